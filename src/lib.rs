//! Resumable harvester for NVDB speed-limit segments.
//!
//! Incrementally fetches the paginated road-object listing for speed limits
//! (object type 105), converts each record's WKT geometry into a
//! GeoJSON-style LineString, and persists results as bounded chunk files
//! that survive process restarts. Key properties:
//!
//! - **Resumable** - the continuation cursor is checkpointed after every
//!   page, so a restarted run continues instead of starting over
//! - **Idempotent** - a dedup index rehydrated from existing chunks makes
//!   re-runs add zero duplicate records
//! - **Bounded** - streak ceilings abort runs against a broken upstream,
//!   and size ceilings refuse to write oversized output
//!
//! The `merge` and `split` tools reconcile the chunk files into one
//! canonical, id-sorted dataset and back.

pub mod config;
pub mod dedup;
pub mod error;
pub mod geometry;
pub mod nvdb;
pub mod record;
pub mod resume;
pub mod runlog;
pub mod session;
pub mod storage;

pub use config::HarvestConfig;
pub use error::HarvestError;
pub use record::{LineString, SpeedLimitRecord};
pub use session::HarvestSession;
