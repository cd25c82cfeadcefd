//! NVDB API interaction layer.
//!
//! This module owns everything that talks to the upstream road database:
//!
//! - **`client`** - the HTTP client with static identification headers and
//!   transient-error classification
//! - **`wire`** - serde types that mirror the upstream JSON exactly
//! - **`harvester`** - the resumable, deduplicating paginated fetch loop

pub mod client;
pub mod harvester;
pub mod wire;

pub use client::{initial_page_url, NvdbClient};
pub use harvester::{run_harvest, CompletionReason, Harvester, HarvestSummary};
