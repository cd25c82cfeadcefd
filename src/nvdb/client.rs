//! NVDB HTTP client.
//!
//! A thin wrapper around `reqwest` that attaches the static identification
//! headers NVDB expects, classifies failures into the transient taxonomy
//! (connection error, non-2xx status, malformed body), and logs one line
//! per request with status and duration.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::info;
use url::Url;

use crate::config::{HarvestConfig, REQUEST_TIMEOUT_SECS};
use crate::error::HarvestError;
use crate::nvdb::wire::WirePage;

/// Maximum characters of an upstream body kept for diagnostics.
const BODY_EXCERPT_CHARS: usize = 200;

/// HTTP client for the NVDB road-object API.
#[derive(Clone)]
pub struct NvdbClient {
    http: reqwest::Client,
}

impl NvdbClient {
    /// Builds the client with the configured identification headers and a
    /// fixed request timeout.
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Client",
            HeaderValue::from_str(&config.client_name)
                .map_err(|_| HarvestError::Internal("invalid client name header".to_string()))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| HarvestError::Internal("invalid user agent header".to_string()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HarvestError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Fetches one page and parses it.
    ///
    /// # Errors
    ///
    /// All three variants are transient and feed the harvester's error
    /// streak:
    /// - `ConnectionFailed` - network-level failure or unreadable body
    /// - `UpstreamStatus` - non-2xx status, with a body excerpt
    /// - `MalformedBody` - a 2xx body that does not parse as a page
    pub async fn fetch_page(&self, url: &Url) -> Result<WirePage, HarvestError> {
        let started = Instant::now();

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| HarvestError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let duration_ms = started.elapsed().as_millis();
        info!("[NVDB] GET {} {} {}ms", url.path(), status.as_u16(), duration_ms);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HarvestError::UpstreamStatus {
                status: status.as_u16(),
                body_excerpt: excerpt(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::ConnectionFailed(format!("failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| HarvestError::MalformedBody(format!("{e} (body: {})", excerpt(&body))))
    }
}

/// First-page URL: the configured endpoint with the filter parameters that
/// are sent only on the initial request. Later pages follow the upstream
/// continuation URL verbatim.
pub fn initial_page_url(config: &HarvestConfig) -> Url {
    let mut url = config.base_url.clone();
    url.query_pairs_mut()
        .append_pair("fylke", &config.county)
        .append_pair("srid", &config.srid)
        .append_pair("antall", &config.page_size.to_string())
        .append_pair("inkluder", &config.include);
    url
}

/// Truncates a body to a short excerpt safe for logs, on a char boundary.
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((byte_index, _)) => format!("{}...", &trimmed[..byte_index]),
        None => trimmed.to_string(),
    }
}
