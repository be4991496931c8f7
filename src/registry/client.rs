//! GLEIF API client
//!
//! Rate-limited HTTP client for the lei-records search endpoint.
//!
//! The pacer is shared: one `GleifClient` is constructed at process
//! start and injected into every domain pipeline, so the minimum
//! request spacing holds across all concurrent lookups. When the pacer
//! is saturated callers wait on it, they do not fail.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tokio::time::sleep;

use super::types::{GleifResponse, LeiRecord, RawEntityRecord};
use crate::error::{PermanentLookupError, ResolutionError, TransientLookupError};

const GLEIF_API_BASE: &str = "https://api.gleif.org/api/v1";

/// Registry search contract consumed by the orchestrator.
///
/// Implementations may fail with `TransientLookup` (retried by the
/// caller) or `PermanentLookup` (recorded as failed for the attempt).
#[async_trait]
pub trait RegistrySearch: Send + Sync {
    /// Search the registry by entity name. `domain_hint` lets an
    /// implementation bias or log the query; the GLEIF endpoint itself
    /// only filters on the name.
    async fn search(
        &self,
        query: &str,
        domain_hint: &str,
    ) -> Result<Vec<RawEntityRecord>, ResolutionError>;
}

pub struct GleifClient {
    client: Client,
    last_request: Mutex<Instant>,
    min_delay: Duration,
    page_size: usize,
}

impl GleifClient {
    pub fn new(min_delay: Duration, page_size: usize) -> Result<Self, ResolutionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransientLookupError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            last_request: Mutex::new(Instant::now() - min_delay),
            min_delay,
            page_size,
        })
    }

    /// Enforce minimum spacing between requests across all callers.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_delay {
            sleep(self.min_delay - elapsed).await;
        }
        *last = Instant::now();
    }

    fn classify_status(status: StatusCode, body: String) -> ResolutionError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            TransientLookupError::RateLimited.into()
        } else if status.is_server_error() {
            TransientLookupError::ServerError {
                status: status.as_u16(),
            }
            .into()
        } else {
            PermanentLookupError::BadRequest {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }
            .into()
        }
    }

    fn classify_request_error(err: reqwest::Error) -> ResolutionError {
        if err.is_timeout() {
            TransientLookupError::Timeout.into()
        } else if err.is_connect() {
            TransientLookupError::Connect(err.to_string()).into()
        } else {
            PermanentLookupError::Decode(err.to_string()).into()
        }
    }
}

#[async_trait]
impl RegistrySearch for GleifClient {
    async fn search(
        &self,
        query: &str,
        domain_hint: &str,
    ) -> Result<Vec<RawEntityRecord>, ResolutionError> {
        self.rate_limit().await;

        let url = format!(
            "{}/lei-records?filter[entity.legalName]={}&page[size]={}",
            GLEIF_API_BASE,
            query.replace(' ', "%20").replace('&', "%26"),
            self.page_size
        );

        tracing::debug!(query = %query, domain = %domain_hint, "GLEIF name search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let text = response
            .text()
            .await
            .map_err(Self::classify_request_error)?;

        let parsed: GleifResponse<Vec<LeiRecord>> = serde_json::from_str(&text).map_err(|e| {
            let head: String = text.chars().take(200).collect();
            PermanentLookupError::Decode(format!("search response: {} (first 200 chars: {})", e, head))
        })?;

        tracing::debug!(
            query = %query,
            hits = parsed.data.len(),
            "GLEIF search returned"
        );

        Ok(parsed.data.into_iter().map(RawEntityRecord::from).collect())
    }
}
