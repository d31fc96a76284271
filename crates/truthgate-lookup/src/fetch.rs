//! `reqwest`-backed implementation of `Fetcher`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::debug;

use truthgate_contracts::error::{TruthgateError, TruthgateResult};
use truthgate_core::traits::{FetchFailure, FetchedBody, Fetcher};

/// Content types every source request advertises.
pub const ACCEPT_TYPES: &str = "application/json,text/html,text/plain";

/// Outbound GET over a shared connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestFetcher {
    /// Build a client identifying itself as `user_agent` that reads at most
    /// `max_body_bytes` of any response body.
    pub fn new(user_agent: &str, max_body_bytes: usize) -> TruthgateResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_TYPES));
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| TruthgateError::FetchError {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

fn classify(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Transport(error.to_string())
    }
}

/// Append as much of `chunk` as fits under `cap`. Returns true once the cap is reached.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= cap
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedBody, FetchFailure> {
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            if append_capped(&mut body, &chunk, self.max_body_bytes) {
                debug!(url, max_body_bytes = self.max_body_bytes, "response body truncated");
                break;
            }
        }

        Ok(FetchedBody {
            status: status.as_u16(),
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_stops_growing_at_the_cap() {
        let mut body = Vec::new();
        assert!(!append_capped(&mut body, b"<rss>", 8));
        assert!(append_capped(&mut body, b"<channel>", 8));
        assert_eq!(body, b"<rss><ch");

        assert!(append_capped(&mut body, b"more", 8));
        assert_eq!(body.len(), 8);
    }

    #[test]
    fn cut_multibyte_char_decodes_lossily() {
        let mut body = Vec::new();
        append_capped(&mut body, "café".as_bytes(), 4);
        assert_eq!(String::from_utf8_lossy(&body), "caf\u{FFFD}");
    }
}
