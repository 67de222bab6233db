use reqwest::{Client, Response};
use serde_json::Value;

use crate::data_models::SearchQuery;
use crate::error::UpstreamError;

const BODY_SNIPPET_MAX: usize = 512;

pub const SEARCH_API: &str = "search API";
pub const HEALTH_API: &str = "health check API";

/// Client for the search backend this service sits in front of.
///
/// Bodies come back as raw JSON so callers can hand them on untouched.
#[derive(Debug, Clone)]
pub struct SearchBackend {
    client: Client,
    base_url: String,
}

impl SearchBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `POST /api/search` with the client body forwarded verbatim.
    pub async fn search_post(&self, body: &Value) -> Result<Value, UpstreamError> {
        let url = format!("{}/api/search", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(SEARCH_API, e))?;
        decode(SEARCH_API, res).await
    }

    /// `GET /api/search?kw=..&res=..&src=..`
    pub async fn search_get(&self, query: &SearchQuery) -> Result<Value, UpstreamError> {
        let url = format!("{}/api/search", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(SEARCH_API, e))?;
        decode(SEARCH_API, res).await
    }

    /// `GET /api/health`, returned as received.
    pub async fn health(&self) -> Result<Value, UpstreamError> {
        let url = format!("{}/api/health", self.base_url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(HEALTH_API, e))?;
        decode(HEALTH_API, res).await
    }

    fn classify(&self, api: &'static str, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            log::error!("{api} request timed out");
            UpstreamError::Timeout { api }
        } else if e.is_connect() {
            log::error!("cannot connect to {api}: {}", self.base_url);
            UpstreamError::Unreachable {
                api,
                url: self.base_url.clone(),
            }
        } else {
            log::error!("{api} error: {:#}", e);
            UpstreamError::Transport {
                api,
                message: e.to_string(),
            }
        }
    }
}

async fn decode(api: &'static str, res: Response) -> Result<Value, UpstreamError> {
    let status = res.status();
    if !status.is_success() {
        log::error!("{api} returned status {status}");
        return Err(UpstreamError::Status { api, status });
    }

    let body = res.bytes().await.map_err(|e| {
        if e.is_timeout() {
            UpstreamError::Timeout { api }
        } else {
            UpstreamError::Transport {
                api,
                message: e.to_string(),
            }
        }
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        let body_snippet = snippet(&body);
        log::error!("unparseable {api} body: {e}, body: {body_snippet}");
        UpstreamError::Decode {
            api,
            reason: e.to_string(),
            body_snippet,
        }
    })
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() > BODY_SNIPPET_MAX {
        let mut end = BODY_SNIPPET_MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.into_owned()
    }
}

#[test]
fn test_snippet_truncates_on_char_boundary() {
    let short = "ok";
    assert_eq!(snippet(short.as_bytes()), "ok");

    let long = "é".repeat(BODY_SNIPPET_MAX);
    let cut = snippet(long.as_bytes());
    assert!(cut.ends_with("..."));
    assert!(cut.len() <= BODY_SNIPPET_MAX + 3);
}
