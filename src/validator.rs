use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;

use crate::data_models::{CheckRequest, CheckResponse};

/// Every storage provider the validator knows how to check. Sent on every call.
pub const SUPPORTED_PLATFORMS: [&str; 8] = [
    "quark", "uc", "baidu", "tianyi", "pan123", "pan115", "xunlei", "aliyun",
];

/// Outcome of one validator round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The validator answered; these links are live.
    Confirmed(HashSet<String>),
    /// The validator could not be used. Carries the reason for logging.
    Unavailable(String),
}

impl Validation {
    /// Resolve to the set of links to keep.
    ///
    /// A confirmed answer is intersected with `unique`; an unavailable
    /// validator lets every link through.
    pub fn into_valid_set(self, unique: &HashSet<String>) -> HashSet<String> {
        match self {
            Validation::Confirmed(valid) => valid
                .into_iter()
                .filter(|url| unique.contains(url))
                .collect(),
            Validation::Unavailable(_) => unique.clone(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Validation::Unavailable(_))
    }
}

#[async_trait]
pub trait LinkValidator: Send + Sync {
    /// Check `links` in a single call. Never fails; failures become
    /// [`Validation::Unavailable`].
    async fn validate(&self, links: &[String]) -> Validation;
}

/// Validator reached over HTTP at a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpLinkValidator {
    client: Client,
    endpoint: String,
}

impl HttpLinkValidator {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn check(&self, links: &[String]) -> Result<CheckResponse, reqwest::Error> {
        let body = CheckRequest {
            links: links.to_vec(),
            selected_platforms: SUPPORTED_PLATFORMS.iter().map(|p| p.to_string()).collect(),
        };
        self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<CheckResponse>()
            .await
    }
}

#[async_trait]
impl LinkValidator for HttpLinkValidator {
    async fn validate(&self, links: &[String]) -> Validation {
        match self.check(links).await {
            Ok(res) => Validation::Confirmed(res.valid_links.into_iter().collect()),
            Err(e) => Validation::Unavailable(e.to_string()),
        }
    }
}
