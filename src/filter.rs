use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::data_models::SearchResponse;
use crate::error::FilterError;
use crate::extractor::extract_links;
use crate::rebuilder::{CategoryCounts, rebuild_response};
use crate::validator::{LinkValidator, Validation};

/// Which route a response came through. Only used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOrigin {
    Post,
    Get,
}

impl fmt::Display for RequestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOrigin::Post => f.write_str("POST"),
            RequestOrigin::Get => f.write_str("GET"),
        }
    }
}

/// What happened while filtering one response.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterReport {
    pub unique_links: usize,
    pub valid_links: usize,
    pub dropped_occurrences: usize,
    pub validator_unavailable: bool,
    pub counts: CategoryCounts,
}

impl FilterReport {
    pub fn filtered_out(&self) -> usize {
        self.unique_links - self.valid_links
    }
}

/// Extract, validate, rebuild.
pub struct ResultFilter {
    validator: Arc<dyn LinkValidator>,
}

impl ResultFilter {
    pub fn new(validator: Arc<dyn LinkValidator>) -> Self {
        Self { validator }
    }

    pub async fn filter(&self, upstream: Value, origin: RequestOrigin) -> Result<Value, FilterError> {
        let (filtered, _) = self.filter_with_report(upstream, origin).await?;
        Ok(filtered)
    }

    /// Returns the report as well, or `None` when there was nothing to check
    /// and `upstream` came back unchanged.
    pub async fn filter_with_report(
        &self,
        upstream: Value,
        origin: RequestOrigin,
    ) -> Result<(Value, Option<FilterReport>), FilterError> {
        let response = SearchResponse::from_upstream(&upstream)?;
        let extracted = extract_links(&response)?;
        if extracted.is_empty() {
            tracing::info!(%origin, "no links to validate, returning upstream response as is");
            return Ok((upstream, None));
        }

        tracing::info!(%origin, unique_links = extracted.len(), "validating links");
        let start = Instant::now();

        let validation = self.validator.validate(extracted.unique()).await;
        if let Validation::Unavailable(reason) = &validation {
            tracing::warn!(%origin, %reason, "link validator unavailable, skipping validation");
        }
        let validator_unavailable = validation.is_unavailable();
        let valid = validation.into_valid_set(extracted.unique_set());

        let (rebuilt, counts) = rebuild_response(upstream, &response, &valid)?;

        let report = FilterReport {
            unique_links: extracted.len(),
            valid_links: valid.len(),
            dropped_occurrences: extracted.dropped_occurrences(&valid),
            validator_unavailable,
            counts,
        };
        log_report(origin, &report, start.elapsed().as_millis() as u64);

        Ok((rebuilt, Some(report)))
    }
}

fn log_report(origin: RequestOrigin, report: &FilterReport, duration_ms: u64) {
    tracing::info!(
        %origin,
        duration_ms,
        before = report.unique_links,
        after = report.valid_links,
        filtered = report.filtered_out(),
        dropped_occurrences = report.dropped_occurrences,
        "filtering complete"
    );
    for (category, tally) in report.counts.iter() {
        tracing::info!(
            %origin,
            "category {}: {} -> {} (filtered: {})",
            category,
            tally.before,
            tally.after,
            tally.filtered()
        );
    }
}
