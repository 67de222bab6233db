use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use linkgate::error::FilterError;
use linkgate::filter::{RequestOrigin, ResultFilter};
use linkgate::validator::{
    HttpLinkValidator, LinkValidator, SUPPORTED_PLATFORMS, Validation,
};

mod test_helpers {
    use super::*;

    /// Validator that answers with a fixed outcome and records every call.
    pub struct StubValidator {
        outcome: Validation,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl StubValidator {
        pub fn confirming(urls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                outcome: Validation::Confirmed(urls.iter().map(|u| u.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                outcome: Validation::Unavailable("connection refused".into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LinkValidator for StubValidator {
        async fn validate(&self, links: &[String]) -> Validation {
            self.calls.lock().unwrap().push(links.to_vec());
            self.outcome.clone()
        }
    }

    pub fn http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_invalid_links_are_removed() -> Result<()> {
    let stub = StubValidator::confirming(&["u1"]);
    let filter = ResultFilter::new(stub.clone());

    let input = json!({
        "code": 0,
        "data": {"merged_by_type": {"baidu": [{"url": "u1"}, {"url": "u2"}]}, "results": []}
    });
    let (out, report) = filter
        .filter_with_report(input, RequestOrigin::Post)
        .await?;
    let report = report.expect("links were present");

    assert_eq!(
        out["data"]["merged_by_type"],
        json!({"baidu": [{"url": "u1"}]})
    );
    assert_eq!(report.unique_links, 2);
    assert_eq!(report.valid_links, 1);
    assert_eq!(report.filtered_out(), 1);
    assert_eq!(report.dropped_occurrences, 1);
    assert!(!report.validator_unavailable);
    assert_eq!(report.counts.get("baidu").map(|t| (t.before, t.after)), Some((2, 1)));
    Ok(())
}

#[tokio::test]
async fn test_validator_called_once_with_unique_links() -> Result<()> {
    let stub = StubValidator::confirming(&["a", "b"]);
    let filter = ResultFilter::new(stub.clone());

    let input = json!({
        "data": {
            "merged_by_type": {"quark": [{"url": "a"}, {"url": "b"}]},
            "results": [{"links": [{"url": "b"}, {"url": "a"}, {"url": "a"}]}]
        }
    });
    filter.filter(input, RequestOrigin::Get).await?;

    let calls = stub.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec!["a".to_string(), "b".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_fail_open_keeps_every_link() -> Result<()> {
    let stub = StubValidator::failing();
    let filter = ResultFilter::new(stub.clone());

    let input = json!({
        "data": {
            "total": 1,
            "results": [{"message_id": "m", "links": [{"url": "u1", "type": "quark"}]}],
            "merged_by_type": {"quark": [{"url": "u1"}]}
        }
    });
    let (out, report) = filter
        .filter_with_report(input.clone(), RequestOrigin::Post)
        .await?;

    assert_eq!(out, input);
    let report = report.unwrap();
    assert!(report.validator_unavailable);
    assert_eq!(report.filtered_out(), 0);
    assert_eq!(stub.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_no_links_short_circuits() -> Result<()> {
    let stub = StubValidator::confirming(&[]);
    let filter = ResultFilter::new(stub.clone());

    let input = json!({
        "code": 0,
        "message": "success",
        "data": {"total": 0, "results": [], "merged_by_type": {}, "extra": "kept"}
    });
    let (out, report) = filter
        .filter_with_report(input.clone(), RequestOrigin::Get)
        .await?;

    assert_eq!(out, input);
    assert!(report.is_none());
    assert_eq!(stub.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_no_links_keeps_nulls_and_absent_keys() -> Result<()> {
    let stub = StubValidator::confirming(&[]);
    let filter = ResultFilter::new(stub.clone());

    for input in [
        json!({
            "code": 0,
            "message": null,
            "data": {"total": 0, "results": [{"title": "no links"}], "merged_by_type": null}
        }),
        json!({"code": 0, "message": "ok", "data": null}),
        json!({"code": 0, "data": {"results": [{"title": "t", "links": []}], "merged_by_type": {"uc": []}}}),
    ] {
        let out = filter.filter(input.clone(), RequestOrigin::Post).await?;
        assert_eq!(out, input);
        assert_eq!(serde_json::to_string(&out)?, serde_json::to_string(&input)?);
    }
    assert_eq!(stub.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unexpected_shape_is_reported() {
    let stub = StubValidator::confirming(&[]);
    let filter = ResultFilter::new(stub.clone());

    let input = json!({"data": {"results": "not a list"}});
    let err = filter.filter(input, RequestOrigin::Get).await.unwrap_err();

    assert!(matches!(err, FilterError::Malformed { .. }));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_shape_violation_is_reported() {
    let stub = StubValidator::confirming(&[]);
    let filter = ResultFilter::new(stub.clone());

    let input = json!({"data": {"results": [{"links": [{"type": "uc"}]}]}});
    let err = filter.filter(input, RequestOrigin::Post).await.unwrap_err();

    assert!(matches!(err, FilterError::MissingUrl { .. }));
    assert_eq!(stub.call_count(), 0);
}

#[tokio::test]
async fn test_extra_urls_from_validator_are_ignored() -> Result<()> {
    let stub = StubValidator::confirming(&["u1", "not-asked-for"]);
    let filter = ResultFilter::new(stub);

    let input = json!({"data": {"results": [{"links": [{"url": "u1"}, {"url": "u2"}]}]}});
    let (_, report) = filter
        .filter_with_report(input, RequestOrigin::Post)
        .await?;
    assert_eq!(report.unwrap().valid_links, 1);
    Ok(())
}

#[tokio::test]
async fn test_http_validator_sends_links_and_every_platform() -> Result<()> {
    let server = MockServer::start().await;
    let platforms: Vec<&str> = SUPPORTED_PLATFORMS.to_vec();
    Mock::given(method("POST"))
        .and(path("/api/v1/links/check"))
        .and(body_partial_json(json!({
            "links": ["u1", "u2"],
            "selected_platforms": platforms
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid_links": ["u2"]})))
        .expect(1)
        .mount(&server)
        .await;

    let validator = HttpLinkValidator::new(
        http_client(),
        format!("{}/api/v1/links/check", server.uri()),
    );
    let outcome = validator
        .validate(&["u1".to_string(), "u2".to_string()])
        .await;

    let expected: HashSet<String> = ["u2".to_string()].into_iter().collect();
    assert_eq!(outcome, Validation::Confirmed(expected));
    Ok(())
}

#[tokio::test]
async fn test_http_validator_failures_are_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(path("/status"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"valid_links": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let links = vec!["u1".to_string()];
    for endpoint in ["/status", "/garbage", "/slow"] {
        let validator = HttpLinkValidator::new(http_client(), format!("{}{}", server.uri(), endpoint));
        let outcome = validator.validate(&links).await;
        assert!(outcome.is_unavailable(), "{endpoint} should be unavailable");
    }

    // Nothing listening at all.
    let validator = HttpLinkValidator::new(http_client(), "http://127.0.0.1:9/check");
    assert!(validator.validate(&links).await.is_unavailable());
    Ok(())
}

#[tokio::test]
async fn test_fail_open_through_http_validator() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let validator = HttpLinkValidator::new(http_client(), format!("{}/check", server.uri()));
    let filter = ResultFilter::new(Arc::new(validator));

    let input = json!({"data": {"results": [{"links": [{"url": "u1", "type": "quark"}]}]}});
    let out = filter.filter(input, RequestOrigin::Post).await?;

    assert_eq!(
        out["data"]["results"],
        json!([{"links": [{"url": "u1", "type": "quark"}]}])
    );
    Ok(())
}
