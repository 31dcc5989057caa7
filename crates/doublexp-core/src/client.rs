//! Mission data client for the doublexp.net endpoint.

use async_trait::async_trait;
use doublexp_models::{MissionBatch, Selector};
use tracing::{debug, error};

use crate::config::AlertConfig;
use crate::error::{MissionError, Result};
use crate::filter::filter_missions;
use crate::schema::{parse_report, MissionReport};

/// Source of raw mission reports.
///
/// Implemented over HTTP by [`MissionDataClient`]; tests substitute fakes.
#[async_trait]
pub trait MissionSource: Send + Sync {
    /// Fetches and parses the report for `selector`.
    ///
    /// Resolves only once the whole body has been received and parsed.
    async fn fetch(&self, selector: Selector) -> Result<MissionReport>;
}

/// HTTP client for `GET {base_url}/json?data={selector}`.
///
/// No request timeout is configured; a stalled endpoint holds only the task
/// that awaits it. Failures are never retried.
#[derive(Debug, Clone)]
pub struct MissionDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MissionDataClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client for the configured endpoint.
    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    /// Full request URL for `selector`.
    pub fn endpoint(&self, selector: Selector) -> String {
        format!(
            "{}/json?data={}",
            self.base_url.trim_end_matches('/'),
            selector
        )
    }
}

#[async_trait]
impl MissionSource for MissionDataClient {
    async fn fetch(&self, selector: Selector) -> Result<MissionReport> {
        let url = self.endpoint(selector);
        debug!(url = %url, "Fetching missions");

        let response = self.http.get(&url).send().await.map_err(|e| {
            error!(selector = %selector, error = %e, "Can't fetch missions data");
            MissionError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(selector = %selector, status = %status, "Missions endpoint returned an error status");
            return Err(MissionError::Transport(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            error!(selector = %selector, error = %e, "Failed to read missions response");
            MissionError::from(e)
        })?;

        parse_report(&body).map_err(|e| {
            error!(selector = %selector, error = %e, "Error while parsing missions data");
            e
        })
    }
}

/// Fetches `selector` and keeps the missions carrying `mutator`.
///
/// The fetch fully completes before filtering starts. A malformed matching
/// record fails the whole batch.
pub async fn fetch_batch(
    source: &dyn MissionSource,
    selector: Selector,
    mutator: &str,
) -> Result<MissionBatch> {
    let report = source.fetch(selector).await?;
    let batch = filter_missions(&report, mutator)?;
    debug!(selector = %selector, count = batch.len(), "Filtered missions");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    const BODY: &str = r#"{
        "Biomes": {
            "Fungus Bogs": [
                {
                    "CodeName": "Soggy Den",
                    "Complexity": "2",
                    "Length": "2",
                    "MissionMutator": "Gold Rush",
                    "PrimaryObjective": "Escort Duty"
                },
                {
                    "CodeName": "Rotten Hive",
                    "Complexity": "1",
                    "Length": "2",
                    "MissionMutator": "Double XP",
                    "MissionWarnings": ["Low Oxygen"],
                    "PrimaryObjective": "Egg Hunt",
                    "SecondaryObjective": "Apoca Blooms",
                    "included_in": ["s0"]
                }
            ]
        },
        "timestamp": "2024-05-02T15:30:00Z"
    }"#;

    /// Serves BODY for `data=next`, garbage for `data=current`.
    async fn serve() -> String {
        async fn json(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
            match params.get("data").map(String::as_str) {
                Some("next") => (StatusCode::OK, BODY.to_string()),
                Some("current") => (StatusCode::OK, "<html>maintenance</html>".to_string()),
                _ => (StatusCode::BAD_REQUEST, String::new()),
            }
        }

        let app = Router::new()
            .route("/json", get(json))
            .route("/down/json", get(|| async { StatusCode::BAD_GATEWAY }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_endpoint() {
        let client = MissionDataClient::new("https://doublexp.net/");
        assert_eq!(
            client.endpoint(Selector::Current),
            "https://doublexp.net/json?data=current"
        );

        let client = MissionDataClient::from_config(&AlertConfig::default());
        assert_eq!(
            client.endpoint(Selector::Next),
            "https://doublexp.net/json?data=next"
        );
    }

    #[tokio::test]
    async fn test_fetch_and_filter() {
        let client = MissionDataClient::new(serve().await);

        // The Gold Rush record has no SecondaryObjective and must not matter
        let batch = fetch_batch(&client, Selector::Next, "Double XP").await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.missions[0].biome, "Fungus Bogs");
        assert_eq!(batch.missions[0].warnings, vec!["Low Oxygen"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_data_format_error() {
        let client = MissionDataClient::new(serve().await);

        let err = client.fetch(Selector::Current).await.unwrap_err();
        assert!(matches!(err, MissionError::DataFormat(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let client = MissionDataClient::new(format!("{}/down", serve().await));

        let err = client.fetch(Selector::Next).await.unwrap_err();
        assert!(matches!(err, MissionError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_transport_error() {
        // Bind then drop to get a local port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = MissionDataClient::new(format!("http://{}", addr));
        let err = client.fetch(Selector::Next).await.unwrap_err();
        assert!(matches!(err, MissionError::Transport(_)));
    }
}
