//! External NLP analyzer client
//!
//! Talks to a Presidio-compatible analyzer service:
//!
//! ```text
//! POST {endpoint}/analyze
//! {"text": "...", "language": "en", "score_threshold": 0.0}
//!
//! 200 OK
//! [{"entity_type": "PERSON", "start": 0, "end": 8, "score": 0.85}]
//! ```
//!
//! The service reports character offsets; they are converted to byte offsets
//! before findings leave this module.

use crate::anonymization::detector::Recognizer;
use crate::anonymization::models::{Finding, FindingSource};
use crate::config::AnalyzerConfig;
use crate::domain::{AnalyzerError, EntityType, PiiGuardError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Analyzer service recognizer
///
/// Created once at startup and shared by reference across segment tasks.
///
/// # Example
///
/// ```no_run
/// use pii_guard::adapters::analyzer::HttpAnalyzer;
/// use pii_guard::anonymization::detector::Recognizer;
/// use pii_guard::config::AnalyzerConfig;
///
/// # async fn example() -> pii_guard::domain::Result<()> {
/// let config = AnalyzerConfig {
///     endpoint: Some("http://localhost:5002".to_string()),
///     ..Default::default()
/// };
/// let analyzer = HttpAnalyzer::new(&config)?;
/// let findings = analyzer.analyze("Call John Smith").await?;
/// analyzer.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpAnalyzer {
    /// Full URL of the analyze endpoint
    analyze_url: String,

    /// HTTP client for making requests
    client: Client,

    config: AnalyzerConfig,

    closed: AtomicBool,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    language: &'a str,
    score_threshold: f32,
}

#[derive(Debug, Deserialize)]
struct AnalyzerResult {
    entity_type: String,
    start: usize,
    end: usize,
    score: f32,
}

impl HttpAnalyzer {
    /// Create a client for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no endpoint is set or the HTTP
    /// client cannot be built.
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            PiiGuardError::Configuration("analyzer.endpoint is not set".to_string())
        })?;
        let analyze_url = format!("{}/analyze", endpoint.trim_end_matches('/'));

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| {
                PiiGuardError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            analyze_url,
            client,
            config: config.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// URL requests are sent to
    pub fn analyze_url(&self) -> &str {
        &self.analyze_url
    }

    async fn send_once(&self, text: &str) -> Result<Vec<AnalyzerResult>> {
        let body = AnalyzeRequest {
            text,
            language: &self.config.language,
            score_threshold: 0.0,
        };

        let mut request = self.client.post(&self.analyze_url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key.expose_secret().as_ref());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout(e.to_string())
            } else {
                AnalyzerError::ConnectionFailed(e.to_string())
            }
        })?;

        match resp.status() {
            StatusCode::OK => Ok(resp
                .json::<Vec<AnalyzerResult>>()
                .await
                .map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))?),
            status if status.is_server_error() => {
                let message = resp.text().await.unwrap_or_default();
                Err(AnalyzerError::ServerError {
                    status: status.as_u16(),
                    message,
                }
                .into())
            }
            status => {
                let message = resp.text().await.unwrap_or_default();
                Err(AnalyzerError::ClientError {
                    status: status.as_u16(),
                    message,
                }
                .into())
            }
        }
    }

    /// Send with exponential backoff on transient failures
    async fn send_with_retry(&self, text: &str) -> Result<Vec<AnalyzerResult>> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match self.send_once(text).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    if attempt >= max_retries || !is_transient(&e) {
                        return Err(e);
                    }
                    attempt += 1;

                    let delay_ms = self.config.retry_delay_ms * (1u64 << (attempt - 1).min(6));
                    crate::log_retry_attempt!(attempt, max_retries, e);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

fn is_transient(error: &PiiGuardError) -> bool {
    matches!(
        error,
        PiiGuardError::Analyzer(
            AnalyzerError::ConnectionFailed(_)
                | AnalyzerError::Timeout(_)
                | AnalyzerError::ServerError { .. }
        )
    )
}

/// Byte offset of every char boundary, indexed by char position
fn char_to_byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn to_findings(text: &str, results: Vec<AnalyzerResult>) -> Vec<Finding> {
    let offsets = char_to_byte_offsets(text);

    results
        .into_iter()
        .filter_map(|r| {
            let (Some(&start), Some(&end)) = (offsets.get(r.start), offsets.get(r.end)) else {
                tracing::debug!(
                    entity_type = %r.entity_type,
                    start = r.start,
                    end = r.end,
                    "Dropping analyzer result outside the text"
                );
                return None;
            };

            let entity_type = match EntityType::new(r.entity_type.as_str()) {
                Ok(entity_type) => entity_type,
                Err(e) => {
                    tracing::debug!(error = %e, start, end, "Dropping analyzer result without entity type");
                    return None;
                }
            };
            match Finding::new(entity_type, start, end, r.score, FindingSource::Builtin) {
                Ok(finding) => Some(finding),
                Err(e) => {
                    tracing::debug!(error = %e, "Dropping invalid analyzer result");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl Recognizer for HttpAnalyzer {
    fn name(&self) -> &str {
        "http_analyzer"
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Finding>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AnalyzerError::ConnectionFailed("analyzer has been shut down".to_string()).into());
        }

        let results = self.send_with_retry(text).await?;
        Ok(to_findings(text, results))
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(url = %self.analyze_url, "Analyzer client closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config_for(url: &str) -> AnalyzerConfig {
        AnalyzerConfig {
            endpoint: Some(url.to_string()),
            timeout_seconds: 5,
            max_retries: 1,
            retry_delay_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_endpoint() {
        assert!(HttpAnalyzer::new(&AnalyzerConfig::default()).is_err());
    }

    #[test]
    fn test_analyze_url() {
        let analyzer = HttpAnalyzer::new(&config_for("http://localhost:5002/")).unwrap();
        assert_eq!(analyzer.analyze_url(), "http://localhost:5002/analyze");
    }

    #[test]
    fn test_char_offsets_converted_to_bytes() {
        let text = "Zoë Müller lives here";
        let results = vec![AnalyzerResult {
            entity_type: "PERSON".to_string(),
            start: 0,
            end: 10,
            score: 0.85,
        }];

        let findings = to_findings(text, results);
        assert_eq!(findings.len(), 1);
        assert_eq!(&text[findings[0].start()..findings[0].end()], "Zoë Müller");
        assert_eq!(findings[0].source(), FindingSource::Builtin);
    }

    #[test]
    fn test_out_of_range_results_dropped() {
        let results = vec![
            AnalyzerResult {
                entity_type: "PERSON".to_string(),
                start: 2,
                end: 40,
                score: 0.85,
            },
            AnalyzerResult {
                entity_type: "PERSON".to_string(),
                start: 3,
                end: 3,
                score: 0.85,
            },
        ];
        assert!(to_findings("short", results).is_empty());
    }

    #[test]
    fn test_blank_entity_type_dropped() {
        let results = vec![
            AnalyzerResult {
                entity_type: "  ".to_string(),
                start: 0,
                end: 4,
                score: 0.85,
            },
            AnalyzerResult {
                entity_type: "PERSON".to_string(),
                start: 5,
                end: 9,
                score: 0.85,
            },
        ];

        let findings = to_findings("Anna Bell", results);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entity_type().as_str(), "PERSON");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .match_header("authorization", "Bearer k-123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "language": "en"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"entity_type": "PERSON", "start": 5, "end": 15, "score": 0.85}]"#)
            .create_async()
            .await;

        let mut config = config_for(&server.url());
        config.api_key = Some(secret_string("k-123".to_string()));
        let analyzer = HttpAnalyzer::new(&config).unwrap();

        let findings = analyzer.analyze("Call John Smith today").await.unwrap();
        mock.assert_async().await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entity_type().as_str(), "PERSON");
        assert_eq!((findings[0].start(), findings[0].end()), (5, 15));
    }

    #[tokio::test]
    async fn test_server_error_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .with_status(503)
            .with_body("unavailable")
            .expect(2)
            .create_async()
            .await;

        let analyzer = HttpAnalyzer::new(&config_for(&server.url())).unwrap();
        let err = analyzer.analyze("text").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            PiiGuardError::Analyzer(AnalyzerError::ServerError { status: 503, .. })
        ));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .with_status(422)
            .expect(1)
            .create_async()
            .await;

        let analyzer = HttpAnalyzer::new(&config_for(&server.url())).unwrap();
        let err = analyzer.analyze("text").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            PiiGuardError::Analyzer(AnalyzerError::ClientError { status: 422, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/analyze")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let analyzer = HttpAnalyzer::new(&config_for(&server.url())).unwrap();
        let err = analyzer.analyze("text").await.unwrap_err();
        assert!(matches!(
            err,
            PiiGuardError::Analyzer(AnalyzerError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_requests() {
        let analyzer = HttpAnalyzer::new(&config_for("http://127.0.0.1:9")).unwrap();
        analyzer.shutdown().await.unwrap();
        analyzer.shutdown().await.unwrap();
        assert!(analyzer.analyze("text").await.is_err());
    }
}
