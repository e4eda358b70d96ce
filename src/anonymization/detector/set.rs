//! Concurrent fan-out over independent recognizers

use super::Recognizer;
use crate::anonymization::models::Finding;
use crate::domain::PiiGuardError;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Candidates gathered for one segment
#[derive(Debug, Default)]
pub struct Candidates {
    /// Concatenated findings from every recognizer that answered
    pub findings: Vec<Finding>,
    /// One entry per recognizer that timed out or failed
    pub warnings: Vec<String>,
}

impl Candidates {
    /// Whether at least one recognizer did not contribute
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Builtin recognizer plus the run's rule snapshot behind one capability
#[derive(Clone)]
pub struct RecognizerSet {
    recognizers: Vec<Arc<dyn Recognizer>>,
    timeout: Duration,
}

impl RecognizerSet {
    /// Create a set whose invocations are each bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            recognizers: Vec::new(),
            timeout,
        }
    }

    /// Add a recognizer
    pub fn with(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    /// Registered recognizer names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Number of recognizers
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Per-invocation timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke every recognizer on `text` concurrently
    ///
    /// A recognizer that times out or errors contributes zero findings and a
    /// warning; the others are unaffected. Findings are concatenated in
    /// recognizer registration order.
    pub async fn analyze(&self, text: &str) -> Candidates {
        let invocations = self.recognizers.iter().map(|recognizer| {
            let recognizer = Arc::clone(recognizer);
            async move {
                let outcome = match tokio::time::timeout(self.timeout, recognizer.analyze(text))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(PiiGuardError::RecognizerTimeout {
                        recognizer: recognizer.name().to_string(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }),
                };
                (recognizer, outcome)
            }
        });

        let mut candidates = Candidates::default();
        for (recognizer, outcome) in join_all(invocations).await {
            match outcome {
                Ok(findings) => {
                    tracing::trace!(
                        recognizer = recognizer.name(),
                        candidates = findings.len(),
                        "Recognizer finished"
                    );
                    candidates.findings.extend(findings);
                }
                Err(e) => {
                    tracing::warn!(
                        recognizer = recognizer.name(),
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Recognizer contributed no findings"
                    );
                    candidates
                        .warnings
                        .push(format!("{}: {e}", recognizer.name()));
                }
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::FindingSource;
    use crate::domain::{AnalyzerError, EntityType, Result};
    use async_trait::async_trait;

    struct Fixed(&'static str, usize, usize);

    #[async_trait]
    impl Recognizer for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn analyze(&self, _text: &str) -> Result<Vec<Finding>> {
            Ok(vec![Finding::new(
                EntityType::new(self.0).unwrap(),
                self.1,
                self.2,
                0.5,
                FindingSource::Builtin,
            )?])
        }
    }

    struct Slow;

    #[async_trait]
    impl Recognizer for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn analyze(&self, _text: &str) -> Result<Vec<Finding>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    struct Broken;

    #[async_trait]
    impl Recognizer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn analyze(&self, _text: &str) -> Result<Vec<Finding>> {
            Err(AnalyzerError::ConnectionFailed("refused".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_results_concatenated_in_registration_order() {
        let set = RecognizerSet::new(Duration::from_secs(1))
            .with(Arc::new(Fixed("A", 0, 1)))
            .with(Arc::new(Fixed("B", 2, 3)));

        let candidates = set.analyze("abcdef").await;
        let labels: Vec<_> = candidates
            .findings
            .iter()
            .map(|f| f.entity_type().to_string())
            .collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert!(!candidates.is_partial());
    }

    #[tokio::test]
    async fn test_timeout_yields_partial_result() {
        let set = RecognizerSet::new(Duration::from_millis(20))
            .with(Arc::new(Slow))
            .with(Arc::new(Fixed("A", 0, 1)));

        let candidates = set.analyze("abc").await;
        assert_eq!(candidates.findings.len(), 1);
        assert!(candidates.is_partial());
        assert!(candidates.warnings[0].starts_with("slow:"));
    }

    #[tokio::test]
    async fn test_error_yields_partial_result() {
        let set = RecognizerSet::new(Duration::from_secs(1))
            .with(Arc::new(Broken))
            .with(Arc::new(Fixed("A", 0, 1)));

        let candidates = set.analyze("abc").await;
        assert_eq!(candidates.findings.len(), 1);
        assert_eq!(candidates.warnings.len(), 1);
        assert_eq!(set.names(), vec!["broken", "A"]);
    }
}
