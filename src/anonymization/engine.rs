//! Main anonymization engine
//!
//! This module provides the long-lived [`AnonymizationEngine`] and the
//! request-scoped [`ScanSession`] that runs segments through the pipeline:
//!
//! - **Recognizer Set**: the builtin recognizer plus the session's custom
//!   rules, invoked concurrently per segment under a timeout
//! - **Merger**: reconciles candidates into a non-overlapping set
//! - **Anonymizer**: substitutes placeholders right to left
//! - **Audit Logger**: records findings with hashed values (optional)
//!
//! # Examples
//!
//! ```no_run
//! use pii_guard::anonymization::{AnonymizationConfig, AnonymizationEngine};
//! use pii_guard::anonymization::models::{NormalizedSegment, Origin};
//!
//! # async fn example() -> pii_guard::domain::Result<()> {
//! let engine = AnonymizationEngine::with_default_patterns(AnonymizationConfig::default())?;
//!
//! let mut session = engine.session();
//! session.register_whitelist_rule("SCHOOL_ID", ["223j1ao5g"], false)?;
//!
//! let segment = NormalizedSegment::new(
//!     "John,john.doe@company.com,223j1ao5g",
//!     Origin::cell(0, 0, "raw"),
//! );
//! let results = session.process(vec![segment]).await?;
//! assert_eq!(results[0].text, "John,<EMAIL_ADDRESS>,<SCHOOL_ID>");
//!
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    anonymizer::Anonymizer,
    audit::AuditLogger,
    config::AnonymizationConfig,
    detector::{regex::PatternRecognizer, rules::RuleRegistry, set::RecognizerSet, Recognizer},
    merger::FindingMerger,
    models::{AnonymizedResult, NormalizedSegment, Origin},
    report::ScanReport,
};
use crate::domain::{PiiGuardError, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Long-lived engine holding the builtin recognizer
///
/// Create it once at startup, share it by reference, and call
/// [`shutdown`](Self::shutdown) before exit. Per-request state lives in
/// [`ScanSession`].
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    builtin: Arc<dyn Recognizer>,
    anonymizer: Arc<Anonymizer>,
    audit_logger: Option<AuditLogger>,
}

impl AnonymizationEngine {
    /// Create an engine around a builtin recognizer
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails or the audit log
    /// directory cannot be created.
    pub fn new(config: AnonymizationConfig, builtin: Arc<dyn Recognizer>) -> Result<Self> {
        config.validate().map_err(|e| {
            PiiGuardError::Configuration(format!("Invalid anonymization configuration: {e}"))
        })?;

        let audit_logger = if config.audit.enabled {
            Some(AuditLogger::new(
                config.audit.log_path.clone(),
                config.audit.json_format,
                true,
            )?)
        } else {
            None
        };

        let anonymizer = Arc::new(Anonymizer::new().with_dry_run(config.dry_run));

        tracing::debug!(
            recognizer = builtin.name(),
            dry_run = config.dry_run,
            max_concurrency = config.max_concurrency,
            segment_timeout_ms = config.segment_timeout_ms,
            "Anonymization engine ready"
        );

        Ok(Self {
            config,
            builtin,
            anonymizer,
            audit_logger,
        })
    }

    /// Create an engine using the embedded pattern library
    pub fn with_default_patterns(config: AnonymizationConfig) -> Result<Self> {
        Self::new(config, Arc::new(PatternRecognizer::new()?))
    }

    /// Start a request-scoped session with an empty rule registry
    pub fn session(&self) -> ScanSession<'_> {
        ScanSession {
            engine: self,
            registry: RuleRegistry::new().with_rule_score(self.config.rule_score),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    /// Check if in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Name of the builtin recognizer
    pub fn builtin_name(&self) -> &str {
        self.builtin.name()
    }

    /// Release the builtin recognizer
    pub async fn shutdown(&self) -> Result<()> {
        tracing::debug!(recognizer = self.builtin.name(), "Shutting down recognizer");
        self.builtin.shutdown().await
    }
}

/// Outcome of one run: results in input order plus failed segments
#[derive(Debug)]
pub struct ScanOutcome {
    /// Run identifier
    pub run_id: Uuid,
    /// Completed segments, in input order
    pub results: Vec<AnonymizedResult>,
    /// Segments that produced no result
    pub failures: Vec<SegmentFailure>,
}

/// A segment that failed as a whole
#[derive(Debug)]
pub struct SegmentFailure {
    /// Position in the input
    pub index: usize,
    /// Segment locator
    pub origin: Origin,
    /// Why it failed
    pub error: PiiGuardError,
}

/// Request-scoped scan state: the custom rule registry
///
/// Rules are registered before a run; [`process`](Self::process) borrows the
/// session immutably and works on a snapshot of the registry.
pub struct ScanSession<'e> {
    engine: &'e AnonymizationEngine,
    registry: RuleRegistry,
}

impl ScanSession<'_> {
    /// Register exact-match literals for a custom entity label
    pub fn register_whitelist_rule<I, S>(
        &mut self,
        entity_type: &str,
        literals: I,
        case_sensitive: bool,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry
            .add_whitelist(entity_type, literals, case_sensitive)
    }

    /// Register a regex pattern for a custom entity label
    pub fn register_regex_rule(&mut self, entity_type: &str, pattern: &str) -> Result<()> {
        self.registry.add_regex(entity_type, pattern)
    }

    /// Registered custom rules
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Drop every registered rule
    pub fn clear_rules(&mut self) {
        self.registry.clear();
    }

    /// Process segments, returning completed results in input order
    ///
    /// Failed segments are logged and left out; use
    /// [`process_with_report`](Self::process_with_report) to see them.
    ///
    /// # Errors
    ///
    /// Only fails if the audit log cannot be written.
    pub async fn process(&self, segments: Vec<NormalizedSegment>) -> Result<Vec<AnonymizedResult>> {
        Ok(self.run(segments).await?.results)
    }

    /// Process segments and build a [`ScanReport`]
    pub async fn process_with_report(
        &self,
        segments: Vec<NormalizedSegment>,
    ) -> Result<(Vec<AnonymizedResult>, ScanReport)> {
        let start = Instant::now();
        let outcome = self.run(segments).await?;

        let mut report = ScanReport::new(outcome.run_id, self.engine.config.dry_run);
        for result in &outcome.results {
            report.add_result(result);
        }
        for failure in &outcome.failures {
            report.add_failure(&failure.origin, &failure.error);
        }
        report.finish(start.elapsed().as_millis() as u64);

        Ok((outcome.results, report))
    }

    /// Process segments, keeping failures alongside results
    pub async fn run(&self, segments: Vec<NormalizedSegment>) -> Result<ScanOutcome> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let engine = self.engine;
        let total = segments.len();

        let recognizers = RecognizerSet::new(engine.config.segment_timeout())
            .with(Arc::clone(&engine.builtin))
            .with(self.registry.snapshot());
        let merger = FindingMerger::new(
            engine.config.source_priority.clone(),
            engine.config.score_threshold,
        );

        crate::log_scan_start!(run_id, total);
        tracing::debug!(
            run_id = %run_id,
            custom_rules = self.registry.len(),
            recognizers = ?recognizers.names(),
            dry_run = engine.config.dry_run,
            "Scan configuration"
        );

        let mut outcomes: Vec<(usize, Origin, Result<AnonymizedResult>)> =
            stream::iter(segments.into_iter().enumerate())
                .map(|(index, segment)| {
                    let recognizers = recognizers.clone();
                    let merger = merger.clone();
                    let anonymizer = Arc::clone(&engine.anonymizer);
                    let origin = segment.origin.clone();

                    async move {
                        let handle = tokio::spawn(process_segment(
                            recognizers,
                            merger,
                            anonymizer,
                            segment,
                        ));
                        let result = match handle.await {
                            Ok(result) => result,
                            Err(e) => Err(PiiGuardError::Other(format!(
                                "segment task failed: {e}"
                            ))),
                        };
                        (index, origin, result)
                    }
                })
                .buffer_unordered(engine.config.max_concurrency.max(1))
                .collect()
                .await;

        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut results = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (index, origin, result) in outcomes {
            match result {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::error!(
                        run_id = %run_id,
                        origin = %origin,
                        error = %error,
                        "Segment failed"
                    );
                    failures.push(SegmentFailure {
                        index,
                        origin,
                        error,
                    });
                }
            }
        }

        if let Some(ref logger) = engine.audit_logger {
            logger.log_results(run_id, engine.config.dry_run, &results)?;
        }

        crate::log_scan_complete!(run_id, results.len(), failures.len(), started.elapsed());

        Ok(ScanOutcome {
            run_id,
            results,
            failures,
        })
    }
}

async fn process_segment(
    recognizers: RecognizerSet,
    merger: FindingMerger,
    anonymizer: Arc<Anonymizer>,
    segment: NormalizedSegment,
) -> Result<AnonymizedResult> {
    let start = Instant::now();
    let NormalizedSegment { text, origin } = segment;

    if text.trim().is_empty() {
        return Ok(AnonymizedResult {
            origin,
            text,
            findings: Vec::new(),
            warnings: Vec::new(),
            processing_time_ms: 0,
        });
    }

    let candidates = recognizers.analyze(&text).await;
    let merged = merger.merge(&text, candidates.findings);
    let redaction = anonymizer.anonymize(&text, merged)?;

    tracing::debug!(
        origin = %origin,
        findings = redaction.records.len(),
        partial = !candidates.warnings.is_empty(),
        "Segment processed"
    );

    Ok(AnonymizedResult {
        origin,
        text: redaction.text,
        findings: redaction.records,
        warnings: candidates.warnings,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::{Finding, FindingSource};
    use crate::domain::EntityType;
    use async_trait::async_trait;

    fn cell(row: usize, text: &str) -> NormalizedSegment {
        NormalizedSegment::new(text, Origin::cell(row, 0, "raw"))
    }

    fn engine() -> AnonymizationEngine {
        AnonymizationEngine::with_default_patterns(AnonymizationConfig::default()).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.builtin_name(), "patterns");
        assert!(!engine.is_dry_run());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnonymizationConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            AnonymizationEngine::with_default_patterns(config),
            Err(PiiGuardError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_scenario() {
        let engine = engine();
        let mut session = engine.session();
        session
            .register_whitelist_rule("SCHOOL_ID", ["223j1ao5g"], false)
            .unwrap();

        let results = session
            .process(vec![cell(0, "John,john.doe@company.com,223j1ao5g")])
            .await
            .unwrap();

        let result = &results[0];
        assert_eq!(result.text, "John,<EMAIL_ADDRESS>,<SCHOOL_ID>");
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.findings[0].finding.span(), 5..25);
        assert_eq!(result.findings[0].finding.source(), FindingSource::Builtin);
        assert_eq!(result.findings[1].finding.span(), 26..35);
        assert_eq!(result.findings[1].finding.score(), 0.90);
        assert_eq!(
            result.findings[1].finding.source(),
            FindingSource::CustomWhitelist
        );
    }

    #[tokio::test]
    async fn test_dry_run_mode() {
        let config = AnonymizationConfig {
            dry_run: true,
            ..Default::default()
        };
        let engine = AnonymizationEngine::with_default_patterns(config).unwrap();

        let text = "reach me at test@example.com";
        let results = engine.session().process(vec![cell(0, text)]).await.unwrap();

        assert_eq!(results[0].text, text);
        assert_eq!(results[0].findings.len(), 1);
    }

    #[tokio::test]
    async fn test_results_in_input_order() {
        let config = AnonymizationConfig {
            max_concurrency: 3,
            ..Default::default()
        };
        let engine = AnonymizationEngine::with_default_patterns(config).unwrap();

        let segments: Vec<_> = (0..25)
            .map(|row| cell(row, &format!("user{row}@example.com")))
            .collect();
        let results = engine.session().process(segments).await.unwrap();

        let rows: Vec<_> = results
            .iter()
            .map(|r| match r.origin {
                Origin::Cell { row, .. } => row,
                Origin::Document { .. } => usize::MAX,
            })
            .collect();
        assert_eq!(rows, (0..25).collect::<Vec<_>>());
    }

    struct Overlapping;

    #[async_trait]
    impl Recognizer for Overlapping {
        fn name(&self) -> &str {
            "overlapping"
        }

        async fn analyze(&self, text: &str) -> Result<Vec<Finding>> {
            if text.contains("explode") {
                panic!("recognizer crashed");
            }
            Ok(vec![Finding::new(
                EntityType::new("WORD").unwrap(),
                0,
                text.len().min(4),
                0.5,
                FindingSource::Builtin,
            )?])
        }
    }

    #[tokio::test]
    async fn test_task_panic_is_segment_failure() {
        let engine =
            AnonymizationEngine::new(AnonymizationConfig::default(), Arc::new(Overlapping))
                .unwrap();

        let (results, report) = engine
            .session()
            .process_with_report(vec![cell(0, "fine text"), cell(1, "explode"), cell(2, "also fine")])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(report.total_segments, 3);
        assert!(report.has_failures());
        assert_eq!(report.failed_segments[0].origin, "row 1, column 'raw'");
        assert_eq!(results[0].text, "<WORD> text");
    }

    #[tokio::test]
    async fn test_shutdown_delegates_to_builtin() {
        let engine = engine();
        assert!(engine.shutdown().await.is_ok());
    }
}
