//! Finding merger
//!
//! Reconciles candidates from every recognizer into one sorted,
//! non-overlapping set. Candidates are validated, ordered by
//! `(start, end, source priority, score desc, entity type)` and swept left to
//! right; a candidate is accepted only if it starts at or after the end of the
//! last accepted finding. Findings are dropped, never truncated or merged.

use crate::anonymization::models::{Finding, FindingSource};
use crate::domain::{PiiGuardError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tie-break order between recognizer families, highest priority first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FindingSource>", into = "Vec<FindingSource>")]
pub struct SourcePriority(Vec<FindingSource>);

impl SourcePriority {
    /// Build an order from a list of sources
    ///
    /// Sources missing from the list rank after every listed one.
    ///
    /// # Errors
    ///
    /// Returns [`PiiGuardError::Configuration`] if a source appears twice.
    pub fn new(order: Vec<FindingSource>) -> Result<Self> {
        for (idx, source) in order.iter().enumerate() {
            if order[..idx].contains(source) {
                return Err(PiiGuardError::Configuration(format!(
                    "source '{source}' listed more than once in source_priority"
                )));
            }
        }
        Ok(Self(order))
    }

    /// Rank of a source; lower sorts first
    pub fn rank(&self, source: FindingSource) -> usize {
        self.0
            .iter()
            .position(|s| *s == source)
            .unwrap_or(self.0.len())
    }

    /// Listed sources, highest priority first
    pub fn order(&self) -> &[FindingSource] {
        &self.0
    }
}

impl Default for SourcePriority {
    fn default() -> Self {
        Self(vec![
            FindingSource::CustomWhitelist,
            FindingSource::CustomRegex,
            FindingSource::Builtin,
        ])
    }
}

impl TryFrom<Vec<FindingSource>> for SourcePriority {
    type Error = PiiGuardError;

    fn try_from(order: Vec<FindingSource>) -> Result<Self> {
        Self::new(order)
    }
}

impl From<SourcePriority> for Vec<FindingSource> {
    fn from(priority: SourcePriority) -> Self {
        priority.0
    }
}

/// Merges candidate findings for one segment
#[derive(Debug, Clone, Default)]
pub struct FindingMerger {
    priority: SourcePriority,
    score_threshold: f32,
}

impl FindingMerger {
    /// Create a merger with an explicit policy
    pub fn new(priority: SourcePriority, score_threshold: f32) -> Self {
        Self {
            priority,
            score_threshold: score_threshold.clamp(0.0, 1.0),
        }
    }

    /// Minimum score a candidate needs to be considered
    pub fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Source tie-break order
    pub fn priority(&self) -> &SourcePriority {
        &self.priority
    }

    /// Reconcile `candidates` found in `text`
    ///
    /// Returns findings sorted by start offset with no two overlapping.
    pub fn merge(&self, text: &str, candidates: Vec<Finding>) -> Vec<Finding> {
        let total = candidates.len();

        let mut valid: Vec<Finding> = candidates
            .into_iter()
            .filter(|candidate| {
                if let Err(e) = candidate.check_bounds(text) {
                    tracing::debug!(
                        entity_type = %candidate.entity_type(),
                        source = %candidate.source(),
                        error = %e,
                        "Rejected candidate"
                    );
                    return false;
                }
                if candidate.score() < self.score_threshold {
                    tracing::debug!(
                        entity_type = %candidate.entity_type(),
                        score = candidate.score(),
                        threshold = self.score_threshold,
                        "Candidate below score threshold"
                    );
                    return false;
                }
                true
            })
            .collect();

        valid.sort_by(|a, b| self.compare(a, b));

        let mut accepted: Vec<Finding> = Vec::with_capacity(valid.len());
        for candidate in valid {
            match accepted.last() {
                Some(last) if candidate.start() < last.end() => {
                    tracing::trace!(
                        entity_type = %candidate.entity_type(),
                        start = candidate.start(),
                        end = candidate.end(),
                        kept = %last.entity_type(),
                        "Dropped overlapping candidate"
                    );
                }
                _ => accepted.push(candidate),
            }
        }

        tracing::debug!(
            candidates = total,
            accepted = accepted.len(),
            "Merged findings"
        );

        accepted
    }

    fn compare(&self, a: &Finding, b: &Finding) -> Ordering {
        a.start()
            .cmp(&b.start())
            .then_with(|| a.end().cmp(&b.end()))
            .then_with(|| {
                self.priority
                    .rank(a.source())
                    .cmp(&self.priority.rank(b.source()))
            })
            .then_with(|| b.score().total_cmp(&a.score()))
            .then_with(|| a.entity_type().cmp(b.entity_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityType;
    use proptest::prelude::*;

    fn finding(label: &str, start: usize, end: usize, score: f32, source: FindingSource) -> Finding {
        Finding::new(EntityType::new(label).unwrap(), start, end, score, source).unwrap()
    }

    #[test]
    fn test_custom_wins_identical_interval() {
        let merger = FindingMerger::default();
        let merged = merger.merge(
            "223j1ao5g",
            vec![
                finding("US_PASSPORT", 0, 9, 0.60, FindingSource::Builtin),
                finding("SCHOOL_ID", 0, 9, 0.90, FindingSource::CustomWhitelist),
            ],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].entity_type().as_str(), "SCHOOL_ID");
        assert_eq!(merged[0].source(), FindingSource::CustomWhitelist);
    }

    #[test]
    fn test_custom_priority_beats_higher_score() {
        let merger = FindingMerger::default();
        let merged = merger.merge(
            "abcdefghij",
            vec![
                finding("BUILTIN", 0, 5, 0.99, FindingSource::Builtin),
                finding("CUSTOM", 0, 5, 0.10, FindingSource::CustomRegex),
            ],
        );
        assert_eq!(merged[0].entity_type().as_str(), "CUSTOM");
    }

    #[test]
    fn test_configured_priority_order() {
        let priority = SourcePriority::new(vec![
            FindingSource::Builtin,
            FindingSource::CustomWhitelist,
            FindingSource::CustomRegex,
        ])
        .unwrap();
        let merger = FindingMerger::new(priority, 0.0);

        let merged = merger.merge(
            "abcdefghij",
            vec![
                finding("CUSTOM", 0, 5, 0.9, FindingSource::CustomWhitelist),
                finding("BUILTIN", 0, 5, 0.6, FindingSource::Builtin),
            ],
        );
        assert_eq!(merged[0].entity_type().as_str(), "BUILTIN");
    }

    #[test]
    fn test_earlier_start_wins_overlap() {
        let merger = FindingMerger::default();
        let merged = merger.merge(
            "abcdefghijklmnop",
            vec![
                finding("LATER", 4, 12, 0.99, FindingSource::CustomWhitelist),
                finding("EARLIER", 2, 6, 0.10, FindingSource::Builtin),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].entity_type().as_str(), "EARLIER");
    }

    #[test]
    fn test_adjacent_findings_both_kept() {
        let merger = FindingMerger::default();
        let merged = merger.merge(
            "abcdefghij",
            vec![
                finding("B", 5, 9, 0.5, FindingSource::Builtin),
                finding("A", 0, 5, 0.5, FindingSource::Builtin),
            ],
        );
        let starts: Vec<_> = merged.iter().map(|f| f.start()).collect();
        assert_eq!(starts, vec![0, 5]);
    }

    #[test]
    fn test_rejects_out_of_bounds_and_low_score() {
        let merger = FindingMerger::new(SourcePriority::default(), 0.5);
        let merged = merger.merge(
            "short",
            vec![
                finding("FAR", 3, 40, 0.9, FindingSource::Builtin),
                finding("WEAK", 0, 2, 0.2, FindingSource::Builtin),
                finding("OK", 0, 5, 0.8, FindingSource::Builtin),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].entity_type().as_str(), "OK");
    }

    #[test]
    fn test_rejects_non_char_boundary() {
        let merger = FindingMerger::default();
        let merged = merger.merge(
            "é",
            vec![finding("HALF", 0, 1, 0.9, FindingSource::Builtin)],
        );
        assert!(merged.is_empty());
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let result = SourcePriority::new(vec![FindingSource::Builtin, FindingSource::Builtin]);
        assert!(matches!(result, Err(PiiGuardError::Configuration(_))));
    }

    #[test]
    fn test_priority_deserializes_from_list() {
        let priority: SourcePriority =
            serde_json::from_str(r#"["builtin", "custom_regex"]"#).unwrap();
        assert_eq!(priority.rank(FindingSource::Builtin), 0);
        assert_eq!(priority.rank(FindingSource::CustomRegex), 1);
        assert_eq!(priority.rank(FindingSource::CustomWhitelist), 2);
    }

    fn source_strategy() -> impl Strategy<Value = FindingSource> {
        prop_oneof![
            Just(FindingSource::Builtin),
            Just(FindingSource::CustomWhitelist),
            Just(FindingSource::CustomRegex),
        ]
    }

    proptest! {
        #[test]
        fn merged_findings_never_overlap(
            spans in prop::collection::vec((0usize..60, 1usize..20, 0.0f32..=1.0, source_strategy()), 0..40)
        ) {
            let text = "x".repeat(64);
            let candidates: Vec<Finding> = spans
                .iter()
                .map(|(start, len, score, source)| finding("E", *start, start + len, *score, *source))
                .collect();

            let merged = FindingMerger::default().merge(&text, candidates);

            for pair in merged.windows(2) {
                prop_assert!(pair[0].end() <= pair[1].start());
            }
            for f in &merged {
                prop_assert!(f.end() <= text.len());
            }
        }
    }
}
