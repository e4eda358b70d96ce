//! Finding data model

use crate::domain::{EntityType, PiiGuardError, Result};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Recognizer family that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    /// Statistical/NLP recognizer (or its in-process pattern stand-in)
    Builtin,
    /// Caller-defined whitelist rule
    CustomWhitelist,
    /// Caller-defined regex rule
    CustomRegex,
}

impl FindingSource {
    /// Whether the finding came from a caller-defined rule
    pub fn is_custom(&self) -> bool {
        !matches!(self, Self::Builtin)
    }

    /// Stable snake_case name, as used in configuration and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::CustomWhitelist => "custom_whitelist",
            Self::CustomRegex => "custom_regex",
        }
    }
}

impl fmt::Display for FindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recognizer's claim that `[start, end)` is an instance of an entity type
///
/// Offsets are byte offsets into the normalized segment text. Findings are
/// immutable: fields are only readable, and a superseded finding is dropped
/// rather than edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    entity_type: EntityType,
    start: usize,
    end: usize,
    score: f32,
    source: FindingSource,
}

impl Finding {
    /// Create a finding, validating the span shape and score range
    ///
    /// Bounds against a concrete text are checked separately with
    /// [`Finding::check_bounds`], since recognizers and the merger see the
    /// text at different times.
    ///
    /// # Errors
    ///
    /// Returns [`PiiGuardError::InvalidFinding`] if `start >= end` or the
    /// score is not a finite value in `[0, 1]`.
    pub fn new(
        entity_type: EntityType,
        start: usize,
        end: usize,
        score: f32,
        source: FindingSource,
    ) -> Result<Self> {
        if start >= end {
            return Err(PiiGuardError::InvalidFinding(format!(
                "empty or inverted span [{start}, {end}) for {entity_type}"
            )));
        }
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(PiiGuardError::InvalidFinding(format!(
                "score {score} out of range for {entity_type}"
            )));
        }

        Ok(Self {
            entity_type,
            start,
            end,
            score,
            source,
        })
    }

    /// Entity type label
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Inclusive start offset
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.end
    }

    /// Confidence score in `[0, 1]`
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Recognizer family
    pub fn source(&self) -> FindingSource {
        self.source
    }

    /// Byte range covered by the finding
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the half-open intervals intersect
    pub fn overlaps(&self, other: &Finding) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check that the span lies inside `text` on UTF-8 char boundaries
    pub fn check_bounds(&self, text: &str) -> Result<()> {
        if self.end > text.len() {
            return Err(PiiGuardError::InvalidFinding(format!(
                "span [{}, {}) exceeds text length {}",
                self.start,
                self.end,
                text.len()
            )));
        }
        if !text.is_char_boundary(self.start) || !text.is_char_boundary(self.end) {
            return Err(PiiGuardError::InvalidFinding(format!(
                "span [{}, {}) does not fall on character boundaries",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Slice of `text` covered by this finding, if in bounds
    pub fn matched<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(label: &str) -> EntityType {
        EntityType::new(label).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_length() {
        let result = Finding::new(entity("EMAIL_ADDRESS"), 4, 4, 0.9, FindingSource::Builtin);
        assert!(matches!(result, Err(PiiGuardError::InvalidFinding(_))));
    }

    #[test]
    fn test_new_rejects_bad_score() {
        assert!(Finding::new(entity("X"), 0, 1, 1.5, FindingSource::Builtin).is_err());
        assert!(Finding::new(entity("X"), 0, 1, -0.1, FindingSource::Builtin).is_err());
        assert!(Finding::new(entity("X"), 0, 1, f32::NAN, FindingSource::Builtin).is_err());
        assert!(Finding::new(entity("X"), 0, 1, 1.0, FindingSource::Builtin).is_ok());
    }

    #[test]
    fn test_overlaps_half_open() {
        let a = Finding::new(entity("A"), 0, 5, 0.5, FindingSource::Builtin).unwrap();
        let b = Finding::new(entity("B"), 5, 9, 0.5, FindingSource::Builtin).unwrap();
        let c = Finding::new(entity("C"), 4, 6, 0.5, FindingSource::Builtin).unwrap();

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_check_bounds() {
        let text = "héllo";
        let ok = Finding::new(entity("A"), 0, 3, 0.5, FindingSource::Builtin).unwrap();
        assert!(ok.check_bounds(text).is_ok());
        assert_eq!(ok.matched(text), Some("hé"));

        let split_char = Finding::new(entity("A"), 0, 2, 0.5, FindingSource::Builtin).unwrap();
        assert!(split_char.check_bounds(text).is_err());

        let too_long = Finding::new(entity("A"), 2, 40, 0.5, FindingSource::Builtin).unwrap();
        assert!(too_long.check_bounds(text).is_err());
    }

    #[test]
    fn test_source_names() {
        assert_eq!(FindingSource::CustomWhitelist.to_string(), "custom_whitelist");
        assert!(FindingSource::CustomRegex.is_custom());
        assert!(!FindingSource::Builtin.is_custom());
    }
}
