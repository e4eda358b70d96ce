//! Custom rule registry
//!
//! Holds caller-defined whitelist literals and regex patterns, keyed by custom
//! entity label. The registry is request-scoped and mutable; a run works on an
//! immutable [`RuleSet`] taken with [`RuleRegistry::snapshot`], so rules added
//! afterwards only affect the next run.

use super::Recognizer;
use crate::anonymization::models::{Finding, FindingSource};
use crate::domain::{EntityType, PiiGuardError, Result};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::Arc;

/// Default score for rule-based findings
///
/// Below the maximum to mark the finding as deterministic rather than
/// probabilistic.
pub const DEFAULT_RULE_SCORE: f32 = 0.90;

/// Exact-match rule over a set of literals
#[derive(Debug, Clone)]
pub struct WhitelistRule {
    entity_type: EntityType,
    literals: Vec<String>,
    case_sensitive: bool,
    matcher: Regex,
}

impl WhitelistRule {
    fn new(entity_type: EntityType, literals: Vec<String>, case_sensitive: bool) -> Result<Self> {
        // Longest literal first: alternation is leftmost-first, so this makes
        // the longest literal win at a given position.
        let mut ordered = literals.clone();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = ordered
            .iter()
            .map(|literal| regex::escape(literal))
            .collect::<Vec<_>>()
            .join("|");

        let matcher = RegexBuilder::new(&alternation)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| {
                PiiGuardError::InvalidRule(format!(
                    "whitelist for '{entity_type}' could not be compiled: {e}"
                ))
            })?;

        Ok(Self {
            entity_type,
            literals,
            case_sensitive,
            matcher,
        })
    }

    /// Entity label
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Registered literals, blank entries removed
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    /// Whether matching respects case
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// Pattern rule
#[derive(Debug, Clone)]
pub struct RegexRule {
    entity_type: EntityType,
    regex: Regex,
}

impl RegexRule {
    /// Entity label
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Source pattern
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// A registered custom rule
#[derive(Debug, Clone)]
pub enum Rule {
    /// Exact literal matches
    Whitelist(WhitelistRule),
    /// Regex matches
    Regex(RegexRule),
}

impl Rule {
    /// Entity label the rule assigns
    pub fn entity_type(&self) -> &EntityType {
        match self {
            Self::Whitelist(rule) => &rule.entity_type,
            Self::Regex(rule) => &rule.entity_type,
        }
    }

    /// Source tag for findings produced by this rule
    pub fn source(&self) -> FindingSource {
        match self {
            Self::Whitelist(_) => FindingSource::CustomWhitelist,
            Self::Regex(_) => FindingSource::CustomRegex,
        }
    }

    /// Non-overlapping, non-empty match spans in left-to-right order
    fn spans<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Range<usize>> + 't {
        let regex = match self {
            Self::Whitelist(rule) => &rule.matcher,
            Self::Regex(rule) => &rule.regex,
        };
        regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
    }
}

/// Immutable set of rules used for one run
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    rule_score: f32,
}

impl RuleSet {
    /// Registered rules in registration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Score assigned to every rule-based finding
    pub fn rule_score(&self) -> f32 {
        self.rule_score
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule is registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scan `text` against every rule
    ///
    /// Rules are applied in registration order; each rule's matches are in
    /// left-to-right scan order.
    pub fn matches(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &self.rules {
            for span in rule.spans(text) {
                match Finding::new(
                    rule.entity_type().clone(),
                    span.start,
                    span.end,
                    self.rule_score,
                    rule.source(),
                ) {
                    Ok(finding) => findings.push(finding),
                    Err(e) => {
                        tracing::debug!(
                            entity_type = %rule.entity_type(),
                            error = %e,
                            "Discarding rule match"
                        );
                    }
                }
            }
        }

        findings
    }
}

#[async_trait]
impl Recognizer for RuleSet {
    fn name(&self) -> &str {
        "custom_rules"
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Finding>> {
        Ok(self.matches(text))
    }
}

/// Mutable, request-scoped registry of custom rules
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    set: RuleSet,
}

impl RuleRegistry {
    /// Create an empty registry using [`DEFAULT_RULE_SCORE`]
    pub fn new() -> Self {
        Self {
            set: RuleSet {
                rules: Vec::new(),
                rule_score: DEFAULT_RULE_SCORE,
            },
        }
    }

    /// Set the score assigned to rule-based findings
    pub fn with_rule_score(mut self, score: f32) -> Self {
        self.set.rule_score = score.clamp(0.0, 1.0);
        self
    }

    /// Register exact-match literals for a custom entity label
    ///
    /// Blank literals are ignored and duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns [`PiiGuardError::InvalidRule`] if the label is blank or no
    /// non-blank literal remains.
    pub fn add_whitelist<I, S>(
        &mut self,
        entity_type: &str,
        literals: I,
        case_sensitive: bool,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entity_type = Self::parse_entity_type(entity_type)?;

        let mut cleaned: Vec<String> = Vec::new();
        for literal in literals {
            let literal = literal.as_ref().trim();
            if !literal.is_empty() && !cleaned.iter().any(|l| l == literal) {
                cleaned.push(literal.to_string());
            }
        }
        if cleaned.is_empty() {
            return Err(PiiGuardError::InvalidRule(format!(
                "whitelist for '{entity_type}' has no literals"
            )));
        }

        tracing::debug!(
            entity_type = %entity_type,
            literal_count = cleaned.len(),
            case_sensitive,
            "Registered whitelist rule"
        );

        let rule = WhitelistRule::new(entity_type, cleaned, case_sensitive)?;
        self.set.rules.push(Rule::Whitelist(rule));
        Ok(())
    }

    /// Register a regex pattern for a custom entity label
    ///
    /// # Errors
    ///
    /// Returns [`PiiGuardError::InvalidRule`] if the label is blank or the
    /// pattern does not compile.
    pub fn add_regex(&mut self, entity_type: &str, pattern: &str) -> Result<()> {
        let entity_type = Self::parse_entity_type(entity_type)?;

        if pattern.is_empty() {
            return Err(PiiGuardError::InvalidRule(format!(
                "pattern for '{entity_type}' is empty"
            )));
        }

        let regex = Regex::new(pattern).map_err(|e| {
            PiiGuardError::InvalidRule(format!("invalid pattern for '{entity_type}': {e}"))
        })?;

        tracing::debug!(entity_type = %entity_type, pattern = %pattern, "Registered regex rule");

        self.set
            .rules
            .push(Rule::Regex(RegexRule { entity_type, regex }));
        Ok(())
    }

    /// Scan `text` against every registered rule
    pub fn matches(&self, text: &str) -> Vec<Finding> {
        self.set.matches(text)
    }

    /// Freeze the current rules for a run
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::new(self.set.clone())
    }

    /// Registered rules
    pub fn rules(&self) -> &[Rule] {
        self.set.rules()
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether no rule is registered
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Drop every rule, keeping the configured score
    pub fn clear(&mut self) {
        self.set.rules.clear();
    }

    fn parse_entity_type(raw: &str) -> Result<EntityType> {
        EntityType::new(raw).map_err(PiiGuardError::InvalidRule)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(findings: &[Finding]) -> Vec<(String, usize, usize)> {
        findings
            .iter()
            .map(|f| (f.entity_type().to_string(), f.start(), f.end()))
            .collect()
    }

    #[test]
    fn test_whitelist_exact_occurrences() {
        let mut registry = RuleRegistry::new();
        registry
            .add_whitelist("SCHOOL_ID", ["223j1ao5g"], false)
            .unwrap();

        let findings = registry.matches("John,john.doe@company.com,223j1ao5g");
        assert_eq!(spans(&findings), vec![("SCHOOL_ID".to_string(), 26, 35)]);
        assert_eq!(findings[0].score(), DEFAULT_RULE_SCORE);
        assert_eq!(findings[0].source(), FindingSource::CustomWhitelist);
    }

    #[test]
    fn test_whitelist_case_rule() {
        let mut insensitive = RuleRegistry::new();
        insensitive
            .add_whitelist("SCHOOL_ID", ["School123"], false)
            .unwrap();
        assert_eq!(insensitive.matches("id: SCHOOL123").len(), 1);

        let mut sensitive = RuleRegistry::new();
        sensitive
            .add_whitelist("SCHOOL_ID", ["School123"], true)
            .unwrap();
        assert!(sensitive.matches("id: SCHOOL123").is_empty());
        assert_eq!(sensitive.matches("id: School123").len(), 1);
    }

    #[test]
    fn test_whitelist_prefers_longest_literal() {
        let mut registry = RuleRegistry::new();
        registry
            .add_whitelist("STUDENT", ["student4", "student456"], true)
            .unwrap();

        let findings = registry.matches("student456 and student4");
        assert_eq!(
            spans(&findings),
            vec![
                ("STUDENT".to_string(), 0, 10),
                ("STUDENT".to_string(), 15, 23)
            ]
        );
    }

    #[test]
    fn test_whitelist_literals_are_not_regex() {
        let mut registry = RuleRegistry::new();
        registry.add_whitelist("CODE", ["a.b"], true).unwrap();
        assert!(registry.matches("axb").is_empty());
        assert_eq!(registry.matches("a.b").len(), 1);
    }

    #[test]
    fn test_whitelist_rejects_empty_literals() {
        let mut registry = RuleRegistry::new();
        let empty: [&str; 0] = [];
        assert!(matches!(
            registry.add_whitelist("SCHOOL_ID", empty, false),
            Err(PiiGuardError::InvalidRule(_))
        ));
        assert!(matches!(
            registry.add_whitelist("SCHOOL_ID", ["", "   "], false),
            Err(PiiGuardError::InvalidRule(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_blank_entity_type() {
        let mut registry = RuleRegistry::new();
        assert!(matches!(
            registry.add_whitelist("  ", ["x"], false),
            Err(PiiGuardError::InvalidRule(_))
        ));
        assert!(matches!(
            registry.add_regex("", "[0-9]+"),
            Err(PiiGuardError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_regex_rule_matches_left_to_right() {
        let mut registry = RuleRegistry::new();
        registry.add_regex("EMPLOYEE_ID", r"EMP-\d{4}").unwrap();

        let findings = registry.matches("EMP-0001, EMP-0002 and EMP-12");
        assert_eq!(
            spans(&findings),
            vec![
                ("EMPLOYEE_ID".to_string(), 0, 8),
                ("EMPLOYEE_ID".to_string(), 10, 18)
            ]
        );
        assert_eq!(findings[0].source(), FindingSource::CustomRegex);
    }

    #[test]
    fn test_regex_rule_rejects_invalid_pattern() {
        let mut registry = RuleRegistry::new();
        let result = registry.add_regex("BROKEN", "([a-z");
        assert!(matches!(result, Err(PiiGuardError::InvalidRule(_))));
    }

    #[test]
    fn test_zero_length_matches_never_emitted() {
        let mut registry = RuleRegistry::new();
        registry.add_regex("MAYBE", r"x*").unwrap();

        let findings = registry.matches("abc xx def");
        assert_eq!(spans(&findings), vec![("MAYBE".to_string(), 4, 6)]);
    }

    #[test]
    fn test_anchored_pattern_matches_whole_cell() {
        let mut registry = RuleRegistry::new();
        registry
            .add_regex("CUSTOM_ID", r"^[A-Za-z0-9]{8,12}$")
            .unwrap();

        assert_eq!(registry.matches("AB12CD34EF").len(), 1);
        assert!(registry.matches("AB12CD34EF and more").is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_rules() {
        let mut registry = RuleRegistry::new().with_rule_score(0.75);
        registry.add_whitelist("A", ["alpha"], false).unwrap();

        let snapshot = registry.snapshot();
        registry.add_whitelist("B", ["beta"], false).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
        assert!(snapshot.matches("beta").is_empty());
        assert_eq!(snapshot.matches("alpha")[0].score(), 0.75);
    }

    #[test]
    fn test_clear_resets_rules() {
        let mut registry = RuleRegistry::new();
        registry.add_regex("X", "x").unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.matches("x").is_empty());
    }

    #[tokio::test]
    async fn test_rule_set_as_recognizer() {
        let mut registry = RuleRegistry::new();
        registry.add_regex("TICKET", r"T-\d+").unwrap();
        let snapshot = registry.snapshot();

        let findings = snapshot.analyze("see T-42").await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(snapshot.name(), "custom_rules");
    }
}
