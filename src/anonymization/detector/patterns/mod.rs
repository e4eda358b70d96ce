//! Pattern library for the builtin recognizer

use crate::domain::{EntityType, PiiGuardError, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Post-match check that filters out structurally invalid candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    /// Luhn checksum (payment cards)
    Luhn,
    /// US SSN area/group/serial rules
    Ssn,
    /// ISO 13616 mod-97 check
    Iban,
}

impl Validator {
    /// Whether `candidate` passes the check
    pub fn is_valid(&self, candidate: &str) -> bool {
        match self {
            Self::Luhn => luhn_valid(candidate),
            Self::Ssn => ssn_valid(candidate),
            Self::Iban => iban_valid(candidate),
        }
    }
}

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this entity type
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity type label
    pub entity_type: String,
    /// Optional post-match validator
    #[serde(default)]
    pub validator: Option<Validator>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Compiled regex
    pub regex: Regex,
    /// Entity type
    pub entity_type: EntityType,
    /// Confidence score
    pub confidence: f32,
    /// Optional post-match validator
    pub validator: Option<Validator>,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Pattern registry for the builtin recognizer
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_entity: HashMap<EntityType, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PiiGuardError::Configuration(format!(
                "Failed to read pattern library {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content).map_err(|e| {
            PiiGuardError::Configuration(format!("Failed to parse pattern library TOML: {e}"))
        })?;

        let mut patterns = Vec::new();
        let mut patterns_by_entity: HashMap<EntityType, Vec<CompiledPattern>> = HashMap::new();

        for (name, def) in library.patterns {
            let entity_type = EntityType::new(&def.entity_type).map_err(|e| {
                PiiGuardError::Configuration(format!("Invalid entity type in pattern '{name}': {e}"))
            })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                return Err(PiiGuardError::Configuration(format!(
                    "Confidence for pattern '{name}' must be between 0.0 and 1.0, got {}",
                    def.confidence
                )));
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str).map_err(|e| {
                    PiiGuardError::Configuration(format!(
                        "Invalid regex in pattern '{name}': {pattern_str}: {e}"
                    ))
                })?;

                let compiled = CompiledPattern {
                    regex,
                    entity_type: entity_type.clone(),
                    confidence: def.confidence,
                    validator: def.validator,
                };

                patterns.push(compiled.clone());
                patterns_by_entity
                    .entry(entity_type.clone())
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_entity,
        })
    }

    /// Create a default pattern registry with built-in patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific entity type
    pub fn patterns_for_entity(&self, entity_type: &str) -> Option<&[CompiledPattern]> {
        let key = EntityType::new(entity_type).ok()?;
        self.patterns_by_entity.get(&key).map(|v| v.as_slice())
    }

    /// Entity types covered by this library
    pub fn entity_types(&self) -> Vec<&EntityType> {
        let mut types: Vec<_> = self.patterns_by_entity.keys().collect();
        types.sort();
        types
    }
}

fn digits(candidate: &str) -> Vec<u32> {
    candidate.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn luhn_valid(candidate: &str) -> bool {
    let digits = digits(candidate);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, &d)| {
            if idx % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

fn ssn_valid(candidate: &str) -> bool {
    let digits = digits(candidate);
    if digits.len() != 9 {
        return false;
    }

    let area = digits[0] * 100 + digits[1] * 10 + digits[2];
    let group = digits[3] * 10 + digits[4];
    let serial = digits[5..].iter().fold(0, |acc, d| acc * 10 + d);

    area != 0 && area != 666 && area < 900 && group != 0 && serial != 0
}

fn iban_valid(candidate: &str) -> bool {
    let compact: String = candidate.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 15 || compact.len() > 34 {
        return false;
    }

    // Move the country code and check digits to the end, then fold mod 97
    // one character at a time so the number never overflows.
    let rearranged = compact[4..].chars().chain(compact[..4].chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let value = match c.to_digit(36) {
            Some(v) => v,
            None => return false,
        };
        remainder = if value >= 10 {
            (remainder * 100 + value) % 97
        } else {
            (remainder * 10 + value) % 97
        };
    }

    remainder == 1
}
