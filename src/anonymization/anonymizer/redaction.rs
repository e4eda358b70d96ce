//! Placeholder replacement strategy

use super::ReplacementStrategy;
use crate::anonymization::models::Finding;

/// Replaces PII with `<ENTITY_TYPE>` tokens
///
/// The token is the entity type upper-cased with everything except ASCII
/// alphanumerics and `_` removed, or `<PII>` when nothing is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderStrategy;

impl ReplacementStrategy for PlaceholderStrategy {
    fn replacement(&self, finding: &Finding) -> String {
        finding.entity_type().placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::FindingSource;
    use crate::domain::EntityType;

    #[test]
    fn test_placeholder() {
        let finding = Finding::new(
            EntityType::new("email_address").unwrap(),
            0,
            4,
            0.9,
            FindingSource::Builtin,
        )
        .unwrap();

        assert_eq!(PlaceholderStrategy.replacement(&finding), "<EMAIL_ADDRESS>");
    }

    #[test]
    fn test_placeholder_fallback() {
        let finding = Finding::new(
            EntityType::new("***").unwrap(),
            0,
            4,
            0.9,
            FindingSource::CustomRegex,
        )
        .unwrap();

        assert_eq!(PlaceholderStrategy.replacement(&finding), "<PII>");
    }
}
