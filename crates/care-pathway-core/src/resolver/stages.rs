//! Matching strategies, one per cascade stage.

use tracing::debug;

use crate::catalog::ConditionCatalog;
use crate::models::{fuzzy_confidence, ConditionMapping, ExtractedCondition, MatchedBy};

use super::patterns::{PatternTable, CONTEXT_KEYWORDS};
use super::similarity::partial_ratio;
use super::{EntityRecognizer, Query};

/// Entity labels that may carry a medical term.
const MEDICAL_ENTITY_LABELS: &[&str] = &["MISC", "ORG", "DISEASE"];

/// Shortest entity text considered for containment matching.
const MIN_ENTITY_CHARS: usize = 3;

/// One stage of the resolution cascade.
pub trait MatchStrategy: Send + Sync {
    /// Tag recorded on extractions produced by this stage.
    fn matched_by(&self) -> MatchedBy;

    /// Try to match the query. `None` passes control to the next stage.
    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition>;
}

fn extract_fixed(mapping: &ConditionMapping, matched_by: MatchedBy) -> ExtractedCondition {
    let confidence = matched_by.fixed_confidence().unwrap_or(0.0);
    ExtractedCondition::from_mapping(mapping, matched_by, confidence)
}

/// Stage 1: synonym contained in the query.
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn matched_by(&self) -> MatchedBy {
        MatchedBy::Exact
    }

    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition> {
        catalog
            .iter()
            .find(|c| c.synonyms.iter().any(|s| query.lowered.contains(s.as_str())))
            .map(|c| extract_fixed(c, MatchedBy::Exact))
    }
}

/// Stage 2: best partial-ratio score over every synonym.
///
/// Ties on score go to the lexicographically smallest condition id.
pub struct FuzzyMatch;

impl MatchStrategy for FuzzyMatch {
    fn matched_by(&self) -> MatchedBy {
        MatchedBy::Fuzzy
    }

    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition> {
        let mut best: Option<(u8, &ConditionMapping)> = None;

        for condition in catalog.iter() {
            for synonym in &condition.synonyms {
                let score = partial_ratio(synonym, &query.lowered);
                if fuzzy_confidence(score).is_none() {
                    continue;
                }

                let better = match best {
                    None => true,
                    Some((best_score, best_condition)) => {
                        score > best_score
                            || (score == best_score && condition.id < best_condition.id)
                    }
                };
                if better {
                    best = Some((score, condition));
                }
            }
        }

        let (score, condition) = best?;
        let confidence = fuzzy_confidence(score)?;
        debug!(condition = %condition.id, score, "Fuzzy candidate selected");
        Some(ExtractedCondition::from_mapping(condition, MatchedBy::Fuzzy, confidence))
    }
}

/// Stage 3: ordered regex table.
pub struct PatternMatch {
    table: PatternTable,
}

impl PatternMatch {
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }
}

impl MatchStrategy for PatternMatch {
    fn matched_by(&self) -> MatchedBy {
        MatchedBy::Regex
    }

    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition> {
        // A row naming a condition outside the catalog is skipped.
        self.table
            .matches(&query.lowered)
            .find_map(|id| catalog.get(id))
            .map(|c| extract_fixed(c, MatchedBy::Regex))
    }
}

/// Stage 4: entities from an optional recognizer, mapped onto synonyms.
pub struct EntityMatch {
    recognizer: Box<dyn EntityRecognizer>,
}

impl EntityMatch {
    pub fn new(recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl MatchStrategy for EntityMatch {
    fn matched_by(&self) -> MatchedBy {
        MatchedBy::Nlp
    }

    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition> {
        self.recognizer
            .recognize(query.original)
            .iter()
            .filter(|e| MEDICAL_ENTITY_LABELS.contains(&e.label.as_str()))
            .find_map(|e| map_text_to_condition(&e.text, catalog))
            .map(|c| extract_fixed(c, MatchedBy::Nlp))
    }
}

/// Map a short piece of text (an entity) to a condition.
///
/// Exact synonym equality is tried across the whole catalog before
/// containment in either direction.
pub fn map_text_to_condition<'c>(
    text: &str,
    catalog: &'c ConditionCatalog,
) -> Option<&'c ConditionMapping> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(found) = catalog
        .iter()
        .find(|c| c.synonyms.iter().any(|s| *s == text))
    {
        return Some(found);
    }

    if text.chars().count() < MIN_ENTITY_CHARS {
        return None;
    }

    catalog.iter().find(|c| {
        c.synonyms
            .iter()
            .any(|s| text.contains(s.as_str()) || s.contains(text.as_str()))
    })
}

/// Stage 5: single keyword hints.
pub struct ContextualMatch {
    keywords: Vec<(String, String)>,
}

impl ContextualMatch {
    pub fn new(keywords: &[(&str, &str)]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|(k, c)| (k.to_lowercase(), c.to_string()))
                .collect(),
        }
    }
}

impl Default for ContextualMatch {
    fn default() -> Self {
        Self::new(CONTEXT_KEYWORDS)
    }
}

impl MatchStrategy for ContextualMatch {
    fn matched_by(&self) -> MatchedBy {
        MatchedBy::Contextual
    }

    fn find(&self, query: &Query<'_>, catalog: &ConditionCatalog) -> Option<ExtractedCondition> {
        self.keywords
            .iter()
            .filter(|(keyword, _)| query.lowered.contains(keyword.as_str()))
            .find_map(|(_, id)| catalog.get(id))
            .map(|c| extract_fixed(c, MatchedBy::Contextual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::resolver::Entity;

    fn query(text: &str) -> Query<'_> {
        Query::new(text)
    }

    #[test]
    fn test_exact_first_condition_wins() {
        let catalog = ConditionCatalog::french_defaults();
        // "stress" (anxiete) and "lombalgie" (mal_de_dos): declaration order decides
        let found = ExactMatch
            .find(&query("Stress et lombalgie"), &catalog)
            .unwrap();
        assert_eq!(found.condition, "mal_de_dos");
        assert_eq!(found.confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_tie_prefers_smallest_id() {
        let respiratory = || Category::Other("resp".into());
        let catalog = ConditionCatalog::new(vec![
            ConditionMapping::new("zeta", "zeta", &["toux sèche"], respiratory(), None),
            ConditionMapping::new("alpha", "alpha", &["toux sèche"], respiratory(), None),
        ])
        .unwrap();

        let found = FuzzyMatch.find(&query("une toux seche"), &catalog).unwrap();
        assert_eq!(found.condition, "alpha");
        assert_eq!(found.matched_by, MatchedBy::Fuzzy);
        assert!((found.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_below_threshold_is_none() {
        let catalog = ConditionCatalog::french_defaults();
        assert!(FuzzyMatch
            .find(&query("rendez-vous chez le dentiste"), &catalog)
            .is_none());
    }

    #[test]
    fn test_pattern_skips_unknown_condition() {
        let catalog = ConditionCatalog::french_defaults();
        let table =
            PatternTable::new(&[(r"toux", "bronchite"), (r"toux|lumbago", "mal_de_dos")]).unwrap();
        let found = PatternMatch::new(table)
            .find(&query("une toux"), &catalog)
            .unwrap();
        assert_eq!(found.condition, "mal_de_dos");
        assert_eq!(found.confidence, 0.85);
    }

    struct FixedEntities(Vec<Entity>);

    impl EntityRecognizer for FixedEntities {
        fn recognize(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }
    }

    #[test]
    fn test_entity_stage_filters_labels() {
        let catalog = ConditionCatalog::french_defaults();
        let stage = EntityMatch::new(Box::new(FixedEntities(vec![
            Entity::new("cystite", "PER"),
            Entity::new("Lumbago", "MISC"),
        ])));

        let found = stage.find(&query("peu importe"), &catalog).unwrap();
        assert_eq!(found.condition, "mal_de_dos");
        assert_eq!(found.confidence, 0.75);
    }

    #[test]
    fn test_map_text_exact_before_containment() {
        let catalog = ConditionCatalog::french_defaults();
        assert_eq!(map_text_to_condition("stress", &catalog).unwrap().id, "anxiete");
        assert_eq!(
            map_text_to_condition("crise de lumbago aigu", &catalog).unwrap().id,
            "mal_de_dos"
        );
        assert!(map_text_to_condition("ab", &catalog).is_none());
    }

    #[test]
    fn test_contextual_keyword_order() {
        let catalog = ConditionCatalog::french_defaults();
        let found = ContextualMatch::default()
            .find(&query("ma glycémie monte"), &catalog)
            .unwrap();
        assert_eq!(found.condition, "diabete_type2");
        assert_eq!(found.confidence, 0.65);
    }
}
