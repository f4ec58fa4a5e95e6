//! Condition resolver.
//!
//! Cascade: Exact → Fuzzy → Regex → Entity (optional) → Contextual
//!
//! Stages run strictly in that order and the first one to match returns.
//! The entity stage exists only when a recognizer is supplied.

mod patterns;
mod similarity;
mod stages;

pub use patterns::*;
pub use similarity::*;
pub use stages::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::ConditionCatalog;
use crate::models::{MatchedBy, Resolution};

/// Resolver construction errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Invalid condition pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// A named entity detected in free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub text: String,
    /// Recognizer label (e.g., "MISC", "ORG")
    pub label: String,
}

impl Entity {
    pub fn new(text: &str, label: &str) -> Self {
        Self {
            text: text.to_string(),
            label: label.to_string(),
        }
    }
}

/// Named-entity recognition capability for the optional cascade stage.
pub trait EntityRecognizer: Send + Sync {
    /// Entities found in `text`. Failures should yield an empty list.
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// A query prepared for matching.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub original: &'a str,
    pub lowered: String,
}

impl<'a> Query<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            lowered: original.to_lowercase(),
        }
    }
}

/// Resolves free text to a canonical condition.
pub struct ConditionResolver {
    catalog: Arc<ConditionCatalog>,
    stages: Vec<Box<dyn MatchStrategy>>,
}

impl ConditionResolver {
    /// Create a resolver without the entity stage.
    pub fn new(catalog: Arc<ConditionCatalog>) -> ResolverResult<Self> {
        Self::build(catalog, None)
    }

    /// Create a resolver with the entity stage enabled.
    pub fn with_recognizer(
        catalog: Arc<ConditionCatalog>,
        recognizer: Box<dyn EntityRecognizer>,
    ) -> ResolverResult<Self> {
        Self::build(catalog, Some(recognizer))
    }

    /// Resolver over the built-in French catalog.
    pub fn french() -> ResolverResult<Self> {
        Self::new(Arc::new(ConditionCatalog::french_defaults()))
    }

    fn build(
        catalog: Arc<ConditionCatalog>,
        recognizer: Option<Box<dyn EntityRecognizer>>,
    ) -> ResolverResult<Self> {
        let mut stages: Vec<Box<dyn MatchStrategy>> = vec![
            Box::new(ExactMatch),
            Box::new(FuzzyMatch),
            Box::new(PatternMatch::new(PatternTable::french_defaults()?)),
        ];
        if let Some(recognizer) = recognizer {
            stages.push(Box::new(EntityMatch::new(recognizer)));
        }
        stages.push(Box::new(ContextualMatch::default()));

        Ok(Self { catalog, stages })
    }

    /// Run the cascade over `query`.
    pub fn resolve(&self, query: &str) -> Resolution {
        if query.trim().is_empty() {
            return Resolution::Unresolved;
        }

        let prepared = Query::new(query);
        for stage in &self.stages {
            if let Some(extracted) = stage.find(&prepared, &self.catalog) {
                info!(
                    condition = %extracted.condition,
                    matched_by = extracted.matched_by.as_str(),
                    confidence = extracted.confidence,
                    "Resolved condition"
                );
                return Resolution::Resolved(extracted);
            }
            debug!(stage = stage.matched_by().as_str(), "Stage found no match");
        }

        debug!(query_chars = query.chars().count(), "No condition extracted");
        Resolution::Unresolved
    }

    /// Check that `query` resolves to `expected`.
    pub fn validate_extraction(&self, query: &str, expected: &str) -> bool {
        self.resolve(query).condition() == Some(expected)
    }

    /// Stages in the order they run.
    pub fn stages(&self) -> Vec<MatchedBy> {
        self.stages.iter().map(|s| s.matched_by()).collect()
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tags `entity` whenever `trigger` appears in the text.
    struct Recognizes {
        trigger: &'static str,
        entity: &'static str,
    }

    impl EntityRecognizer for Recognizes {
        fn recognize(&self, text: &str) -> Vec<Entity> {
            if text.contains(self.trigger) {
                vec![Entity::new(self.entity, "MISC")]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_stage_order_without_recognizer() {
        let resolver = ConditionResolver::french().unwrap();
        assert_eq!(
            resolver.stages(),
            vec![
                MatchedBy::Exact,
                MatchedBy::Fuzzy,
                MatchedBy::Regex,
                MatchedBy::Contextual
            ]
        );
    }

    #[test]
    fn test_stage_order_with_recognizer() {
        let catalog = Arc::new(ConditionCatalog::french_defaults());
        let resolver = ConditionResolver::with_recognizer(
            catalog,
            Box::new(Recognizes {
                trigger: "x",
                entity: "x",
            }),
        )
        .unwrap();
        assert_eq!(resolver.stages()[3], MatchedBy::Nlp);
        assert_eq!(resolver.stages().len(), 5);
    }

    #[test]
    fn test_empty_query_unresolved() {
        let resolver = ConditionResolver::french().unwrap();
        assert_eq!(resolver.resolve(""), Resolution::Unresolved);
        assert_eq!(resolver.resolve("   \n\t"), Resolution::Unresolved);
    }

    #[test]
    fn test_entity_stage_resolves_what_rules_miss() {
        let query = "je souffre d'une cruralgie";

        let plain = ConditionResolver::french().unwrap();
        assert_eq!(plain.resolve(query), Resolution::Unresolved);

        let catalog = Arc::new(ConditionCatalog::french_defaults());
        let resolver = ConditionResolver::with_recognizer(
            catalog,
            Box::new(Recognizes {
                trigger: "cruralgie",
                entity: "Lombalgie",
            }),
        )
        .unwrap();

        let extracted = resolver.resolve(query).into_option().unwrap();
        assert_eq!(extracted.condition, "mal_de_dos");
        assert_eq!(extracted.matched_by, MatchedBy::Nlp);
        assert_eq!(extracted.confidence, 0.75);
    }

    #[test]
    fn test_validate_extraction() {
        let resolver = ConditionResolver::french().unwrap();
        assert!(resolver.validate_extraction("J'ai une cystite", "infection_urinaire"));
        assert!(!resolver.validate_extraction("J'ai une cystite", "hypertension"));
    }
}
