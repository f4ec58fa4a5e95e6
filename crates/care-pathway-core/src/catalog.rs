//! Static condition catalog.
//!
//! Built once at startup and never mutated. Declaration order is significant:
//! exact matching scans conditions in this order and the first hit wins.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{Category, ConditionMapping};

/// Catalog construction errors.
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate condition id: {0}")]
    DuplicateId(String),

    #[error("Condition {0} has no synonyms")]
    EmptySynonyms(String),

    #[error("Condition {id} lists synonym '{synonym}' more than once")]
    DuplicateSynonym { id: String, synonym: String },

    #[error("Condition id is empty")]
    EmptyId,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Validated, ordered set of condition mappings.
#[derive(Debug, Clone)]
pub struct ConditionCatalog {
    conditions: Vec<ConditionMapping>,
    by_id: HashMap<String, usize>,
}

impl ConditionCatalog {
    /// Validate and index a list of mappings.
    ///
    /// Synonyms are trimmed and lower-cased here so matching never has to.
    pub fn new(mappings: Vec<ConditionMapping>) -> CatalogResult<Self> {
        let mut conditions = Vec::with_capacity(mappings.len());
        let mut by_id = HashMap::with_capacity(mappings.len());

        for mut mapping in mappings {
            if mapping.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if by_id.contains_key(&mapping.id) {
                return Err(CatalogError::DuplicateId(mapping.id));
            }

            mapping.synonyms = mapping
                .synonyms
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();

            if mapping.synonyms.is_empty() {
                return Err(CatalogError::EmptySynonyms(mapping.id));
            }

            let mut seen = HashSet::new();
            for synonym in &mapping.synonyms {
                if !seen.insert(synonym.as_str()) {
                    return Err(CatalogError::DuplicateSynonym {
                        id: mapping.id.clone(),
                        synonym: synonym.clone(),
                    });
                }
            }

            by_id.insert(mapping.id.clone(), conditions.len());
            conditions.push(mapping);
        }

        Ok(Self { conditions, by_id })
    }

    /// The built-in French catalog.
    pub fn french_defaults() -> Self {
        let conditions = default_conditions();
        let by_id = conditions
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { conditions, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&ConditionMapping> {
        self.by_id.get(id).map(|&i| &self.conditions[i])
    }

    /// Conditions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionMapping> {
        self.conditions.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.id.as_str())
    }

    /// Every canonical id, in declaration order.
    pub fn list_supported_conditions(&self) -> Vec<String> {
        self.ids().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Default for ConditionCatalog {
    fn default() -> Self {
        Self::french_defaults()
    }
}

/// Built-in conditions. Synonyms are already lower-case.
fn default_conditions() -> Vec<ConditionMapping> {
    vec![
        ConditionMapping::new(
            "infection_urinaire",
            "infection urinaire",
            &[
                "infection urinaire",
                "cystite",
                "uti",
                "infection des voies urinaires",
                "infection vésicale",
                "brûlures mictionnelles",
                "cystite aiguë",
                "infection tractus urinaire",
                "pyurie",
                "dysurie",
            ],
            Category::InfectiousDisease,
            Some("N39.0"),
        ),
        ConditionMapping::new(
            "hypertension",
            "hypertension",
            &[
                "hypertension",
                "hta",
                "tension artérielle élevée",
                "pression artérielle élevée",
                "hypertension artérielle",
                "haute tension",
                "tension haute",
                "pression sanguine élevée",
                "hypertonie",
            ],
            Category::Cardiovascular,
            Some("I10"),
        ),
        ConditionMapping::new(
            "diabete_type2",
            "diabète type 2",
            &[
                "diabète type 2",
                "diabète de type 2",
                "dt2",
                "diabète non insulino-dépendant",
                "diabète adulte",
                "diabète sucré type 2",
                "diabète mellitus type 2",
                "dnid",
                "hyperglycémie chronique",
            ],
            Category::Endocrine,
            Some("E11"),
        ),
        ConditionMapping::new(
            "mal_de_dos",
            "mal de dos",
            &[
                "mal de dos",
                "douleur dorsale",
                "lombalgie",
                "dorsalgie",
                "douleur lombaire",
                "lumbago",
                "sciatique",
                "douleur rachidienne",
                "douleur colonne vertébrale",
                "rachialgie",
                "back pain",
            ],
            Category::Musculoskeletal,
            Some("M54"),
        ),
        ConditionMapping::new(
            "depression",
            "dépression",
            &[
                "dépression",
                "épisode dépressif",
                "trouble dépressif",
                "déprime",
                "syndrome dépressif",
                "humeur dépressive",
                "état dépressif",
                "mélancolie",
            ],
            Category::MentalHealth,
            Some("F32"),
        ),
        ConditionMapping::new(
            "anxiete",
            "anxiété",
            &[
                "anxiété",
                "trouble anxieux",
                "angoisse",
                "stress",
                "anxiété généralisée",
                "panique",
                "phobies",
                "trouble anxieux généralisé",
                "tag",
            ],
            Category::MentalHealth,
            Some("F41"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = ConditionCatalog::french_defaults();
        let revalidated = ConditionCatalog::new(defaults.iter().cloned().collect()).unwrap();
        assert_eq!(revalidated.len(), 6);
    }

    #[test]
    fn test_declaration_order() {
        let catalog = ConditionCatalog::french_defaults();
        assert_eq!(
            catalog.list_supported_conditions(),
            vec![
                "infection_urinaire",
                "hypertension",
                "diabete_type2",
                "mal_de_dos",
                "depression",
                "anxiete"
            ]
        );
        assert_eq!(catalog.ids().next(), Some("infection_urinaire"));
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = ConditionCatalog::french_defaults();
        let diabetes = catalog.get("diabete_type2").unwrap();
        assert_eq!(diabetes.icd10.as_deref(), Some("E11"));
        assert_eq!(diabetes.category, Category::Endocrine);
        assert!(catalog.get("grippe").is_none());
    }

    #[test]
    fn test_synonyms_lowercased() {
        let catalog = ConditionCatalog::new(vec![ConditionMapping::new(
            "grippe",
            "grippe",
            &["  Grippe ", "INFLUENZA"],
            Category::InfectiousDisease,
            Some("J11"),
        )])
        .unwrap();

        assert_eq!(catalog.get("grippe").unwrap().synonyms, vec!["grippe", "influenza"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mapping = ConditionMapping::new("a", "a", &["x"], Category::Endocrine, None);
        let result = ConditionCatalog::new(vec![mapping.clone(), mapping]);
        assert_eq!(result.unwrap_err(), CatalogError::DuplicateId("a".into()));
    }

    #[test]
    fn test_empty_synonyms_rejected() {
        let mapping = ConditionMapping::new("a", "a", &["  "], Category::Endocrine, None);
        assert!(matches!(
            ConditionCatalog::new(vec![mapping]),
            Err(CatalogError::EmptySynonyms(_))
        ));
    }

    #[test]
    fn test_duplicate_synonym_rejected() {
        let mapping = ConditionMapping::new("a", "a", &["toux", "TOUX"], Category::Endocrine, None);
        assert!(matches!(
            ConditionCatalog::new(vec![mapping]),
            Err(CatalogError::DuplicateSynonym { .. })
        ));
    }
}
