//! Condition catalog and extraction models.

use serde::{Deserialize, Serialize};

/// Minimum partial-ratio score for a fuzzy match to count.
pub const FUZZY_THRESHOLD: u8 = 80;

/// Clinical category of a condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    InfectiousDisease,
    Cardiovascular,
    Endocrine,
    Musculoskeletal,
    MentalHealth,
    #[serde(untagged)]
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::InfectiousDisease => "infectious_disease",
            Category::Cardiovascular => "cardiovascular",
            Category::Endocrine => "endocrine",
            Category::Musculoskeletal => "musculoskeletal",
            Category::MentalHealth => "mental_health",
            Category::Other(other) => other,
        }
    }
}

/// A canonical condition with the phrasings that identify it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionMapping {
    /// Canonical key (e.g., "diabete_type2")
    pub id: String,
    /// Human-readable label
    pub primary_label: String,
    /// Lower-cased synonyms, scanned in order during exact matching
    pub synonyms: Vec<String>,
    pub category: Category,
    /// ICD-10 code, when one applies
    pub icd10: Option<String>,
}

impl ConditionMapping {
    /// Create a mapping from borrowed literals.
    pub fn new(
        id: &str,
        primary_label: &str,
        synonyms: &[&str],
        category: Category,
        icd10: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            primary_label: primary_label.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            category,
            icd10: icd10.map(str::to_string),
        }
    }
}

/// Which cascade stage produced a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Exact,
    Fuzzy,
    Regex,
    Nlp,
    Contextual,
}

impl MatchedBy {
    /// Confidence assigned by the stages with a fixed score.
    ///
    /// Fuzzy matches are scored from their similarity instead, see [`fuzzy_confidence`].
    pub fn fixed_confidence(self) -> Option<f64> {
        match self {
            MatchedBy::Exact => Some(1.0),
            MatchedBy::Regex => Some(0.85),
            MatchedBy::Nlp => Some(0.75),
            MatchedBy::Contextual => Some(0.65),
            MatchedBy::Fuzzy => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchedBy::Exact => "exact",
            MatchedBy::Fuzzy => "fuzzy",
            MatchedBy::Regex => "regex",
            MatchedBy::Nlp => "nlp",
            MatchedBy::Contextual => "contextual",
        }
    }
}

/// Convert a partial-ratio score into a confidence.
///
/// Returns `None` below [`FUZZY_THRESHOLD`].
pub fn fuzzy_confidence(score: u8) -> Option<f64> {
    if score < FUZZY_THRESHOLD {
        return None;
    }
    Some(f64::from(score.min(100)) / 100.0)
}

/// A condition extracted from free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedCondition {
    /// Canonical condition id
    pub condition: String,
    pub primary_label: String,
    /// Confidence (0.0 - 1.0), determined by the stage that matched
    pub confidence: f64,
    pub category: Category,
    pub icd10: Option<String>,
    pub matched_by: MatchedBy,
    /// Synonyms of the matched condition
    pub synonyms: Vec<String>,
}

impl ExtractedCondition {
    /// Build an extraction for a catalog entry.
    pub fn from_mapping(
        mapping: &ConditionMapping,
        matched_by: MatchedBy,
        confidence: f64,
    ) -> Self {
        Self {
            condition: mapping.id.clone(),
            primary_label: mapping.primary_label.clone(),
            confidence,
            category: mapping.category.clone(),
            icd10: mapping.icd10.clone(),
            matched_by,
            synonyms: mapping.synonyms.clone(),
        }
    }
}

/// Outcome of running the resolution cascade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ExtractedCondition),
    /// No stage matched. This is a valid outcome, not an error.
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn as_extracted(&self) -> Option<&ExtractedCondition> {
        match self {
            Resolution::Resolved(extracted) => Some(extracted),
            Resolution::Unresolved => None,
        }
    }

    pub fn into_option(self) -> Option<ExtractedCondition> {
        match self {
            Resolution::Resolved(extracted) => Some(extracted),
            Resolution::Unresolved => None,
        }
    }

    /// Canonical id of the resolved condition.
    pub fn condition(&self) -> Option<&str> {
        self.as_extracted().map(|e| e.condition.as_str())
    }
}
