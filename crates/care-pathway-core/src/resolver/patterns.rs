//! Ordered pattern and keyword tables for the later cascade stages.
//!
//! Row order decides which condition wins on ambiguous phrasing.

use regex::Regex;

/// Condition-specific phrasings: direct names first, then symptoms.
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    // Direct condition mentions
    (r"(?i)\b(infection\s+urinaire|cystite|uti)\b", "infection_urinaire"),
    (r"(?i)\b(hypertension|hta|tension\s+(?:artérielle\s+)?élevée)\b", "hypertension"),
    (r"(?i)\b(diabète\s+(?:de\s+)?type\s+2|dt2|diabète\s+adulte)\b", "diabete_type2"),
    (r"(?i)\b(mal\s+de\s+dos|lombalgie|dorsalgie|lumbago)\b", "mal_de_dos"),
    (r"(?i)\b(dépression|épisode\s+dépressif|trouble\s+dépressif)\b", "depression"),
    (r"(?i)\b(anxiété|trouble\s+anxieux|angoisse)\b", "anxiete"),
    // Symptom phrasings
    (r"(?i)\b(brûlures?\s+(?:en\s+)?urinant|dysurie)\b", "infection_urinaire"),
    (r"(?i)\b(tension\s+haute|pression\s+élevée)\b", "hypertension"),
    (r"(?i)\b(glycémie\s+élevée|hyperglycémie)\b", "diabete_type2"),
    (r"(?i)\b(douleur\s+(?:au\s+)?dos|douleur\s+lombaire)\b", "mal_de_dos"),
];

/// Single keywords hinting at a condition. First keyword found wins.
pub const CONTEXT_KEYWORDS: &[(&str, &str)] = &[
    ("urine", "infection_urinaire"),
    ("urinant", "infection_urinaire"),
    ("brûlures", "infection_urinaire"),
    ("brûlure", "infection_urinaire"),
    ("vessie", "infection_urinaire"),
    ("miction", "infection_urinaire"),
    ("dysurie", "infection_urinaire"),
    ("tension", "hypertension"),
    ("pression", "hypertension"),
    ("cardiovasculaire", "hypertension"),
    ("glycémie", "diabete_type2"),
    ("sucre", "diabete_type2"),
    ("insuline", "diabete_type2"),
    ("dos", "mal_de_dos"),
    ("colonne", "mal_de_dos"),
    ("vertèbre", "mal_de_dos"),
    ("déprim", "depression"),
    ("tristesse", "depression"),
    ("mélancolie", "depression"),
    ("stress", "anxiete"),
    ("peur", "anxiete"),
    ("panique", "anxiete"),
];

/// Compiled, ordered regex → condition table.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rows: Vec<(Regex, String)>,
}

impl PatternTable {
    /// Compile `(pattern, condition_id)` rows, keeping their order.
    pub fn new(rows: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let rows = rows
            .iter()
            .map(|(pattern, condition)| Ok((Regex::new(pattern)?, condition.to_string())))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rows })
    }

    pub fn french_defaults() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_PATTERNS)
    }

    /// Conditions whose pattern matches `text`, in table order.
    pub fn matches<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .filter(move |(regex, _)| regex.is_match(text))
            .map(|(_, condition)| condition.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile() {
        let table = PatternTable::french_defaults().unwrap();
        assert_eq!(table.len(), DEFAULT_PATTERNS.len());
    }

    #[test]
    fn test_symptom_pattern() {
        let table = PatternTable::french_defaults().unwrap();
        let first = table.matches("brûlure en urinant").next();
        assert_eq!(first, Some("infection_urinaire"));
    }

    #[test]
    fn test_table_order_wins() {
        let table = PatternTable::new(&[(r"toux", "bronchite"), (r"toux", "grippe")]).unwrap();
        assert_eq!(table.matches("une toux grasse").next(), Some("bronchite"));
    }

    #[test]
    fn test_word_boundaries() {
        let table = PatternTable::french_defaults().unwrap();
        // "uti" inside a longer word must not match
        assert!(table.matches("utiliser").next().is_none());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(PatternTable::new(&[(r"(unclosed", "x")]).is_err());
    }

    #[test]
    fn test_keywords_reference_default_conditions() {
        let catalog = crate::catalog::ConditionCatalog::french_defaults();
        for (_, condition) in CONTEXT_KEYWORDS.iter().chain(DEFAULT_PATTERNS) {
            assert!(catalog.get(condition).is_some(), "unknown condition {}", condition);
        }
    }
}
