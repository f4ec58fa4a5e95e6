//! Entity extraction from completion output.

use care_pathway_core::{Entity, EntityRecognizer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompts::build_full_prompt;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Completion error: {0}")]
    Inference(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Raw NER output from a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerOutput {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
}

/// One entity as emitted by the model. Offsets are in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntity {
    pub text: String,
    pub label: String,
    #[serde(default)]
    pub start_offset: usize,
    #[serde(default)]
    pub end_offset: usize,
}

/// Parse completion text into entities, ignoring prose around the object.
pub fn parse_ner_output(text: &str) -> ExtractionResult<NerOutput> {
    let start = text.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let end = text.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if end < start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    Ok(serde_json::from_str(&text[start..=end])?)
}

/// Convert raw entities to resolver entities, dropping blank ones.
pub fn to_entities(output: &NerOutput) -> Vec<Entity> {
    output
        .entities
        .iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| Entity::new(e.text.trim(), &e.label))
        .collect()
}

type Completion = Box<dyn Fn(&str) -> ExtractionResult<String> + Send + Sync>;

/// Recognizer backed by a prompt-completion function.
///
/// Any failure is logged and treated as "no entities".
pub struct PromptedRecognizer {
    completion: Completion,
    include_examples: bool,
}

impl PromptedRecognizer {
    pub fn new<F>(completion: F) -> Self
    where
        F: Fn(&str) -> ExtractionResult<String> + Send + Sync + 'static,
    {
        Self {
            completion: Box::new(completion),
            include_examples: true,
        }
    }

    /// Toggle the few-shot examples in the prompt.
    pub fn with_examples(mut self, include_examples: bool) -> Self {
        self.include_examples = include_examples;
        self
    }

    /// Run the completion and parse its output.
    pub fn extract(&self, text: &str) -> ExtractionResult<Vec<Entity>> {
        let prompt = build_full_prompt(text, self.include_examples);
        let raw = (self.completion)(&prompt)?;
        let output = parse_ner_output(&raw)?;
        Ok(to_entities(&output))
    }
}

impl EntityRecognizer for PromptedRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        match self.extract(text) {
            Ok(entities) => {
                debug!(count = entities.len(), "Entities extracted");
                entities
            }
            Err(e) => {
                warn!(error = %e, "Entity extraction failed");
                Vec::new()
            }
        }
    }
}

/// Keyword-based recognizer for tests and offline use.
///
/// Known terms are tagged `MISC`, reported under their canonical wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRecognizer;

const MOCK_TERMS: &[(&str, Option<&str>)] = &[
    ("cruralgie", Some("sciatique")),
    ("névralgie crurale", Some("sciatique")),
    ("pyélonéphrite", Some("infection urinaire")),
    ("pollakiurie", Some("infection urinaire")),
    ("insulinorésistance", Some("diabète type 2")),
    ("hypertension", None),
    ("lombalgie", None),
    ("cystite", None),
    ("angoisse", None),
];

impl EntityRecognizer for MockRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        let lowered = text.to_lowercase();
        MOCK_TERMS
            .iter()
            .filter(|(term, _)| lowered.contains(term))
            .map(|(term, canonical)| Entity::new(canonical.unwrap_or(term), "MISC"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use care_pathway_core::{ConditionCatalog, ConditionResolver, MatchedBy, Resolution};
    use proptest::prelude::*;

    use super::*;

    const CRURALGIA: &str =
        r#"{"entities":[{"text":"cruralgie","label":"DISEASE","start_offset":0,"end_offset":9}]}"#;
    const LOW_BACK_PAIN: &str =
        r#"{"entities":[{"text":"lombalgie","label":"DISEASE","start_offset":0,"end_offset":9}]}"#;

    #[test]
    fn test_parse_ner_output() {
        let json =
            r#"{"entities":[{"text":"cystite","label":"DISEASE","start_offset":8,"end_offset":15}]}"#;

        let output = parse_ner_output(json).unwrap();
        assert_eq!(output.entities.len(), 1);
        assert_eq!(output.entities[0].text, "cystite");
        assert_eq!(output.entities[0].end_offset, 15);
    }

    #[test]
    fn test_parse_ner_output_with_prose() {
        let text = r#"Voici les entités:
{"entities":[{"text":"HTA","label":"MISC","start_offset":0,"end_offset":3}]}
Bonne journée."#;

        let output = parse_ner_output(text).unwrap();
        assert_eq!(output.entities[0].label, "MISC");
    }

    #[test]
    fn test_parse_ner_output_without_object() {
        assert!(matches!(
            parse_ner_output("aucune entité"),
            Err(ExtractionError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_ner_output("} puis {"),
            Err(ExtractionError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_ner_output("{pas du json}"),
            Err(ExtractionError::JsonParse(_))
        ));
    }

    #[test]
    fn test_to_entities_drops_blank_text() {
        let output = parse_ner_output(
            r#"{"entities":[{"text":"  ","label":"MISC"},{"text":" lumbago ","label":"DISEASE"}]}"#,
        )
        .unwrap();

        assert_eq!(to_entities(&output), vec![Entity::new("lumbago", "DISEASE")]);
    }

    #[test]
    fn test_prompted_recognizer_sees_message() {
        let recognizer = PromptedRecognizer::new(|prompt: &str| {
            assert!(prompt.contains("douleur à la cuisse"));
            Ok(CRURALGIA.to_string())
        })
        .with_examples(false);

        let entities = recognizer.recognize("douleur à la cuisse");
        assert_eq!(entities, vec![Entity::new("cruralgie", "DISEASE")]);
    }

    #[test]
    fn test_prompted_recognizer_failure_is_empty() {
        let failing =
            PromptedRecognizer::new(|_: &str| Err(ExtractionError::Inference("timeout".into())));
        assert!(failing.recognize("j'ai mal").is_empty());

        let garbage = PromptedRecognizer::new(|_: &str| Ok("je ne sais pas".to_string()));
        assert!(garbage.recognize("j'ai mal").is_empty());
    }

    #[test]
    fn test_prompted_recognizer_in_cascade() {
        let recognizer = PromptedRecognizer::new(|_: &str| Ok(LOW_BACK_PAIN.to_string()));
        let resolver = ConditionResolver::with_recognizer(
            Arc::new(ConditionCatalog::french_defaults()),
            Box::new(recognizer),
        )
        .unwrap();

        let extracted = resolver
            .resolve("je souffre d'une cruralgie")
            .into_option()
            .unwrap();
        assert_eq!(extracted.condition, "mal_de_dos");
        assert_eq!(extracted.matched_by, MatchedBy::Nlp);
    }

    #[test]
    fn test_mock_recognizer() {
        let entities = MockRecognizer.recognize("Une Pyélonéphrite et une cystite");
        assert_eq!(
            entities,
            vec![
                Entity::new("infection urinaire", "MISC"),
                Entity::new("cystite", "MISC"),
            ]
        );
        assert!(MockRecognizer.recognize("rien de médical").is_empty());
    }

    #[test]
    fn test_mock_recognizer_in_cascade() {
        let resolver = ConditionResolver::with_recognizer(
            Arc::new(ConditionCatalog::french_defaults()),
            Box::new(MockRecognizer),
        )
        .unwrap();

        let resolution = resolver.resolve("je souffre d'une cruralgie");
        assert_eq!(resolution.condition(), Some("mal_de_dos"));
        assert_eq!(resolver.resolve("bonjour"), Resolution::Unresolved);
    }

    proptest! {
        #[test]
        fn parse_ner_output_never_panics(text in ".{0,200}") {
            let _ = parse_ner_output(&text);
        }
    }
}
