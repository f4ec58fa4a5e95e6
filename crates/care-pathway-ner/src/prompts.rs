//! NER prompts for French condition extraction.
//!
//! The completion backend is expected to honour `JSON_GRAMMAR`, but the
//! parser tolerates prose around the object anyway.

/// System prompt for condition NER.
pub const SYSTEM_PROMPT: &str = r#"Tu es un assistant médical qui repère les pathologies dans les messages de patients francophones.

Repère chaque mention de maladie, de trouble ou de terme médical:
- text: le texte exact tel qu'il apparaît dans le message
- label: "DISEASE" pour une maladie nommée, "MISC" pour tout autre terme médical

Abréviations courantes:
- HTA = hypertension artérielle
- DT2 = diabète de type 2
- IU = infection urinaire

Ne propose jamais de diagnostic. Réponds uniquement avec un objet JSON contenant un tableau "entities"."#;

/// User prompt template for entity extraction.
pub fn make_extraction_prompt(message: &str) -> String {
    format!(
        r#"Extrais toutes les entités médicales de ce message patient:

"{}"

Retourne un objet JSON avec un tableau "entities". Chaque entité contient:
- text: le texte exact de la mention
- label: "DISEASE" ou "MISC"
- start_offset: position du premier caractère
- end_offset: position après le dernier caractère"#,
        message
    )
}

/// GBNF grammar constraining completions to the expected shape.
pub const JSON_GRAMMAR: &str = r#"
root ::= object
object ::= "{" ws "\"entities\"" ws ":" ws entities ws "}"
entities ::= "[" ws (entity (ws "," ws entity)*)? ws "]"
entity ::= "{" ws
    "\"text\"" ws ":" ws string ws "," ws
    "\"label\"" ws ":" ws label ws "," ws
    "\"start_offset\"" ws ":" ws number ws "," ws
    "\"end_offset\"" ws ":" ws number ws
"}"
label ::= "\"DISEASE\"" | "\"MISC\""
string ::= "\"" ([^"\\] | "\\" .)* "\""
number ::= [0-9]+
ws ::= [ \t\n]*
"#;

/// Few-shot pairs of (message, expected completion).
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    (
        "Depuis hier j'ai une cystite et des brûlures",
        r#"{"entities":[{"text":"cystite","label":"DISEASE","start_offset":21,"end_offset":28}]}"#,
    ),
    (
        "Mon médecin parle de lombalgie chronique",
        r#"{"entities":[{"text":"lombalgie chronique","label":"DISEASE","start_offset":21,"end_offset":40}]}"#,
    ),
    (
        "Je suis suivie pour une HTA et un diabète",
        r#"{"entities":[{"text":"HTA","label":"MISC","start_offset":24,"end_offset":27},{"text":"diabète","label":"DISEASE","start_offset":34,"end_offset":41}]}"#,
    ),
];

/// Build a complete chat prompt, optionally with the few-shot examples.
pub fn build_full_prompt(message: &str, include_examples: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str("<|system|>\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n<|end|>\n");

    if include_examples {
        for (input, output) in FEW_SHOT_EXAMPLES {
            push_turn(&mut prompt, "user", &make_extraction_prompt(input));
            push_turn(&mut prompt, "assistant", output);
        }
    }

    push_turn(&mut prompt, "user", &make_extraction_prompt(message));
    prompt.push_str("<|assistant|>\n");

    prompt
}

fn push_turn(prompt: &mut String, role: &str, content: &str) {
    prompt.push_str("<|");
    prompt.push_str(role);
    prompt.push_str("|>\n");
    prompt.push_str(content);
    prompt.push_str("\n<|end|>\n");
}
