// src/ai_response.rs
use crate::error::{AppError, Result};
use crate::game_state::{PersonaDraft, QuestionSetup};
use crate::message::{OptionId, QuestionOption};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

pub const FALLBACK_OPTIONS: [&str; 3] = [
    "Tell me about your experience during that time.",
    "What was the most significant event you witnessed?",
    "How did these events change your perspective?",
];

// "Name, a wise healer who ..." -> "Name"
static NAME_BEFORE_ARTICLE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?),\s+(?:a|an|the)\b").ok());

#[derive(Debug, Deserialize)]
struct RawPersona {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    text: String,
}

/// Slice from the first `open` to the last `close`, which strips code fences and chatter
/// models like to wrap around JSON.
fn extract_block(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

pub fn extract_json_object(text: &str) -> Option<&str> {
    extract_block(text, '{', '}')
}

pub fn extract_json_array(text: &str) -> Option<&str> {
    extract_block(text, '[', ']')
}

/// Reads a generated persona. Never fails: when the JSON is unusable the raw text becomes
/// the description and the name is guessed from its leading clause.
pub fn parse_persona(text: &str) -> PersonaDraft {
    let parsed = extract_json_object(text)
        .and_then(|json| serde_json::from_str::<RawPersona>(json).ok())
        .filter(|raw| !raw.description.trim().is_empty());

    match parsed {
        Some(raw) => {
            let description = raw.description.trim().to_string();
            let name = if raw.name.trim().is_empty() {
                guess_name(&description)
            } else {
                raw.name.trim().to_string()
            };
            PersonaDraft { name, description }
        }
        None => {
            log::warn!("Persona response was not valid JSON, guessing the name");
            let description = text.trim().to_string();
            PersonaDraft {
                name: guess_name(&description),
                description,
            }
        }
    }
}

/// Leading clause of a persona description: text before ", a/an/the", else before the
/// first period, else the whole trimmed text.
pub fn guess_name(text: &str) -> String {
    let text = text.trim();
    if let Some(regex) = NAME_BEFORE_ARTICLE.as_ref() {
        if let Some(name) = regex.captures(text).and_then(|c| c.get(1)) {
            let name = name.as_str().trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    match text.split_once('.') {
        Some((head, _)) if !head.trim().is_empty() => head.trim().to_string(),
        _ => text.to_string(),
    }
}

/// Topic, context and criteria for a freeform question. Unlike personas there is nothing
/// sensible to fall back to, so a bad response is an error.
pub fn parse_question_setup(text: &str) -> Result<QuestionSetup> {
    let json = extract_json_object(text)
        .ok_or_else(|| AppError::parse("question setup", "no JSON object in response"))?;
    let setup: QuestionSetup =
        serde_json::from_str(json).map_err(|e| AppError::parse("question setup", e))?;

    let validation_criteria: Vec<String> = setup
        .validation_criteria
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if validation_criteria.is_empty() {
        return Err(AppError::parse("question setup", "no validation criteria"));
    }
    if setup.target_topic.trim().is_empty() {
        return Err(AppError::parse("question setup", "empty target topic"));
    }

    Ok(QuestionSetup {
        target_topic: setup.target_topic.trim().to_string(),
        context: setup.context.trim().to_string(),
        validation_criteria,
    })
}

/// Exactly three options, ids assigned A, B, C by position. Anything else is `None`.
pub fn parse_options(text: &str) -> Option<Vec<QuestionOption>> {
    let json = extract_json_array(text)?;
    let raw: Vec<RawOption> = serde_json::from_str(json).ok()?;
    if raw.len() != OptionId::ALL.len() || raw.iter().any(|o| o.text.trim().is_empty()) {
        return None;
    }
    Some(
        OptionId::ALL
            .iter()
            .zip(raw)
            .map(|(id, option)| QuestionOption::new(*id, option.text.trim()))
            .collect(),
    )
}

pub fn fallback_options() -> Vec<QuestionOption> {
    OptionId::ALL
        .iter()
        .zip(FALLBACK_OPTIONS)
        .map(|(id, text)| QuestionOption::new(*id, text))
        .collect()
}

/// Evaluator verdict: any "yes" in the reply counts.
pub fn is_affirmative(text: &str) -> bool {
    text.trim().to_lowercase().contains("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_inside_code_fence() {
        let text = "```json\n[{\"id\":\"A\",\"text\":\"one\"},{\"id\":\"B\",\"text\":\"two\"},{\"id\":\"C\",\"text\":\"three\"}]\n```";
        let options = parse_options(text).expect("three options");
        assert_eq!(options[2], QuestionOption::new(OptionId::C, "three"));
    }

    #[test]
    fn two_options_is_a_shape_failure() {
        assert!(parse_options(r#"[{"text":"one"},{"text":"two"}]"#).is_none());
        assert!(parse_options("").is_none());
    }

    #[test]
    fn guess_name_falls_back_to_first_sentence() {
        assert_eq!(guess_name("Old Tam. He bakes bread."), "Old Tam");
        assert_eq!(guess_name("Marigold"), "Marigold");
    }

    #[test]
    fn affirmative_is_case_insensitive() {
        assert!(is_affirmative("  YES, it does."));
        assert!(!is_affirmative("no"));
    }
}
