use crate::level::LevelRecord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CRITERIA: [&str; 3] = [
    "The answer directly addresses the research question",
    "The answer gives at least one concrete fact, example or explanation",
    "The answer stays on the topic instead of deflecting",
];

/// Everything the engine needs to voice a persona and judge its answers.
///
/// A config is never edited in place: the engine swaps the whole value when a new
/// session is loaded, so a half-updated config cannot exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub persona: String,
    pub character_name: String,
    pub question: String,
    pub target_topic: String,
    pub context: String,
    pub validation_criteria: Vec<String>,
}

impl SessionConfig {
    /// Builds a config from a catalog level and a generated persona, filling the
    /// optional level fields with generic defaults.
    pub fn from_level(level: &LevelRecord, character_name: String, persona: String) -> Self {
        let context = level
            .context
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| default_context(&level.target_topic));
        let validation_criteria = level
            .validation_criteria
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_criteria);

        Self {
            persona,
            character_name,
            question: level.question.clone(),
            target_topic: level.target_topic.clone(),
            context,
            validation_criteria,
        }
    }
}

pub fn default_context(target_topic: &str) -> String {
    format!(
        "This is an educational conversation exploring {}. Answers should be accurate, concrete and suitable for young learners.",
        target_topic
    )
}

pub fn default_criteria() -> Vec<String> {
    DEFAULT_CRITERIA.iter().map(|c| c.to_string()).collect()
}

// Answer produced by question-setup generation in freeform mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetup {
    pub target_topic: String,
    pub context: String,
    pub validation_criteria: Vec<String>,
}

// Name and voice of a generated persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDraft {
    pub name: String,
    pub description: String,
}
