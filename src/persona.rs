use crate::ai::GameAI;
use crate::error::{AppError, Result};
use crate::game_state::SessionConfig;
use crate::level::LevelRecord;
use crate::tags::MAX_SELECTED_TAGS;
use std::sync::Arc;

/// Turns the player's trait picks into a ready-to-play [`SessionConfig`].
#[derive(Clone)]
pub struct PersonaBuilder {
    ai: Arc<GameAI>,
}

fn check_tags(tags: &[String]) -> Result<Vec<String>> {
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return Err(AppError::validation("select at least one tag to create your persona"));
    }
    if tags.len() > MAX_SELECTED_TAGS {
        return Err(AppError::validation(format!(
            "at most {} tags can be selected",
            MAX_SELECTED_TAGS
        )));
    }
    Ok(tags)
}

impl PersonaBuilder {
    pub fn new(ai: Arc<GameAI>) -> Self {
        Self { ai }
    }

    /// Level mode: question, topic, context and criteria come from the level record.
    pub async fn build(&self, tags: &[String], level: &LevelRecord) -> Result<SessionConfig> {
        let tags = check_tags(tags)?;
        log::info!("Building persona for level '{}' from {:?}", level.id, tags);

        let persona = self
            .ai
            .generate_persona(&tags, &level.question, &level.target_topic)
            .await?;
        Ok(SessionConfig::from_level(level, persona.name, persona.description))
    }

    /// Freeform mode: the question setup and the persona are generated side by side.
    pub async fn build_freeform(&self, tags: &[String], question: &str) -> Result<SessionConfig> {
        let tags = check_tags(tags)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::validation("no research question chosen"));
        }
        log::info!("Building freeform persona for \"{}\" from {:?}", question, tags);

        let (setup, persona) = tokio::try_join!(
            self.ai.generate_question_setup(question),
            self.ai.generate_persona(&tags, question, ""),
        )?;

        Ok(SessionConfig {
            persona: persona.description,
            character_name: persona.name,
            question: question.to_string(),
            target_topic: setup.target_topic,
            context: setup.context,
            validation_criteria: setup.validation_criteria,
        })
    }
}
