use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::Display;

const BUILTIN_LEVELS: &str = include_str!("../assets/levels.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Introduction,
    History,
    Science,
    Philosophy,
    Literature,
    Technology,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub question: String,
    pub target_topic: String,
    pub persona: String, // Seed persona, used as a hint when no tags shape the character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_criteria: Option<Vec<String>>,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_after: Option<String>, // Id of the level that must be completed first.
}

/// Ordered, read-only collection of levels.
///
/// Order matters: it drives [`LevelCatalog::next_level`], while unlocking follows the
/// `unlock_after` edges.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelRecord>,
}

impl LevelCatalog {
    /// Validates ids (unique, non-empty) and prerequisite references.
    pub fn new(levels: Vec<LevelRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for level in &levels {
            if level.id.trim().is_empty() {
                return Err(AppError::validation("level with an empty id"));
            }
            if !seen.insert(level.id.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate level id '{}'",
                    level.id
                )));
            }
        }
        for level in &levels {
            if let Some(parent) = &level.unlock_after {
                if !seen.contains(parent.as_str()) {
                    return Err(AppError::validation(format!(
                        "level '{}' unlocks after unknown level '{}'",
                        level.id, parent
                    )));
                }
            }
        }
        if !levels.iter().any(|l| l.unlock_after.is_none()) {
            return Err(AppError::validation("catalog has no entry level"));
        }
        Ok(Self { levels })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let levels: Vec<LevelRecord> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    /// The curriculum shipped with the game.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LEVELS)
    }

    pub fn levels(&self) -> &[LevelRecord] {
        &self.levels
    }

    pub fn get(&self, id: &str) -> Option<&LevelRecord> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// First level without a prerequisite; always present in a validated catalog.
    pub fn entry_level(&self) -> Option<&LevelRecord> {
        self.levels.iter().find(|l| l.unlock_after.is_none())
    }

    /// Every level whose prerequisite is `id`.
    pub fn unlocked_by<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LevelRecord> + 'a {
        self.levels
            .iter()
            .filter(move |l| l.unlock_after.as_deref() == Some(id))
    }

    /// Positional successor in catalog order, independent of the unlock graph.
    pub fn next_level(&self, id: &str) -> Option<&LevelRecord> {
        let index = self.levels.iter().position(|l| l.id == id)?;
        self.levels.get(index + 1)
    }
}
