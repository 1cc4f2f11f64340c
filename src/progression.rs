use crate::error::{AppError, Result};
use crate::level::{LevelCatalog, LevelRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionState {
    pub current_level_id: Option<String>,
    pub unlocked_level_ids: BTreeSet<String>,
    pub completed_level_ids: BTreeSet<String>,
    pub has_rewind_ability: bool,
}

impl ProgressionState {
    /// Fresh progress: only the catalog's entry level is open.
    pub fn seeded(catalog: &LevelCatalog) -> Self {
        let mut state = Self::default();
        if let Some(entry) = catalog.entry_level() {
            state.unlocked_level_ids.insert(entry.id.clone());
        }
        state
    }
}

/// Where progression lives between runs. Saved after every mutation.
pub trait ProgressionStore: Send + Sync {
    fn load(&self) -> Result<Option<ProgressionState>>;
    fn save(&self, state: &ProgressionState) -> Result<()>;
}

// What a call to `complete` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub newly_completed: bool,
    pub newly_unlocked: Vec<String>,
}

pub struct ProgressionTracker {
    catalog: Arc<LevelCatalog>,
    store: Box<dyn ProgressionStore>,
    state: ProgressionState,
}

impl ProgressionTracker {
    /// Loads saved progress, or seeds it when nothing was saved yet. The entry level is
    /// always unlocked, and completed levels are folded back into the unlocked set.
    pub fn load(catalog: Arc<LevelCatalog>, store: Box<dyn ProgressionStore>) -> Result<Self> {
        let mut state = match store.load()? {
            Some(state) => state,
            None => ProgressionState::seeded(&catalog),
        };
        if let Some(entry) = catalog.entry_level() {
            state.unlocked_level_ids.insert(entry.id.clone());
        }
        let completed: Vec<String> = state.completed_level_ids.iter().cloned().collect();
        state.unlocked_level_ids.extend(completed);

        Ok(Self {
            catalog,
            store,
            state,
        })
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn is_unlocked(&self, level_id: &str) -> bool {
        self.state.unlocked_level_ids.contains(level_id)
    }

    pub fn is_completed(&self, level_id: &str) -> bool {
        self.state.completed_level_ids.contains(level_id)
    }

    /// Unlocked levels in catalog order.
    pub fn unlocked_levels(&self) -> Vec<&LevelRecord> {
        self.catalog
            .levels()
            .iter()
            .filter(|l| self.is_unlocked(&l.id))
            .collect()
    }

    pub fn next_level(&self, level_id: &str) -> Option<&LevelRecord> {
        self.catalog.next_level(level_id)
    }

    /// Marks `level_id` completed and unlocks every level that lists it as prerequisite.
    /// Repeated calls for the same level change nothing and do not touch the store.
    pub fn complete(&mut self, level_id: &str) -> Result<Completion> {
        if self.catalog.get(level_id).is_none() {
            return Err(AppError::validation(format!("unknown level '{}'", level_id)));
        }
        if !self.is_unlocked(level_id) {
            return Err(AppError::validation(format!(
                "level '{}' is still locked",
                level_id
            )));
        }

        let newly_completed = self.state.completed_level_ids.insert(level_id.to_string());
        let newly_unlocked: Vec<String> = self
            .catalog
            .unlocked_by(level_id)
            .filter_map(|next| {
                self.state
                    .unlocked_level_ids
                    .insert(next.id.clone())
                    .then(|| next.id.clone())
            })
            .collect();

        if newly_completed || !newly_unlocked.is_empty() {
            log::info!(
                "Completed level '{}', unlocked {:?}",
                level_id,
                newly_unlocked
            );
            self.store.save(&self.state)?;
        }

        // The first finished level grants the rewind (undo) ability.
        if newly_completed {
            self.unlock_rewind_ability()?;
        }

        Ok(Completion {
            newly_completed,
            newly_unlocked,
        })
    }

    pub fn set_current_level(&mut self, level_id: Option<&str>) -> Result<()> {
        if let Some(id) = level_id {
            if !self.is_unlocked(id) {
                return Err(AppError::validation(format!("level '{}' is still locked", id)));
            }
        }
        self.state.current_level_id = level_id.map(str::to_string);
        self.store.save(&self.state)
    }

    /// Saves only when the ability was not held yet.
    pub fn unlock_rewind_ability(&mut self) -> Result<()> {
        if !self.state.has_rewind_ability {
            self.state.has_rewind_ability = true;
            self.store.save(&self.state)?;
        }
        Ok(())
    }

    /// Back to a fresh game.
    pub fn reset(&mut self) -> Result<()> {
        self.state = ProgressionState::seeded(&self.catalog);
        self.store.save(&self.state)
    }
}
