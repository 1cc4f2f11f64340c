// Import necessary libraries and modules for file I/O and serialization.
use crate::error::Result;
use crate::save::{load_json, save_json};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

// Define a structure to hold application settings with serialization and deserialization capabilities.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub model: String,               // Model identifier sent with every completion request.
    pub api_url: String,             // Chat-completion endpoint.
    pub request_timeout_secs: u64,   // Per-attempt network timeout.
    pub max_attempts: u32,           // Total attempts per generation call, first one included.
    pub initial_backoff_ms: u64,     // Delay before the second attempt, doubled afterwards.
    pub temperature: f32,
    pub max_tokens: u32,
    pub elaborate_on_miss: bool, // Let the persona elaborate once when an answer falls short.
    pub debug_mode: bool,        // Log at debug level instead of info.
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            model: "deepseek/deepseek-r1-0528".to_string(),
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 1000,
            temperature: 0.7,
            max_tokens: 1000,
            elaborate_on_miss: false,
            debug_mode: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    // Load settings from the data directory, falling back to defaults when no file exists yet.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Ok(load_json(&dir.join(SETTINGS_FILE))?.unwrap_or_default())
    }

    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        save_json(&dir.join(SETTINGS_FILE), self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}
