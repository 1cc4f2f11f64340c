use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

const BUILTIN_TERMS: &str = include_str!("../assets/profanity_en.json");

pub const CENSORED: &str = "[censored]";

/// Ceiling applied to everything a persona says.
pub const CHARACTER_MAX_SEVERITY: u8 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub id: String,
    #[serde(rename = "match")]
    pub pattern: String, // Variants separated by '|'.
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCategory {
    pub notes: String,
    pub severity: u8,
    pub tags: Vec<String>,
    pub dictionary: Vec<TermEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ContentRating {
    G,
    #[strum(serialize = "PG-13")]
    Pg13,
    R,
    X,
}

struct CompiledCategory {
    severity: u8,
    regex: Regex,
}

/// Whole-word, case-insensitive term censoring keyed by severity.
pub struct ContentFilter {
    categories: Vec<CompiledCategory>,
}

impl std::fmt::Debug for ContentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFilter")
            .field("categories", &self.categories.len())
            .finish()
    }
}

impl ContentFilter {
    pub fn new(categories: Vec<TermCategory>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(categories.len());
        for category in categories {
            let alternatives: Vec<String> = category
                .dictionary
                .iter()
                .flat_map(|entry| entry.pattern.split('|'))
                .map(str::trim)
                .filter(|variant| !variant.is_empty())
                .map(regex::escape)
                .collect();
            if alternatives.is_empty() {
                continue;
            }
            let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
                .case_insensitive(true)
                .build()?;
            compiled.push(CompiledCategory {
                severity: category.severity,
                regex,
            });
        }
        Ok(Self {
            categories: compiled,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let categories: Vec<TermCategory> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    /// English term list bundled with the game.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TERMS)
    }

    /// Replaces every term whose severity exceeds `max_severity` with [`CENSORED`].
    pub fn filter(&self, text: &str, max_severity: u8) -> String {
        let mut filtered = text.to_string();
        for category in self.categories.iter().filter(|c| c.severity > max_severity) {
            filtered = category.regex.replace_all(&filtered, CENSORED).into_owned();
        }
        filtered
    }

    pub fn contains_inappropriate(&self, text: &str, max_severity: u8) -> bool {
        self.categories
            .iter()
            .filter(|c| c.severity > max_severity)
            .any(|c| c.regex.is_match(text))
    }

    /// Highest severity found in `text`, 0 when clean.
    pub fn severity_of(&self, text: &str) -> u8 {
        self.categories
            .iter()
            .filter(|c| c.regex.is_match(text))
            .map(|c| c.severity)
            .max()
            .unwrap_or(0)
    }

    pub fn rating(&self, text: &str) -> ContentRating {
        match self.severity_of(text) {
            0 | 1 => ContentRating::G,
            2 => ContentRating::Pg13,
            3 => ContentRating::R,
            _ => ContentRating::X,
        }
    }
}
