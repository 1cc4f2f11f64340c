use crate::error::Result;
use crate::progression::{ProgressionState, ProgressionStore};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const PROGRESSION_FILE: &str = "amur-isondo-game-storage.json";

/// `~/amur_isondo/data`, or `./data` when no home directory can be resolved.
pub fn get_game_data_dir() -> PathBuf {
    match dir::home_dir() {
        Some(home) => home.join("amur_isondo").join("data"),
        None => PathBuf::from("./data"),
    }
}

/// Reads a JSON record. A missing file is `Ok(None)`, a corrupt one is an error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_reader(file)?))
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    Ok(())
}

pub fn remove_json(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// Progression record kept as a single JSON file in the data directory.
#[derive(Debug, Clone)]
pub struct JsonProgressionStore {
    path: PathBuf,
}

impl JsonProgressionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROGRESSION_FILE))
    }
}

impl ProgressionStore for JsonProgressionStore {
    fn load(&self) -> Result<Option<ProgressionState>> {
        load_json(&self.path)
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        save_json(&self.path, state)
    }
}
