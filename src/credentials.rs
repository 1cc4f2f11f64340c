use crate::error::Result;
use crate::save::{load_json, remove_json, save_json};
use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CREDENTIAL_FILE: &str = "openrouter_api_key.json";
pub const CREDENTIAL_LIFETIME_DAYS: i64 = 30;

/// Supplies the API key on demand. Implementations may prompt the player, read a
/// stored key, or hand out a fixed one; `None` means no key is available.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> BoxFuture<'_, Option<String>>;
}

// A key known up front, e.g. from the environment.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub Option<String>);

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> BoxFuture<'_, Option<String>> {
        let key = self.0.clone();
        async move { key }.boxed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub api_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Persisted API key with a 30 day lifetime, the way a browser cookie would keep it.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    cached: Mutex<Option<StoredCredential>>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CREDENTIAL_FILE))
    }

    /// Current key, if one is stored and not expired. Expired records are deleted.
    pub fn load(&self) -> Result<Option<String>> {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        let stored: Option<StoredCredential> = match self.cached_copy() {
            Some(stored) => Some(stored),
            None => load_json(&self.path)?,
        };
        match stored {
            Some(stored) if stored.expires_at > now => {
                self.set_cache(Some(stored.clone()));
                Ok(Some(stored.api_key))
            }
            Some(_) => {
                log::info!("Stored API key expired, removing it");
                self.clear()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn set(&self, api_key: &str) -> Result<()> {
        self.set_at(api_key, Utc::now())
    }

    pub fn set_at(&self, api_key: &str, now: DateTime<Utc>) -> Result<()> {
        let stored = StoredCredential {
            api_key: api_key.trim().to_string(),
            expires_at: now + Duration::days(CREDENTIAL_LIFETIME_DAYS),
        };
        save_json(&self.path, &stored)?;
        self.set_cache(Some(stored));
        Ok(())
    }

    /// Forgets the key, on disk and in memory.
    pub fn clear(&self) -> Result<()> {
        self.set_cache(None);
        remove_json(&self.path)
    }

    fn cached_copy(&self) -> Option<StoredCredential> {
        match self.cached.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_cache(&self, value: Option<StoredCredential>) {
        match self.cached.lock() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl CredentialProvider for CredentialStore {
    fn credential(&self) -> BoxFuture<'_, Option<String>> {
        async move {
            match self.load() {
                Ok(key) => key,
                Err(e) => {
                    log::error!("Failed to read stored API key: {e:#?}");
                    None
                }
            }
        }
        .boxed()
    }
}
