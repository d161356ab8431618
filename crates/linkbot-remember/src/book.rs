//! Memory book: named values kept in a key/value namespace

use linkbot_persistence::KeyValueStore;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

/// Memory book errors
#[derive(Debug, Error)]
pub enum MemoryError {
    /// No key was given
    #[error("nothing to remember")]
    EmptyKey,

    /// The key already holds a value and must be forgotten first
    #[error("`{key}` is already {value}")]
    AlreadyKnown {
        /// Key as the user typed it
        key: String,
        /// Value currently stored
        value: String,
    },

    /// Nothing is stored under the key
    #[error("nothing remembered for `{0}`")]
    Unknown(String),

    /// Stored value is not a string
    #[error("memory `{key}` is not a text value")]
    Corrupt {
        /// Store key of the value
        key: String,
    },

    /// Persistence backend failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Split `remember` arguments into a key and an optional value
///
/// The first standalone `is` (any case, whitespace on both sides) separates
/// the two; everything after it is the value.
pub fn parse_remember(args: &str) -> (String, Option<String>) {
    let args = args.trim();
    let lower = args.to_ascii_lowercase();

    let split = lower.match_indices("is").map(|(i, _)| i).find(|&i| {
        let before = args[..i].chars().next_back();
        let after = args[i + 2..].chars().next();
        before.is_some_and(char::is_whitespace) && after.is_some_and(char::is_whitespace)
    });

    match split {
        Some(i) => {
            let key = args[..i].trim().to_string();
            let value = args[i + 2..].trim().to_string();
            (key, Some(value).filter(|v| !v.is_empty()))
        }
        None => (args.to_string(), None),
    }
}

/// Memories stored case-insensitively by key
pub struct MemoryBook {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl MemoryBook {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Store `value` under `key` unless something is already there
    pub async fn remember(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        let stored_key = normalize_key(key)?;

        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.get(&stored_key).await? {
            return Err(MemoryError::AlreadyKnown {
                key: key.to_string(),
                value: existing,
            });
        }

        self.store
            .put(&stored_key, Value::String(value.trim().to_string()))
            .await?;
        info!("Remembered `{}`", stored_key);
        Ok(())
    }

    pub async fn recall(&self, key: &str) -> Result<String> {
        let stored_key = normalize_key(key)?;
        self.get(&stored_key)
            .await?
            .ok_or_else(|| MemoryError::Unknown(key.trim().to_string()))
    }

    /// Drop the memory under `key`, returning what it held
    pub async fn forget(&self, key: &str) -> Result<String> {
        let stored_key = normalize_key(key)?;

        let _guard = self.write_lock.lock().await;
        let value = self
            .get(&stored_key)
            .await?
            .ok_or_else(|| MemoryError::Unknown(key.trim().to_string()))?;

        self.store.delete(&stored_key).await?;
        info!("Forgot `{}`", stored_key);
        Ok(value)
    }

    /// Every remembered key, sorted
    pub async fn memories(&self) -> Result<Vec<String>> {
        let mut keys = self.store.keys().await?;
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, stored_key: &str) -> Result<Option<String>> {
        match self.store.get(stored_key).await? {
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(MemoryError::Corrupt {
                key: stored_key.to_string(),
            }),
            None => Ok(None),
        }
    }
}

fn normalize_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(MemoryError::EmptyKey);
    }
    Ok(key.to_lowercase())
}
