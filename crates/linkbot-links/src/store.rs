//! Trigger store
//!
//! Owns every trigger, keeps them in insertion order and writes each change
//! through to the injected [`KeyValueStore`] before it becomes visible.
//! Mutations hold the write guard across the whole read-modify-persist
//! sequence so concurrent commands against the same key cannot lose updates.

use linkbot_persistence::KeyValueStore;
use linkbot_types::{Removal, TriggerListing, TriggerRecord};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{LinkError, Result};
use crate::pattern::{canonical_key, Pattern};
use crate::trigger::{clean_targets, Trigger};

/// Trigger store backed by a key/value namespace
pub struct TriggerStore {
    store: Arc<dyn KeyValueStore>,
    triggers: RwLock<Vec<Trigger>>,
}

impl TriggerStore {
    /// Load every persisted trigger, in the order the backend returns keys
    ///
    /// Records that no longer decode or compile are skipped with a warning.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut triggers = Vec::new();

        for key in store.keys().await? {
            let Some(value) = store.get(&key).await? else {
                continue;
            };

            match decode(&key, value) {
                Ok(trigger) if trigger.key() != key => {
                    warn!(
                        "Skipping trigger stored under `{}`: its pattern normalizes to `{}`",
                        key,
                        trigger.key()
                    );
                }
                Ok(trigger) if trigger.targets().is_empty() => {
                    warn!("Skipping trigger `{}` with no targets", key);
                }
                Ok(trigger) => triggers.push(trigger),
                Err(e) => warn!("Skipping trigger `{}`: {}", key, e),
            }
        }

        info!("Loaded {} link triggers", triggers.len());
        Ok(Self {
            store,
            triggers: RwLock::new(triggers),
        })
    }

    /// Add targets to the trigger for `raw_pattern`, creating it if needed
    pub async fn add<I, S>(&self, raw_pattern: &str, targets: I) -> Result<TriggerListing>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw_pattern = raw_pattern.trim();
        if raw_pattern.is_empty() {
            return Err(LinkError::EmptyPattern);
        }

        let targets = clean_targets(targets);
        if targets.is_empty() {
            return Err(LinkError::Usage(format!(
                "no targets given for `{raw_pattern}`"
            )));
        }

        let pattern = Pattern::parse(raw_pattern)?;
        let key = pattern.key();

        let mut triggers = self.triggers.write().await;
        let position = triggers.iter().position(|t| t.key() == key);

        let mut trigger = match position {
            Some(i) => triggers[i].clone(),
            None => Trigger::new(raw_pattern, pattern),
        };
        trigger.add_targets(targets);

        self.persist(&trigger).await?;
        let listing = trigger.listing();

        match position {
            Some(i) => triggers[i] = trigger,
            None => triggers.push(trigger),
        }

        info!(
            "Trigger `{}` now has {} targets",
            listing.pattern,
            listing.targets.len()
        );
        Ok(listing)
    }

    /// Remove a whole trigger by key, or else a target value from every trigger
    pub async fn remove(&self, query: &str) -> Result<Vec<Removal>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LinkError::Usage("nothing to remove".to_string()));
        }

        let mut triggers = self.triggers.write().await;

        if let Some(i) = key_position(&triggers, query) {
            let key = triggers[i].key().to_string();
            self.store.delete(&key).await?;
            let trigger = triggers.remove(i);

            info!("Removed trigger `{}`", key);
            return Ok(vec![Removal {
                pattern: key,
                removed_targets: trigger.targets().to_vec(),
                trigger_deleted: true,
            }]);
        }

        let mut removals = Vec::new();
        let mut i = 0;
        while i < triggers.len() {
            if !triggers[i].has_target(query) {
                i += 1;
                continue;
            }

            let mut trigger = triggers[i].clone();
            trigger.remove_target(query);
            let key = trigger.key().to_string();
            let trigger_deleted = trigger.targets().is_empty();

            if trigger_deleted {
                self.store.delete(&key).await?;
                triggers.remove(i);
            } else {
                self.persist(&trigger).await?;
                triggers[i] = trigger;
                i += 1;
            }

            info!("Removed `{}` from trigger `{}`", query, key);
            removals.push(Removal {
                pattern: key,
                removed_targets: vec![query.to_string()],
                trigger_deleted,
            });
        }

        if removals.is_empty() {
            return Err(LinkError::NotFound(query.to_string()));
        }
        Ok(removals)
    }

    /// All triggers in insertion order
    pub async fn list(&self) -> Vec<TriggerListing> {
        let triggers = self.triggers.read().await;
        triggers.iter().map(Trigger::listing).collect()
    }

    /// Exact lookup by normalized key
    ///
    /// The trimmed text is compared literally first, then in its own
    /// normalized form, so `SIMPLE   PHRASE` finds `simple phrase`.
    pub async fn find_by_key(&self, text: &str) -> Option<TriggerListing> {
        let triggers = self.triggers.read().await;
        key_position(&triggers, text).map(|i| triggers[i].listing())
    }

    /// First trigger, in insertion order, whose pattern matches `text`
    pub async fn find_by_match(&self, text: &str, fullmatch: bool) -> Option<TriggerListing> {
        let triggers = self.triggers.read().await;
        triggers
            .iter()
            .find(|t| t.is_match(text, fullmatch))
            .map(Trigger::listing)
    }

    /// Reply for an inbound message, if any trigger matches it
    pub async fn resolve(&self, text: &str) -> Option<String> {
        let triggers = self.triggers.read().await;
        pick_reply(&triggers, text, &mut rand::thread_rng())
    }

    /// [`TriggerStore::resolve`] with a caller-supplied random source
    pub async fn resolve_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Option<String> {
        let triggers = self.triggers.read().await;
        pick_reply(&triggers, text, rng)
    }

    pub async fn len(&self) -> usize {
        self.triggers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.triggers.read().await.is_empty()
    }

    async fn persist(&self, trigger: &Trigger) -> Result<()> {
        let value = encode(trigger)?;
        self.store.put(trigger.key(), value).await?;
        Ok(())
    }
}

fn encode(trigger: &Trigger) -> Result<Value> {
    trigger.to_record().to_value().map_err(|source| LinkError::Record {
        key: trigger.key().to_string(),
        source,
    })
}

fn decode(key: &str, value: Value) -> Result<Trigger> {
    let record = TriggerRecord::from_value(value).map_err(|source| LinkError::Record {
        key: key.to_string(),
        source,
    })?;
    Trigger::from_record(record)
}

fn key_position(triggers: &[Trigger], text: &str) -> Option<usize> {
    let text = text.trim();
    if let Some(i) = triggers.iter().position(|t| t.key() == text) {
        return Some(i);
    }

    let normalized = canonical_key(text)?;
    triggers.iter().position(|t| t.key() == normalized)
}

fn pick_reply<R: Rng + ?Sized>(triggers: &[Trigger], text: &str, rng: &mut R) -> Option<String> {
    let trigger = match key_position(triggers, text) {
        Some(i) => &triggers[i],
        None => triggers.iter().find(|t| t.is_match(text, false))?,
    };

    debug!("Message matched trigger `{}`", trigger.key());
    trigger.random_target(rng).map(str::to_string)
}
