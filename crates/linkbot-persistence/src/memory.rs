use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::KeyValueStore;

/// In-process [`KeyValueStore`], used when no database is wanted and in tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<(String, Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(k, _)| k.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_behaves_like_sqlite() {
        let store = MemoryStore::new();

        store.put("b", json!(1)).await.unwrap();
        store.put("a", json!(2)).await.unwrap();
        store.put("b", json!(3)).await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["b", "a"]);
        assert_eq!(store.get("b").await.unwrap(), Some(json!(3)));
        assert!(store.delete("b").await.unwrap());
        assert!(!store.delete("b").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["a"]);
    }
}
