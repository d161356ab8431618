//! Key/value persistence for linkbot plugins
//!
//! Each plugin owns a namespace. Values are JSON documents, keys are
//! returned in the order they were first written.

mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info};

/// Storage interface injected into the plugins
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Insert or replace the value under `key`. Replacing keeps the key's position.
    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Delete `key`, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// All keys, oldest first
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Persistence service for storing plugin data in SQLite
#[derive(Clone)]
pub struct PersistenceService {
    pool: SqlitePool,
}

impl PersistenceService {
    /// Create a new persistence service
    pub async fn new(database_path: &str) -> Result<Self> {
        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = SqlitePool::connect(&database_url).await?;

        let service = Self { pool };
        service.run_migrations().await?;

        info!("Persistence service initialized with database: {}", database_path);
        Ok(service)
    }

    /// Create a service backed by a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        let pool = in_memory_pool_options().connect("sqlite::memory:").await?;

        let service = Self { pool };
        service.run_migrations().await?;
        Ok(service)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (namespace, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// A store view restricted to one namespace
    pub fn namespace(&self, namespace: impl Into<String>) -> SqliteStore {
        SqliteStore {
            pool: self.pool.clone(),
            namespace: namespace.into(),
        }
    }

    /// Close the underlying pool, waiting for in-flight queries
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// SQLite-backed [`KeyValueStore`] for a single namespace
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteStore {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_store WHERE namespace = ? AND key = ?")
                .bind(&self.namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;

        sqlx::query(
            r#"
            INSERT INTO kv_store (namespace, key, value)
            VALUES (?, ?, ?)
            ON CONFLICT (namespace, key)
            DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        debug!(namespace = %self.namespace, key, "Stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(namespace = %self.namespace, key, "Deleted value");
        Ok(result.rows_affected() > 0)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store WHERE namespace = ? ORDER BY seq")
            .bind(&self.namespace)
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

/// Pool settings for `sqlite::memory:`
///
/// The in-memory database lives only while a connection to it is open, so the
/// single connection is never reaped for idleness or age.
fn in_memory_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
}
