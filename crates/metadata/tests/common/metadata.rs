//! Metadata store test utilities.

use sitegate_metadata::{MetadataResult, MetadataStore, SqliteStore};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tempfile::TempDir;

/// A test metadata store wrapper that cleans up on drop.
#[allow(dead_code)]
pub struct TestMetadata {
    pub store: Arc<dyn MetadataStore>,
    pub(crate) sqlite_store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

impl TestMetadata {
    /// Create a new test metadata store backed by a temporary file.
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = Arc::new(SqliteStore::new(&db_path, None).await?);

        Ok(Self {
            store: store.clone(),
            sqlite_store: store,
            _temp_dir: temp_dir,
        })
    }

    /// Get a reference to the metadata store.
    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.store.clone()
    }

    /// Get a reference to the SQLite connection pool for raw queries.
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite_store.pool()
    }

    /// Create an entity table with an `id` key and a nullable `domain_id`.
    #[allow(dead_code)]
    pub async fn create_entity_table(&self, table: &str, ids: &[&str]) {
        sqlx::query(&format!(
            r#"CREATE TABLE "{table}" (id TEXT PRIMARY KEY, title TEXT, domain_id TEXT)"#
        ))
        .execute(self.pool())
        .await
        .expect("Failed to create entity table");

        for id in ids {
            sqlx::query(&format!(r#"INSERT INTO "{table}" (id, title) VALUES (?, ?)"#))
                .bind(id)
                .bind(format!("{table} {id}"))
                .execute(self.pool())
                .await
                .expect("Failed to insert entity row");
        }
    }

    /// Read the stored domain_id of one entity row.
    #[allow(dead_code)]
    pub async fn entity_domain_id(&self, table: &str, id: &str) -> Option<String> {
        sqlx::query_scalar(&format!(r#"SELECT domain_id FROM "{table}" WHERE id = ?"#))
            .bind(id)
            .fetch_one(self.pool())
            .await
            .expect("Failed to read entity row")
    }
}
