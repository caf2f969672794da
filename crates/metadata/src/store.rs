//! Metadata store trait and implementations.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{AttachmentRepo, DomainRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: DomainRepo + AttachmentRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    ///
    /// `query_timeout_secs` bounds how long a statement waits on a locked
    /// database (default 5 seconds).
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(5);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(query_timeout_secs));

        let pool = SqlitePoolOptions::new()
            // A single connection avoids "database is locked" failures when
            // several requests write at once.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            query_timeout_secs,
            "SQLite metadata store opened"
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Validate an entity table name before splicing it into SQL.
fn checked_table(table: &str) -> MetadataResult<&str> {
    sitegate_core::validate_identifier(table)
        .map(|()| table)
        .map_err(|e| MetadataError::Config(e.to_string()))
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;

    #[async_trait]
    impl DomainRepo for SqliteStore {
        async fn select_all_enabled_domains(&self) -> MetadataResult<Vec<DomainRow>> {
            let rows = sqlx::query_as::<_, DomainRow>(
                "SELECT * FROM domains WHERE is_enabled = 1 ORDER BY position ASC, name ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn retrieve_by_domain(&self, host: &str) -> MetadataResult<Option<DomainRow>> {
            let mut rows = sqlx::query_as::<_, DomainRow>(
                "SELECT * FROM domains WHERE host = ? AND is_enabled = 1 LIMIT 2",
            )
            .bind(host)
            .fetch_all(&self.pool)
            .await?;

            if rows.len() > 1 {
                return Err(MetadataError::Constraint(format!(
                    "more than one enabled domain answers on host '{host}'"
                )));
            }
            Ok(rows.pop())
        }

        async fn retrieve_by_master(&self) -> MetadataResult<Option<DomainRow>> {
            let row = sqlx::query_as::<_, DomainRow>(
                "SELECT * FROM domains WHERE is_master = 1 AND is_enabled = 1 \
                 ORDER BY position ASC, name ASC LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn create_domain(&self, domain: &DomainRow) -> MetadataResult<()> {
            if self.get_domain(&domain.domain_id).await?.is_some() {
                return Err(MetadataError::AlreadyExists(format!(
                    "domain_id {} already exists",
                    domain.domain_id
                )));
            }
            if let Some(keyname) = domain.keyname.as_deref()
                && self.get_domain_by_keyname(keyname).await?.is_some()
            {
                return Err(MetadataError::AlreadyExists(format!(
                    "keyname '{keyname}' already exists"
                )));
            }

            sqlx::query(
                "INSERT INTO domains (domain_id, master_id, host, name, keyname, domain_env, \
                 favicon, logo, scheme, is_master, is_enabled, is_virtual, is_translate, \
                 redirect_url, redirect_with_uri, one_page, language, position, created_at, \
                 updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&domain.domain_id)
            .bind(&domain.master_id)
            .bind(&domain.host)
            .bind(&domain.name)
            .bind(&domain.keyname)
            .bind(&domain.domain_env)
            .bind(&domain.favicon)
            .bind(&domain.logo)
            .bind(&domain.scheme)
            .bind(domain.is_master)
            .bind(domain.is_enabled)
            .bind(domain.is_virtual)
            .bind(domain.is_translate)
            .bind(&domain.redirect_url)
            .bind(domain.redirect_with_uri)
            .bind(domain.one_page)
            .bind(&domain.language)
            .bind(domain.position)
            .bind(domain.created_at)
            .bind(domain.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn list_domains(&self) -> MetadataResult<Vec<DomainRow>> {
            let rows = sqlx::query_as::<_, DomainRow>(
                "SELECT * FROM domains ORDER BY position ASC, name ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn get_domain(&self, domain_id: &str) -> MetadataResult<Option<DomainRow>> {
            let row = sqlx::query_as::<_, DomainRow>("SELECT * FROM domains WHERE domain_id = ?")
                .bind(domain_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_domain_by_keyname(&self, keyname: &str) -> MetadataResult<Option<DomainRow>> {
            let row = sqlx::query_as::<_, DomainRow>("SELECT * FROM domains WHERE keyname = ?")
                .bind(keyname)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn update_domain(&self, domain: &DomainRow) -> MetadataResult<()> {
            if let Some(keyname) = domain.keyname.as_deref()
                && let Some(existing) = self.get_domain_by_keyname(keyname).await?
                && existing.domain_id != domain.domain_id
            {
                return Err(MetadataError::AlreadyExists(format!(
                    "keyname '{keyname}' already exists"
                )));
            }

            let result = sqlx::query(
                "UPDATE domains SET master_id = ?, host = ?, name = ?, keyname = ?, \
                 domain_env = ?, favicon = ?, logo = ?, scheme = ?, is_master = ?, \
                 is_enabled = ?, is_virtual = ?, is_translate = ?, redirect_url = ?, \
                 redirect_with_uri = ?, one_page = ?, language = ?, position = ?, \
                 updated_at = ? WHERE domain_id = ?",
            )
            .bind(&domain.master_id)
            .bind(&domain.host)
            .bind(&domain.name)
            .bind(&domain.keyname)
            .bind(&domain.domain_env)
            .bind(&domain.favicon)
            .bind(&domain.logo)
            .bind(&domain.scheme)
            .bind(domain.is_master)
            .bind(domain.is_enabled)
            .bind(domain.is_virtual)
            .bind(domain.is_translate)
            .bind(&domain.redirect_url)
            .bind(domain.redirect_with_uri)
            .bind(domain.one_page)
            .bind(&domain.language)
            .bind(domain.position)
            .bind(domain.updated_at)
            .bind(&domain.domain_id)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!(
                    "domain_id {} not found",
                    domain.domain_id
                )));
            }
            Ok(())
        }

        async fn delete_domain(&self, domain_id: &str) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;

            sqlx::query("UPDATE domains SET master_id = NULL WHERE master_id = ?")
                .bind(domain_id)
                .execute(&mut *tx)
                .await?;

            let result = sqlx::query("DELETE FROM domains WHERE domain_id = ?")
                .bind(domain_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the detach above.
                return Err(MetadataError::NotFound(format!(
                    "domain_id {domain_id} not found"
                )));
            }

            tx.commit().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl AttachmentRepo for SqliteStore {
        async fn table_columns(&self, table: &str) -> MetadataResult<Vec<String>> {
            let table = checked_table(table)?;
            let columns: Vec<String> =
                sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                    .bind(table)
                    .fetch_all(&self.pool)
                    .await?;

            if columns.is_empty() {
                return Err(MetadataError::NotFound(format!("table {table} not found")));
            }
            Ok(columns)
        }

        async fn get_entity_attachment(
            &self,
            table: &str,
            entity_id: &str,
        ) -> MetadataResult<Option<EntityAttachmentRow>> {
            let table = checked_table(table)?;
            let row = sqlx::query_as::<_, EntityAttachmentRow>(&format!(
                r#"SELECT id, domain_id FROM "{table}" WHERE id = ?"#
            ))
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn persist_attachment(
            &self,
            table: &str,
            entity_id: &str,
            domain_id: &str,
        ) -> MetadataResult<bool> {
            let table = checked_table(table)?;
            let result = sqlx::query(&format!(
                r#"UPDATE "{table}" SET domain_id = ? WHERE id = ?"#
            ))
            .bind(domain_id)
            .bind(entity_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        }

        async fn attach_unassigned(&self, table: &str, domain_id: &str) -> MetadataResult<u64> {
            let table = checked_table(table)?;
            let result = sqlx::query(&format!(
                r#"UPDATE "{table}" SET domain_id = ? WHERE domain_id IS NULL"#
            ))
            .bind(domain_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected())
        }
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    domain_id TEXT PRIMARY KEY,
    master_id TEXT,
    host TEXT,
    name TEXT,
    keyname TEXT,
    domain_env TEXT NOT NULL DEFAULT 'prod',
    favicon TEXT,
    logo TEXT,
    scheme TEXT NOT NULL DEFAULT 'https',
    is_master INTEGER NOT NULL DEFAULT 0,
    is_enabled INTEGER NOT NULL DEFAULT 1,
    is_virtual INTEGER NOT NULL DEFAULT 0,
    is_translate INTEGER NOT NULL DEFAULT 0,
    redirect_url TEXT,
    redirect_with_uri INTEGER NOT NULL DEFAULT 0,
    one_page INTEGER NOT NULL DEFAULT 0,
    language TEXT,
    position INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_domains_host ON domains(host);
CREATE INDEX IF NOT EXISTS idx_domains_master ON domains(master_id);
CREATE INDEX IF NOT EXISTS idx_domains_position ON domains(position, name);
CREATE UNIQUE INDEX IF NOT EXISTS idx_domains_keyname ON domains(keyname) WHERE keyname IS NOT NULL;
"#;
