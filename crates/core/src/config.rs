//! Configuration types shared across crates.

use crate::domain::{DEFAULT_DOMAIN_ENV, Scheme};
use crate::mapping::{DomainFilter, EntityKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path prefix of the administration area.
    #[serde(default = "default_admin_path_prefix")]
    pub admin_path_prefix: String,
    /// Wrap the router in an HTTP request trace layer.
    #[serde(default = "default_enable_tracing")]
    pub enable_tracing: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_enable_tracing() -> bool {
    true
}

fn default_admin_path_prefix() -> String {
    "/admin".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_path_prefix: default_admin_path_prefix(),
            enable_tracing: default_enable_tracing(),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Query timeout in seconds (advisory only - SQLite cannot force-cancel queries).
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(30)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/sitegate.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

/// Per-area gzip compression switches.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionGzipConfig {
    #[serde(default = "default_true")]
    pub admin: bool,
    #[serde(default = "default_true")]
    pub website: bool,
    #[serde(default = "default_true")]
    pub other: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CompressionGzipConfig {
    fn default() -> Self {
        Self {
            admin: true,
            website: true,
            other: true,
        }
    }
}

/// HTTP behaviour: languages, environments and compression.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Scheme used when a domain does not declare one.
    #[serde(default)]
    pub scheme: Scheme,
    /// Language used when neither the domain nor the request provides one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Supported languages. Empty means any language is accepted.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Environment this process runs in.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Valid environment names.
    #[serde(default = "default_environments")]
    pub environments: Vec<String>,
    #[serde(default)]
    pub compression_gzip: CompressionGzipConfig,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_environment() -> String {
    DEFAULT_DOMAIN_ENV.to_string()
}

fn default_environments() -> Vec<String> {
    vec![DEFAULT_DOMAIN_ENV.to_string()]
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            default_language: default_language(),
            languages: Vec::new(),
            environment: default_environment(),
            environments: default_environments(),
            compression_gzip: CompressionGzipConfig::default(),
        }
    }
}

impl HttpConfig {
    /// Validate HTTP configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if !self.environments.iter().any(|env| env == &self.environment) {
            return Err(format!(
                "http.environment '{}' is not one of http.environments {:?}",
                self.environment, self.environments
            ));
        }
        if !self.languages.is_empty() && !self.languages.contains(&self.default_language) {
            return Err(format!(
                "http.default_language '{}' is not one of http.languages {:?}",
                self.default_language, self.languages
            ));
        }
        Ok(())
    }

    /// True when `language` is accepted by this configuration.
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }
}

/// Declarative domain filter for an entity table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Entity kind used as mapping key.
    pub kind: String,
    /// Backing table; its primary key column must be `id`.
    pub table: String,
    #[serde(flatten)]
    pub filter: DomainFilter,
}

impl EntityConfig {
    pub fn entity_kind(&self) -> EntityKind {
        EntityKind::new(self.kind.clone())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Entity tables taking part in domain attachment.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses a SQLite database under `dir`.
    pub fn for_testing(dir: &std::path::Path) -> Self {
        Self {
            server: ServerConfig::default(),
            metadata: MetadataConfig::Sqlite {
                path: dir.join("sitegate.db"),
                query_timeout_secs: None,
            },
            http: HttpConfig::default(),
            entities: Vec::new(),
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.http.validate()?;
        if !self.server.admin_path_prefix.starts_with('/') {
            return Err(format!(
                "server.admin_path_prefix '{}' must start with '/'",
                self.server.admin_path_prefix
            ));
        }
        let mut kinds = std::collections::HashSet::new();
        for entity in &self.entities {
            if !kinds.insert(entity.kind.as_str()) {
                return Err(format!("entity kind '{}' is declared twice", entity.kind));
            }
        }
        Ok(())
    }
}
