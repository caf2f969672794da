//! Metadata store abstraction and implementations for sitegate.
//!
//! This crate provides the persistence side of domain resolution:
//! - Domain lookup queries used while resolving a request
//! - Domain administration (create, update, delete)
//! - Domain attachment writes on entity tables

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{DomainRow, EntityAttachmentRow};
pub use repos::{AttachmentRepo, DomainRepo};
pub use store::{MetadataStore, SqliteStore};

use sitegate_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *query_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
