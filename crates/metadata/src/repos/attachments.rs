//! Persistence of entity domain attachments.

use crate::error::MetadataResult;
use crate::models::EntityAttachmentRow;
use async_trait::async_trait;

/// Writes domain identifiers onto rows of entity tables.
///
/// Entity tables are addressed by name and must use `id` as primary key.
/// Table names are validated as SQL identifiers before use.
#[async_trait]
pub trait AttachmentRepo: Send + Sync {
    /// Column names of `table`. `NotFound` when the table does not exist.
    async fn table_columns(&self, table: &str) -> MetadataResult<Vec<String>>;

    /// Current attachment of the row `entity_id` of `table`.
    async fn get_entity_attachment(
        &self,
        table: &str,
        entity_id: &str,
    ) -> MetadataResult<Option<EntityAttachmentRow>>;

    /// Store `domain_id` on the row `entity_id` of `table`.
    ///
    /// Returns false when no such row exists.
    async fn persist_attachment(
        &self,
        table: &str,
        entity_id: &str,
        domain_id: &str,
    ) -> MetadataResult<bool>;

    /// Stamp `domain_id` on every row of `table` that has none.
    async fn attach_unassigned(&self, table: &str, domain_id: &str) -> MetadataResult<u64>;
}
