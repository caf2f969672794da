//! Domain lookup repository.

use crate::error::MetadataResult;
use crate::models::DomainRow;
use async_trait::async_trait;

/// Repository for domain records.
///
/// The first three methods are the lookup contract used while resolving a
/// request; the rest back the administration endpoints.
#[async_trait]
pub trait DomainRepo: Send + Sync {
    /// All enabled domains ordered by position, then name.
    async fn select_all_enabled_domains(&self) -> MetadataResult<Vec<DomainRow>>;

    /// Enabled domain answering on `host`.
    ///
    /// Returns `Constraint` when more than one enabled record matches.
    async fn retrieve_by_domain(&self, host: &str) -> MetadataResult<Option<DomainRow>>;

    /// First enabled master domain.
    async fn retrieve_by_master(&self) -> MetadataResult<Option<DomainRow>>;

    /// Create a new domain.
    async fn create_domain(&self, domain: &DomainRow) -> MetadataResult<()>;

    /// List all domains, enabled or not.
    async fn list_domains(&self) -> MetadataResult<Vec<DomainRow>>;

    /// Get a domain by ID.
    async fn get_domain(&self, domain_id: &str) -> MetadataResult<Option<DomainRow>>;

    /// Get a domain by keyname.
    async fn get_domain_by_keyname(&self, keyname: &str) -> MetadataResult<Option<DomainRow>>;

    /// Replace a domain record.
    async fn update_domain(&self, domain: &DomainRow) -> MetadataResult<()>;

    /// Delete a domain by ID. Virtual domains pointing at it lose their master.
    async fn delete_domain(&self, domain_id: &str) -> MetadataResult<()>;
}
