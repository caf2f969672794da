//! Request-scoped domain resolution for sitegate.
//!
//! [`DomainsManagement`] indexes the enabled domains once per request,
//! resolves the domain serving the request host, answers identifier,
//! keyname and sentinel lookups, and stamps domain identifiers onto
//! domain-aware entities. Tagged entities are persisted with
//! [`flush_attachments`].

pub mod attachment;
pub mod error;
pub mod management;
pub mod persist;
pub mod request;

pub use attachment::{AttachedEntity, AttachmentBatch};
pub use error::{TenancyError, TenancyResult};
pub use management::DomainsManagement;
pub use persist::{MigrationReport, TableMigration, flush_attachments, migrate_attachments};
pub use request::{RequestInfo, negotiate_language, normalize_host};
