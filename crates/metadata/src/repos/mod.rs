//! Repository traits for metadata operations.

pub mod attachments;
pub mod domains;

pub use attachments::AttachmentRepo;
pub use domains::DomainRepo;
