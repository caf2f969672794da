//! HTTP request handlers.

pub mod admin;
pub mod common;
pub mod domains;

pub use admin::{
    attach_entity, create_domain, delete_domain, get_domain as admin_get_domain,
    list_domains as admin_list_domains, migrate_attachments_handler, update_domain,
};
pub use common::*;
pub use domains::*;
