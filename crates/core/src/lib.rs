//! Core domain types and shared logic for sitegate.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Domain records, identifiers and sentinel references
//! - The domain arena and its master/virtual relations
//! - Domain filter mappings of persisted entity types
//! - Application configuration

pub mod config;
pub mod domain;
pub mod domain_set;
pub mod error;
pub mod mapping;

pub use domain::{
    DEFAULT_DOMAIN_ENV, DOMAIN_ID_CURRENT, DOMAIN_ID_FOR_ALL_DOMAINS, DOMAIN_ID_MASTER, Domain,
    DomainId, DomainRef, Scheme, is_reserved_id, slugify,
};
pub use domain_set::{DomainSet, DomainView};
pub use error::{Error, Result};
pub use mapping::{
    DomainEntity, DomainFilter, DomainFilterMapping, DomainFilterable, EntityCapabilities,
    EntityDescriptor, EntityKind, MappingRegistry, MappingRegistryBuilder, validate_identifier,
};
