//! Domain filter mappings for persisted entity types.
//!
//! Each entity type that participates in domain filtering declares a
//! [`DomainFilter`]. The declarations are collected once at boot into an
//! immutable [`MappingRegistry`]; a declaration whose entity type lacks the
//! required domain accessors is rejected while the registry is built.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a persisted entity type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(Cow<'static, str>);

impl EntityKind {
    pub const fn from_static(kind: &'static str) -> Self {
        Self(Cow::Borrowed(kind))
    }

    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declarative domain filter metadata for one entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    /// The entity carries a single domain identifier that is populated automatically.
    #[serde(default)]
    pub auto_domain_id: bool,
    /// The entity applies to every domain.
    #[serde(default)]
    pub for_all_domain_enabled: bool,
    /// Stamp the identifier automatically instead of leaving it to application code.
    #[serde(default = "default_auto_attachement")]
    pub auto_attachement: bool,
}

fn default_auto_attachement() -> bool {
    true
}

impl DomainFilter {
    pub const fn new(auto_domain_id: bool, for_all_domain_enabled: bool) -> Self {
        Self {
            auto_domain_id,
            for_all_domain_enabled,
            auto_attachement: true,
        }
    }
}

impl Default for DomainFilter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Domain accessors an entity type exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityCapabilities {
    /// Single domain identifier accessors.
    pub domain_id: bool,
    /// Domain identifier set accessors.
    pub domain_ids: bool,
}

/// Compile-time declaration of an entity type's domain filter.
pub trait DomainFilterable {
    const KIND: EntityKind;
    const FILTER: DomainFilter;
    const CAPABILITIES: EntityCapabilities;
    /// Backing table, when attachments are persisted through the metadata store.
    const TABLE: Option<&'static str> = None;
}

/// Runtime declaration of an entity type, as loaded from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub filter: DomainFilter,
    pub capabilities: EntityCapabilities,
    pub table: Option<String>,
}

/// Validated domain filter policy of one entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainFilterMapping {
    kind: EntityKind,
    auto_domain_id: bool,
    for_all_domain_enabled: bool,
    auto_attachement: bool,
    table: Option<String>,
}

impl DomainFilterMapping {
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn auto_domain_id(&self) -> bool {
        self.auto_domain_id
    }

    pub fn for_all_domain_enabled(&self) -> bool {
        self.for_all_domain_enabled
    }

    pub fn auto_attachement(&self) -> bool {
        self.auto_attachement
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

/// Check that `name` is safe to splice into SQL as an identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid && name.len() <= 64 {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid table identifier '{name}'")))
    }
}

/// Collects entity declarations and validates them.
#[derive(Debug, Default)]
pub struct MappingRegistryBuilder {
    mappings: HashMap<EntityKind, DomainFilterMapping>,
}

impl MappingRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type declared in code.
    pub fn register<T: DomainFilterable>(self) -> Result<Self> {
        self.register_descriptor(EntityDescriptor {
            kind: T::KIND,
            filter: T::FILTER,
            capabilities: T::CAPABILITIES,
            table: T::TABLE.map(str::to_string),
        })
    }

    /// Register a runtime declaration.
    pub fn register_descriptor(mut self, descriptor: EntityDescriptor) -> Result<Self> {
        let EntityDescriptor {
            kind,
            filter,
            capabilities,
            table,
        } = descriptor;

        if self.mappings.contains_key(&kind) {
            return Err(Error::Config(format!(
                "{kind} has more than one domain filter declaration"
            )));
        }

        if filter.auto_domain_id {
            if !capabilities.domain_id {
                return Err(Error::Config(format!(
                    "{kind} has a domain filter but does not expose a domain_id accessor"
                )));
            }
        } else if !filter.for_all_domain_enabled && !capabilities.domain_ids {
            return Err(Error::Config(format!(
                "{kind} has a domain filter but does not expose a domain_ids accessor"
            )));
        }

        if let Some(table) = table.as_deref() {
            validate_identifier(table)?;
        }

        let mapping = DomainFilterMapping {
            kind: kind.clone(),
            auto_domain_id: filter.auto_domain_id,
            for_all_domain_enabled: filter.for_all_domain_enabled,
            auto_attachement: filter.auto_attachement,
            table,
        };
        self.mappings.insert(kind, mapping);
        Ok(self)
    }

    pub fn build(self) -> MappingRegistry {
        MappingRegistry {
            mappings: self.mappings,
        }
    }
}

/// Immutable registry of domain filter mappings keyed by entity kind.
#[derive(Debug, Default)]
pub struct MappingRegistry {
    mappings: HashMap<EntityKind, DomainFilterMapping>,
}

impl MappingRegistry {
    pub fn builder() -> MappingRegistryBuilder {
        MappingRegistryBuilder::new()
    }

    pub fn get(&self, kind: &EntityKind) -> Option<&DomainFilterMapping> {
        self.mappings.get(kind)
    }

    pub fn table_for(&self, kind: &EntityKind) -> Option<&str> {
        self.get(kind).and_then(DomainFilterMapping::table)
    }

    /// Mappings sorted by kind.
    pub fn iter(&self) -> impl Iterator<Item = &DomainFilterMapping> {
        let mut mappings: Vec<_> = self.mappings.values().collect();
        mappings.sort_by(|a, b| a.kind.cmp(&b.kind));
        mappings.into_iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Capability of a persisted object to take part in domain attachment.
pub trait DomainEntity {
    fn entity_kind(&self) -> EntityKind;

    /// Primary key of the object in its backing table.
    fn entity_id(&self) -> String;

    fn domain_id(&self) -> Option<&str>;

    fn set_domain_id(&mut self, domain_id: Option<String>);

    /// Children that inherit the parent's domain attachment.
    fn children_mut(&mut self) -> Vec<&mut dyn DomainEntity> {
        Vec::new()
    }

    /// Canonical record when this object is a translation of it.
    fn translation_master_mut(&mut self) -> Option<&mut dyn DomainEntity> {
        None
    }
}
