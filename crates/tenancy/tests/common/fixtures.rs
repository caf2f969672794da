//! Domain and entity fixtures.

use sitegate_core::{
    Domain, DomainEntity, DomainFilter, DomainFilterable, EntityCapabilities, EntityKind,
    MappingRegistry,
};
use std::sync::Arc;

#[allow(dead_code)]
pub fn master_domain(host: &str, name: &str) -> Domain {
    let mut domain = Domain::new(host, name);
    domain.is_master = true;
    domain
}

#[allow(dead_code)]
pub fn env_domain(master: &Domain, host: &str, env: &str) -> Domain {
    let mut domain = Domain::new(host, format!("{} {env}", master.label()));
    domain.master_id = Some(master.id.clone());
    domain.is_virtual = true;
    domain.domain_env = env.to_string();
    domain
}

#[allow(dead_code)]
pub fn translation_domain(master: &Domain, host: &str, language: &str) -> Domain {
    let mut domain = Domain::new(host, format!("{} {language}", master.label()));
    domain.master_id = Some(master.id.clone());
    domain.is_virtual = true;
    domain.is_translate = true;
    domain.language = Some(language.to_string());
    domain
}

#[allow(dead_code)]
pub fn redirect_domain(host: &str, target: &str) -> Domain {
    let mut domain = Domain::new(host, format!("Redirect {host}"));
    domain.redirect_url = Some(target.to_string());
    domain
}

/// Page with nested blocks; tagged automatically.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub id: String,
    pub domain_id: Option<String>,
    pub blocks: Vec<Block>,
    pub translations: Vec<PageTranslation>,
}

impl DomainFilterable for Page {
    const KIND: EntityKind = EntityKind::from_static("page");
    const FILTER: DomainFilter = DomainFilter::new(true, false);
    const CAPABILITIES: EntityCapabilities = EntityCapabilities {
        domain_id: true,
        domain_ids: false,
    };
    const TABLE: Option<&'static str> = Some("pages");
}

impl DomainEntity for Page {
    fn entity_kind(&self) -> EntityKind {
        Self::KIND
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }

    fn set_domain_id(&mut self, domain_id: Option<String>) {
        self.domain_id = domain_id;
    }

    fn children_mut(&mut self) -> Vec<&mut dyn DomainEntity> {
        self.blocks
            .iter_mut()
            .map(|b| b as &mut dyn DomainEntity)
            .collect()
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub id: String,
    pub domain_id: Option<String>,
}

impl DomainFilterable for Block {
    const KIND: EntityKind = EntityKind::from_static("block");
    const FILTER: DomainFilter = DomainFilter::new(true, false);
    const CAPABILITIES: EntityCapabilities = EntityCapabilities {
        domain_id: true,
        domain_ids: false,
    };
    const TABLE: Option<&'static str> = Some("blocks");
}

impl DomainEntity for Block {
    fn entity_kind(&self) -> EntityKind {
        Self::KIND
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }

    fn set_domain_id(&mut self, domain_id: Option<String>) {
        self.domain_id = domain_id;
    }
}

/// Translation of a page; owns no tag of its own.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct PageTranslation {
    pub id: String,
    pub language: String,
    pub master: Option<Box<Page>>,
}

impl DomainEntity for PageTranslation {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::from_static("page_translation")
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn domain_id(&self) -> Option<&str> {
        None
    }

    fn set_domain_id(&mut self, _domain_id: Option<String>) {}

    fn translation_master_mut(&mut self) -> Option<&mut dyn DomainEntity> {
        self.master.as_deref_mut().map(|p| p as &mut dyn DomainEntity)
    }
}

/// Entity without a domain filter.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    pub id: String,
    pub domain_id: Option<String>,
}

impl DomainEntity for AuditLog {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::from_static("audit_log")
    }

    fn entity_id(&self) -> String {
        self.id.clone()
    }

    fn domain_id(&self) -> Option<&str> {
        self.domain_id.as_deref()
    }

    fn set_domain_id(&mut self, domain_id: Option<String>) {
        self.domain_id = domain_id;
    }
}

#[allow(dead_code)]
pub fn page(id: &str, blocks: &[&str]) -> Page {
    Page {
        id: id.to_string(),
        domain_id: None,
        blocks: blocks
            .iter()
            .map(|b| Block {
                id: b.to_string(),
                domain_id: None,
            })
            .collect(),
        translations: Vec::new(),
    }
}

/// Registry with pages and blocks.
#[allow(dead_code)]
pub fn registry() -> Arc<MappingRegistry> {
    Arc::new(
        MappingRegistry::builder()
            .register::<Page>()
            .expect("page mapping")
            .register::<Block>()
            .expect("block mapping")
            .build(),
    )
}
