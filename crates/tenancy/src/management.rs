//! Request-scoped domain index, resolution and entity tagging.

use crate::attachment::{AttachedEntity, AttachmentBatch};
use crate::error::{TenancyError, TenancyResult};
use crate::request::RequestInfo;
use sitegate_core::{
    DOMAIN_ID_FOR_ALL_DOMAINS, DOMAIN_ID_MASTER, Domain, DomainEntity, DomainId, DomainRef,
    DomainSet, MappingRegistry,
};
use sitegate_metadata::DomainRepo;
use sitegate_metadata::models::rows_into_domains;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup tables built from the enabled domains of one request.
#[derive(Debug, Default)]
struct DomainIndex {
    /// Stored records first (position order), then the transient ones.
    domains: DomainSet,
    /// Number of stored records at the front of `domains`.
    stored: usize,
    keynames: HashMap<String, DomainId>,
    without_virtual: Vec<DomainId>,
    masters: Vec<DomainId>,
    domain_master: Option<DomainId>,
    current: Option<DomainId>,
    current_with_virtual: Option<DomainId>,
    /// Master of the matched virtual domain when it is not enabled.
    unindexed_master: Option<DomainId>,
    filter_domain_id: Option<DomainId>,
    base_urls: HashMap<DomainId, String>,
}

impl DomainIndex {
    fn build(
        records: Vec<Domain>,
        domain_for_all: Domain,
        request_host: Option<&str>,
        detect_host: bool,
    ) -> Self {
        let mut index = Self {
            stored: records.len(),
            ..Self::default()
        };
        let mut matched_host: Option<DomainId> = None;

        for domain in records {
            let id = domain.id.clone();

            // The last record serving the host wins.
            if detect_host
                && let (Some(host), Some(domain_host)) = (request_host, domain.host.as_deref())
                && host.eq_ignore_ascii_case(domain_host)
            {
                matched_host = Some(id.clone());
            }

            // First master in position order wins; later ones are ignored.
            if index.domain_master.is_none() && domain.is_master {
                index.domain_master = Some(id.clone());
                index.keynames.insert(DOMAIN_ID_MASTER.to_string(), id.clone());
                index.filter_domain_id = Some(id.clone());
            }

            if !domain.is_redirect() {
                if !domain.is_virtual {
                    index.without_virtual.push(id.clone());
                    if domain.is_master {
                        index.masters.push(id.clone());
                    }
                }
                if let Some(keyname) = domain.keyname() {
                    index.keynames.insert(keyname.to_string(), id.clone());
                }
                if let Some(base_url) = domain.base_url() {
                    index.base_urls.insert(id.clone(), base_url);
                }
            }

            index.domains.insert(domain);
        }

        // A virtual domain serving the host stands in for its master.
        if let Some(matched) = matched_host
            && let Some(view) = index.domains.view(matched.as_str())
        {
            let domain = view.domain();
            match (view.master(), &domain.master_id) {
                (Some(master), _) if domain.is_virtual => {
                    index.current = Some(master.domain().id.clone());
                }
                (None, Some(master_id)) if domain.is_virtual => {
                    index.unindexed_master = Some(master_id.clone());
                }
                _ => index.current = Some(matched.clone()),
            }
            index.current_with_virtual = Some(matched);
        }

        index
            .keynames
            .insert(DOMAIN_ID_FOR_ALL_DOMAINS.to_string(), domain_for_all.id.clone());
        index.domains.insert(domain_for_all);

        if index.domain_master.is_none() {
            let mut master = Domain::virtual_domain(DOMAIN_ID_MASTER, request_host);
            master.is_master = true;
            let id = master.id.clone();

            tracing::warn!(
                host = ?request_host,
                "no enabled master domain stored, using a synthesized master"
            );

            index.keynames.insert(DOMAIN_ID_MASTER.to_string(), id.clone());
            index.domain_master = Some(id.clone());
            index.current = Some(id.clone());
            if index.current_with_virtual.is_none() {
                index.current_with_virtual = Some(id.clone());
            }
            index.filter_domain_id = Some(id.clone());
            index.without_virtual.push(id);
            index.domains.insert(master);
        }

        index
    }

    fn get(&self, id: &DomainId) -> Option<&Domain> {
        self.domains.get(id.as_str())
    }

    fn ids<'a>(&'a self, ids: &'a [DomainId]) -> impl Iterator<Item = &'a Domain> + 'a {
        ids.iter().filter_map(|id| self.get(id))
    }
}

/// Domain resolution service owned by a single request.
///
/// The index is built by [`initialize`](Self::initialize) with one storage
/// query and never rebuilt. Until then every lookup reports absence.
pub struct DomainsManagement {
    repo: Arc<dyn DomainRepo>,
    registry: Arc<MappingRegistry>,
    request: RequestInfo,
    domain_for_all: Domain,
    initialized: bool,
    index: DomainIndex,
    attachments: AttachmentBatch,
}

impl DomainsManagement {
    pub fn new(
        repo: Arc<dyn DomainRepo>,
        registry: Arc<MappingRegistry>,
        request: RequestInfo,
    ) -> Self {
        let domain_for_all = Domain::virtual_domain(DOMAIN_ID_FOR_ALL_DOMAINS, request.host());
        Self {
            repo,
            registry,
            request,
            domain_for_all,
            initialized: false,
            index: DomainIndex::default(),
            attachments: AttachmentBatch::new(),
        }
    }

    /// Load enabled domains and build the index.
    ///
    /// Only the first successful call queries storage. A failed call leaves
    /// the service uninitialized so it can be retried.
    #[tracing::instrument(skip(self), fields(host = ?self.request.host()))]
    pub async fn initialize(&mut self, detect_host: bool) -> TenancyResult<()> {
        if self.initialized {
            return Ok(());
        }

        let rows = self.repo.select_all_enabled_domains().await?;
        let records = rows_into_domains(rows)?;

        let mut index = DomainIndex::build(
            records,
            self.domain_for_all.clone(),
            self.request.host(),
            detect_host,
        );
        if index.current.is_none()
            && let Some(master_id) = index.unindexed_master.take()
        {
            index.current = match self.repo.get_domain(master_id.as_str()).await? {
                Some(row) => {
                    let master = row.into_domain()?;
                    tracing::debug!(
                        domain_id = %master.id,
                        "virtual domain served for a master that is not enabled"
                    );
                    let id = master.id.clone();
                    index.domains.insert(master);
                    Some(id)
                }
                // A dangling master reference is treated as no master.
                None => index.current_with_virtual.clone(),
            };
        }

        self.index = index;
        self.initialized = true;

        tracing::debug!(
            domains = self.index.stored,
            master = ?self.index.domain_master,
            current = ?self.index.current,
            "domain index built"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    /// Enabled stored domains in position order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.index.domains.iter().take(self.index.stored)
    }

    /// Non-virtual, non-redirect domains, plus the synthesized master if any.
    pub fn domains_without_virtual(&self) -> impl Iterator<Item = &Domain> {
        self.index.ids(&self.index.without_virtual)
    }

    /// Stored master domains that are neither virtual nor redirects.
    pub fn domains_master(&self) -> impl Iterator<Item = &Domain> {
        self.index.ids(&self.index.masters)
    }

    /// True when more than one tenant master is enabled.
    pub fn has_multiple_masters(&self) -> bool {
        self.index.masters.len() > 1
    }

    /// Every indexed record, including the transient ones.
    pub fn domain_set(&self) -> &DomainSet {
        &self.index.domains
    }

    // -------------------------------------------------------------------------
    // Current, master and filter domains
    // -------------------------------------------------------------------------

    /// The master domain. Always present once initialized.
    pub fn domain_master(&self) -> TenancyResult<&Domain> {
        self.index
            .domain_master
            .as_ref()
            .and_then(|id| self.index.get(id))
            .ok_or(TenancyError::NotInitialized)
    }

    /// Domain serving the request. With `without_virtual`, a virtual match
    /// is replaced by its master.
    pub fn current_domain(&self, without_virtual: bool) -> Option<&Domain> {
        let id = if without_virtual {
            self.index.current.as_ref()
        } else {
            self.index.current_with_virtual.as_ref()
        };
        id.and_then(|id| self.index.get(id))
    }

    /// Override the current domain. Returns false when the reference is unknown.
    pub fn set_current_domain(&mut self, reference: &DomainRef) -> bool {
        match self.resolve(reference).map(|domain| domain.id.clone()) {
            Some(id) => {
                self.index.current = Some(id.clone());
                self.index.current_with_virtual = Some(id);
                true
            }
            None => false,
        }
    }

    /// Language of the matched domain or its master, else the request language.
    ///
    /// A translation domain serves its own language even though it resolves
    /// to its master.
    pub fn current_language(&self) -> &str {
        [self.current_domain(false), self.current_domain(true)]
            .into_iter()
            .flatten()
            .find_map(|domain| domain.language.as_deref())
            .unwrap_or_else(|| self.request.language())
    }

    /// The record shared by every domain.
    pub fn domain_for_all(&self) -> &Domain {
        &self.domain_for_all
    }

    /// Domain stamped onto newly tagged entities.
    pub fn filter_domain_id(&self) -> Option<&DomainId> {
        self.index.filter_domain_id.as_ref()
    }

    pub fn set_filter_domain_id(&mut self, domain_id: Option<DomainId>) {
        self.index.filter_domain_id = domain_id;
    }

    pub fn filter_domain(&self) -> Option<&Domain> {
        self.filter_domain_id()
            .and_then(|id| self.resolve(&DomainRef::from(id)))
    }

    /// Absolute base URL of the referenced domain.
    pub fn base_url_by_domain_id(&self, reference: &DomainRef, without_virtual: bool) -> Option<&str> {
        let id = self.reel_domain_id(Some(reference), without_virtual)?;
        self.index.base_urls.get(&id).map(String::as_str)
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Resolve a reference to an indexed record.
    pub fn resolve(&self, reference: &DomainRef) -> Option<&Domain> {
        match reference {
            DomainRef::Current => self.current_domain(true),
            DomainRef::Master => self.domain_master().ok(),
            DomainRef::ForAllDomains => Some(&self.domain_for_all),
            DomainRef::Id(id) => {
                let id = self
                    .index
                    .keynames
                    .get(id.as_str())
                    .map(DomainId::as_str)
                    .unwrap_or(id.as_str());
                self.index.domains.get(id)
            }
        }
    }

    /// Look up by identifier, keyname or sentinel. Empty input means the
    /// current domain.
    pub fn domain_by_id(&self, id: Option<&str>) -> Option<&Domain> {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => self.resolve(&DomainRef::parse(id)),
            None => self.current_domain(true),
        }
    }

    pub fn domain_id_by_keyname(&self, keyname: &str) -> Option<&DomainId> {
        self.index.keynames.get(keyname)
    }

    /// Look up by keyname. Empty input and unknown keynames mean the
    /// current domain.
    pub fn domain_by_keyname(&self, keyname: Option<&str>) -> Option<&Domain> {
        match keyname
            .filter(|k| !k.is_empty())
            .and_then(|k| self.domain_id_by_keyname(k))
        {
            Some(id) => self.index.get(id),
            None => self.current_domain(true),
        }
    }

    /// Concrete identifier behind a reference, defaulting to the master.
    ///
    /// `None` only when `Current` is asked for and no domain serves the request.
    pub fn reel_domain_id(
        &self,
        reference: Option<&DomainRef>,
        without_virtual: bool,
    ) -> Option<DomainId> {
        let reference = reference.cloned().unwrap_or_default();
        if reference == DomainRef::Current {
            return self
                .current_domain(without_virtual)
                .map(|domain| domain.id.clone());
        }
        let key = reference.as_key();
        Some(
            self.index
                .keynames
                .get(key)
                .cloned()
                .unwrap_or_else(|| DomainId::new(key)),
        )
    }

    // -------------------------------------------------------------------------
    // Tagging
    // -------------------------------------------------------------------------

    /// True when `entity` is attached to the referenced domain.
    pub fn object_attached_to(&self, entity: &dyn DomainEntity, reference: Option<&DomainRef>) -> bool {
        let Some(mapping) = self.registry.get(&entity.entity_kind()) else {
            return false;
        };
        if !mapping.auto_domain_id() {
            return false;
        }
        match (entity.domain_id(), self.reel_domain_id(reference, true)) {
            (Some(domain_id), Some(expected)) => domain_id == expected.as_str(),
            _ => false,
        }
    }

    /// Stamp the filter domain onto `entity` and, with `with_child`, onto
    /// its children. An existing domain identifier is never replaced.
    pub fn object_domain_attachement(
        &mut self,
        entity: &mut dyn DomainEntity,
        with_child: bool,
    ) -> &mut Self {
        let filter = self.index.filter_domain_id.clone();
        attach(
            entity,
            &self.registry,
            filter.as_ref(),
            with_child,
            &mut self.attachments,
        );
        self
    }

    /// Entities tagged so far, without draining them.
    pub fn attachments(&self) -> &AttachmentBatch {
        &self.attachments
    }

    /// Drain the tagged entities for persistence.
    pub fn take_attachments(&mut self) -> AttachmentBatch {
        std::mem::take(&mut self.attachments)
    }
}

fn attach(
    entity: &mut dyn DomainEntity,
    registry: &MappingRegistry,
    filter: Option<&DomainId>,
    with_child: bool,
    batch: &mut AttachmentBatch,
) {
    // Tags belong to the canonical record, not its translations.
    if let Some(master) = entity.translation_master_mut() {
        attach(master, registry, filter, with_child, batch);
        return;
    }

    let kind = entity.entity_kind();
    let Some(mapping) = registry.get(&kind) else {
        return;
    };

    if mapping.auto_domain_id()
        && mapping.auto_attachement()
        && let Some(filter) = filter
        && entity.domain_id().is_none_or(str::is_empty)
    {
        entity.set_domain_id(Some(filter.to_string()));
        tracing::trace!(
            kind = %kind,
            entity_id = %entity.entity_id(),
            domain_id = %filter,
            "entity attached to domain"
        );
    }

    if with_child {
        for child in entity.children_mut() {
            attach(child, registry, filter, true, batch);
        }
    }

    batch.push(AttachedEntity {
        entity_id: entity.entity_id(),
        domain_id: entity
            .domain_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        kind,
    });
}
