//! Arena of domain records.
//!
//! Records reference their master by identifier only. Virtual children are
//! derived by scanning the arena, so there is no owning back-pointer between
//! a master and its virtual domains.

use crate::domain::{Domain, DomainId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Ordered collection of domains addressed by identifier.
#[derive(Clone, Debug, Default)]
pub struct DomainSet {
    domains: Vec<Domain>,
    index: HashMap<DomainId, usize>,
}

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set keeping the given order.
    pub fn from_domains(domains: impl IntoIterator<Item = Domain>) -> Self {
        let mut set = Self::new();
        for domain in domains {
            set.insert(domain);
        }
        set
    }

    /// Insert a record, replacing any record with the same identifier in place.
    pub fn insert(&mut self, domain: Domain) {
        match self.index.get(&domain.id) {
            Some(&slot) => self.domains[slot] = domain,
            None => {
                self.index.insert(domain.id.clone(), self.domains.len());
                self.domains.push(domain);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Domain> {
        self.index.get(id).map(|&slot| &self.domains[slot])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Domain> {
        self.index.get(id).map(|&slot| &mut self.domains[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Relational view over one record.
    pub fn view(&self, id: &str) -> Option<DomainView<'_>> {
        self.get(id).map(|domain| DomainView { set: self, domain })
    }
}

/// A domain together with the arena it lives in.
#[derive(Clone, Copy, Debug)]
pub struct DomainView<'a> {
    set: &'a DomainSet,
    domain: &'a Domain,
}

impl<'a> DomainView<'a> {
    pub fn domain(&self) -> &'a Domain {
        self.domain
    }

    /// The master record, when it is present in the arena.
    pub fn master(&self) -> Option<DomainView<'a>> {
        self.domain
            .master_id
            .as_ref()
            .filter(|master_id| **master_id != self.domain.id)
            .and_then(|master_id| self.set.view(master_id.as_str()))
    }

    /// Records whose master is this record, in arena order.
    pub fn virtuals(&self) -> impl Iterator<Item = &'a Domain> + 'a {
        let (set, domain) = (self.set, self.domain);
        let id = &domain.id;
        set.domains
            .iter()
            .filter(move |candidate| candidate.master_id.as_ref() == Some(id) && candidate.id != *id)
    }

    /// Walk up to the record owning environment policy: the first ancestor
    /// that has no master or is itself a translation.
    fn env_owner(&self) -> DomainView<'a> {
        let mut owner = *self;
        let mut visited = HashSet::new();
        visited.insert(owner.domain.id.as_str());
        while !owner.domain.is_translate {
            match owner.master() {
                Some(master) if visited.insert(master.domain.id.as_str()) => owner = master,
                _ => break,
            }
        }
        owner
    }

    /// Map of environment tag to the record serving it.
    ///
    /// Every virtual child contributes its environment; the owner's own
    /// environment always maps to the owner.
    pub fn domains_by_env(&self) -> BTreeMap<&'a str, &'a Domain> {
        let owner = self.env_owner();
        let mut by_env = BTreeMap::new();
        for virtual_domain in owner.virtuals() {
            by_env.insert(virtual_domain.domain_env.as_str(), virtual_domain);
        }
        by_env.insert(owner.domain.domain_env.as_str(), owner.domain);
        by_env
    }

    /// Record serving `env`, falling back to the owner itself.
    pub fn domain_by_env(&self, env: &str) -> &'a Domain {
        let owner = self.env_owner();
        owner
            .domains_by_env()
            .get(env)
            .copied()
            .unwrap_or(owner.domain)
    }

    /// Translation children keyed by language. Empty for virtual records.
    pub fn domains_translate(&self) -> BTreeMap<&'a str, &'a Domain> {
        if self.domain.is_virtual {
            return BTreeMap::new();
        }
        self.virtuals()
            .filter(|child| child.is_translate)
            .filter_map(|child| child.language.as_deref().map(|lang| (lang, child)))
            .collect()
    }

    pub fn domain_translate_by_language(&self, language: Option<&str>) -> Option<&'a Domain> {
        let language = language.filter(|l| !l.is_empty())?;
        self.domains_translate().get(language).copied()
    }
}
