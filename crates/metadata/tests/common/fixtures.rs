//! Domain fixtures.

use sitegate_core::{Domain, DomainId};
use sitegate_metadata::DomainRow;

/// Enabled master domain.
#[allow(dead_code)]
pub fn master_domain(host: &str, name: &str) -> Domain {
    let mut domain = Domain::new(host, name);
    domain.is_master = true;
    domain
}

/// Virtual environment alias of `master`.
#[allow(dead_code)]
pub fn env_domain(master: &Domain, host: &str, env: &str) -> Domain {
    let mut domain = Domain::new(host, format!("{} {env}", master.label()));
    domain.master_id = Some(master.id.clone());
    domain.is_virtual = true;
    domain.domain_env = env.to_string();
    domain
}

/// Virtual translation of `master`.
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
pub fn row(domain: &Domain) -> DomainRow {
    DomainRow::from(domain)
}

#[allow(dead_code)]
pub fn ids(rows: &[DomainRow]) -> Vec<DomainId> {
    rows.iter().map(|r| DomainId::new(r.domain_id.clone())).collect()
}
