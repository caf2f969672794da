//! Domain fixtures.

use sitegate_core::Domain;

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
pub fn redirect_domain(host: &str, target: &str, with_uri: bool) -> Domain {
    let mut domain = Domain::new(host, format!("Redirect {host}"));
    domain.redirect_url = Some(target.to_string());
    domain.redirect_with_uri = with_uri;
    domain
}
