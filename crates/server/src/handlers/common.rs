//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestDomains;
use axum::extract::Request;
use serde::Serialize;
use sitegate_core::Domain;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Domain as returned by the API.
#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub domain_id: String,
    pub master_id: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub keyname: Option<String>,
    pub label: String,
    pub domain_env: String,
    pub favicon: Option<String>,
    pub logo: Option<String>,
    pub scheme: String,
    pub base_url: Option<String>,
    pub is_master: bool,
    pub is_enabled: bool,
    pub is_virtual: bool,
    pub is_translate: bool,
    pub redirect_url: Option<String>,
    pub redirect_with_uri: bool,
    pub one_page: bool,
    pub language: Option<String>,
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
}

fn format_timestamp(value: OffsetDateTime, field: &str) -> ApiResult<String> {
    value
        .format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format {field}: {e}")))
}

pub fn domain_to_response(domain: &Domain) -> ApiResult<DomainResponse> {
    Ok(DomainResponse {
        domain_id: domain.id.to_string(),
        master_id: domain.master_id.as_ref().map(ToString::to_string),
        host: domain.host.clone(),
        name: domain.name.clone(),
        keyname: domain.keyname().map(str::to_string),
        label: domain.label().to_string(),
        domain_env: domain.domain_env.clone(),
        favicon: domain.favicon.clone(),
        logo: domain.logo.clone(),
        scheme: domain.scheme.to_string(),
        base_url: domain.base_url(),
        is_master: domain.is_master,
        is_enabled: domain.is_enabled,
        is_virtual: domain.is_virtual,
        is_translate: domain.is_translate,
        redirect_url: domain.redirect_url.clone(),
        redirect_with_uri: domain.redirect_with_uri,
        one_page: domain.one_page,
        language: domain.language.clone(),
        position: domain.position,
        created_at: format_timestamp(domain.created_at, "created_at")?,
        updated_at: format_timestamp(domain.updated_at, "updated_at")?,
    })
}

pub fn domains_to_response<'a>(
    domains: impl IntoIterator<Item = &'a Domain>,
) -> ApiResult<Vec<DomainResponse>> {
    domains.into_iter().map(domain_to_response).collect()
}

/// Domain resolution service installed by the domain middleware.
pub fn request_domains(req: &Request) -> ApiResult<RequestDomains> {
    req.extensions()
        .get::<RequestDomains>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("domain middleware did not run".to_string()))
}
