//! Read-only domain endpoints and the website entry point.

use super::common::{DomainResponse, domain_to_response, domains_to_response, request_domains};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{Locale, RequestDomains};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Extension, Path, Query, Request, State};
use serde::{Deserialize, Serialize};
use sitegate_core::DomainRef;
use sitegate_tenancy::DomainsManagement;
use std::collections::BTreeMap;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /v1/health - Health check.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.metadata.health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Response for listing the domains of the request.
#[derive(Debug, Serialize)]
pub struct ListDomainsResponse {
    pub domains: Vec<DomainResponse>,
    pub multiple_masters: bool,
}

/// GET /v1/domains - Non-virtual enabled domains.
pub async fn list_domains(
    Extension(domains): Extension<RequestDomains>,
) -> ApiResult<Json<ListDomainsResponse>> {
    let domains = domains.lock().await;
    Ok(Json(ListDomainsResponse {
        domains: domains_to_response(domains.domains_without_virtual())?,
        multiple_masters: domains.has_multiple_masters(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentDomainQuery {
    /// Return the matched virtual domain instead of its master.
    #[serde(default)]
    pub with_virtual: bool,
}

/// GET /v1/domains/current - Domain serving the request host.
pub async fn get_current_domain(
    Extension(domains): Extension<RequestDomains>,
    Query(query): Query<CurrentDomainQuery>,
) -> ApiResult<Json<DomainResponse>> {
    let domains = domains.lock().await;
    let domain = domains
        .current_domain(!query.with_virtual)
        .ok_or_else(|| no_current_domain(&domains))?;
    Ok(Json(domain_to_response(domain)?))
}

fn no_current_domain(domains: &DomainsManagement) -> ApiError {
    match domains.request().host() {
        Some(host) => ApiError::NotFound(format!("no enabled domain serves host '{host}'")),
        None => ApiError::NotFound("request has no host".to_string()),
    }
}

fn lookup<'a>(
    domains: &'a DomainsManagement,
    reference: &str,
) -> ApiResult<&'a sitegate_core::Domain> {
    domains.domain_by_id(Some(reference)).ok_or_else(|| {
        if DomainRef::parse(reference) == DomainRef::Current {
            no_current_domain(domains)
        } else {
            ApiError::NotFound(format!("domain '{reference}' not found"))
        }
    })
}

/// GET /v1/domains/{reference} - Domain by identifier, keyname or sentinel.
pub async fn get_domain(
    Extension(domains): Extension<RequestDomains>,
    Path(reference): Path<String>,
) -> ApiResult<Json<DomainResponse>> {
    let domains = domains.lock().await;
    let domain = lookup(&domains, &reference)?;
    Ok(Json(domain_to_response(domain)?))
}

/// GET /v1/domains/{reference}/env/{env} - Domain serving an environment.
pub async fn get_domain_by_env(
    State(state): State<AppState>,
    Extension(domains): Extension<RequestDomains>,
    Path((reference, env)): Path<(String, String)>,
) -> ApiResult<Json<DomainResponse>> {
    if !state.config.http.environments.contains(&env) {
        return Err(ApiError::BadRequest(format!(
            "unknown environment '{env}', expected one of {:?}",
            state.config.http.environments
        )));
    }

    let domains = domains.lock().await;
    let domain = lookup(&domains, &reference)?;
    let view = domains
        .domain_set()
        .view(domain.id.as_str())
        .ok_or_else(|| ApiError::NotFound(format!("domain '{reference}' not found")))?;
    Ok(Json(domain_to_response(view.domain_by_env(&env))?))
}

#[derive(Debug, Serialize)]
pub struct TranslationsResponse {
    pub domain_id: String,
    pub translations: BTreeMap<String, DomainResponse>,
}

/// GET /v1/domains/{reference}/translations - Translation domains by language.
pub async fn get_domain_translations(
    Extension(domains): Extension<RequestDomains>,
    Path(reference): Path<String>,
) -> ApiResult<Json<TranslationsResponse>> {
    let domains = domains.lock().await;
    let domain = lookup(&domains, &reference)?;
    let translations = match domains.domain_set().view(domain.id.as_str()) {
        Some(view) => view
            .domains_translate()
            .into_iter()
            .map(|(language, translation)| {
                Ok((language.to_string(), domain_to_response(translation)?))
            })
            .collect::<ApiResult<BTreeMap<_, _>>>()?,
        None => BTreeMap::new(),
    };

    Ok(Json(TranslationsResponse {
        domain_id: domain.id.to_string(),
        translations,
    }))
}

/// Domain context of a website request.
#[derive(Debug, Serialize)]
pub struct WebsiteContextResponse {
    pub path: String,
    pub language: String,
    pub domain: Option<DomainResponse>,
    pub master: DomainResponse,
    pub base_url: Option<String>,
}

/// Fallback for website pages: reports the domain context the page is rendered in.
pub async fn website_context(req: Request) -> ApiResult<Json<WebsiteContextResponse>> {
    let path = req.uri().path().to_string();
    let language = req
        .extensions()
        .get::<Locale>()
        .map(|locale| locale.as_str().to_string())
        .unwrap_or_default();
    let domains = request_domains(&req)?;
    let domains = domains.lock().await;

    let domain = domains
        .current_domain(false)
        .map(domain_to_response)
        .transpose()?;
    let base_url = domains
        .base_url_by_domain_id(&DomainRef::Current, false)
        .map(str::to_string);

    Ok(Json(WebsiteContextResponse {
        path,
        language,
        domain,
        master: domain_to_response(domains.domain_master()?)?,
        base_url,
    }))
}
