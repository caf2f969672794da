//! Per-request domain resolution.
//!
//! Every request gets its own [`DomainsManagement`], initialized from the
//! `Host` and `Accept-Language` headers before the handler runs. Handlers
//! reach it through the [`RequestDomains`] extension.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE, HOST, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sitegate_tenancy::{DomainsManagement, RequestInfo};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Part of the application a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestArea {
    Admin,
    Website,
    Other,
}

impl RequestArea {
    /// Classify `path` given the configured admin prefix.
    pub fn from_path(path: &str, admin_prefix: &str) -> Self {
        let admin_prefix = admin_prefix.trim_end_matches('/');
        if under_prefix(path, admin_prefix) {
            Self::Admin
        } else if under_prefix(path, "/v1") {
            Self::Other
        } else {
            Self::Website
        }
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Request-scoped domain resolution service.
#[derive(Clone)]
pub struct RequestDomains(Arc<Mutex<DomainsManagement>>);

impl RequestDomains {
    pub fn new(management: DomainsManagement) -> Self {
        Self(Arc::new(Mutex::new(management)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, DomainsManagement> {
        self.0.lock().await
    }
}

/// Language selected for the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of resolving the request against the domain index.
enum Resolution {
    Redirect(String),
    Serve(Locale),
}

fn header_str<'a>(req: &'a Request, name: axum::http::HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn path_and_query(req: &Request) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

fn resolve_area(
    domains: &DomainsManagement,
    area: RequestArea,
    uri: &str,
) -> ApiResult<Resolution> {
    match area {
        RequestArea::Website => {
            if let Some(domain) = domains.current_domain(false)
                && let Some(target) = domain.redirect_target(uri)
            {
                tracing::debug!(domain_id = %domain.id, location = %target, "redirect-only domain");
                return Ok(Resolution::Redirect(target));
            }
        }
        RequestArea::Admin => {
            let master = domains.domain_master()?;
            if !master.id.is_reserved()
                && let Some(current) = domains.current_domain(true)
                && current.id != master.id
                && let Some(base_url) = master.base_url()
            {
                tracing::debug!(
                    domain_id = %current.id,
                    master_id = %master.id,
                    "administration is served by the master domain"
                );
                return Ok(Resolution::Redirect(format!("{base_url}{uri}")));
            }
        }
        RequestArea::Other => {}
    }
    Ok(Resolution::Serve(Locale(domains.current_language().to_string())))
}

fn found(location: &str) -> ApiResult<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| ApiError::Internal(format!("invalid redirect location: {e}")))?;
    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}

/// Resolve the domain serving the request and apply domain-level redirects.
pub async fn domain_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let area = RequestArea::from_path(req.uri().path(), &state.config.server.admin_path_prefix);
    let request = RequestInfo::from_parts(
        header_str(&req, HOST),
        header_str(&req, ACCEPT_LANGUAGE),
        &state.config.http,
    );

    let mut domains = state.domains_management(request);
    domains.initialize(true).await?;

    let uri = path_and_query(&req);
    let locale = match resolve_area(&domains, area, &uri)? {
        Resolution::Redirect(location) => return found(&location),
        Resolution::Serve(locale) => locale,
    };

    let content_language = HeaderValue::from_str(locale.as_str()).ok();
    req.extensions_mut().insert(RequestDomains::new(domains));
    req.extensions_mut().insert(area);
    req.extensions_mut().insert(locale);

    let mut response = next.run(req).await;
    if let Some(value) = content_language {
        response.headers_mut().insert(CONTENT_LANGUAGE, value);
    }
    Ok(response)
}
