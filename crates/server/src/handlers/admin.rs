//! Administrative endpoints.

use super::common::{DomainResponse, domain_to_response, request_domains};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sitegate_core::{
    Domain, DomainEntity, DomainId, DomainRef, EntityKind, Scheme, is_reserved_id,
};
use sitegate_metadata::DomainRow;
use sitegate_tenancy::{RequestInfo, flush_attachments, migrate_attachments};
use time::OffsetDateTime;

/// Maximum request body size for admin endpoints (1 MiB).
const MAX_ADMIN_BODY_SIZE: usize = 1024 * 1024;

// =============================================================================
// Domain Management Types
// =============================================================================

/// Domain fields accepted by create and update.
///
/// Absent fields keep their current value. For optional text fields an
/// empty string clears the value.
#[derive(Debug, Default, Deserialize)]
pub struct DomainPayload {
    pub host: Option<String>,
    pub name: Option<String>,
    pub keyname: Option<String>,
    pub master_id: Option<String>,
    pub domain_env: Option<String>,
    pub favicon: Option<String>,
    pub logo: Option<String>,
    pub scheme: Option<String>,
    pub is_master: Option<bool>,
    pub is_enabled: Option<bool>,
    pub is_virtual: Option<bool>,
    pub is_translate: Option<bool>,
    pub redirect_url: Option<String>,
    pub redirect_with_uri: Option<bool>,
    pub one_page: Option<bool>,
    pub language: Option<String>,
    pub position: Option<i32>,
}

/// Request to create a new domain.
#[derive(Debug, Deserialize)]
pub struct CreateDomainRequest {
    /// Explicit identifier; generated when absent.
    pub domain_id: Option<String>,
    #[serde(flatten)]
    pub domain: DomainPayload,
}

/// Response for listing domains.
#[derive(Debug, Serialize)]
pub struct ListDomainsResponse {
    pub domains: Vec<DomainResponse>,
}

fn clearable(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

impl DomainPayload {
    fn apply(self, domain: &mut Domain) -> ApiResult<()> {
        if let Some(host) = self.host {
            domain.host = clearable(host).map(|h| h.to_ascii_lowercase());
        }
        if let Some(name) = self.name {
            domain.name = clearable(name);
        }
        if let Some(master_id) = self.master_id {
            domain.master_id = clearable(master_id).map(DomainId::new);
        }
        if let Some(domain_env) = self.domain_env {
            domain.domain_env = domain_env;
        }
        if let Some(favicon) = self.favicon {
            domain.favicon = clearable(favicon);
        }
        if let Some(logo) = self.logo {
            domain.logo = clearable(logo);
        }
        if let Some(scheme) = self.scheme {
            domain.scheme = scheme.parse::<Scheme>()?;
        }
        if let Some(is_master) = self.is_master {
            domain.is_master = is_master;
        }
        if let Some(is_enabled) = self.is_enabled {
            domain.is_enabled = is_enabled;
        }
        if let Some(is_virtual) = self.is_virtual {
            domain.is_virtual = is_virtual;
        }
        if let Some(is_translate) = self.is_translate {
            domain.is_translate = is_translate;
        }
        if let Some(redirect_url) = self.redirect_url {
            domain.redirect_url = clearable(redirect_url);
        }
        if let Some(redirect_with_uri) = self.redirect_with_uri {
            domain.redirect_with_uri = redirect_with_uri;
        }
        if let Some(one_page) = self.one_page {
            domain.one_page = one_page;
        }
        if let Some(language) = self.language {
            domain.language = clearable(language);
        }
        if let Some(position) = self.position {
            domain.position = position;
        }
        // A missing keyname is derived from the name.
        match self.keyname {
            Some(keyname) => domain.set_keyname(Some(&keyname)),
            None if domain.keyname().is_none() => domain.set_keyname(None),
            None => {}
        }
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_ADMIN_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Check a domain against configuration and the other stored domains.
async fn validate_domain(state: &AppState, domain: &Domain) -> ApiResult<()> {
    domain.validate()?;

    let http = &state.config.http;
    if !http.environments.contains(&domain.domain_env) {
        return Err(ApiError::BadRequest(format!(
            "unknown environment '{}', expected one of {:?}",
            domain.domain_env, http.environments
        )));
    }
    if let Some(language) = domain.language.as_deref()
        && !http.supports_language(language)
    {
        return Err(ApiError::BadRequest(format!(
            "unsupported language '{language}'"
        )));
    }
    if domain.is_translate && domain.language.is_none() {
        return Err(ApiError::BadRequest(
            "translation domain requires a language".to_string(),
        ));
    }
    if let Some(keyname) = domain.keyname()
        && is_reserved_id(keyname)
    {
        return Err(ApiError::BadRequest(format!(
            "keyname '{keyname}' is reserved"
        )));
    }

    if let Some(master_id) = &domain.master_id
        && state.metadata.get_domain(master_id.as_str()).await?.is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "master domain '{master_id}' does not exist"
        )));
    }

    if let Some(keyname) = domain.keyname()
        && let Some(existing) = state.metadata.get_domain_by_keyname(keyname).await?
        && existing.domain_id != domain.id.as_str()
    {
        return Err(ApiError::Conflict(format!(
            "keyname '{keyname}' is already used by domain {}",
            existing.domain_id
        )));
    }

    Ok(())
}

// =============================================================================
// Domain Management Handlers
// =============================================================================

/// POST /admin/v1/domains - Create a new domain.
pub async fn create_domain(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<DomainResponse>)> {
    let body: CreateDomainRequest = read_json(req).await?;

    let domain_id = match body.domain_id.and_then(clearable) {
        Some(id) if is_reserved_id(&id) => {
            return Err(ApiError::BadRequest(format!(
                "domain identifier '{id}' is reserved"
            )));
        }
        Some(id) => DomainId::new(id),
        None => DomainId::generate(),
    };

    let mut domain = Domain::with_id(domain_id);
    body.domain.apply(&mut domain)?;
    validate_domain(&state, &domain).await?;

    state.metadata.create_domain(&DomainRow::from(&domain)).await?;
    tracing::info!(domain_id = %domain.id, host = ?domain.host, "domain created");

    Ok((StatusCode::CREATED, Json(domain_to_response(&domain)?)))
}

/// GET /admin/v1/domains - List all domains, enabled or not.
pub async fn list_domains(State(state): State<AppState>) -> ApiResult<Json<ListDomainsResponse>> {
    let domains = state
        .metadata
        .list_domains()
        .await?
        .into_iter()
        .map(|row| domain_to_response(&row.into_domain()?))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(ListDomainsResponse { domains }))
}

async fn load_domain(state: &AppState, domain_id: &str) -> ApiResult<Domain> {
    let row = state
        .metadata
        .get_domain(domain_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("domain not found".to_string()))?;
    Ok(row.into_domain()?)
}

/// GET /admin/v1/domains/{domain_id} - Get a domain by ID.
pub async fn get_domain(
    State(state): State<AppState>,
    Path(domain_id): Path<String>,
) -> ApiResult<Json<DomainResponse>> {
    let domain = load_domain(&state, &domain_id).await?;
    Ok(Json(domain_to_response(&domain)?))
}

/// PUT /admin/v1/domains/{domain_id} - Update a domain.
pub async fn update_domain(
    State(state): State<AppState>,
    Path(domain_id): Path<String>,
    req: Request,
) -> ApiResult<Json<DomainResponse>> {
    let body: DomainPayload = read_json(req).await?;

    let mut domain = load_domain(&state, &domain_id).await?;
    body.apply(&mut domain)?;
    domain.updated_at = OffsetDateTime::now_utc();
    validate_domain(&state, &domain).await?;

    state.metadata.update_domain(&DomainRow::from(&domain)).await?;
    tracing::info!(domain_id = %domain.id, "domain updated");

    Ok(Json(domain_to_response(&domain)?))
}

/// DELETE /admin/v1/domains/{domain_id} - Delete a domain.
pub async fn delete_domain(
    State(state): State<AppState>,
    Path(domain_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.metadata.delete_domain(&domain_id).await?;
    tracing::info!(domain_id = %domain_id, "domain deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Attachment Migration
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TableMigrationResponse {
    pub kind: String,
    pub table: String,
    pub attached: u64,
}

#[derive(Debug, Serialize)]
pub struct MigrateAttachmentsResponse {
    pub domain_id: String,
    pub tables: Vec<TableMigrationResponse>,
    pub total: u64,
}

/// POST /admin/v1/attachments/migrate - Attach untagged entity rows to the master domain.
pub async fn migrate_attachments_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<MigrateAttachmentsResponse>> {
    let mut domains = state.domains_management(RequestInfo::detached(&state.config.http));
    domains.initialize(false).await?;

    let report = migrate_attachments(&domains, state.metadata.as_ref(), &state.registry).await?;
    let total = report.total();

    Ok(Json(MigrateAttachmentsResponse {
        domain_id: report.domain_id.to_string(),
        tables: report
            .tables
            .into_iter()
            .map(|t| TableMigrationResponse {
                kind: t.kind.to_string(),
                table: t.table,
                attached: t.attached,
            })
            .collect(),
        total,
    }))
}

// =============================================================================
// Entity Attachment
// =============================================================================

/// Row of a configured entity table, as seen by the tagging engine.
struct StoredEntity {
    kind: EntityKind,
    id: String,
    domain_id: Option<String>,
}

impl DomainEntity for StoredEntity {
    fn entity_kind(&self) -> EntityKind {
        self.kind.clone()
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

#[derive(Debug, Default, Deserialize)]
pub struct AttachEntityQuery {
    /// Domain to stamp instead of the filter domain (id, keyname or sentinel).
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttachEntityResponse {
    pub kind: String,
    pub entity_id: String,
    pub domain_id: Option<String>,
    pub persisted: u64,
}

/// POST /admin/v1/entities/{kind}/{entity_id}/attach - Tag one entity row.
///
/// The row goes through the request's domain service like any persisted
/// object: an existing attachment is kept, otherwise the filter domain is
/// stamped, and the tagged batch is flushed to the entity table.
pub async fn attach_entity(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, String)>,
    Query(query): Query<AttachEntityQuery>,
    req: Request,
) -> ApiResult<Json<AttachEntityResponse>> {
    let kind = EntityKind::new(kind);
    let mapping = state
        .registry
        .get(&kind)
        .ok_or_else(|| ApiError::NotFound(format!("unknown entity kind '{kind}'")))?;
    if !mapping.auto_domain_id() {
        return Err(ApiError::BadRequest(format!(
            "entity kind '{kind}' is not attached to a single domain"
        )));
    }
    let table = mapping
        .table()
        .ok_or_else(|| ApiError::Internal(format!("entity kind '{kind}' has no table")))?
        .to_string();

    let row = state
        .metadata
        .get_entity_attachment(&table, &entity_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("entity not found".to_string()))?;
    let mut entity = StoredEntity {
        kind: kind.clone(),
        id: row.entity_id,
        domain_id: row.domain_id,
    };

    let batch = {
        let handle = request_domains(&req)?;
        let mut domains = handle.lock().await;
        if let Some(reference) = query.domain.as_deref().filter(|d| !d.is_empty()) {
            let domain_id = domains
                .resolve(&DomainRef::parse(reference))
                .map(|domain| domain.id.clone())
                .ok_or_else(|| ApiError::NotFound(format!("domain '{reference}' not found")))?;
            domains.set_filter_domain_id(Some(domain_id));
        }
        domains
            .object_domain_attachement(&mut entity, true)
            .take_attachments()
    };

    let persisted = flush_attachments(state.metadata.as_ref(), &state.registry, batch).await?;
    tracing::info!(
        kind = %kind,
        entity_id = %entity.id,
        domain_id = ?entity.domain_id,
        persisted,
        "entity attachment flushed"
    );

    Ok(Json(AttachEntityResponse {
        kind: kind.to_string(),
        entity_id: entity.id,
        domain_id: entity.domain_id,
        persisted,
    }))
}
