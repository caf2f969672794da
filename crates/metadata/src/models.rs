//! Database models mapping to the metadata schema.

use crate::error::{MetadataError, MetadataResult};
use sitegate_core::{Domain, DomainId};
use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Domains
// =============================================================================

/// Stored domain record.
#[derive(Debug, Clone, FromRow)]
pub struct DomainRow {
    pub domain_id: String,
    pub master_id: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub keyname: Option<String>,
    pub domain_env: String,
    pub favicon: Option<String>,
    pub logo: Option<String>,
    pub scheme: String,
    pub is_master: bool,
    pub is_enabled: bool,
    pub is_virtual: bool,
    pub is_translate: bool,
    pub redirect_url: Option<String>,
    pub redirect_with_uri: bool,
    pub one_page: bool,
    pub language: Option<String>,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl DomainRow {
    /// Convert a stored row into the domain model.
    pub fn into_domain(self) -> MetadataResult<Domain> {
        let scheme = self.scheme.parse().map_err(|e| {
            MetadataError::Internal(format!("domain {} has {e}", self.domain_id))
        })?;

        let mut domain = Domain::with_id(DomainId::new(self.domain_id));
        domain.master_id = self.master_id.map(DomainId::new);
        domain.host = self.host;
        domain.name = self.name;
        domain.domain_env = self.domain_env;
        domain.favicon = self.favicon;
        domain.logo = self.logo;
        domain.scheme = scheme;
        domain.is_master = self.is_master;
        domain.is_enabled = self.is_enabled;
        domain.is_virtual = self.is_virtual;
        domain.is_translate = self.is_translate;
        domain.redirect_url = self.redirect_url;
        domain.redirect_with_uri = self.redirect_with_uri;
        domain.one_page = self.one_page;
        domain.language = self.language;
        domain.position = self.position;
        domain.created_at = self.created_at;
        domain.updated_at = self.updated_at;
        Ok(domain.with_stored_keyname(self.keyname))
    }
}

impl From<&Domain> for DomainRow {
    fn from(domain: &Domain) -> Self {
        Self {
            domain_id: domain.id.to_string(),
            master_id: domain.master_id.as_ref().map(ToString::to_string),
            host: domain.host.clone(),
            name: domain.name.clone(),
            keyname: domain.keyname().map(str::to_string),
            domain_env: domain.domain_env.clone(),
            favicon: domain.favicon.clone(),
            logo: domain.logo.clone(),
            scheme: domain.scheme.to_string(),
            is_master: domain.is_master,
            is_enabled: domain.is_enabled,
            is_virtual: domain.is_virtual,
            is_translate: domain.is_translate,
            redirect_url: domain.redirect_url.clone(),
            redirect_with_uri: domain.redirect_with_uri,
            one_page: domain.one_page,
            language: domain.language.clone(),
            position: domain.position,
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }
}

/// Convert a batch of rows, failing on the first malformed one.
pub fn rows_into_domains(rows: Vec<DomainRow>) -> MetadataResult<Vec<Domain>> {
    rows.into_iter().map(DomainRow::into_domain).collect()
}

// =============================================================================
// Entity attachments
// =============================================================================

/// Domain attachment of one row of an entity table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EntityAttachmentRow {
    #[sqlx(rename = "id")]
    pub entity_id: String,
    pub domain_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegate_core::Scheme;

    #[test]
    fn test_row_conversion_preserves_fields() {
        let mut domain = Domain::new("fr.example.com", "Site FR");
        domain.master_id = Some(DomainId::generate());
        domain.is_virtual = true;
        domain.is_translate = true;
        domain.language = Some("fr".into());
        domain.scheme = Scheme::Http;
        domain.position = 4;

        let back = DomainRow::from(&domain).into_domain().unwrap();
        assert_eq!(back, domain);
    }

    #[test]
    fn test_unknown_scheme_is_internal_error() {
        let mut row = DomainRow::from(&Domain::new("a.example.com", "A"));
        row.scheme = "gopher".into();
        assert!(matches!(row.into_domain(), Err(MetadataError::Internal(_))));
    }

    #[test]
    fn test_missing_keyname_regenerated_from_name() {
        let mut row = DomainRow::from(&Domain::new("a.example.com", "Main Site"));
        row.keyname = None;
        let domain = row.into_domain().unwrap();
        assert_eq!(domain.keyname(), Some("main-site"));
    }
}
