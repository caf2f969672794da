//! Domain records, identifiers and sentinel references.
//!
//! A domain is one tenant-facing hostname together with its routing and
//! display policy. Virtual domains point back at a master through
//! `master_id`; the reverse relation is derived by [`crate::DomainSet`].

use crate::error::{Error, Result};
use heck::ToKebabCase;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Reserved identifier of the master domain alias.
pub const DOMAIN_ID_MASTER: &str = "master";

/// Reserved identifier of the domain shared by every tenant.
pub const DOMAIN_ID_FOR_ALL_DOMAINS: &str = "for-all-domains";

/// Reserved identifier resolved to the domain of the current request.
pub const DOMAIN_ID_CURRENT: &str = "current";

/// Environment tag given to domains that do not declare one.
pub const DEFAULT_DOMAIN_ENV: &str = "prod";

/// Default sort position.
pub const DEFAULT_POSITION: i32 = 1;

/// Returns true for identifiers that never name a stored record.
pub fn is_reserved_id(id: &str) -> bool {
    matches!(
        id,
        DOMAIN_ID_MASTER | DOMAIN_ID_FOR_ALL_DOMAINS | DOMAIN_ID_CURRENT
    )
}

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque domain identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(String);

impl DomainId {
    /// Create an identifier from an existing value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for a stored record.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier of the synthesized master.
    pub fn master() -> Self {
        Self(DOMAIN_ID_MASTER.to_string())
    }

    /// Identifier of the for-all-domains record.
    pub fn for_all_domains() -> Self {
        Self(DOMAIN_ID_FOR_ALL_DOMAINS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        is_reserved_id(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DomainId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DomainId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DomainId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reference to a domain as callers spell it.
///
/// Stored identifiers and keynames share the `Id` variant; the sentinels get
/// their own variants so resolution never compares magic strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DomainRef {
    /// Stored identifier or keyname.
    Id(String),
    /// The master domain.
    #[default]
    Master,
    /// The domain serving the current request.
    Current,
    /// The record shared by every domain.
    ForAllDomains,
}

impl DomainRef {
    /// Parse a user-facing reference.
    pub fn parse(value: &str) -> Self {
        match value {
            DOMAIN_ID_MASTER => Self::Master,
            DOMAIN_ID_CURRENT => Self::Current,
            DOMAIN_ID_FOR_ALL_DOMAINS => Self::ForAllDomains,
            other => Self::Id(other.to_string()),
        }
    }

    /// The key this reference is looked up under in keyname indexes.
    pub fn as_key(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Master => DOMAIN_ID_MASTER,
            Self::Current => DOMAIN_ID_CURRENT,
            Self::ForAllDomains => DOMAIN_ID_FOR_ALL_DOMAINS,
        }
    }
}

impl fmt::Display for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl From<&str> for DomainRef {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<&DomainId> for DomainRef {
    fn from(value: &DomainId) -> Self {
        Self::parse(value.as_str())
    }
}

impl FromStr for DomainRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

// =============================================================================
// Scheme
// =============================================================================

/// URL scheme a domain is served under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" | "" => Ok(Self::Https),
            other => Err(Error::InvalidScheme(other.to_string())),
        }
    }
}

// =============================================================================
// Keyname generation
// =============================================================================

/// Derive a keyname slug: ASCII-folded, lowercase, hyphen separated.
pub fn slugify(value: &str) -> String {
    let folded: String = value.nfkd().filter(char::is_ascii).collect();
    folded.to_kebab_case()
}

// =============================================================================
// Domain record
// =============================================================================

/// One tenant-facing hostname and its policy flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    /// Master of a virtual (environment or translation) domain.
    pub master_id: Option<DomainId>,
    /// Hostname the domain answers on.
    pub host: Option<String>,
    pub name: Option<String>,
    keyname: Option<String>,
    pub domain_env: String,
    pub favicon: Option<String>,
    pub logo: Option<String>,
    pub scheme: Scheme,
    pub is_master: bool,
    pub is_enabled: bool,
    pub is_virtual: bool,
    pub is_translate: bool,
    pub redirect_url: Option<String>,
    pub redirect_with_uri: bool,
    pub one_page: bool,
    pub language: Option<String>,
    pub position: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Domain {
    /// Record with the given identifier and every policy flag at its default.
    pub fn with_id(id: DomainId) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            master_id: None,
            host: None,
            name: None,
            keyname: None,
            domain_env: DEFAULT_DOMAIN_ENV.to_string(),
            favicon: None,
            logo: None,
            scheme: Scheme::default(),
            is_master: false,
            is_enabled: true,
            is_virtual: false,
            is_translate: false,
            redirect_url: None,
            redirect_with_uri: false,
            one_page: false,
            language: None,
            position: DEFAULT_POSITION,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an enabled, non-virtual domain with a generated identifier.
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        let mut domain = Self::with_id(DomainId::generate());
        domain.host = Some(host.into());
        domain.name = Some(name.into());
        domain.keyname = domain.keyname_generator(None);
        domain
    }

    /// Build a transient record for a sentinel identifier.
    ///
    /// These records are never written back to storage.
    pub fn virtual_domain(sentinel: &str, host: Option<&str>) -> Self {
        let mut domain = Self::with_id(DomainId::new(sentinel));
        domain.host = host.map(str::to_string);
        domain.name = Some(sentinel.to_string());
        domain.keyname = Some(sentinel.to_string());
        domain.is_virtual = true;
        domain
    }

    pub fn keyname(&self) -> Option<&str> {
        self.keyname.as_deref()
    }

    /// Set the keyname, deriving it from the name when `keyname` is empty.
    pub fn set_keyname(&mut self, keyname: Option<&str>) {
        self.keyname = self.keyname_generator(keyname);
    }

    /// Assign the stored keyname verbatim. Used when hydrating rows.
    pub fn with_stored_keyname(mut self, keyname: Option<String>) -> Self {
        self.keyname = keyname.filter(|k| !k.is_empty());
        if self.keyname.is_none() {
            self.keyname = self.keyname_generator(None);
        }
        self
    }

    fn keyname_generator(&self, keyname: Option<&str>) -> Option<String> {
        if let Some(explicit) = keyname.map(str::trim).filter(|k| !k.is_empty()) {
            if is_reserved_id(explicit) {
                return Some(explicit.to_string());
            }
            let slug = slugify(explicit);
            if !slug.is_empty() {
                return Some(slug);
            }
        }
        self.name
            .as_deref()
            .map(slugify)
            .filter(|slug| !slug.is_empty())
    }

    /// Display label: the name, else the hostname.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or_default()
    }

    /// True when the domain only redirects elsewhere.
    pub fn is_redirect(&self) -> bool {
        self.redirect_url.is_some()
    }

    /// Language of the domain, falling back to the request language.
    pub fn current_language<'a>(&'a self, request_language: Option<&'a str>) -> Option<&'a str> {
        self.language.as_deref().or(request_language)
    }

    /// Absolute base URL (`scheme://host`) used to generate links for this domain.
    pub fn base_url(&self) -> Option<String> {
        self.host
            .as_deref()
            .filter(|host| !host.is_empty())
            .map(|host| format!("{}://{}", self.scheme, host))
    }

    /// Location a redirect-only domain sends `uri` to.
    pub fn redirect_target(&self, uri: &str) -> Option<String> {
        let url = self.redirect_url.as_deref()?;
        if self.redirect_with_uri {
            let path = if uri.starts_with('/') {
                uri.to_string()
            } else {
                format!("/{uri}")
            };
            Some(format!("{}{}", url.trim_end_matches('/'), path))
        } else {
            Some(url.to_string())
        }
    }

    /// Check record-level invariants before persisting.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().is_empty() {
            return Err(Error::InvalidDomain("identifier must not be empty".to_string()));
        }
        if !self.is_virtual && self.host.as_deref().is_none_or(str::is_empty) {
            return Err(Error::InvalidDomain(format!(
                "domain {} has no hostname",
                self.id
            )));
        }
        if self.is_virtual && self.is_translate && self.master_id.is_none() {
            return Err(Error::InvalidDomain(format!(
                "translation domain {} must reference a master",
                self.id
            )));
        }
        if self.master_id.as_ref() == Some(&self.id) {
            return Err(Error::InvalidDomain(format!(
                "domain {} cannot be its own master",
                self.id
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
