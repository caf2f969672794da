//! Per-request inputs to domain resolution.

use sitegate_core::Scheme;
use sitegate_core::config::HttpConfig;

/// Host, scheme and language of the request being served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    host: Option<String>,
    scheme: Scheme,
    language: Option<String>,
    default_language: String,
}

impl RequestInfo {
    /// Build request info from raw header values.
    pub fn from_parts(
        host_header: Option<&str>,
        accept_language: Option<&str>,
        http: &HttpConfig,
    ) -> Self {
        Self {
            host: host_header.and_then(normalize_host),
            scheme: http.scheme,
            language: accept_language.and_then(|header| negotiate_language(header, http)),
            default_language: http.default_language.clone(),
        }
    }

    /// Request info for work done outside an HTTP request.
    pub fn detached(http: &HttpConfig) -> Self {
        Self::from_parts(None, None, http)
    }

    /// Request info for `host` with default HTTP settings.
    pub fn for_host(host: &str) -> Self {
        Self::from_parts(Some(host), None, &HttpConfig::default())
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Normalized hostname (lowercase, no port).
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Negotiated language, else the configured default.
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(&self.default_language)
    }

    /// True when the client asked for a supported language.
    pub fn has_negotiated_language(&self) -> bool {
        self.language.is_some()
    }
}

impl Default for RequestInfo {
    fn default() -> Self {
        Self::detached(&HttpConfig::default())
    }
}

/// Lowercase a `Host` header value and strip its port.
///
/// Returns `None` for an empty value.
pub fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let host = if let Some(rest) = raw.strip_prefix('[') {
        // IPv6 literal: keep the brackets, drop what follows them.
        match rest.find(']') {
            Some(end) => &raw[..end + 2],
            None => raw,
        }
    } else {
        match raw.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => raw,
        }
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Pick the best supported language from an `Accept-Language` header.
///
/// Tags are tried in quality order; a regional tag (`fr-CH`) also matches
/// its primary language (`fr`). Wildcards and `q=0` entries are ignored.
pub fn negotiate_language(header: &str, http: &HttpConfig) -> Option<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim().to_ascii_lowercase();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then_some((tag, quality))
        })
        .collect();
    tags.sort_by(|a, b| b.1.total_cmp(&a.1));

    tags.into_iter().find_map(|(tag, _)| {
        if http.supports_language(&tag) {
            return Some(tag);
        }
        let primary = tag.split('-').next()?;
        http.supports_language(primary).then(|| primary.to_string())
    })
}
