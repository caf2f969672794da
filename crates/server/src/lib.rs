//! HTTP request-lifecycle adapter for sitegate.
//!
//! This crate resolves the tenant domain of every request and serves:
//! - Domain lookups for the request host (`/v1/domains/...`)
//! - Domain administration under the admin prefix
//! - Attachment migration of untagged entity rows
//! - Website pages with domain redirects and locale selection

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use middleware::{Locale, RequestArea, RequestDomains};
pub use routes::create_router;
pub use state::AppState;
