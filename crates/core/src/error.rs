//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised while building entity mappings or validating configuration.
    /// These are boot-time failures and must halt startup.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid scheme: {0}")]
    InvalidScheme(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
