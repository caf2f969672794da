//! Error types for request-scoped domain resolution.

use sitegate_metadata::MetadataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenancyError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Core(#[from] sitegate_core::Error),

    /// The domain index was read before `initialize` completed.
    #[error("domains management is not initialized")]
    NotInitialized,
}

pub type TenancyResult<T> = std::result::Result<T, TenancyError>;
