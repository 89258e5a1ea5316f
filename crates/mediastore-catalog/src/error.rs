//! Error types for the version registry.

use chrono::{DateTime, Utc};
use mediastore_types::{TypeError, VersionKey};
use thiserror::Error;

/// Failures reported by a [`Catalog`](crate::Catalog) backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The backend could not be reached, read, or written.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A record for this key already exists.
    #[error("duplicate catalog record: {key}")]
    Duplicate { key: VersionKey },

    /// A stored row could not be decoded into a record.
    #[error("corrupt catalog record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result alias for catalog backends.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Why a publish was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The content store reported no fingerprint; nothing was recorded.
    #[error("no content fingerprint for {key}: nothing new to publish")]
    MissingFingerprint { key: VersionKey },

    /// The version was published before. The existing record is unchanged.
    #[error("version {key} is already published")]
    DuplicateVersion { key: VersionKey },

    /// The catalog could not be written.
    #[error("catalog unavailable: {0}")]
    StoreUnavailable(String),

    /// The dataset name or version label is not valid.
    #[error(transparent)]
    InvalidKey(#[from] TypeError),

    /// The content store reported a value that is not a valid fingerprint.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(TypeError),

    /// `created_at` falls outside the years 0000 to 9999.
    #[error("publish time {created_at} for {key} is outside years 0000-9999")]
    TimestampOutOfRange { key: VersionKey, created_at: DateTime<Utc> },
}

impl From<CatalogError> for PublishError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Duplicate { key } => Self::DuplicateVersion { key },
            CatalogError::Unavailable(msg) => Self::StoreUnavailable(msg),
            err @ CatalogError::Corrupt { .. } => Self::StoreUnavailable(err.to_string()),
        }
    }
}

/// Why a resolve failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No version was ever published under this key.
    #[error("version {key} not found")]
    NotFound { key: VersionKey },

    /// The catalog could not be read.
    #[error("catalog unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    InvalidKey(#[from] TypeError),

    /// The stored record exists but cannot be decoded.
    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

impl From<CatalogError> for ResolveError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unavailable(msg) => Self::StoreUnavailable(msg),
            CatalogError::Corrupt { key, reason } => Self::CorruptRecord { key, reason },
            err @ CatalogError::Duplicate { .. } => Self::StoreUnavailable(err.to_string()),
        }
    }
}
