use std::path::PathBuf;

use thiserror::Error;

use mediastore_catalog::{CatalogError, PublishError, ResolveError};
use mediastore_store::StoreError;
use mediastore_types::{TypeError, VersionKey};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("content store error: {0}")]
    Store(#[from] StoreError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("version {key} has not been created (expected {})", .path.display())]
    VersionNotCreated { key: VersionKey, path: PathBuf },

    #[error("not a regular file: {}", .0.display())]
    SourceNotAFile(PathBuf),

    #[error("another source already uses the file name of {}", .0.display())]
    DuplicateSourceName(PathBuf),

    #[error("invalid configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SdkResult<T> = Result<T, SdkError>;

/// Coarse classification of an [`SdkError`], used to pick exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The requested version was never published.
    NotFound,
    /// The request was refused; nothing was changed.
    Rejected,
    /// The catalog, content store, or filesystem failed.
    Failure,
}

impl SdkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolve(ResolveError::NotFound { .. }) => ErrorCategory::NotFound,
            Self::Resolve(ResolveError::InvalidKey(_))
            | Self::Publish(
                PublishError::MissingFingerprint { .. }
                | PublishError::DuplicateVersion { .. }
                | PublishError::InvalidKey(_)
                | PublishError::InvalidFingerprint(_)
                | PublishError::TimestampOutOfRange { .. },
            )
            | Self::InvalidName(_)
            | Self::VersionNotCreated { .. }
            | Self::SourceNotAFile(_)
            | Self::DuplicateSourceName(_) => ErrorCategory::Rejected,
            _ => ErrorCategory::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> VersionKey {
        VersionKey::parse("catsdogs", "v1").unwrap()
    }

    #[test]
    fn categories() {
        let not_found: SdkError = ResolveError::NotFound { key: key() }.into();
        assert_eq!(not_found.category(), ErrorCategory::NotFound);

        let missing: SdkError = PublishError::MissingFingerprint { key: key() }.into();
        assert_eq!(missing.category(), ErrorCategory::Rejected);

        let duplicate: SdkError = PublishError::DuplicateVersion { key: key() }.into();
        assert_eq!(duplicate.category(), ErrorCategory::Rejected);

        let not_created = SdkError::VersionNotCreated { key: key(), path: PathBuf::from("x") };
        assert_eq!(not_created.category(), ErrorCategory::Rejected);

        let clash = SdkError::DuplicateSourceName(PathBuf::from("b/img.jpeg"));
        assert_eq!(clash.category(), ErrorCategory::Rejected);

        let unavailable: SdkError = PublishError::StoreUnavailable("locked".into()).into();
        assert_eq!(unavailable.category(), ErrorCategory::Failure);

        let read_failure: SdkError = ResolveError::StoreUnavailable("locked".into()).into();
        assert_eq!(read_failure.category(), ErrorCategory::Failure);

        let store: SdkError = StoreError::NotFound("abc".into()).into();
        assert_eq!(store.category(), ErrorCategory::Failure);
    }
}
