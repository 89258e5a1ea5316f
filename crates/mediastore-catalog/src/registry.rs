use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, info, warn};

use mediastore_types::{DatasetName, Fingerprint, PublishClock, VersionKey, VersionRecord};

use crate::error::{PublishError, ResolveError};
use crate::memory::InMemoryCatalog;
use crate::traits::Catalog;

/// The `(dataset, version) -> fingerprint` registry.
///
/// A published record is immutable: a second publish for the same key is
/// rejected with [`PublishError::DuplicateVersion`] and the first record
/// stays as it was.
pub struct VersionRegistry {
    catalog: Arc<dyn Catalog>,
    clock: PublishClock,
}

impl std::fmt::Debug for VersionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionRegistry").finish_non_exhaustive()
    }
}

impl VersionRegistry {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            clock: PublishClock::new(),
        }
    }

    /// A registry over a fresh [`InMemoryCatalog`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCatalog::new()))
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Record `fingerprint` as the content of `dataset`/`version`.
    ///
    /// `fingerprint` is the raw value reported by the content store; absent,
    /// empty, or whitespace-only values are refused with
    /// [`PublishError::MissingFingerprint`] and nothing is written.
    /// `created_at` defaults to the registry's monotonic clock and must fall
    /// within the years 0000 to 9999, the range in which catalogs order
    /// records correctly.
    pub fn publish(
        &self,
        dataset: &str,
        version: &str,
        fingerprint: Option<&str>,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<VersionRecord, PublishError> {
        let key = VersionKey::parse(dataset, version)?;
        let fingerprint = match Fingerprint::from_reported(fingerprint) {
            Ok(Some(fp)) => fp,
            Ok(None) => {
                warn!(dataset, version, "refusing to publish without a fingerprint");
                return Err(PublishError::MissingFingerprint { key });
            }
            Err(e) => return Err(PublishError::InvalidFingerprint(e)),
        };

        let created_at = created_at.unwrap_or_else(|| self.clock.now());
        if !(0..=9999).contains(&created_at.year()) {
            warn!(dataset, version, %created_at, "publish time out of range");
            return Err(PublishError::TimestampOutOfRange { key, created_at });
        }
        let record = VersionRecord::new(key, fingerprint, created_at);
        if let Err(err) = self.catalog.insert(&record) {
            warn!(dataset, version, error = %err, "publish failed");
            return Err(err.into());
        }

        info!(
            dataset,
            version,
            fingerprint = %record.fingerprint,
            created_at = %record.created_at,
            "version published"
        );
        Ok(record)
    }

    /// Look up the record for `dataset`/`version`.
    pub fn resolve(&self, dataset: &str, version: &str) -> Result<VersionRecord, ResolveError> {
        let key = VersionKey::parse(dataset, version)?;
        match self.catalog.get(&key)? {
            Some(record) => {
                debug!(dataset, version, fingerprint = %record.fingerprint, "version resolved");
                Ok(record)
            }
            None => Err(ResolveError::NotFound { key }),
        }
    }

    /// Whether `dataset`/`version` has been published.
    pub fn is_published(&self, dataset: &str, version: &str) -> Result<bool, ResolveError> {
        let key = VersionKey::parse(dataset, version)?;
        Ok(self.catalog.contains(&key)?)
    }

    /// Published versions of `dataset`, oldest first.
    pub fn list_versions(&self, dataset: &str) -> Result<Vec<VersionRecord>, ResolveError> {
        let dataset = DatasetName::new(dataset)?;
        Ok(self.catalog.list(&dataset)?)
    }

    /// Datasets with at least one published version.
    pub fn list_datasets(&self) -> Result<Vec<DatasetName>, ResolveError> {
        Ok(self.catalog.datasets()?)
    }
}
