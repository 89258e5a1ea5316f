//! The [`Catalog`] trait defining the version storage interface.

use mediastore_types::{DatasetName, VersionKey, VersionRecord};

use crate::error::CatalogResult;

/// Storage backend for published version records.
///
/// Implementations must be thread-safe and must enforce uniqueness of the
/// `(dataset, version)` key themselves: of two concurrent inserts for one
/// key, exactly one succeeds and the other fails with
/// [`CatalogError::Duplicate`](crate::CatalogError::Duplicate).
pub trait Catalog: Send + Sync {
    /// Insert a new record. Existing records are never replaced.
    fn insert(&self, record: &VersionRecord) -> CatalogResult<()>;

    /// Read the record for `key`, or `Ok(None)` if it was never inserted.
    fn get(&self, key: &VersionKey) -> CatalogResult<Option<VersionRecord>>;

    /// All records of one dataset, ordered by `created_at` then version.
    fn list(&self, dataset: &DatasetName) -> CatalogResult<Vec<VersionRecord>>;

    /// Distinct dataset names with at least one record, sorted.
    fn datasets(&self) -> CatalogResult<Vec<DatasetName>>;

    /// Check that the backend is reachable.
    fn ping(&self) -> CatalogResult<()> {
        Ok(())
    }

    fn contains(&self, key: &VersionKey) -> CatalogResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
