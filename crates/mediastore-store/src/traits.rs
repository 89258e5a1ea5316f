use std::path::Path;

use mediastore_types::{Fingerprint, ObjectId};

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Key-value storage of immutable objects keyed by content hash.
///
/// Implementations must satisfy these invariants:
/// - Writing an object that already exists is a no-op.
/// - The returned id is computed from the object's kind and data.
/// - The store never interprets object contents.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id.
    ///
    /// Returns `Ok(None)` if the object does not exist and `Err` on I/O
    /// failure or corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its id.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;
}

/// Files restored by a checkout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub files: usize,
    pub bytes: u64,
}

/// A content-addressed store of directory snapshots.
///
/// This is the boundary the version registry relies on: `add` must only
/// return a fingerprint once the content behind it is durably stored, and
/// `checkout` must reproduce exactly that content.
pub trait ContentStore: Send + Sync {
    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Snapshot every regular file below `dir`.
    ///
    /// Returns `Ok(None)` when there is nothing to add (the directory holds
    /// no files). Never returns an empty fingerprint. The fingerprint is
    /// recorded exactly as returned, without trimming or case folding.
    fn add(&self, dir: &Path) -> StoreResult<Option<Fingerprint>>;

    /// Write the files of the snapshot `fingerprint` into `dest`, creating it
    /// if needed. Same-named files are overwritten; other files are left in
    /// place.
    fn checkout(&self, fingerprint: &Fingerprint, dest: &Path) -> StoreResult<CheckoutSummary>;
}
