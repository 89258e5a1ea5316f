//! Filesystem object store: one file per object.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/
//!   ab/
//!     cdef0123...   (remaining 62 hex chars of the object id)
//! ```
//!
//! Objects are written to a temporary file in the fan-out directory, synced,
//! and renamed into place, so a reader never observes a partial object.
//! Every read re-hashes the bytes against the id.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use mediastore_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

#[derive(Debug, Clone)]
pub struct LooseObjectStore {
    root: PathBuf,
}

impl LooseObjectStore {
    /// Open (or create) a loose object directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened loose object store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `id`, whether or not it exists.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, rest) = id.fanout();
        self.root.join(dir).join(rest)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        StoredObject::decode(id, &bytes).map(Some)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if self.exists(&id)? {
            return Ok(id);
        }
        let path = self.object_path(&id);

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&object.encode())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::{Blob, Tree};

    #[test]
    fn write_then_read_from_fresh_handle() {
        let dir = tempfile::tempdir().unwrap();
        let obj = Blob::new(b"image bytes".to_vec()).to_stored_object();
        let id = LooseObjectStore::open(dir.path()).unwrap().write(&obj).unwrap();

        let reopened = LooseObjectStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn objects_use_fanout_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path()).unwrap();
        let id = store.write(&Tree::new(vec![]).to_stored_object().unwrap()).unwrap();

        let hex = id.to_hex();
        let expected = dir.path().join(&hex[..2]).join(&hex[2..]);
        assert!(expected.is_file());
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn missing_object_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path()).unwrap();
        assert!(store.read(&ObjectId::from_bytes(b"nope")).unwrap().is_none());
    }

    #[test]
    fn corrupted_object_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path()).unwrap();
        let obj = Blob::new(b"AAAA".to_vec()).to_stored_object();
        let id = store.write(&obj).unwrap();

        let path = store.object_path(&id);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = b'B';
        fs::write(&path, bytes).unwrap();

        assert!(matches!(store.read(&id), Err(StoreError::HashMismatch { .. })));
    }

    #[test]
    fn rewrite_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path()).unwrap();
        let obj = Blob::new(b"dup".to_vec()).to_stored_object();
        assert_eq!(store.write(&obj).unwrap(), store.write(&obj).unwrap());
    }
}
