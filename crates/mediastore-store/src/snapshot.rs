//! Native directory snapshots over an [`ObjectStore`].
//!
//! `add` stores every regular file as a [`Blob`] and every directory as a
//! [`Tree`]; the fingerprint is the hex id of the root tree. Empty
//! directories contribute nothing, so a directory with no files at any depth
//! has no fingerprint.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use mediastore_types::{Fingerprint, ObjectId};

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryObjectStore;
use crate::object::{Blob, EntryMode, Tree, TreeEntry};
use crate::traits::{CheckoutSummary, ContentStore, ObjectStore};

#[derive(Debug)]
pub struct ObjectContentStore<S> {
    objects: S,
}

impl ObjectContentStore<InMemoryObjectStore> {
    /// A store that keeps every object in memory.
    pub fn in_memory() -> Self {
        Self::new(InMemoryObjectStore::new())
    }
}

impl<S: ObjectStore> ObjectContentStore<S> {
    pub fn new(objects: S) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &S {
        &self.objects
    }

    /// Store the contents of `dir`. Returns `None` when it holds no files.
    fn write_dir(&self, dir: &Path, files: &mut usize) -> StoreResult<Option<ObjectId>> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
            })?;
            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| StoreError::Serialization(format!(
                    "file name is not valid UTF-8: {}",
                    entry.path().display()
                )))?
                .to_string();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let Some(id) = self.write_dir(entry.path(), files)? {
                    entries.push(TreeEntry::new(EntryMode::Directory, name, id));
                }
            } else if file_type.is_file() {
                let data = fs::read(entry.path())?;
                let id = self.objects.write(&Blob::new(data).to_stored_object())?;
                entries.push(TreeEntry::new(file_mode(entry.path())?, name, id));
                *files += 1;
            } else {
                debug!(path = %entry.path().display(), "skipping non-regular file");
            }
        }

        if entries.is_empty() {
            return Ok(None);
        }
        let id = self.objects.write(&Tree::new(entries).to_stored_object()?)?;
        Ok(Some(id))
    }

    fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        let obj = self
            .objects
            .read(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))?;
        Tree::from_stored_object(&obj)
    }

    fn checkout_tree(
        &self,
        id: &ObjectId,
        dest: &Path,
        summary: &mut CheckoutSummary,
    ) -> StoreResult<()> {
        let tree = self.read_tree(id)?;
        fs::create_dir_all(dest)?;

        for entry in &tree.entries {
            if !TreeEntry::is_safe_name(&entry.name) {
                return Err(StoreError::CorruptObject {
                    id: id.to_hex(),
                    reason: format!("unsafe entry name {:?}", entry.name),
                });
            }
            let target = dest.join(&entry.name);
            match entry.mode {
                EntryMode::Directory => self.checkout_tree(&entry.object_id, &target, summary)?,
                EntryMode::Regular | EntryMode::Executable => {
                    let obj = self
                        .objects
                        .read(&entry.object_id)?
                        .ok_or_else(|| StoreError::NotFound(entry.object_id.to_hex()))?;
                    let blob = Blob::from_stored_object(&obj)?;
                    fs::write(&target, &blob.data)?;
                    if entry.mode == EntryMode::Executable {
                        set_executable(&target)?;
                    }
                    summary.files += 1;
                    summary.bytes += blob.data.len() as u64;
                }
            }
        }
        Ok(())
    }
}

impl<S: ObjectStore> ContentStore for ObjectContentStore<S> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn add(&self, dir: &Path) -> StoreResult<Option<Fingerprint>> {
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }

        let mut files = 0;
        let Some(root) = self.write_dir(dir, &mut files)? else {
            info!(path = %dir.display(), "nothing to add");
            return Ok(None);
        };

        let fingerprint = Fingerprint::from(root);
        info!(path = %dir.display(), files, fingerprint = %fingerprint.short(), "snapshot stored");
        Ok(Some(fingerprint))
    }

    fn checkout(&self, fingerprint: &Fingerprint, dest: &Path) -> StoreResult<CheckoutSummary> {
        let root = ObjectId::from_hex(fingerprint.as_str()).map_err(|e| {
            StoreError::InvalidFingerprint {
                fingerprint: fingerprint.to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut summary = CheckoutSummary::default();
        self.checkout_tree(&root, dest, &mut summary)?;
        info!(
            fingerprint = %fingerprint.short(),
            dest = %dest.display(),
            files = summary.files,
            bytes = summary.bytes,
            "snapshot checked out"
        );
        Ok(summary)
    }
}

#[cfg(unix)]
fn file_mode(path: &Path) -> StoreResult<EntryMode> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(if mode & 0o111 != 0 {
        EntryMode::Executable
    } else {
        EntryMode::Regular
    })
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> StoreResult<EntryMode> {
    Ok(EntryMode::Regular)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> StoreResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> StoreResult<()> {
    Ok(())
}
