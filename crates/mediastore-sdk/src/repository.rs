use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use mediastore_catalog::{PublishError, SqliteCatalog, VersionRegistry};
use mediastore_store::{
    ContentStore, DvcContentStore, LooseObjectStore, ObjectContentStore,
};
use mediastore_types::{DatasetName, Fingerprint, VersionKey, VersionRecord};

use crate::config::{ContentBackend, MediastoreConfig};
use crate::error::{SdkError, SdkResult};

/// A published version restored onto disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RetrievedVersion {
    pub record: VersionRecord,
    /// Directory the files were written into.
    pub path: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// High-level Mediastore API.
///
/// Working directories live under `datasets_root` as
/// `<datasets_root>/<dataset>/<version>`. Content is snapshotted through a
/// [`ContentStore`] and the resulting fingerprint is published to the
/// [`VersionRegistry`].
pub struct Mediastore {
    datasets_root: PathBuf,
    content: Arc<dyn ContentStore>,
    registry: VersionRegistry,
}

impl std::fmt::Debug for Mediastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediastore")
            .field("datasets_root", &self.datasets_root)
            .field("content", &self.content.name())
            .finish_non_exhaustive()
    }
}

impl Mediastore {
    pub fn new(
        datasets_root: impl Into<PathBuf>,
        content: Arc<dyn ContentStore>,
        registry: VersionRegistry,
    ) -> Self {
        Self {
            datasets_root: datasets_root.into(),
            content,
            registry,
        }
    }

    /// Open the content store and catalog described by `config`.
    pub fn open(config: &MediastoreConfig) -> SdkResult<Self> {
        let content: Arc<dyn ContentStore> = match config.content.backend {
            ContentBackend::Native => Arc::new(ObjectContentStore::new(LooseObjectStore::open(
                &config.content.objects_dir,
            )?)),
            ContentBackend::Dvc => Arc::new(DvcContentStore::new(config.content.dvc())),
        };
        let catalog = SqliteCatalog::open(&config.catalog)?;
        let registry = VersionRegistry::new(Arc::new(catalog));
        registry.catalog().ping()?;

        debug!(
            datasets_root = %config.datasets_root.display(),
            backend = content.name(),
            "mediastore opened"
        );
        Ok(Self::new(config.datasets_root.clone(), content, registry))
    }

    /// Everything in memory except the working area on disk.
    pub fn in_memory(datasets_root: impl Into<PathBuf>) -> Self {
        Self::new(
            datasets_root,
            Arc::new(ObjectContentStore::in_memory()),
            VersionRegistry::in_memory(),
        )
    }

    pub fn datasets_root(&self) -> &Path {
        &self.datasets_root
    }

    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn dataset_dir(&self, dataset: &DatasetName) -> PathBuf {
        self.datasets_root.join(dataset.as_str())
    }

    pub fn version_dir(&self, key: &VersionKey) -> PathBuf {
        self.dataset_dir(&key.dataset).join(key.version.as_str())
    }

    // ---- Workflow ----

    /// Create the working directory of a dataset. Idempotent.
    pub fn create_dataset(&self, dataset: &str) -> SdkResult<PathBuf> {
        let dataset = DatasetName::new(dataset)?;
        let dir = self.dataset_dir(&dataset);
        fs::create_dir_all(&dir).map_err(|e| SdkError::io(&dir, e))?;
        info!(dataset = %dataset, path = %dir.display(), "dataset created");
        Ok(dir)
    }

    /// Create the working directory of a not yet published version.
    pub fn create_version(&self, dataset: &str, version: &str) -> SdkResult<PathBuf> {
        let key = VersionKey::parse(dataset, version)?;
        self.ensure_unpublished(&key)?;

        let dir = self.version_dir(&key);
        fs::create_dir_all(&dir).map_err(|e| SdkError::io(&dir, e))?;
        info!(dataset, version, path = %dir.display(), "version created");
        Ok(dir)
    }

    /// Copy `files` into the version's working directory, snapshot it, and
    /// publish the snapshot's fingerprint.
    ///
    /// Nothing is copied if the version is already published, if its
    /// directory has not been created, or if any source is not a regular
    /// file.
    pub fn add_images<P: AsRef<Path>>(
        &self,
        dataset: &str,
        version: &str,
        files: &[P],
    ) -> SdkResult<VersionRecord> {
        let key = VersionKey::parse(dataset, version)?;
        self.ensure_unpublished(&key)?;

        let dir = self.version_dir(&key);
        if !dir.is_dir() {
            return Err(SdkError::VersionNotCreated { key, path: dir });
        }

        let mut names = HashSet::with_capacity(files.len());
        let mut copies = Vec::with_capacity(files.len());
        for source in files {
            let source = source.as_ref();
            let name = source
                .file_name()
                .filter(|_| source.is_file())
                .ok_or_else(|| SdkError::SourceNotAFile(source.to_path_buf()))?;
            if !names.insert(name) {
                return Err(SdkError::DuplicateSourceName(source.to_path_buf()));
            }
            let target = dir.join(name);
            if is_same_file(source, &target)? {
                debug!(source = %source.display(), "image already staged");
                continue;
            }
            copies.push((source, target));
        }
        for (source, target) in &copies {
            fs::copy(source, target).map_err(|e| SdkError::io(*source, e))?;
            debug!(source = %source.display(), target = %target.display(), "image staged");
        }

        let fingerprint = self.content.add(&dir)?;
        let record = self.registry.publish(
            dataset,
            version,
            fingerprint.as_ref().map(Fingerprint::as_str),
            None,
        )?;
        info!(
            dataset,
            version,
            files = names.len(),
            fingerprint = %record.fingerprint.short(),
            "images added"
        );
        Ok(record)
    }

    /// Restore a published version into `dest`, or into its working
    /// directory when `dest` is `None`.
    pub fn retrieve_version(
        &self,
        dataset: &str,
        version: &str,
        dest: Option<&Path>,
    ) -> SdkResult<RetrievedVersion> {
        let record = self.registry.resolve(dataset, version)?;
        let path = match dest {
            Some(dest) => dest.to_path_buf(),
            None => self.version_dir(&record.key()),
        };

        let summary = self.content.checkout(&record.fingerprint, &path)?;
        info!(
            dataset,
            version,
            path = %path.display(),
            files = summary.files,
            "version retrieved"
        );
        Ok(RetrievedVersion {
            record,
            path,
            files: summary.files,
            bytes: summary.bytes,
        })
    }

    pub fn list_versions(&self, dataset: &str) -> SdkResult<Vec<VersionRecord>> {
        Ok(self.registry.list_versions(dataset)?)
    }

    pub fn list_datasets(&self) -> SdkResult<Vec<DatasetName>> {
        Ok(self.registry.list_datasets()?)
    }

    fn ensure_unpublished(&self, key: &VersionKey) -> SdkResult<()> {
        if self
            .registry
            .is_published(key.dataset.as_str(), key.version.as_str())?
        {
            return Err(PublishError::DuplicateVersion { key: key.clone() }.into());
        }
        Ok(())
    }
}

/// Whether `target` already exists and is `source` reached by another path.
fn is_same_file(source: &Path, target: &Path) -> SdkResult<bool> {
    if !target.exists() {
        return Ok(false);
    }
    let canonical = |path: &Path| fs::canonicalize(path).map_err(|e| SdkError::io(path, e));
    Ok(canonical(source)? == canonical(target)?)
}
