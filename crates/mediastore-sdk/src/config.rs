//! Configuration file support.
//!
//! ```toml
//! datasets_root = "datasets"
//!
//! [catalog]
//! path = ".mediastore/catalog.db"
//! busy_timeout_ms = 5000
//!
//! [content]
//! backend = "native"            # or "dvc"
//! objects_dir = ".mediastore/objects"
//! dvc_binary = "dvc"
//! dvc_repo_root = "."
//! ```
//!
//! Every key is optional. Relative paths are resolved against the process
//! working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use mediastore_catalog::SqliteCatalogConfig;
use mediastore_store::DvcConfig;

use crate::error::{SdkError, SdkResult};

/// Which [`ContentStore`](mediastore_store::ContentStore) to snapshot with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    /// Built-in BLAKE3 object store.
    #[default]
    Native,
    /// External `dvc` installation.
    Dvc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub backend: ContentBackend,
    /// Object directory of the native backend.
    pub objects_dir: PathBuf,
    pub dvc_binary: PathBuf,
    pub dvc_repo_root: PathBuf,
    /// DVC cache directory; `<dvc_repo_root>/.dvc/cache` when unset.
    pub dvc_cache_dir: Option<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let dvc = DvcConfig::default();
        Self {
            backend: ContentBackend::default(),
            objects_dir: PathBuf::from(".mediastore/objects"),
            dvc_binary: dvc.binary,
            dvc_repo_root: dvc.repo_root,
            dvc_cache_dir: dvc.cache_dir,
        }
    }
}

impl ContentConfig {
    pub fn dvc(&self) -> DvcConfig {
        DvcConfig {
            binary: self.dvc_binary.clone(),
            repo_root: self.dvc_repo_root.clone(),
            cache_dir: self.dvc_cache_dir.clone(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediastoreConfig {
    /// Working area; versions live at `<datasets_root>/<dataset>/<version>`.
    pub datasets_root: PathBuf,
    pub catalog: SqliteCatalogConfig,
    pub content: ContentConfig,
}

impl Default for MediastoreConfig {
    fn default() -> Self {
        Self {
            datasets_root: PathBuf::from("datasets"),
            catalog: SqliteCatalogConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

impl MediastoreConfig {
    /// Name of the configuration file picked up from the working directory.
    pub const FILE_NAME: &'static str = "mediastore.toml";

    pub fn from_toml_str(source: &str, origin: &Path) -> SdkResult<Self> {
        toml::from_str(source).map_err(|e| SdkError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&source, path)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load `explicit` if given, else `<dir>/mediastore.toml` if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> SdkResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(Self::FILE_NAME);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        debug!("no configuration file, using defaults");
        Ok(Self::default())
    }

    pub fn with_datasets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.datasets_root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MediastoreConfig::default();
        assert_eq!(config.datasets_root, PathBuf::from("datasets"));
        assert_eq!(config.catalog.path, PathBuf::from(".mediastore/catalog.db"));
        assert_eq!(config.catalog.busy_timeout_ms, 5000);
        assert_eq!(config.content.backend, ContentBackend::Native);
        assert_eq!(config.content.dvc_binary, PathBuf::from("dvc"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = MediastoreConfig::from_toml_str("", Path::new("mediastore.toml")).unwrap();
        assert_eq!(config, MediastoreConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let source = r#"
datasets_root = "/srv/datasets"

[catalog]
busy_timeout_ms = 250

[content]
backend = "dvc"
dvc_repo_root = "/srv"
"#;
        let config = MediastoreConfig::from_toml_str(source, Path::new("m.toml")).unwrap();
        assert_eq!(config.datasets_root, PathBuf::from("/srv/datasets"));
        assert_eq!(config.catalog.busy_timeout_ms, 250);
        assert_eq!(config.catalog.path, PathBuf::from(".mediastore/catalog.db"));
        assert_eq!(config.content.backend, ContentBackend::Dvc);

        let dvc = config.content.dvc();
        assert_eq!(dvc.repo_root, PathBuf::from("/srv"));
        assert_eq!(dvc.binary, PathBuf::from("dvc"));
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = MediastoreConfig::from_toml_str(
            "[content]\nbackend = \"s3\"\n",
            Path::new("bad.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, SdkError::Config { .. }));
    }

    #[test]
    fn discover_prefers_explicit_then_local_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            MediastoreConfig::discover(None, dir.path()).unwrap(),
            MediastoreConfig::default()
        );

        fs::write(dir.path().join(MediastoreConfig::FILE_NAME), "datasets_root = \"local\"\n")
            .unwrap();
        let local = MediastoreConfig::discover(None, dir.path()).unwrap();
        assert_eq!(local.datasets_root, PathBuf::from("local"));

        let explicit = dir.path().join("other.toml");
        fs::write(&explicit, "datasets_root = \"explicit\"\n").unwrap();
        let chosen = MediastoreConfig::discover(Some(&explicit), dir.path()).unwrap();
        assert_eq!(chosen.datasets_root, PathBuf::from("explicit"));

        let missing = dir.path().join("missing.toml");
        assert!(MediastoreConfig::discover(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn root_override() {
        let config = MediastoreConfig::default().with_datasets_root("/tmp/ds");
        assert_eq!(config.datasets_root, PathBuf::from("/tmp/ds"));
    }
}
