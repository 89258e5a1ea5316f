//! Adapter over an external [DVC](https://dvc.org) installation.
//!
//! `add` runs `dvc add <dir>` and reads the fingerprint from the `.dvc`
//! file DVC writes next to the directory, never from DVC's console output.
//! `checkout` restores a directory snapshot straight from the DVC cache:
//!
//! ```text
//! <cache>/files/md5/<2 hex>/<30 hex>.dir   JSON manifest: [{"md5", "relpath"}]
//! <cache>/files/md5/<2 hex>/<30 hex>       file contents
//! ```

use std::fs;
use std::io;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use mediastore_types::Fingerprint;

use crate::error::{StoreError, StoreResult};
use crate::traits::{CheckoutSummary, ContentStore};

const DIR_SUFFIX: &str = ".dir";

/// Where to find DVC and its cache.
#[derive(Clone, Debug)]
pub struct DvcConfig {
    /// Executable to run, resolved through `PATH` when relative.
    pub binary: PathBuf,
    /// Root of the DVC repository; `dvc` runs with this as working directory.
    pub repo_root: PathBuf,
    /// Cache directory; defaults to `<repo_root>/.dvc/cache`.
    pub cache_dir: Option<PathBuf>,
}

impl Default for DvcConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("dvc"),
            repo_root: PathBuf::from("."),
            cache_dir: None,
        }
    }
}

/// The parts of a `.dvc` file we read.
#[derive(Debug, Deserialize)]
struct DvcFile {
    #[serde(default)]
    outs: Vec<DvcOut>,
}

#[derive(Debug, Deserialize)]
struct DvcOut {
    md5: Option<String>,
}

/// One entry of a `.dir` manifest in the cache.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    md5: String,
    relpath: String,
}

#[derive(Debug, Clone)]
pub struct DvcContentStore {
    config: DvcConfig,
}

impl DvcContentStore {
    pub fn new(config: DvcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DvcConfig {
        &self.config
    }

    fn cache_dir(&self) -> PathBuf {
        self.config
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.config.repo_root.join(".dvc").join("cache"))
    }

    /// Cache path of an md5 hash (with or without the `.dir` suffix).
    fn cache_path(&self, hash: &str) -> PathBuf {
        let (dir, rest) = hash.split_at(2);
        self.cache_dir().join("files").join("md5").join(dir).join(rest)
    }

    fn run(&self, args: &[&OsStr]) -> StoreResult<()> {
        let tool = self.config.binary.display().to_string();
        debug!(tool = %tool, ?args, "running external tool");

        let output = Command::new(&self.config.binary)
            .args(args)
            .current_dir(&self.config.repo_root)
            .output()
            .map_err(|source| StoreError::ToolUnavailable {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(StoreError::ToolFailed {
                tool,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Path of the `.dvc` file DVC writes for `target`.
fn dvc_file_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".dvc");
    target.with_file_name(name)
}

/// Read the fingerprint of the first output recorded in a `.dvc` file.
fn read_dvc_file(contents: &str) -> StoreResult<Option<Fingerprint>> {
    let file: DvcFile =
        serde_yaml::from_str(contents).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let md5 = file.outs.first().and_then(|out| out.md5.as_deref());
    Ok(Fingerprint::from_reported(md5)?)
}

/// Split a DVC fingerprint into its md5 and whether it names a directory.
fn parse_fingerprint(fingerprint: &Fingerprint) -> StoreResult<(&str, bool)> {
    let raw = fingerprint.as_str();
    let (hash, is_dir) = match raw.strip_suffix(DIR_SUFFIX) {
        Some(hash) => (hash, true),
        None => (raw, false),
    };
    if hash.len() != 32 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StoreError::InvalidFingerprint {
            fingerprint: raw.to_string(),
            reason: "expected an md5 hash".into(),
        });
    }
    Ok((hash, is_dir))
}

/// A manifest path is safe when every component is a plain name.
fn is_safe_relpath(relpath: &str) -> bool {
    let path = Path::new(relpath);
    !relpath.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn has_regular_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file())
}

impl ContentStore for DvcContentStore {
    fn name(&self) -> &'static str {
        "dvc"
    }

    fn add(&self, dir: &Path) -> StoreResult<Option<Fingerprint>> {
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }
        if !has_regular_files(dir) {
            info!(path = %dir.display(), "nothing to add");
            return Ok(None);
        }

        let target = fs::canonicalize(dir)?;
        self.run(&[OsStr::new("add"), OsStr::new("--quiet"), target.as_os_str()])?;

        let dvc_file = dvc_file_for(&target);
        let contents = match fs::read_to_string(&dvc_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %dvc_file.display(), "dvc add succeeded but wrote no .dvc file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let fingerprint = read_dvc_file(&contents)?;
        match &fingerprint {
            Some(fp) => info!(path = %dir.display(), fingerprint = %fp, "dvc snapshot stored"),
            None => warn!(path = %dvc_file.display(), "dvc file records no md5"),
        }
        Ok(fingerprint)
    }

    fn checkout(&self, fingerprint: &Fingerprint, dest: &Path) -> StoreResult<CheckoutSummary> {
        let (_, is_dir) = parse_fingerprint(fingerprint)?;
        if !is_dir {
            return Err(StoreError::InvalidFingerprint {
                fingerprint: fingerprint.to_string(),
                reason: "not a directory snapshot".into(),
            });
        }

        let manifest_path = self.cache_path(fingerprint.as_str());
        let manifest = match fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(fingerprint.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<ManifestEntry> = serde_json::from_slice(&manifest)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::create_dir_all(dest)?;
        let mut summary = CheckoutSummary::default();
        for entry in &entries {
            if !is_safe_relpath(&entry.relpath) {
                return Err(StoreError::CorruptObject {
                    id: fingerprint.to_string(),
                    reason: format!("unsafe relpath {:?}", entry.relpath),
                });
            }
            let entry_fp = Fingerprint::new(entry.md5.as_str())?;
            parse_fingerprint(&entry_fp)?;

            let source = self.cache_path(&entry.md5);
            if !source.is_file() {
                return Err(StoreError::NotFound(entry.md5.clone()));
            }
            let target = dest.join(&entry.relpath);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            summary.bytes += fs::copy(&source, &target)?;
            summary.files += 1;
        }

        info!(
            fingerprint = %fingerprint,
            dest = %dest.display(),
            files = summary.files,
            "dvc snapshot checked out"
        );
        Ok(summary)
    }
}
