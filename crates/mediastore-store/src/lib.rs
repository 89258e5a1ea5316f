//! Content-addressed storage for Mediastore.
//!
//! A content store turns a directory of staged files into a [`Fingerprint`]
//! and turns a fingerprint back into files on disk. The version registry
//! records fingerprints; it never looks at bytes.
//!
//! # Content Stores
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`ObjectContentStore`] -- native snapshots built from [`Blob`] and
//!   [`Tree`] objects over any [`ObjectStore`]
//! - [`DvcContentStore`] -- adapter over an external `dvc` installation
//!
//! # Object Stores
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`LooseObjectStore`] -- one file per object under a fan-out directory
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; writing the same bytes twice is a no-op.
//! 2. Fingerprints are returned as structured values, never parsed out of tool logs.
//! 3. An empty directory has no fingerprint: `add` returns `Ok(None)`.
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`Fingerprint`]: mediastore_types::Fingerprint

pub mod dvc;
pub mod error;
pub mod hasher;
pub mod loose;
pub mod memory;
pub mod object;
pub mod snapshot;
pub mod traits;

pub use dvc::{DvcConfig, DvcContentStore};
pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use snapshot::ObjectContentStore;
pub use traits::{CheckoutSummary, ContentStore, ObjectStore};
