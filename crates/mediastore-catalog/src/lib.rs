//! Dataset version registry for Mediastore.
//!
//! The registry is the durable mapping from `(dataset, version)` to the
//! fingerprint a content store produced for that snapshot. A version is
//! published exactly once; resolving it afterwards always returns the same
//! fingerprint and timestamp.
//!
//! # Architecture
//!
//! - [`VersionRegistry`] validates names and fingerprints, stamps publish
//!   times, and translates catalog failures into [`PublishError`] and
//!   [`ResolveError`].
//! - [`Catalog`] is the storage seam. The registry holds it as
//!   `Arc<dyn Catalog>`, opened once per process.
//!
//! # Modules
//!
//! - [`error`] — catalog, publish and resolve errors
//! - [`traits`] — the [`Catalog`] trait
//! - [`memory`] — [`InMemoryCatalog`] for tests and embedding
//! - [`sqlite`] — [`SqliteCatalog`], the durable backend
//! - [`registry`] — [`VersionRegistry`]

pub mod error;
pub mod memory;
pub mod registry;
pub mod sqlite;
pub mod traits;

pub use error::{CatalogError, CatalogResult, PublishError, ResolveError};
pub use memory::InMemoryCatalog;
pub use registry::VersionRegistry;
pub use sqlite::{SqliteCatalog, SqliteCatalogConfig};
pub use traits::Catalog;
