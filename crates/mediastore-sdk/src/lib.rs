//! High-level SDK for Mediastore.
//!
//! [`Mediastore`] ties a content store and the version registry together
//! into the dataset workflow: create a dataset, create a version, add images
//! to it (which snapshots and publishes the version), and retrieve any
//! published version later.

pub mod config;
pub mod error;
pub mod repository;

pub use config::{ContentBackend, ContentConfig, MediastoreConfig};
pub use error::{ErrorCategory, SdkError, SdkResult};
pub use repository::{Mediastore, RetrievedVersion};

// Re-export key types
pub use mediastore_catalog::{PublishError, ResolveError, SqliteCatalogConfig, VersionRegistry};
pub use mediastore_store::{CheckoutSummary, ContentStore};
pub use mediastore_types::{DatasetName, Fingerprint, VersionKey, VersionLabel, VersionRecord};
