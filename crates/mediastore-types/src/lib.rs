//! Foundation types for Mediastore.
//!
//! Every other Mediastore crate depends on `mediastore-types`. The types here
//! carry no I/O: they validate and name the values that flow between the
//! content store, the version catalog, and the workflow layer.
//!
//! # Key Types
//!
//! - [`DatasetName`] / [`VersionLabel`] — validated path-safe identifiers
//! - [`VersionKey`] — the `(dataset, version)` primary key
//! - [`Fingerprint`] — opaque, never-empty content identifier
//! - [`VersionRecord`] — one published dataset version
//! - [`ObjectId`] — BLAKE3 content-addressed object identifier
//! - [`PublishClock`] — monotonic publish timestamps

pub mod error;
pub mod fingerprint;
pub mod name;
pub mod object;
pub mod record;
pub mod temporal;

pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use name::{validate_name, DatasetName, VersionLabel};
pub use object::ObjectId;
pub use record::{VersionKey, VersionRecord};
pub use temporal::PublishClock;
