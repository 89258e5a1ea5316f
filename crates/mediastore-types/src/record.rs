//! Catalog records: the `(dataset, version)` key and the row it maps to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::fingerprint::Fingerprint;
use crate::name::{DatasetName, VersionLabel};

/// Primary key of a published dataset version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionKey {
    pub dataset: DatasetName,
    pub version: VersionLabel,
}

impl VersionKey {
    pub fn new(dataset: DatasetName, version: VersionLabel) -> Self {
        Self { dataset, version }
    }

    /// Validate both halves of a key given as raw strings.
    pub fn parse(dataset: &str, version: &str) -> Result<Self, TypeError> {
        Ok(Self {
            dataset: DatasetName::new(dataset)?,
            version: VersionLabel::new(version)?,
        })
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset, self.version)
    }
}

/// One published dataset version.
///
/// Records are written once and never mutated; a new snapshot of a dataset is
/// a new record under a new version label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub dataset: DatasetName,
    pub version: VersionLabel,
    /// Fingerprint returned by the content store for this snapshot.
    pub fingerprint: Fingerprint,
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(key: VersionKey, fingerprint: Fingerprint, created_at: DateTime<Utc>) -> Self {
        Self {
            dataset: key.dataset,
            version: key.version,
            fingerprint,
            created_at,
        }
    }

    pub fn key(&self) -> VersionKey {
        VersionKey::new(self.dataset.clone(), self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_validates_both_halves() {
        assert!(VersionKey::parse("catsdogs", "v1").is_ok());
        assert!(VersionKey::parse("", "v1").is_err());
        assert!(VersionKey::parse("catsdogs", "v/1").is_err());
    }

    #[test]
    fn key_display() {
        let key = VersionKey::parse("catsdogs", "v1").unwrap();
        assert_eq!(key.to_string(), "catsdogs/v1");
    }

    #[test]
    fn record_key_matches_fields() {
        let key = VersionKey::parse("catsdogs", "v1").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = VersionRecord::new(key.clone(), Fingerprint::new("fp-abc123").unwrap(), t0);
        assert_eq!(record.key(), key);
        assert_eq!(record.created_at, t0);
    }

    #[test]
    fn record_json_shape() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = VersionRecord::new(
            VersionKey::parse("catsdogs", "v1").unwrap(),
            Fingerprint::new("fp-abc123").unwrap(),
            t0,
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["dataset"], "catsdogs");
        assert_eq!(json["version"], "v1");
        assert_eq!(json["fingerprint"], "fp-abc123");
        let back: VersionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
