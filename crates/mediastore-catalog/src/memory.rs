//! In-memory catalog for tests and embedding.

use std::collections::BTreeMap;
use std::sync::RwLock;

use mediastore_types::{DatasetName, VersionKey, VersionRecord};

use crate::error::{CatalogError, CatalogResult};
use crate::traits::Catalog;

/// A [`Catalog`] backed by a `BTreeMap` behind a `RwLock`.
///
/// Records are lost when the catalog is dropped.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: RwLock<BTreeMap<VersionKey, VersionRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> CatalogError {
    CatalogError::Unavailable("catalog lock poisoned".into())
}

impl Catalog for InMemoryCatalog {
    fn insert(&self, record: &VersionRecord) -> CatalogResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        let key = record.key();
        if records.contains_key(&key) {
            return Err(CatalogError::Duplicate { key });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn get(&self, key: &VersionKey) -> CatalogResult<Option<VersionRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn list(&self, dataset: &DatasetName) -> CatalogResult<Vec<VersionRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut result: Vec<VersionRecord> = records
            .values()
            .filter(|r| &r.dataset == dataset)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.version.cmp(&b.version))
        });
        Ok(result)
    }

    fn datasets(&self) -> CatalogResult<Vec<DatasetName>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut names: Vec<DatasetName> = records.keys().map(|k| k.dataset.clone()).collect();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mediastore_types::Fingerprint;

    fn record(dataset: &str, version: &str, fp: &str, secs: i64) -> VersionRecord {
        VersionRecord::new(
            VersionKey::parse(dataset, version).unwrap(),
            Fingerprint::new(fp).unwrap(),
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn insert_and_get() {
        let catalog = InMemoryCatalog::new();
        let r = record("catsdogs", "v1", "fp-abc123", 0);
        catalog.insert(&r).unwrap();
        assert_eq!(catalog.get(&r.key()).unwrap(), Some(r));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn get_missing_is_none() {
        let catalog = InMemoryCatalog::new();
        let key = VersionKey::parse("catsdogs", "v2").unwrap();
        assert_eq!(catalog.get(&key).unwrap(), None);
        assert!(!catalog.contains(&key).unwrap());
    }

    #[test]
    fn duplicate_insert_keeps_first() {
        let catalog = InMemoryCatalog::new();
        let first = record("catsdogs", "v1", "fp-first", 0);
        catalog.insert(&first).unwrap();

        let err = catalog.insert(&record("catsdogs", "v1", "fp-second", 5)).unwrap_err();
        assert_eq!(err, CatalogError::Duplicate { key: first.key() });
        assert_eq!(catalog.get(&first.key()).unwrap(), Some(first));
    }

    #[test]
    fn concurrent_inserts_admit_exactly_one() {
        let catalog = InMemoryCatalog::new();
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let catalog = &catalog;
                    s.spawn(move || catalog.insert(&record("catsdogs", "v1", &format!("fp-{i}"), i)))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let duplicates =
            results.iter().filter(|r| matches!(r, Err(CatalogError::Duplicate { .. }))).count();
        assert_eq!((winners, duplicates), (1, 7));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn list_orders_by_time_then_label() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(&record("catsdogs", "v3", "c", 20)).unwrap();
        catalog.insert(&record("catsdogs", "v2", "b", 10)).unwrap();
        catalog.insert(&record("catsdogs", "v1", "a", 10)).unwrap();
        catalog.insert(&record("birds", "v1", "z", 0)).unwrap();

        let dataset = DatasetName::new("catsdogs").unwrap();
        let labels: Vec<_> = catalog
            .list(&dataset)
            .unwrap()
            .into_iter()
            .map(|r| r.version.to_string())
            .collect();
        assert_eq!(labels, ["v1", "v2", "v3"]);
    }

    #[test]
    fn datasets_are_distinct_and_sorted() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(&record("catsdogs", "v1", "a", 0)).unwrap();
        catalog.insert(&record("catsdogs", "v2", "b", 1)).unwrap();
        catalog.insert(&record("birds", "v1", "c", 2)).unwrap();

        let names: Vec<_> = catalog.datasets().unwrap().iter().map(|d| d.to_string()).collect();
        assert_eq!(names, ["birds", "catsdogs"]);
    }
}
