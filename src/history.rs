//! Calculation history
//!
//! Keeps the most recent valuations, newest first, in a bounded list that is
//! persisted as one JSON record in a key-value store after each change.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AnnuityError, Result};
use crate::valuation::{AnnuityKind, AnnuityParameters, AnnuityResult};

/// Maximum number of entries kept
pub const HISTORY_CAPACITY: usize = 50;

/// Key under which the history is stored
pub const HISTORY_KEY: &str = "annuity_history";

/// Durable string records addressed by key
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, mainly for tests and one-off runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<()> {
        self.records.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: String) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// A stored valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: AnnuityKind,
    pub parameters: AnnuityParameters,
    pub result: AnnuityResult,
    pub timestamp: DateTime<Utc>,
}

/// Persisted form of the history
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    next_id: u64,
    entries: VecDeque<HistoryEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecordRef<'a> {
    next_id: u64,
    entries: &'a VecDeque<HistoryEntry>,
}

/// Bounded, newest-first list of valuations backed by a store
///
/// Ids are never reused, even after entries are removed or the history is
/// cleared.
#[derive(Debug)]
pub struct CalculationHistory<S: KeyValueStore> {
    store: S,
    entries: VecDeque<HistoryEntry>,
    next_id: u64,
    capacity: usize,
}

impl<S: KeyValueStore> CalculationHistory<S> {
    /// Load the history held by a store (empty if none)
    pub fn open(store: S) -> Result<Self> {
        Self::with_capacity(store, HISTORY_CAPACITY)
    }

    pub fn with_capacity(store: S, capacity: usize) -> Result<Self> {
        let record: HistoryRecord = match store.get(HISTORY_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => HistoryRecord::default(),
        };

        let mut entries = record.entries;
        entries.truncate(capacity);
        let stored_max = entries.iter().map(|e| e.id).max().unwrap_or(0);
        let next_id = record.next_id.max(stored_max + 1);

        info!("Loaded {} history entries", entries.len());
        Ok(Self {
            store,
            entries,
            next_id,
            capacity,
        })
    }

    /// Store a valuation as the newest entry, evicting the oldest on overflow
    pub fn record(
        &mut self,
        parameters: AnnuityParameters,
        result: AnnuityResult,
    ) -> Result<&HistoryEntry> {
        let entry = HistoryEntry {
            id: self.next_id,
            kind: parameters.kind(),
            parameters,
            result,
            timestamp: Utc::now(),
        };
        self.next_id += 1;

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.persist()?;

        Ok(&self.entries[0])
    }

    /// Entries, newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn remove(&mut self, id: u64) -> Result<HistoryEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(AnnuityError::EntryNotFound(id))?;
        let removed = self.entries.remove(index).ok_or(AnnuityError::EntryNotFound(id))?;
        self.persist()?;
        Ok(removed)
    }

    /// Drop every entry; the id counter is kept
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&HistoryRecordRef {
            next_id: self.next_id,
            entries: &self.entries,
        })?;
        self.store.put(HISTORY_KEY, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::Sex;
    use crate::valuation::ValuationEngine;

    fn valuation(age: u32) -> (AnnuityParameters, AnnuityResult) {
        let params = AnnuityParameters::new(age, Sex::Female, 2.0, 6_000.0);
        let result = ValuationEngine::standard().evaluate(&params);
        (params, result)
    }

    #[test]
    fn test_record_newest_first() {
        let mut history = CalculationHistory::open(MemoryStore::new()).unwrap();
        assert!(history.is_empty());

        for age in [60, 61, 62] {
            let (params, result) = valuation(age);
            history.record(params, result).unwrap();
        }

        let ages: Vec<_> = history.entries().map(|e| e.parameters.age).collect();
        assert_eq!(ages, vec![62, 61, 60]);
        let ids: Vec<_> = history.entries().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = CalculationHistory::with_capacity(MemoryStore::new(), 3).unwrap();
        for age in 60..65 {
            let (params, result) = valuation(age);
            history.record(params, result).unwrap();
        }

        assert_eq!(history.len(), 3);
        let ages: Vec<_> = history.entries().map(|e| e.parameters.age).collect();
        assert_eq!(ages, vec![64, 63, 62]);
    }

    #[test]
    fn test_default_capacity() {
        let mut history = CalculationHistory::open(MemoryStore::new()).unwrap();
        let (params, result) = valuation(65);
        for _ in 0..(HISTORY_CAPACITY + 5) {
            history.record(params.clone(), result.clone()).unwrap();
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.entries().next().map(|e| e.id), Some(55));
    }

    #[test]
    fn test_persists_and_reloads() {
        let mut history = CalculationHistory::open(MemoryStore::new()).unwrap();
        let (params, result) = valuation(70);
        history.record(params.clone().temporary(10), result).unwrap();

        let store = history.store().clone();
        let json = store.get(HISTORY_KEY).unwrap().unwrap();
        assert!(json.contains("\"type\":\"temporary\""));

        let reloaded = CalculationHistory::open(store).unwrap();
        assert_eq!(reloaded.len(), 1);
        let entry = reloaded.get(1).unwrap();
        assert_eq!(entry.parameters, params.temporary(10));
        assert_eq!(entry.kind, AnnuityKind::Temporary);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut history = CalculationHistory::open(MemoryStore::new()).unwrap();
        for age in [60, 61] {
            let (params, result) = valuation(age);
            history.record(params, result).unwrap();
        }

        let removed = history.remove(1).unwrap();
        assert_eq!(removed.parameters.age, 60);
        assert!(matches!(history.remove(1), Err(AnnuityError::EntryNotFound(1))));

        history.clear().unwrap();
        assert!(history.is_empty());
        let reloaded = CalculationHistory::open(history.store().clone()).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_ids_never_reused() {
        let mut history = CalculationHistory::open(MemoryStore::new()).unwrap();
        for age in [60, 61] {
            let (params, result) = valuation(age);
            history.record(params, result).unwrap();
        }

        // Removing the newest entry does not free its id
        history.remove(2).unwrap();
        let (params, result) = valuation(62);
        assert_eq!(history.record(params, result).unwrap().id, 3);

        // Nor does clearing, across a reload
        history.clear().unwrap();
        let mut reloaded = CalculationHistory::open(history.store().clone()).unwrap();
        let (params, result) = valuation(63);
        assert_eq!(reloaded.record(params, result).unwrap().id, 4);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("annuity_history_{}", std::process::id()));
        let mut store = FileStore::open(&dir).unwrap();
        assert!(store.get("missing").unwrap().is_none());

        store.put("key", "value".to_string()).unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));

        store.remove("key").unwrap();
        store.remove("key").unwrap();
        assert!(store.get("key").unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }
}
