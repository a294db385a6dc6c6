//! Search History and Favorites
//!
//! Both are newest-first lists deduplicated by CAS number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ChemicalRecord;
use crate::storage::{JsonFile, StateDir, StoreError, FAVORITES_KEY, HISTORY_KEY};

pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalRef {
    pub cas_number: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_zh: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChemicalRef {
    pub fn from_record(record: &ChemicalRecord) -> Self {
        Self {
            cas_number: record.cas_number.trim().to_string(),
            name_en: record.name_en.clone(),
            name_zh: record.name_zh.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn bare(cas: &str) -> Self {
        Self {
            cas_number: cas.trim().to_string(),
            name_en: None,
            name_zh: None,
            timestamp: Utc::now(),
        }
    }
}

/// Newest-first list of chemicals keyed by CAS, optionally capped.
struct RefList {
    file: JsonFile<Vec<ChemicalRef>>,
    entries: Vec<ChemicalRef>,
    cap: Option<usize>,
}

impl RefList {
    fn open(state: &StateDir, key: &str, cap: Option<usize>) -> Self {
        let file = state.file(key);
        let mut entries: Vec<ChemicalRef> = file.load();
        if let Some(cap) = cap {
            entries.truncate(cap);
        }
        Self { file, entries, cap }
    }

    fn position(&self, cas: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.cas_number == cas.trim())
    }

    /// Persist `next`, then adopt it. A failed save leaves memory as it was.
    fn commit(&mut self, next: Vec<ChemicalRef>) -> Result<(), StoreError> {
        self.file.save(&next)?;
        self.entries = next;
        Ok(())
    }

    fn push_front(&mut self, entry: ChemicalRef) -> Result<(), StoreError> {
        let mut next: Vec<ChemicalRef> = self
            .entries
            .iter()
            .filter(|e| e.cas_number != entry.cas_number)
            .cloned()
            .collect();
        next.insert(0, entry);
        if let Some(cap) = self.cap {
            next.truncate(cap);
        }
        self.commit(next)
    }

    fn remove(&mut self, cas: &str) -> Result<bool, StoreError> {
        let Some(pos) = self.position(cas) else {
            return Ok(false);
        };
        let mut next = self.entries.clone();
        next.remove(pos);
        self.commit(next)?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }
}

pub struct SearchHistory {
    list: RefList,
}

impl SearchHistory {
    pub fn open(state: &StateDir) -> Self {
        Self {
            list: RefList::open(state, HISTORY_KEY, Some(MAX_HISTORY)),
        }
    }

    /// Record a search; a repeated CAS moves to the front.
    pub fn record(&mut self, entry: ChemicalRef) -> Result<(), StoreError> {
        if entry.cas_number.is_empty() {
            return Ok(());
        }
        self.list.push_front(entry)
    }

    pub fn remove(&mut self, cas: &str) -> Result<bool, StoreError> {
        self.list.remove(cas)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.list.clear()
    }

    pub fn entries(&self) -> &[ChemicalRef] {
        &self.list.entries
    }
}

pub struct Favorites {
    list: RefList,
}

impl Favorites {
    pub fn open(state: &StateDir) -> Self {
        Self {
            list: RefList::open(state, FAVORITES_KEY, None),
        }
    }

    pub fn contains(&self, cas: &str) -> bool {
        self.list.position(cas).is_some()
    }

    /// Adding an existing favorite refreshes it to the front.
    pub fn add(&mut self, entry: ChemicalRef) -> Result<(), StoreError> {
        self.list.push_front(entry)
    }

    pub fn remove(&mut self, cas: &str) -> Result<bool, StoreError> {
        self.list.remove(cas)
    }

    /// Returns whether the chemical is a favorite afterwards.
    pub fn toggle(&mut self, entry: ChemicalRef) -> Result<bool, StoreError> {
        if self.list.remove(&entry.cas_number)? {
            Ok(false)
        } else {
            self.list.push_front(entry)?;
            Ok(true)
        }
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.list.clear()
    }

    pub fn entries(&self) -> &[ChemicalRef] {
        &self.list.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_dedupes_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::open(dir.path()).unwrap();
        let mut history = SearchHistory::open(&state);

        for i in 0..60 {
            history.record(ChemicalRef::bare(&format!("{}-00-0", 100 + i))).unwrap();
        }
        history.record(ChemicalRef::bare("150-00-0")).unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0].cas_number, "150-00-0");
        assert_eq!(entries.iter().filter(|e| e.cas_number == "150-00-0").count(), 1);

        let reopened = SearchHistory::open(&state);
        assert_eq!(reopened.entries().len(), MAX_HISTORY);
    }

    #[test]
    fn test_failed_save_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::open(dir.path().join("state")).unwrap();
        let mut history = SearchHistory::open(&state);
        history.record(ChemicalRef::bare("64-17-5")).unwrap();
        std::fs::remove_dir_all(state.root()).unwrap();

        assert!(history.record(ChemicalRef::bare("67-64-1")).is_err());
        assert!(history.clear().is_err());
        let cas: Vec<_> = history.entries().iter().map(|e| e.cas_number.as_str()).collect();
        assert_eq!(cas, vec!["64-17-5"]);
    }

    #[test]
    fn test_favorites_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::open(dir.path()).unwrap();
        let mut favorites = Favorites::open(&state);

        assert!(favorites.toggle(ChemicalRef::bare("64-17-5")).unwrap());
        assert!(favorites.contains("64-17-5"));
        assert!(!favorites.toggle(ChemicalRef::bare("64-17-5")).unwrap());
        assert!(Favorites::open(&state).entries().is_empty());
    }

    #[test]
    fn test_favorites_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::open(dir.path()).unwrap();
        let mut favorites = Favorites::open(&state);

        favorites.add(ChemicalRef::bare("64-17-5")).unwrap();
        favorites.add(ChemicalRef::bare("67-64-1")).unwrap();
        favorites.add(ChemicalRef::bare("64-17-5")).unwrap();

        let cas: Vec<_> = favorites.entries().iter().map(|e| e.cas_number.as_str()).collect();
        assert_eq!(cas, vec!["64-17-5", "67-64-1"]);
    }
}
