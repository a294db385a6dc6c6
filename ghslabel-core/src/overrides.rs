//! Custom Classification Overrides
//!
//! Per-CAS user choice of classification bundle. Every mutation is written
//! through to disk before returning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::storage::{JsonFile, StateDir, StoreError, OVERRIDES_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOverride {
    pub selected_index: usize,
    #[serde(default)]
    pub note: String,
    pub updated_at: DateTime<Utc>,
}

pub type OverrideMap = BTreeMap<String, CustomOverride>;

pub struct OverrideStore {
    file: JsonFile<OverrideMap>,
    entries: OverrideMap,
}

impl OverrideStore {
    pub fn open(state: &StateDir) -> Self {
        let file = state.file(OVERRIDES_KEY);
        let entries = file.load();
        Self { file, entries }
    }

    pub fn get(&self, cas: &str) -> Option<&CustomOverride> {
        self.entries.get(cas.trim())
    }

    pub fn all(&self) -> &OverrideMap {
        &self.entries
    }

    /// Upsert the choice for `cas`. Indices are not checked against any
    /// record here; the resolver ignores stale ones.
    pub fn set_override(&mut self, cas: &str, selected_index: usize, note: &str) -> Result<&CustomOverride, StoreError> {
        let cas = cas.trim().to_string();
        let entry = CustomOverride {
            selected_index,
            note: note.trim().to_string(),
            updated_at: Utc::now(),
        };
        let mut next = self.entries.clone();
        next.insert(cas.clone(), entry);
        self.file.save(&next)?;
        self.entries = next;
        tracing::info!(cas = %cas, selected_index, "classification override saved");
        Ok(&self.entries[&cas])
    }

    /// Restore the default classification. Returns whether an override existed.
    pub fn clear_override(&mut self, cas: &str) -> Result<bool, StoreError> {
        let cas = cas.trim();
        if !self.entries.contains_key(cas) {
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.remove(cas);
        self.file.save(&next)?;
        self.entries = next;
        tracing::info!(cas = %cas, "classification override cleared");
        Ok(true)
    }
}
