//! Credential records stored inside the encrypted vault payload.
//!
//! The whole `VaultContent` is serialized to JSON and encrypted as one
//! blob on every save; individual entries are never encrypted on their
//! own.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Stable identifier (UUID v4), assigned once and never reused.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
}

/// Fields of an entry that has not been given an id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
}

impl VaultEntry {
    /// Case-insensitive substring match on title, username or URL.
    /// Passwords and notes are never searched.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.title, &self.username, &self.url]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

impl NewEntry {
    /// Turn this into a committed entry with a freshly generated id.
    pub fn into_entry(self) -> VaultEntry {
        VaultEntry {
            id: new_entry_id(),
            title: self.title,
            username: self.username,
            password: self.password,
            url: self.url,
            notes: self.notes,
        }
    }
}

/// The plaintext payload of a vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContent {
    #[serde(default)]
    pub entries: Vec<VaultEntry>,
}

impl VaultContent {
    /// Give every entry without an id a fresh one.
    ///
    /// Returns the number of ids assigned.
    pub fn assign_missing_ids(&mut self) -> usize {
        let mut assigned = 0;
        for entry in self.entries.iter_mut().filter(|e| e.id.is_empty()) {
            entry.id = new_entry_id();
            assigned += 1;
        }
        assigned
    }

    /// Entries sorted by title (case-insensitive), for display.
    pub fn sorted_by_title(&self) -> Vec<&VaultEntry> {
        let mut list: Vec<&VaultEntry> = self.entries.iter().collect();
        list.sort_by_key(|e| e.title.to_lowercase());
        list
    }

    /// Entries matching `query`, sorted by title.
    pub fn search(&self, query: &str) -> Vec<&VaultEntry> {
        let mut list = self.sorted_by_title();
        list.retain(|e| e.matches(query));
        list
    }
}

/// Generate a new unique entry id.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}
