use crate::error::StoreError;
use crate::persist::read_json_or_default;
use crate::persist::write_json;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

pub const HISTORY_FILENAME: &str = "history.json";

/// Past queries, most recent first, each value at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from stored entries, keeping the first occurrence of
    /// any duplicate.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::new();
        for entry in entries {
            if !history.entries.contains(&entry) {
                history.entries.push(entry);
            }
        }
        history
    }

    /// Moves `query` to the front, inserting it when absent.
    pub fn record(&mut self, query: &str) {
        self.entries.retain(|existing| existing != query);
        self.entries.insert(0, query.to_string());
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, query: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|existing| existing != query);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn front(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `history.json` in the data directory.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredHistory {
    #[serde(default)]
    queries: Vec<String>,
}

impl HistoryFile {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILENAME),
        }
    }

    pub fn load(&self) -> Result<SearchHistory, StoreError> {
        let stored: StoredHistory = read_json_or_default(&self.path)?;
        Ok(SearchHistory::from_entries(stored.queries))
    }

    pub fn save(&self, history: &SearchHistory) -> Result<(), StoreError> {
        write_json(
            &self.path,
            &StoredHistory {
                queries: history.entries.clone(),
            },
        )
    }
}
