//! Locale and theme preferences that outlive a session.

use crate::error::StoreError;
use crate::persist::read_json_or_default;
use crate::persist::write_json;
use neurodoc_protocol::LocaleSelection;
use neurodoc_protocol::Theme;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

pub const PREFERENCES_FILENAME: &str = "preferences.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// The user's choice, never the resolved locale.
    #[serde(default)]
    pub locale: LocaleSelection,
    #[serde(default)]
    pub theme: Theme,
}

/// Key-value storage for [`Preferences`]; read once at startup, written on
/// every change.
pub trait PreferenceStore: Send {
    fn load(&self) -> Result<Preferences, StoreError>;
    fn save(&self, preferences: &Preferences) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            path: data_dir.join(PREFERENCES_FILENAME),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Preferences, StoreError> {
        read_json_or_default(&self.path)
    }

    fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        write_json(&self.path, preferences)
    }
}

/// In-process store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    preferences: Preferences,
    saves: usize,
}

impl MemoryPreferenceStore {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemorySlot {
                preferences,
                saves: 0,
            })),
        }
    }

    pub fn current(&self) -> Preferences {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .preferences
    }

    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .saves
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Preferences, StoreError> {
        Ok(self.current())
    }

    fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        slot.preferences = *preferences;
        slot.saves += 1;
        Ok(())
    }
}
