use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

pub const MIN_WORD_COUNT: usize = 5;
pub const MAX_WORD_COUNT: usize = 200;
pub const DEFAULT_WORD_COUNT: usize = 20;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Word count {0} is outside {min}..={max}", min = MIN_WORD_COUNT, max = MAX_WORD_COUNT)]
    OutOfRange(usize),

    #[error("Failed to write preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings that persist between runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub word_count: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            word_count: DEFAULT_WORD_COUNT,
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> Result<(), PreferencesError> {
        if (MIN_WORD_COUNT..=MAX_WORD_COUNT).contains(&self.word_count) {
            Ok(())
        } else {
            Err(PreferencesError::OutOfRange(self.word_count))
        }
    }
}

pub trait PreferencesStore {
    /// Never fails: anything unusable loads as the defaults.
    fn load(&self) -> Preferences;
    fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError>;
}

#[derive(Debug, Clone)]
pub struct FilePreferencesStore {
    path: PathBuf,
}

impl FilePreferencesStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::preferences_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FilePreferencesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferencesStore for FilePreferencesStore {
    fn load(&self) -> Preferences {
        let Ok(bytes) = fs::read(&self.path) else {
            return Preferences::default();
        };

        let loaded = serde_json::from_slice::<Preferences>(&bytes)
            .map_err(PreferencesError::from)
            .and_then(|prefs| prefs.validate().map(|_| prefs));

        match loaded {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!(
                    "Failed to load preferences from {}: {e}",
                    self.path.display()
                );
                Preferences::default()
            }
        }
    }

    fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        prefs.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(prefs)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_preferences() {
        let dir = tempdir().unwrap();
        let store = FilePreferencesStore::with_path(dir.path().join("preferences.json"));
        let prefs = Preferences::default();
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn save_and_load_custom_word_count() {
        let dir = tempdir().unwrap();
        let store = FilePreferencesStore::with_path(dir.path().join("a").join("prefs.json"));
        let prefs = Preferences { word_count: 50 };
        store.save(&prefs).unwrap();
        assert_eq!(store.load().word_count, 50);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let store = FilePreferencesStore::with_path(dir.path().join("none.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ this is not json").unwrap();
        let store = FilePreferencesStore::with_path(&path);
        assert_eq!(store.load().word_count, DEFAULT_WORD_COUNT);
    }

    #[test]
    fn out_of_range_file_loads_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"word_count": 999}"#).unwrap();
        let store = FilePreferencesStore::with_path(&path);
        assert_eq!(store.load().word_count, DEFAULT_WORD_COUNT);

        fs::write(&path, r#"{"word_count": "many"}"#).unwrap();
        assert_eq!(store.load().word_count, DEFAULT_WORD_COUNT);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(FilePreferencesStore::with_path(&path).load(), Preferences::default());
    }

    #[test]
    fn save_rejects_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let store = FilePreferencesStore::with_path(&path);
        assert_matches!(
            store.save(&Preferences { word_count: 1 }),
            Err(PreferencesError::OutOfRange(1))
        );
        assert!(!path.exists());
    }
}
