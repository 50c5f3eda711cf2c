use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides the data directory, mainly for tests and portable installs.
pub const DATA_DIR_ENV: &str = "TERMTYPR_DATA_DIR";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn data_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            PathBuf::from(dir)
        } else {
            ProjectDirs::from("", "", "termtypr")
                .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn history_path() -> PathBuf {
        Self::data_dir().join("history.json")
    }

    pub fn preferences_path() -> PathBuf {
        Self::data_dir().join("preferences.json")
    }

    pub fn user_words_path() -> PathBuf {
        Self::data_dir().join("words.json")
    }

    pub fn log_path() -> PathBuf {
        Self::data_dir().join("termtypr.log")
    }
}
