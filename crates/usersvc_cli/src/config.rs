//! Console configuration resolved from the environment.
//!
//! | Variable             | Default                      |
//! |----------------------|------------------------------|
//! | `USERSVC_DB_PATH`    | `usersvc.sqlite3`            |
//! | `USERSVC_LOG_LEVEL`  | build-mode default           |
//! | `USERSVC_LOG_DIR`    | `<temp dir>/usersvc-logs`    |
//!
//! `USERSVC_DB_PATH=:memory:` selects a throwaway in-memory store.

use std::path::{Path, PathBuf};
use usersvc_core::default_log_level;

pub const DB_PATH_VAR: &str = "USERSVC_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "USERSVC_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "USERSVC_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "usersvc.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "usersvc-logs";
const MEMORY_STORE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub store: StoreLocation,
    pub log_level: String,
    /// Always absolute.
    pub log_dir: PathBuf,
}

impl CliConfig {
    pub fn from_env() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir());
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Resolves settings from `lookup`; relative log dirs are joined onto `cwd`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, cwd: &Path) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let store = match non_blank(DB_PATH_VAR) {
            Some(value) if value.trim() == MEMORY_STORE => StoreLocation::Memory,
            Some(value) => StoreLocation::File(PathBuf::from(value.trim())),
            None => StoreLocation::File(PathBuf::from(DEFAULT_DB_FILE_NAME)),
        };

        let log_level =
            non_blank(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string());

        let log_dir = match non_blank(LOG_DIR_VAR) {
            Some(value) => {
                let path = PathBuf::from(value.trim());
                if path.is_absolute() {
                    path
                } else {
                    cwd.join(path)
                }
            }
            None => std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        };

        Self {
            store,
            log_level,
            log_dir,
        }
    }

    /// Log directory as UTF-8 text; the logger takes string paths.
    pub fn log_dir_utf8(&self) -> Result<&str, String> {
        self.log_dir.to_str().ok_or_else(|| {
            format!(
                "log directory `{}` is not valid UTF-8",
                self.log_dir.display()
            )
        })
    }
}
