// SPDX-License-Identifier: MPL-2.0
//! Durable key-value storage for the two persisted scalars: the UI
//! language and the install-guidance dismissal timestamp.
//!
//! Values are whole-string replacements, so there are no partial-update
//! races to worry about. Callers treat read failures as "value absent"
//! and log (rather than propagate) write failures, so a broken storage
//! backend degrades to default-language / not-yet-dismissed behavior.
//!
//! # Path Resolution
//!
//! [`FileStorage`] resolves its directory in priority order:
//! 1. Explicit directory passed to [`FileStorage::with_dir`] (for tests)
//! 2. `RUNNER_SHELL_DATA_DIR` environment variable
//! 3. Platform-specific data directory via the `dirs` crate

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Storage key for the persisted language store state.
pub const LANGUAGE_KEY: &str = "runner-language";

/// Storage key for the dismissal timestamp (epoch milliseconds as a
/// numeric string).
pub const DISMISSED_AT_KEY: &str = "pwa-install-dismissed-at";

/// Application name used for directory naming.
const APP_NAME: &str = "RunnerShell";

/// Environment variable to override the storage directory.
pub const ENV_DATA_DIR: &str = "RUNNER_SHELL_DATA_DIR";

/// Durable string-keyed storage with whole-value replacement semantics.
pub trait Storage {
    /// Returns the stored value, or `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replaces the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes the value under `key`. Removing an absent key is not an
    /// error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed storage with one file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates storage rooted at the default data directory.
    ///
    /// Returns `None` if no data directory can be determined (rare edge
    /// case when the platform reports no home directory).
    #[must_use]
    pub fn new() -> Option<Self> {
        resolve_data_dir().map(|dir| Self { dir })
    }

    /// Creates storage rooted at an explicit directory.
    #[must_use]
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(sanitize_key(key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.file_path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::from(err)),
        }
    }
}

/// Returns the storage directory path.
///
/// Resolution order: `RUNNER_SHELL_DATA_DIR` environment variable (if
/// set and non-empty), then the platform data directory with the app
/// name appended.
fn resolve_data_dir() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(ENV_DATA_DIR) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    dirs::data_dir().map(|mut path| {
        path.push(APP_NAME);
        path
    })
}

/// Maps a storage key to a safe file name.
///
/// The crate only uses fixed dash-cased keys, so this is a guard rail
/// for embedder-supplied keys rather than a general escaping scheme.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
