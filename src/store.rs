//! Persistence for [`SecurityState`].
//!
//! The guard treats the store as best-effort: a failed load means "no prior
//! state" and a failed save is logged and dropped. The store itself reports
//! failures through [`StoreError`] so that decision stays with the caller.
//!
//! No cross-process locking is done. Two processes saving concurrently race,
//! and the last writer wins.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::guard::state::SecurityState;

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".tcds_lock_state.json";

/// Errors from reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("state file I/O error at {}: {source}", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but does not hold a valid state record.
    #[error("malformed state file at {}: {source}", path.display())]
    Malformed {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The file holds valid JSON that is not an object.
    #[error("state file at {} does not hold a JSON object", path.display())]
    NotAnObject {
        /// File that was read.
        path: PathBuf,
    },

    /// The state could not be encoded.
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    /// In-memory store lock was poisoned.
    #[error("state store lock poisoned")]
    Poisoned,
}

/// Load/save interface for the guard's persisted state.
pub trait StateStore: Send {
    /// Read the stored state. A store with nothing saved yet returns the default.
    fn load(&self) -> Result<SecurityState, StoreError>;

    /// Overwrite the stored state.
    fn save(&self, state: &SecurityState) -> Result<(), StoreError>;
}

/// JSON file store at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<SecurityState, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting clean");
                return Ok(SecurityState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        SecurityState::from_json_lenient(&value).ok_or_else(|| StoreError::NotAnObject {
            path: self.path.clone(),
        })
    }

    /// Writes to a temporary sibling first, then renames over the target so
    /// readers never observe a half-written record.
    fn save(&self, state: &SecurityState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state).map_err(StoreError::Encode)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "state file updated");
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a test can keep a handle
/// and inspect what the guard saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<SecurityState>>>,
}

impl MemoryStore {
    /// Empty store; loads as the default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a state, as if saved by an earlier run.
    pub fn with_state(state: SecurityState) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// Last saved state, if any.
    pub fn saved(&self) -> Option<SecurityState> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<SecurityState, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone().unwrap_or_default())
    }

    fn save(&self, state: &SecurityState) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(state.clone());
        Ok(())
    }
}
