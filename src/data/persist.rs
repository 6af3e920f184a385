//! Versioned on-disk state: orbs, profiles and the shareable category set.
//!
//! The version lives in both the file name (`_v1`) and the payload. A file with any other
//! version is ignored rather than partially merged. Failures are logged and reported through
//! `bool`/`Option` results; they never leave in-memory state half-updated.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::orb::Orb;
use super::profile::Profile;
use crate::editor::AppState;

pub const STATE_VERSION: u32 = 1;
pub const DEFAULT_STATE_PATH: &str = "data/orbsmith_state_v1.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state file io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("state file has version {found}, expected {STATE_VERSION}")]
    Version { found: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
    orbs: Vec<Orb>,
    profiles: Vec<Profile>,
    shareable: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_PATH)
    }
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the state; `false` (and a warning) on any failure.
    pub fn save(&self, state: &AppState) -> bool {
        match self.try_save(state) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to save state");
                false
            }
        }
    }

    /// Reads the state; `None` when the file is missing, unreadable, or from another version.
    pub fn load(&self) -> Option<AppState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved state");
            return None;
        }
        match self.try_load() {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring saved state");
                None
            }
        }
    }

    /// Removes the state file. A missing file counts as cleared.
    pub fn clear(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to clear state");
                false
            }
        }
    }

    pub fn try_save(&self, state: &AppState) -> Result<(), PersistError> {
        let payload = PersistedState {
            version: STATE_VERSION,
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            orbs: state.orbs.clone(),
            profiles: state.profiles.clone(),
            shareable: state.shareable.clone(),
        };
        let serialized = serde_json::to_string_pretty(&payload)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialized)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    pub fn try_load(&self) -> Result<AppState, PersistError> {
        let raw = fs::read_to_string(&self.path)?;
        let payload: PersistedState = serde_json::from_str(&raw)?;
        if payload.version != STATE_VERSION {
            return Err(PersistError::Version {
                found: payload.version,
            });
        }
        Ok(AppState {
            orbs: payload.orbs.into_iter().map(Orb::normalized).collect(),
            profiles: payload.profiles,
            shareable: payload.shareable,
        })
    }
}
