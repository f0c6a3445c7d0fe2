// ── Persisted session state ──
//
// Durable state surviving restarts: the slot → platform-alarm links and
// the polling flag. The store is a small trait so tests can run against
// an in-memory map while deployments write a JSON file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CoreError;

/// Link between a device alarm slot and its platform counterparts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmLink {
    /// Capability id on the device entry, e.g. `alarm.3`.
    pub capability_id: String,
    /// Platform alarm id, once one has been created for this slot.
    pub external_id: Option<String>,
}

/// Everything the session persists between restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Keyed by device alarm slot number.
    #[serde(default)]
    pub links: BTreeMap<u8, AlarmLink>,
    #[serde(default = "default_polling")]
    pub polling_enabled: bool,
}

fn default_polling() -> bool {
    true
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            links: BTreeMap::new(),
            polling_enabled: true,
        }
    }
}

/// Durable storage for [`PersistedState`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last saved state, or the default when nothing was saved.
    async fn load(&self) -> Result<PersistedState, CoreError>;

    async fn save(&self, state: &PersistedState) -> Result<(), CoreError>;
}

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<PersistedState, CoreError> {
        Ok(self.state.lock().await.clone().unwrap_or_default())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

/// JSON-file-backed store. Writes go to a sibling temp file first and
/// are renamed into place, so a crash mid-write never corrupts state.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<PersistedState, CoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| CoreError::Store {
                message: format!("corrupt state file {}: {e}", self.path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(CoreError::Store {
                message: format!("failed to read {}: {e}", self.path.display()),
            }),
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| CoreError::Store {
            message: format!("failed to encode state: {e}"),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CoreError::Store {
                message: format!("failed to write {}: {e}", tmp.display()),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CoreError::Store {
                message: format!("failed to replace {}: {e}", self.path.display()),
            })
    }
}
