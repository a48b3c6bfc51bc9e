use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{STORAGE_FILE, STORAGE_NAME, STORAGE_VERSION};
use crate::models::Expense;

/// The nested state object inside the persisted blob: the serialized ledger
/// plus UI flags that should survive a restart.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub history_open: bool,
}

/// On-disk envelope: a name tag and version wrapping the state object.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct StorageEnvelope {
    name: String,
    version: u32,
    state: PersistedState,
}

/// Durable local storage for the ledger: a single named JSON blob, read
/// once at startup and rewritten on every mutation.
#[derive(Debug, Clone)]
pub struct LedgerStorage {
    path: PathBuf,
}

impl LedgerStorage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORAGE_FILE),
        }
    }

    /// Load the persisted state, or the default when no blob exists yet.
    pub async fn load(&self) -> Result<PersistedState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: StorageEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.name != STORAGE_NAME {
            bail!(
                "unexpected storage blob name '{}' (expected '{}')",
                envelope.name,
                STORAGE_NAME
            );
        }
        if envelope.version > STORAGE_VERSION {
            bail!(
                "storage blob version {} is newer than supported version {}",
                envelope.version,
                STORAGE_VERSION
            );
        }
        Ok(envelope.state)
    }

    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let envelope = StorageEnvelope {
            name: STORAGE_NAME.to_string(),
            version: STORAGE_VERSION,
            state: state.clone(),
        };
        let bytes = serde_json::to_vec(&envelope)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
