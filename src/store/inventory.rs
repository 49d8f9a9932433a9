use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::StoreError;

/// The medicine/equipment document. Entries are plain names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub medicines: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

impl Inventory {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Write-through store for the inventory document.
///
/// Reads are served from memory under a shared lock. A replace takes
/// the exclusive lock, persists the whole document atomically (temp
/// file in the same directory, then rename) and only then updates the
/// in-memory copy, so a concurrent reader never observes a torn or
/// half-applied document.
pub struct InventoryStore {
    path: PathBuf,
    current: RwLock<Inventory>,
}

impl InventoryStore {
    /// Open the store, defaulting to an empty inventory when the
    /// document is missing or malformed.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match Inventory::load(&path) {
            Ok(inventory) => inventory,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Inventory unavailable; starting empty"
                );
                Inventory::default()
            }
        };
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn snapshot(&self) -> Inventory {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the document wholesale. Persistence failures surface to
    /// the caller and leave the previous document in place.
    pub fn replace(&self, inventory: Inventory) -> Result<(), StoreError> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        persist(&self.path, &inventory)?;
        *guard = inventory;
        Ok(())
    }
}

fn persist(path: &Path, inventory: &Inventory) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    // Temp file must live in the target directory so the rename is atomic.
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, inventory)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
