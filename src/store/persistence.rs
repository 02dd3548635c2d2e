use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use crate::core::entry::Entry;
use crate::error::StoreError;

/// Load-all/save-all contract for the entry set.
pub trait EntryPersistence {
    /// Returns an empty set when nothing has been stored yet.
    fn load(&self) -> Result<Vec<Entry>, StoreError>;
    fn save(&self, entries: &[Entry]) -> Result<(), StoreError>;
}

/// Entries kept as a pretty-printed JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

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

impl EntryPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Vec<Entry>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No entry file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries: Vec<Entry> =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        log::debug!("Loaded {} entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// In-process persistence; remembers the last saved set.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: RefCell<Vec<Entry>>,
    saves: Cell<usize>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            saved: RefCell::new(entries),
            saves: Cell::new(0),
        }
    }

    pub fn saved(&self) -> Vec<Entry> {
        self.saved.borrow().clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl EntryPersistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        *self.saved.borrow_mut() = entries.to_vec();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
