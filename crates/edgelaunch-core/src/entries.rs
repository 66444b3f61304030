//! Entry tree persisted as `entries.json`.

use std::path::{Path, PathBuf};

use edgelaunch_types::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{EntrySource, TransactionContext};
use crate::{Error, Result};

const ENTRIES_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EntriesDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

fn default_version() -> u32 {
    ENTRIES_VERSION
}

/// `EntrySource` reading the whole tree from one JSON file per transaction.
#[derive(Debug, Clone)]
pub struct JsonEntryStore {
    path: PathBuf,
}

impl JsonEntryStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree contains virtual folders or the file
    /// cannot be written.
    pub fn save(&self, entries: &[Entry]) -> Result<()> {
        validate_persisted(entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let document = EntriesDocument {
            version: ENTRIES_VERSION,
            entries: entries.to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }

    fn read_document(&self) -> Result<EntriesDocument> {
        if !self.path.exists() {
            debug!("No entries file at {}, starting empty", self.path.display());
            return Ok(EntriesDocument::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let document: EntriesDocument = serde_json::from_str(&content)
            .map_err(|e| Error::DataSource(format!("{}: {e}", self.path.display())))?;
        if document.version > ENTRIES_VERSION {
            return Err(Error::DataSource(format!(
                "unsupported entries version {}",
                document.version
            )));
        }
        validate_persisted(&document.entries)?;
        Ok(document)
    }
}

/// Virtual folders exist only at runtime.
fn validate_persisted(entries: &[Entry]) -> Result<()> {
    for entry in entries {
        if entry.is_virtual() {
            return Err(Error::DataSource(format!(
                "virtual folder '{}' in persisted tree",
                entry.name()
            )));
        }
        validate_persisted(entry.children())?;
    }
    Ok(())
}

struct Snapshot {
    document: EntriesDocument,
}

impl TransactionContext for Snapshot {
    fn load_root_content(&self) -> Result<Vec<Entry>> {
        Ok(self.document.entries.clone())
    }
}

impl EntrySource for JsonEntryStore {
    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn TransactionContext) -> Result<()>,
    ) -> Result<()> {
        let snapshot = Snapshot {
            document: self.read_document()?,
        };
        f(&snapshot)
    }
}
