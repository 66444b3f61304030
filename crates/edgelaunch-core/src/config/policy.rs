use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::host::PolicyStore;

/// Persisted user policy: whether the overlay should be running at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyState {
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for PolicyState {
    fn default() -> Self {
        Self { is_active: true }
    }
}

impl PolicyState {
    /// Load the policy, treating a missing file as active.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// `PolicyStore` backed by `state.json`.
#[derive(Debug, Clone)]
pub struct PolicyFile {
    path: PathBuf,
}

impl PolicyFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PolicyStore for PolicyFile {
    fn load(&self) -> Result<bool> {
        PolicyState::load(&self.path).map(|state| state.is_active)
    }

    fn save(&self, active: bool) -> Result<()> {
        PolicyState { is_active: active }.save(&self.path)
    }
}
