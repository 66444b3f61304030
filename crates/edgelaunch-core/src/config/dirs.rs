use directories::ProjectDirs;
use std::path::PathBuf;

use crate::{Error, Result};

/// Application directories following XDG spec
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/edgelaunch)
    pub config: PathBuf,

    /// Data directory (~/.local/share/edgelaunch)
    pub data: PathBuf,

    /// User settings (strip geometry, entry metrics, vibration)
    pub settings_file: PathBuf,

    /// Persisted entry tree
    pub entries_file: PathBuf,

    /// Persistent policy flag
    pub state_file: PathBuf,

    /// Bundled package metadata shown on the about screen
    pub licenses_file: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with standard XDG paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the system's project directories cannot be determined
    /// (no home directory).
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "edgelaunch")
            .ok_or_else(|| Error::Config("failed to determine project directories".into()))?;

        let config = project.config_dir().to_path_buf();
        let data = project.data_dir().to_path_buf();

        Ok(Self {
            settings_file: config.join("settings.json"),
            entries_file: config.join("entries.json"),
            licenses_file: config.join("licenses.json"),
            state_file: data.join("state.json"),
            config,
            data,
        })
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            settings_file: base.join("settings.json"),
            entries_file: base.join("entries.json"),
            licenses_file: base.join("licenses.json"),
            state_file: base.join("state.json"),
            config: base.clone(),
            data: base,
        }
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        Ok(())
    }
}
