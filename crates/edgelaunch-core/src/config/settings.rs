use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;
use crate::host::SettingsSource;

/// User settings as stored in `settings.json`. All lengths are in dip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub image_width_dip: i32,
    pub image_margin_dip: i32,
    pub entries_margin_dip: i32,
    pub launcher_sensitivity_dip: i32,
    pub launcher_offset_position_dip: i32,
    pub launcher_offset_height_dip: i32,
    pub on_right_side: bool,
    pub vibrate_on_activation: bool,
    /// ARGB color of the activation strip
    pub strip_background: u32,
    /// Display name of synthesized overflow folders
    pub overflow_folder_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_width_dip: 48,
            image_margin_dip: 5,
            entries_margin_dip: 5,
            launcher_sensitivity_dip: 16,
            launcher_offset_position_dip: 0,
            launcher_offset_height_dip: 400,
            on_right_side: false,
            vibrate_on_activation: true,
            strip_background: 0x0000_0000,
            overflow_folder_name: "More".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from file, or return defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "settings.json");
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Height of one launcher row: the icon plus its margins and the row margins.
    #[must_use]
    pub fn entry_height_dip(&self) -> i32 {
        self.image_width_dip + 2 * self.image_margin_dip + 2 * self.entries_margin_dip
    }
}

/// `SettingsSource` reading `settings.json` on every load.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SettingsSource for SettingsFile {
    fn load(&self) -> Result<Settings> {
        Settings::load(&self.path)
    }
}
