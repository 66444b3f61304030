use std::sync::Arc;

use edgelaunch_types::{Entry, Side};

use super::Settings;
use crate::host::DisplayMetrics;

/// Immutable view of the user configuration plus the shaped entry tree.
///
/// Snapshots are never mutated: a reload builds a new one and the controller
/// swaps the `Arc`. Launcher views keep whichever snapshot they were
/// initialized with.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub image_width_dip: i32,
    pub image_margin_dip: i32,
    pub entries_margin_dip: i32,
    pub launcher_sensitivity_dip: i32,
    pub launcher_offset_position_dip: i32,
    pub launcher_offset_height_dip: i32,
    pub side: Side,
    pub vibrate_on_activation: bool,
    pub strip_background: u32,
    pub overflow_folder_name: String,
    entries: Arc<[Entry]>,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            image_width_dip: settings.image_width_dip,
            image_margin_dip: settings.image_margin_dip,
            entries_margin_dip: settings.entries_margin_dip,
            launcher_sensitivity_dip: settings.launcher_sensitivity_dip,
            launcher_offset_position_dip: settings.launcher_offset_position_dip,
            launcher_offset_height_dip: settings.launcher_offset_height_dip,
            side: Side::from_right_flag(settings.on_right_side),
            vibrate_on_activation: settings.vibrate_on_activation,
            strip_background: settings.strip_background,
            overflow_folder_name: settings.overflow_folder_name.clone(),
            entries: Arc::from(Vec::new()),
        }
    }

    /// Copy of this snapshot carrying a different entry tree.
    #[must_use]
    pub fn with_entries(&self, entries: impl Into<Arc<[Entry]>>) -> Self {
        Self {
            entries: entries.into(),
            ..self.clone()
        }
    }

    /// Same metadata, sharing the entry tree of `from`.
    #[must_use]
    pub fn carry_entries(self, from: &ConfigSnapshot) -> Self {
        Self {
            entries: Arc::clone(&from.entries),
            ..self
        }
    }

    /// Shaped top-level entries.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn entry_height_dip(&self) -> i32 {
        self.image_width_dip + 2 * self.image_margin_dip + 2 * self.entries_margin_dip
    }

    #[must_use]
    pub fn entry_height_px(&self, metrics: &DisplayMetrics) -> i32 {
        metrics.dip_to_px(self.entry_height_dip())
    }

    #[must_use]
    pub fn sensitivity_px(&self, metrics: &DisplayMetrics) -> i32 {
        metrics.dip_to_px(self.launcher_sensitivity_dip)
    }

    #[must_use]
    pub fn offset_position_px(&self, metrics: &DisplayMetrics) -> i32 {
        metrics.dip_to_px(self.launcher_offset_position_dip)
    }

    #[must_use]
    pub fn offset_height_px(&self, metrics: &DisplayMetrics) -> i32 {
        metrics.dip_to_px(self.launcher_offset_height_dip)
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
