//! Interfaces to the platform the overlay runs on.
//!
//! The controller only talks to the outside world through these traits.
//! Implementations must not call back into the controller from inside a
//! method: every trigger already holds the controller lock.

use std::sync::Arc;
use std::time::Duration;

use edgelaunch_types::{Entry, Orientation, Point, Rect, Side, StatusNotice, TouchAction, TouchEvent};

use crate::Result;
use crate::config::{ConfigSnapshot, Settings};

/// Usable screen area and pixel density of the default display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub screen: Rect,
    /// Pixels per dip
    pub density: f32,
}

impl DisplayMetrics {
    #[must_use]
    pub const fn new(screen: Rect, density: f32) -> Self {
        Self { screen, density }
    }

    // Layout values are small integers, rounding back to i32 cannot overflow
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    #[must_use]
    pub fn dip_to_px(&self, dip: i32) -> i32 {
        (dip as f32 * self.density).round() as i32
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        if self.screen.width() > self.screen.height() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Opaque identifier of an attached window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// What to attach
#[derive(Debug, Clone, PartialEq)]
pub enum WindowSpec {
    /// Full-height container on one screen edge with the touch target inside it
    Strip {
        side: Side,
        container: Rect,
        touch_target: Rect,
        background: u32,
    },
    /// Full-screen launcher window
    Launcher,
}

impl WindowSpec {
    #[must_use]
    pub const fn is_launcher(&self) -> bool {
        matches!(self, WindowSpec::Launcher)
    }
}

pub trait WindowSystem: Send + Sync {
    fn display(&self) -> DisplayMetrics;

    /// # Errors
    ///
    /// Returns an error if the platform refuses the window.
    fn add_window(&self, spec: &WindowSpec) -> Result<WindowId>;

    /// # Errors
    ///
    /// Returns an error if the window is not attached or detaching fails.
    fn remove_window(&self, id: WindowId) -> Result<()>;
}

/// Whether a launcher view wants more touch events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Active,
    Finished,
}

/// The launcher widget. Rendering is entirely its own business.
pub trait LauncherView: Send {
    fn initialize(&mut self, config: Arc<ConfigSnapshot>);

    /// Replay the touch that opened the launcher as the start of a drag.
    fn auto_start(&mut self, event: &TouchEvent) -> ViewStatus;

    fn handle_touch_event(&mut self, action: TouchAction, x: f32, y: f32) -> ViewStatus;

    /// Top-left corner of the view in screen coordinates
    fn origin_on_screen(&self) -> Point;
}

pub trait LauncherViewFactory: Send + Sync {
    fn create(&self) -> Box<dyn LauncherView>;
}

pub trait PermissionCheck: Send + Sync {
    fn has_overlay_permission(&self) -> bool;
}

pub trait Vibrator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no vibrator is available.
    fn vibrate(&self, duration: Duration) -> Result<()>;
}

pub trait SettingsSource: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or parsed.
    fn load(&self) -> Result<Settings>;
}

/// Read access granted for the duration of one transaction
pub trait TransactionContext {
    /// # Errors
    ///
    /// Returns an error if the root level cannot be loaded.
    fn load_root_content(&self) -> Result<Vec<Entry>>;
}

pub trait EntrySource: Send + Sync {
    /// # Errors
    ///
    /// Returns the error of `f`, or an error opening the transaction.
    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn TransactionContext) -> Result<()>,
    ) -> Result<()>;
}

pub trait PolicyStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be read.
    fn load(&self) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted.
    fn save(&self, active: bool) -> Result<()>;
}

pub trait StatusIndicator: Send + Sync {
    fn publish(&self, notice: &StatusNotice);
}

/// Everything the controller needs from its environment
#[derive(Clone)]
pub struct Host {
    pub windows: Arc<dyn WindowSystem>,
    pub views: Arc<dyn LauncherViewFactory>,
    pub permission: Arc<dyn PermissionCheck>,
    pub vibrator: Arc<dyn Vibrator>,
    pub settings: Arc<dyn SettingsSource>,
    pub entries: Arc<dyn EntrySource>,
    pub policy: Arc<dyn PolicyStore>,
    pub status: Arc<dyn StatusIndicator>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dip_to_px_rounds() {
        let metrics = DisplayMetrics::new(Rect::from_size(720, 1280), 1.5);
        assert_eq!(metrics.dip_to_px(16), 24);
        assert_eq!(metrics.dip_to_px(5), 8);
        assert_eq!(metrics.dip_to_px(0), 0);
        assert_eq!(metrics.dip_to_px(-10), -15);
    }

    #[test]
    fn test_orientation_from_screen() {
        let portrait = DisplayMetrics::new(Rect::from_size(1080, 1920), 3.0);
        let landscape = DisplayMetrics::new(Rect::from_size(1920, 1080), 3.0);
        assert_eq!(portrait.orientation(), Orientation::Portrait);
        assert_eq!(landscape.orientation(), Orientation::Landscape);
    }
}
