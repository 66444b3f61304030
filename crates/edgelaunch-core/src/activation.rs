//! Ownership of the single activation strip window.

use std::sync::Arc;

use edgelaunch_types::Rect;
use tracing::{debug, warn};

use crate::Result;
use crate::config::ConfigSnapshot;
use crate::geometry::{compute_strip, strip_container};
use crate::host::{DisplayMetrics, PermissionCheck, WindowId, WindowSpec, WindowSystem};

/// Result of placing the strip.
///
/// `success` is false when the overlay permission is missing. In that case no
/// window was created, and any window the caller handed in is carried over
/// untouched so it can still be removed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationWindowHandle {
    window: Option<WindowId>,
    touch_target: Rect,
    success: bool,
}

impl ActivationWindowHandle {
    fn denied(carried: Option<ActivationWindowHandle>) -> Self {
        match carried {
            Some(old) => Self {
                success: false,
                ..old
            },
            None => Self {
                window: None,
                touch_target: Rect::default(),
                success: false,
            },
        }
    }

    #[must_use]
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// Strip rectangle in screen coordinates
    #[must_use]
    pub fn touch_target(&self) -> Rect {
        self.touch_target
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.window.is_some()
    }
}

pub struct ActivationWindowManager {
    windows: Arc<dyn WindowSystem>,
    permission: Arc<dyn PermissionCheck>,
}

impl ActivationWindowManager {
    pub fn new(windows: Arc<dyn WindowSystem>, permission: Arc<dyn PermissionCheck>) -> Self {
        Self {
            windows,
            permission,
        }
    }

    /// Attach a strip for `config` and then detach `old`.
    ///
    /// Without overlay permission nothing is attached or detached and the
    /// returned handle has `success == false`, carrying `old`'s window.
    ///
    /// # Errors
    ///
    /// Returns an error if the new window cannot be added. `old` is left
    /// attached in that case.
    pub fn show_or_replace(
        &self,
        old: Option<&ActivationWindowHandle>,
        config: &ConfigSnapshot,
        metrics: &DisplayMetrics,
    ) -> Result<ActivationWindowHandle> {
        if !self.permission.has_overlay_permission() {
            debug!("Overlay permission missing, strip not attached");
            return Ok(ActivationWindowHandle::denied(old.cloned()));
        }

        let touch_target = compute_strip(
            config.sensitivity_px(metrics),
            config.offset_position_px(metrics),
            config.offset_height_px(metrics),
            config.side,
            metrics.screen,
        );
        let spec = WindowSpec::Strip {
            side: config.side,
            container: strip_container(touch_target, metrics.screen),
            touch_target,
            background: config.strip_background,
        };

        let window = self.windows.add_window(&spec)?;
        debug!("Attached strip {window:?} at {touch_target}");

        if let Some(old) = old {
            self.remove(old);
        }

        Ok(ActivationWindowHandle {
            window: Some(window),
            touch_target,
            success: true,
        })
    }

    /// Detach the strip if it is attached. Failures are logged and ignored.
    pub fn remove(&self, handle: &ActivationWindowHandle) {
        let Some(window) = handle.window else {
            return;
        };
        match self.windows.remove_window(window) {
            Ok(()) => debug!("Detached strip {window:?}"),
            Err(e) => warn!("Ignoring failure to detach strip {window:?}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessWindowSystem, SharedPermission};

    fn manager(granted: bool) -> (Arc<HeadlessWindowSystem>, ActivationWindowManager) {
        let windows = Arc::new(HeadlessWindowSystem::new(DisplayMetrics::new(
            Rect::from_size(1080, 1920),
            2.0,
        )));
        let manager =
            ActivationWindowManager::new(windows.clone(), Arc::new(SharedPermission::new(granted)));
        (windows, manager)
    }

    #[test]
    fn test_show_attaches_strip_in_px() {
        let (windows, manager) = manager(true);
        let metrics = windows.display();
        let handle = manager
            .show_or_replace(None, &ConfigSnapshot::default(), &metrics)
            .unwrap();

        assert!(handle.success());
        assert!(handle.is_attached());
        // 16dip x 400dip at density 2
        assert_eq!(handle.touch_target(), Rect::new(0, 0, 32, 800));
        assert_eq!(windows.strips(), vec![handle.touch_target()]);
    }

    #[test]
    fn test_replace_keeps_single_window() {
        let (windows, manager) = manager(true);
        let metrics = windows.display();
        let config = ConfigSnapshot::default();

        let mut handle = manager.show_or_replace(None, &config, &metrics).unwrap();
        for _ in 0..10 {
            handle = manager.show_or_replace(Some(&handle), &config, &metrics).unwrap();
        }
        assert_eq!(windows.live_windows(), 1);

        manager.remove(&handle);
        assert_eq!(windows.live_windows(), 0);
    }

    #[test]
    fn test_denied_creates_nothing() {
        let (windows, manager) = manager(false);
        let handle = manager
            .show_or_replace(None, &ConfigSnapshot::default(), &windows.display())
            .unwrap();

        assert!(!handle.success());
        assert!(!handle.is_attached());
        assert_eq!(windows.live_windows(), 0);
        manager.remove(&handle);
    }

    #[test]
    fn test_remove_twice_is_harmless() {
        let (windows, manager) = manager(true);
        let handle = manager
            .show_or_replace(None, &ConfigSnapshot::default(), &windows.display())
            .unwrap();

        manager.remove(&handle);
        manager.remove(&handle);
        assert_eq!(windows.live_windows(), 0);
    }

    #[test]
    fn test_add_failure_leaves_old_attached() {
        let (windows, manager) = manager(true);
        let metrics = windows.display();
        let config = ConfigSnapshot::default();
        let old = manager.show_or_replace(None, &config, &metrics).unwrap();

        windows.set_fail_adds(true);
        assert!(manager.show_or_replace(Some(&old), &config, &metrics).is_err());
        assert_eq!(windows.strips(), vec![old.touch_target()]);
    }
}
