//! The overlay lifecycle state machine.
//!
//! Every trigger takes the controller lock for its whole duration, so
//! triggers run one at a time in the order they arrive. Host collaborators
//! are called with the lock held and must not call back in.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use edgelaunch_types::{
    Command, ControllerStatus, LifecycleState, Point, TouchAction, TouchEvent,
};
use tracing::{debug, error, info, warn};

use crate::activation::{ActivationWindowHandle, ActivationWindowManager};
use crate::config::{ConfigSnapshot, Settings};
use crate::host::{Host, LauncherView, ViewStatus, WindowId, WindowSpec};
use crate::shaper::shape_entries;
use crate::status::StatusBoard;
use crate::{Error, Result};

/// Haptic pulse when the launcher opens
pub const ACTIVATION_VIBRATION: Duration = Duration::from_millis(60);

struct PresentedLauncher {
    window: WindowId,
    view: Box<dyn LauncherView>,
}

struct ControllerInner {
    policy_active: bool,
    config: Option<Arc<ConfigSnapshot>>,
    entries_loaded: bool,
    strip: Option<ActivationWindowHandle>,
    /// Strip is up for the current config; plain launches are no-ops
    already_registered: bool,
    launcher: Option<PresentedLauncher>,
    status: StatusBoard,
}

impl ControllerInner {
    fn state(&self) -> LifecycleState {
        if self.launcher.is_some() {
            LifecycleState::Presenting
        } else if self
            .strip
            .as_ref()
            .is_some_and(ActivationWindowHandle::is_attached)
        {
            LifecycleState::Armed
        } else {
            LifecycleState::Inactive
        }
    }
}

pub struct OverlayController {
    host: Host,
    strips: ActivationWindowManager,
    inner: Mutex<ControllerInner>,
}

impl OverlayController {
    /// Build a controller around `host`, reading the persisted policy flag.
    /// An unreadable policy counts as active.
    pub fn new(host: Host) -> Self {
        let policy_active = host.policy.load().unwrap_or_else(|e| {
            warn!("Failed to load policy state, assuming active: {e}");
            true
        });
        let strips =
            ActivationWindowManager::new(Arc::clone(&host.windows), Arc::clone(&host.permission));

        Self {
            host,
            strips,
            inner: Mutex::new(ControllerInner {
                policy_active,
                config: None,
                entries_loaded: false,
                strip: None,
                already_registered: false,
                launcher: None,
                status: StatusBoard::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Controller lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn run(
        &self,
        trigger: &str,
        f: impl FnOnce(&Self, &mut ControllerInner) -> Result<()>,
    ) -> Result<LifecycleState> {
        let mut inner = self.lock();
        let before = inner.state();
        let result = f(self, &mut inner);
        let after = inner.state();

        if before != after {
            debug!("{trigger}: {before} -> {after}");
        }
        match result {
            Ok(()) => Ok(after),
            Err(e) => {
                error!("{trigger} failed in state {after}: {e}");
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lock().state()
    }

    #[must_use]
    pub fn status(&self) -> ControllerStatus {
        let inner = self.lock();
        ControllerStatus {
            state: inner.state(),
            policy_active: inner.policy_active,
            strip: inner
                .strip
                .as_ref()
                .filter(|s| s.is_attached())
                .map(ActivationWindowHandle::touch_target),
            permission_denied: inner.strip.as_ref().is_some_and(|s| !s.success()),
            entries_loaded: inner.entries_loaded,
            top_level_entries: inner.config.as_ref().map_or(0, |c| c.entries().len()),
        }
    }

    /// Snapshot currently handed to new launcher views
    #[must_use]
    pub fn current_config(&self) -> Option<Arc<ConfigSnapshot>> {
        self.lock().config.clone()
    }

    /// Run one command of the public command surface.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed step; the controller stays usable.
    pub fn dispatch(&self, command: Command) -> Result<LifecycleState> {
        match command {
            Command::Launch => self.launch(),
            Command::NotifyDataChanged => self.notify_data_changed(),
            Command::NotifyConfigChanged => self.notify_config_changed(),
            Command::NotifyPermissionChanged => self.notify_permission_changed(),
            Command::EnsureActivationTappable => self.ensure_activation_tappable(),
            Command::Pause => self.pause(),
            Command::Play => self.play(),
        }
    }

    /// Bring the overlay in line with the policy flag.
    ///
    /// # Errors
    ///
    /// Returns an error if settings, the strip window or the entry tree
    /// cannot be set up.
    pub fn launch(&self) -> Result<LifecycleState> {
        self.run("launch", |c, inner| c.adapt_state(inner, false))
    }

    /// Drop the cached entry tree and launch with a full reload.
    ///
    /// # Errors
    ///
    /// See [`OverlayController::launch`].
    pub fn notify_data_changed(&self) -> Result<LifecycleState> {
        self.run("notify-data-changed", |c, inner| {
            inner.entries_loaded = false;
            c.adapt_state(inner, true)
        })
    }

    /// Reload settings, keep the loaded entries, rebuild the strip.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or the strip cannot be
    /// attached.
    pub fn notify_config_changed(&self) -> Result<LifecycleState> {
        self.run("notify-config-changed", |c, inner| {
            c.reload_config_metadata(inner)?;
            c.reload_strip_if_active(inner)
        })
    }

    /// Retry attaching the strip after the overlay permission changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip cannot be attached.
    pub fn notify_permission_changed(&self) -> Result<LifecycleState> {
        self.run("notify-permission-changed", Self::reload_strip_if_active)
    }

    /// Same as [`OverlayController::notify_permission_changed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the strip cannot be attached.
    pub fn ensure_activation_tappable(&self) -> Result<LifecycleState> {
        self.run("ensure-activation-tappable", Self::reload_strip_if_active)
    }

    /// Persist the inactive policy and tear the overlay down.
    ///
    /// # Errors
    ///
    /// Never fails in practice; persistence failures are logged.
    pub fn pause(&self) -> Result<LifecycleState> {
        self.run("pause", |c, inner| {
            c.set_policy(inner, false);
            c.adapt_state(inner, false)
        })
    }

    /// Persist the active policy and bring the overlay up.
    ///
    /// # Errors
    ///
    /// See [`OverlayController::launch`].
    pub fn play(&self) -> Result<LifecycleState> {
        self.run("play", |c, inner| {
            c.set_policy(inner, true);
            c.adapt_state(inner, false)
        })
    }

    /// Touch on the strip: opens the launcher, or forwards the touch to the
    /// open launcher in its own coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries or the launcher window cannot be set
    /// up; the launcher stays closed in that case.
    pub fn strip_touch(&self, event: TouchEvent) -> Result<LifecycleState> {
        self.run("strip-touch", |c, inner| c.handle_touch(inner, event))
    }

    /// The strip lost input focus, e.g. a system dialog came up.
    ///
    /// # Errors
    ///
    /// Never fails; removal errors are swallowed.
    pub fn strip_focus_lost(&self) -> Result<LifecycleState> {
        self.run("strip-focus-lost", |c, inner| {
            c.finish_launcher(inner);
            Ok(())
        })
    }

    /// The launcher view reported that it is done.
    ///
    /// # Errors
    ///
    /// Never fails; removal errors are swallowed.
    pub fn launcher_finished(&self) -> Result<LifecycleState> {
        self.run("launcher-finished", |c, inner| {
            c.finish_launcher(inner);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Never fails; removal errors are swallowed.
    pub fn screen_off(&self) -> Result<LifecycleState> {
        self.run("screen-off", |c, inner| {
            c.ensure_inactive(inner);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// See [`OverlayController::launch`].
    pub fn screen_on(&self) -> Result<LifecycleState> {
        self.run("screen-on", |c, inner| c.adapt_state(inner, false))
    }

    /// Display orientation flipped: close the launcher and rebuild strip and
    /// entries for the new screen size.
    ///
    /// # Errors
    ///
    /// See [`OverlayController::launch`].
    pub fn orientation_changed(&self) -> Result<LifecycleState> {
        self.run("orientation-changed", |c, inner| {
            c.finish_launcher(inner);
            if inner.policy_active {
                c.ensure_active(inner, true)
            } else {
                inner.entries_loaded = false;
                Ok(())
            }
        })
    }

    /// Remove every window. The controller can be launched again afterwards.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        self.ensure_inactive(&mut inner);
        info!("Overlay shut down");
    }

    fn adapt_state(&self, inner: &mut ControllerInner, force: bool) -> Result<()> {
        let result = if inner.policy_active {
            self.ensure_active(inner, force)
        } else {
            self.ensure_inactive(inner);
            Ok(())
        };
        self.refresh_status(inner);
        result
    }

    fn ensure_active(&self, inner: &mut ControllerInner, force: bool) -> Result<()> {
        if !force && inner.already_registered {
            return Ok(());
        }
        self.ensure_config(inner, force)?;
        self.reload_strip(inner)?;
        self.ensure_data(inner, force)
    }

    fn ensure_inactive(&self, inner: &mut ControllerInner) {
        self.finish_launcher(inner);
        if let Some(handle) = inner.strip.take() {
            self.strips.remove(&handle);
        }
        inner.already_registered = false;
    }

    fn set_policy(&self, inner: &mut ControllerInner, active: bool) {
        inner.policy_active = active;
        if let Err(e) = self.host.policy.save(active) {
            warn!("Failed to persist policy state: {e}");
        }
    }

    fn refresh_status(&self, inner: &mut ControllerInner) {
        let notice = inner.status.notice(inner.policy_active);
        self.host.status.publish(&notice);
    }

    fn load_settings(&self) -> Result<ConfigSnapshot> {
        let settings: Settings = self.host.settings.load()?;
        Ok(ConfigSnapshot::from_settings(&settings))
    }

    fn ensure_config(&self, inner: &mut ControllerInner, force: bool) -> Result<()> {
        if !force && inner.config.is_some() {
            return Ok(());
        }

        let snapshot = match self.load_settings() {
            Ok(snapshot) => snapshot,
            Err(e) if inner.config.is_some() => {
                warn!("Keeping current configuration, reload failed: {e}");
                return Ok(());
            }
            Err(e) => {
                warn!("Using default settings, load failed: {e}");
                ConfigSnapshot::default()
            }
        };

        inner.config = Some(Arc::new(snapshot));
        inner.entries_loaded = false;
        Ok(())
    }

    fn reload_config_metadata(&self, inner: &mut ControllerInner) -> Result<()> {
        let Some(current) = inner.config.clone() else {
            return self.ensure_config(inner, false);
        };
        let snapshot = self.load_settings()?.carry_entries(&current);
        inner.config = Some(Arc::new(snapshot));
        Ok(())
    }

    fn current_snapshot(inner: &ControllerInner) -> Result<Arc<ConfigSnapshot>> {
        inner
            .config
            .clone()
            .ok_or_else(|| Error::Config("no configuration loaded".into()))
    }

    fn reload_strip_if_active(&self, inner: &mut ControllerInner) -> Result<()> {
        if !inner.policy_active {
            debug!("Policy inactive, strip stays down");
            return Ok(());
        }
        self.reload_strip(inner)
    }

    fn reload_strip(&self, inner: &mut ControllerInner) -> Result<()> {
        self.ensure_config(inner, false)?;
        let config = Self::current_snapshot(inner)?;
        let metrics = self.host.windows.display();

        let handle = self
            .strips
            .show_or_replace(inner.strip.as_ref(), &config, &metrics)?;
        if !handle.success() {
            info!("Overlay permission not granted, waiting for permission change");
        }
        inner.already_registered = handle.success();
        inner.strip = Some(handle);
        Ok(())
    }

    fn ensure_data(&self, inner: &mut ControllerInner, force: bool) -> Result<()> {
        self.ensure_config(inner, false)?;
        if force {
            inner.entries_loaded = false;
        }
        if inner.entries_loaded {
            return Ok(());
        }

        let mut root = Vec::new();
        self.host.entries.with_transaction(&mut |ctx| {
            root = ctx.load_root_content()?;
            Ok(())
        })?;

        let config = Self::current_snapshot(inner)?;
        let metrics = self.host.windows.display();
        let shaped = shape_entries(
            root,
            config.entry_height_px(&metrics),
            metrics.screen.height(),
            &config.overflow_folder_name,
        )?;

        info!("Loaded {} top-level entries", shaped.len());
        inner.config = Some(Arc::new(config.with_entries(shaped)));
        inner.entries_loaded = true;
        Ok(())
    }

    fn handle_touch(&self, inner: &mut ControllerInner, event: TouchEvent) -> Result<()> {
        let Some(strip_origin) = inner
            .strip
            .as_ref()
            .filter(|s| s.is_attached())
            .map(|s| s.touch_target().origin())
        else {
            debug!("Ignoring strip touch without a strip");
            return Ok(());
        };

        if let Some(launcher) = inner.launcher.as_mut() {
            let moved = translate(event, strip_origin, launcher.view.origin_on_screen());
            let status = launcher.view.handle_touch_event(moved.action, moved.x, moved.y);
            if status == ViewStatus::Finished {
                self.finish_launcher(inner);
            }
            return Ok(());
        }

        if event.action != TouchAction::Down {
            debug!("Ignoring {:?} on strip without an open launcher", event.action);
            return Ok(());
        }

        self.ensure_data(inner, false)?;
        let config = Self::current_snapshot(inner)?;

        let mut view = self.host.views.create();
        view.initialize(Arc::clone(&config));
        let window = self.host.windows.add_window(&WindowSpec::Launcher)?;
        let start = translate(event, strip_origin, view.origin_on_screen());
        let status = view.auto_start(&start);
        inner.launcher = Some(PresentedLauncher { window, view });
        info!("Launcher opened in window {window:?}");

        if config.vibrate_on_activation
            && let Err(e) = self.host.vibrator.vibrate(ACTIVATION_VIBRATION)
        {
            warn!("Activation vibration failed: {e}");
        }

        if status == ViewStatus::Finished {
            self.finish_launcher(inner);
        }
        Ok(())
    }

    fn finish_launcher(&self, inner: &mut ControllerInner) {
        let Some(launcher) = inner.launcher.take() else {
            return;
        };
        match self.host.windows.remove_window(launcher.window) {
            Ok(()) => debug!("Launcher window {:?} closed", launcher.window),
            Err(e) => warn!("Ignoring failure to close launcher window: {e}"),
        }
    }
}

/// Move a strip-local touch into the launcher view's coordinate space.
fn translate(event: TouchEvent, from: Point, to: Point) -> TouchEvent {
    TouchEvent::new(event.action, event.x + from.x - to.x, event.y + from.y - to.y)
}
