//! In-process host used by the daemon and the test suites.
//!
//! Windows are bookkeeping entries, the launcher view records the touches it
//! receives and finishes when a gesture ends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use edgelaunch_types::{Point, Rect, StatusNotice, TouchAction, TouchEvent};
use tracing::{debug, info};

use crate::config::ConfigSnapshot;
use crate::host::{
    DisplayMetrics, LauncherView, LauncherViewFactory, PermissionCheck, StatusIndicator,
    Vibrator, ViewStatus, WindowId, WindowSpec, WindowSystem,
};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct HeadlessWindowSystem {
    metrics: Mutex<DisplayMetrics>,
    next_id: AtomicU64,
    live: Mutex<BTreeMap<WindowId, WindowSpec>>,
    fail_adds: AtomicBool,
    fail_removals: AtomicBool,
}

impl HeadlessWindowSystem {
    #[must_use]
    pub fn new(metrics: DisplayMetrics) -> Self {
        Self {
            metrics: Mutex::new(metrics),
            next_id: AtomicU64::new(1),
            live: Mutex::new(BTreeMap::new()),
            fail_adds: AtomicBool::new(false),
            fail_removals: AtomicBool::new(false),
        }
    }

    /// Simulate a rotation or resolution change.
    pub fn set_display(&self, metrics: DisplayMetrics) {
        *lock(&self.metrics) = metrics;
    }

    pub fn set_fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    /// Make every removal report an error after detaching the window.
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn live_windows(&self) -> usize {
        lock(&self.live).len()
    }

    #[must_use]
    pub fn live_launchers(&self) -> usize {
        lock(&self.live).values().filter(|s| s.is_launcher()).count()
    }

    /// Touch targets of all attached strips
    #[must_use]
    pub fn strips(&self) -> Vec<Rect> {
        lock(&self.live)
            .values()
            .filter_map(|spec| match spec {
                WindowSpec::Strip { touch_target, .. } => Some(*touch_target),
                WindowSpec::Launcher => None,
            })
            .collect()
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn display(&self) -> DisplayMetrics {
        *lock(&self.metrics)
    }

    fn add_window(&self, spec: &WindowSpec) -> Result<WindowId> {
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(Error::Window("window manager refused the window".into()));
        }
        let id = WindowId(self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.live).insert(id, spec.clone());
        Ok(id)
    }

    fn remove_window(&self, id: WindowId) -> Result<()> {
        let removed = lock(&self.live).remove(&id);
        if removed.is_none() {
            return Err(Error::Window(format!("window {} not attached", id.0)));
        }
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(Error::Window(format!("window {} detached with errors", id.0)));
        }
        Ok(())
    }
}

/// Shared log of the touches delivered to headless launcher views
pub type TouchLog = Arc<Mutex<Vec<TouchEvent>>>;

pub struct HeadlessLauncherView {
    origin: Point,
    config: Option<Arc<ConfigSnapshot>>,
    log: TouchLog,
}

impl HeadlessLauncherView {
    fn record(&self, event: TouchEvent) -> ViewStatus {
        lock(&self.log).push(event);
        if event.action.ends_gesture() {
            ViewStatus::Finished
        } else {
            ViewStatus::Active
        }
    }
}

impl LauncherView for HeadlessLauncherView {
    fn initialize(&mut self, config: Arc<ConfigSnapshot>) {
        self.config = Some(config);
    }

    fn auto_start(&mut self, event: &TouchEvent) -> ViewStatus {
        let entries = self.config.as_ref().map_or(0, |c| c.entries().len());
        debug!("Launcher opened at ({}, {}) showing {entries} entries", event.x, event.y);
        self.record(*event)
    }

    fn handle_touch_event(&mut self, action: TouchAction, x: f32, y: f32) -> ViewStatus {
        self.record(TouchEvent::new(action, x, y))
    }

    fn origin_on_screen(&self) -> Point {
        self.origin
    }
}

pub struct HeadlessViewFactory {
    origin: Point,
    log: TouchLog,
    created: AtomicUsize,
}

impl HeadlessViewFactory {
    /// Views are placed with their top-left corner at `origin`.
    #[must_use]
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            log: TouchLog::default(),
            created: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn touch_log(&self) -> Vec<TouchEvent> {
        lock(&self.log).clone()
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl LauncherViewFactory for HeadlessViewFactory {
    fn create(&self) -> Box<dyn LauncherView> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(HeadlessLauncherView {
            origin: self.origin,
            config: None,
            log: Arc::clone(&self.log),
        })
    }
}

/// Permission flag flipped by the host
#[derive(Debug)]
pub struct SharedPermission(AtomicBool);

impl SharedPermission {
    #[must_use]
    pub fn new(granted: bool) -> Self {
        Self(AtomicBool::new(granted))
    }

    pub fn set(&self, granted: bool) {
        self.0.store(granted, Ordering::SeqCst);
    }
}

impl PermissionCheck for SharedPermission {
    fn has_overlay_permission(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Vibrator that only logs; an absent one reports `Error::Vibration`.
#[derive(Debug)]
pub struct LogVibrator {
    available: bool,
    pulses: AtomicUsize,
}

impl LogVibrator {
    #[must_use]
    pub fn new(available: bool) -> Self {
        Self {
            available,
            pulses: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl Vibrator for LogVibrator {
    fn vibrate(&self, duration: Duration) -> Result<()> {
        if !self.available {
            return Err(Error::Vibration("no vibrator on this device".into()));
        }
        self.pulses.fetch_add(1, Ordering::SeqCst);
        debug!("Vibrate {}ms", duration.as_millis());
        Ok(())
    }
}

/// Status indicator that logs and keeps the latest notice
#[derive(Debug, Default)]
pub struct LogStatusIndicator {
    latest: Mutex<Option<StatusNotice>>,
    published: AtomicUsize,
}

impl LogStatusIndicator {
    #[must_use]
    pub fn latest(&self) -> Option<StatusNotice> {
        lock(&self.latest).clone()
    }

    #[must_use]
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }
}

impl StatusIndicator for LogStatusIndicator {
    fn publish(&self, notice: &StatusNotice) {
        info!(
            "Status: {} - {} [{}]",
            notice.title,
            notice.text,
            notice.action.label()
        );
        self.published.fetch_add(1, Ordering::SeqCst);
        *lock(&self.latest) = Some(notice.clone());
    }
}
