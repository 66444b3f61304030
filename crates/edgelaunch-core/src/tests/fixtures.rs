//! Test fixtures and helpers

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use edgelaunch_types::{Entry, Folder, Leaf, Point, Rect};

use crate::config::Settings;
use crate::controller::OverlayController;
use crate::headless::{
    HeadlessViewFactory, HeadlessWindowSystem, LogStatusIndicator, LogVibrator, SharedPermission,
};
use crate::host::{
    DisplayMetrics, EntrySource, Host, PolicyStore, SettingsSource, TransactionContext,
};
use crate::{Error, Result};

pub const SCREEN: Rect = Rect::from_size(1080, 1920);

/// Launcher views sit below a 24px status bar
pub const VIEW_ORIGIN: Point = Point::new(0.0, 24.0);

pub fn portrait() -> DisplayMetrics {
    DisplayMetrics::new(SCREEN, 1.0)
}

pub fn landscape() -> DisplayMetrics {
    DisplayMetrics::new(Rect::from_size(1920, 1080), 1.0)
}

pub fn make_leaf(id: i64) -> Entry {
    Entry::Leaf(Leaf {
        id,
        name: format!("app-{id}"),
        icon: Some(format!("icon-{id}")),
        target: format!("org.example.app{id}"),
    })
}

pub fn make_leaves(count: i64) -> Vec<Entry> {
    (0..count).map(make_leaf).collect()
}

pub fn make_folder(id: i64, children: Vec<Entry>) -> Entry {
    Entry::Folder(Folder {
        id,
        name: format!("folder-{id}"),
        icon: None,
        children,
    })
}

#[derive(Default)]
pub struct MemorySettings {
    pub settings: Mutex<Settings>,
    pub fail: AtomicBool,
}

impl MemorySettings {
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings.lock().unwrap());
    }
}

impl SettingsSource for MemorySettings {
    fn load(&self) -> Result<Settings> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Config("settings unreadable".into()));
        }
        Ok(self.settings.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryEntries {
    pub entries: Mutex<Vec<Entry>>,
    pub fail: AtomicBool,
    pub loads: AtomicUsize,
}

struct MemoryContext(Vec<Entry>);

impl TransactionContext for MemoryContext {
    fn load_root_content(&self) -> Result<Vec<Entry>> {
        Ok(self.0.clone())
    }
}

impl EntrySource for MemoryEntries {
    fn with_transaction(
        &self,
        f: &mut dyn FnMut(&dyn TransactionContext) -> Result<()>,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::DataSource("database locked".into()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        f(&MemoryContext(self.entries.lock().unwrap().clone()))
    }
}

pub struct MemoryPolicy {
    pub active: AtomicBool,
    pub fail_saves: AtomicBool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            active: AtomicBool::new(true),
            fail_saves: AtomicBool::new(false),
        }
    }
}

impl PolicyStore for MemoryPolicy {
    fn load(&self) -> Result<bool> {
        Ok(self.active.load(Ordering::SeqCst))
    }

    fn save(&self, active: bool) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("read-only storage")));
        }
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }
}

/// Headless host with every collaborator exposed for inspection
pub struct Fixture {
    pub windows: Arc<HeadlessWindowSystem>,
    pub views: Arc<HeadlessViewFactory>,
    pub permission: Arc<SharedPermission>,
    pub vibrator: Arc<LogVibrator>,
    pub settings: Arc<MemorySettings>,
    pub entries: Arc<MemoryEntries>,
    pub policy: Arc<MemoryPolicy>,
    pub status: Arc<LogStatusIndicator>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_vibrator(true)
    }

    pub fn with_vibrator(available: bool) -> Self {
        let fixture = Self {
            windows: Arc::new(HeadlessWindowSystem::new(portrait())),
            views: Arc::new(HeadlessViewFactory::new(VIEW_ORIGIN)),
            permission: Arc::new(SharedPermission::new(true)),
            vibrator: Arc::new(LogVibrator::new(available)),
            settings: Arc::default(),
            entries: Arc::default(),
            policy: Arc::default(),
            status: Arc::default(),
        };
        *fixture.entries.entries.lock().unwrap() = make_leaves(5);
        fixture
    }

    pub fn host(&self) -> Host {
        Host {
            windows: self.windows.clone(),
            views: self.views.clone(),
            permission: self.permission.clone(),
            vibrator: self.vibrator.clone(),
            settings: self.settings.clone(),
            entries: self.entries.clone(),
            policy: self.policy.clone(),
            status: self.status.clone(),
        }
    }

    pub fn controller(&self) -> OverlayController {
        OverlayController::new(self.host())
    }

    pub fn set_entries(&self, entries: Vec<Entry>) {
        *self.entries.entries.lock().unwrap() = entries;
    }

    pub fn entry_loads(&self) -> usize {
        self.entries.loads.load(Ordering::SeqCst)
    }
}
