//! Shared types for edgelaunch components.
//!
//! This crate provides the types used across edgelaunch-core, edgelaunch-rpc,
//! edgelaunch-daemon and edgelaunch-cli. All types are serializable for RPC
//! transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in screen pixels. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle anchored at the origin with the given size
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Whether `other` lies entirely within this rectangle
    #[must_use]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    // Screen coordinates are far below f32's exact integer range
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn origin(&self) -> Point {
        Point {
            x: self.left as f32,
            y: self.top as f32,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}][{},{}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Point in screen or view coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Screen edge the activation strip is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub const fn from_right_flag(on_right_side: bool) -> Self {
        if on_right_side { Side::Right } else { Side::Left }
    }
}

/// Display orientation as reported by configuration-changed broadcasts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Kind of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
    Outside,
}

impl TouchAction {
    /// Whether this action ends the current gesture
    #[must_use]
    pub const fn ends_gesture(self) -> bool {
        matches!(self, TouchAction::Up | TouchAction::Cancel)
    }
}

/// Touch event in the coordinate space of the view that received it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
}

impl TouchEvent {
    #[must_use]
    pub const fn new(action: TouchAction, x: f32, y: f32) -> Self {
        Self { action, x, y }
    }

    #[must_use]
    pub const fn down(x: f32, y: f32) -> Self {
        Self::new(TouchAction::Down, x, y)
    }
}

/// Launchable item in the entry tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Platform launch target (package/activity, desktop id, command line)
    pub target: String,
}

/// Persisted folder owning an ordered list of children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub children: Vec<Entry>,
}

/// Runtime-only folder holding entries that did not fit on screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFolder {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub children: Vec<Entry>,
}

/// Node of the launcher entry tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Leaf(Leaf),
    Folder(Folder),
    VirtualFolder(VirtualFolder),
}

impl Entry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Entry::Leaf(leaf) => &leaf.name,
            Entry::Folder(folder) => &folder.name,
            Entry::VirtualFolder(folder) => &folder.name,
        }
    }

    /// Whether the entry has children (persisted or virtual)
    #[must_use]
    pub fn is_folder(&self) -> bool {
        !matches!(self, Entry::Leaf(_))
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Entry::VirtualFolder(_))
    }

    #[must_use]
    pub fn children(&self) -> &[Entry] {
        match self {
            Entry::Leaf(_) => &[],
            Entry::Folder(folder) => &folder.children,
            Entry::VirtualFolder(folder) => &folder.children,
        }
    }

    /// Number of nodes in this subtree, including the entry itself
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(Entry::subtree_len).sum::<usize>()
    }
}

/// Lifecycle state of the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No windows shown
    #[default]
    Inactive,
    /// Activation strip visible and listening for touches
    Armed,
    /// Launcher window visible and receiving routed touches
    Presenting,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Inactive => "inactive",
            LifecycleState::Armed => "armed",
            LifecycleState::Presenting => "presenting",
        };
        f.write_str(name)
    }
}

/// External commands accepted by the overlay service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Launch,
    NotifyDataChanged,
    NotifyConfigChanged,
    NotifyPermissionChanged,
    EnsureActivationTappable,
    Pause,
    Play,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Launch,
        Command::NotifyDataChanged,
        Command::NotifyConfigChanged,
        Command::NotifyPermissionChanged,
        Command::EnsureActivationTappable,
        Command::Pause,
        Command::Play,
    ];

    /// Command name as used on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Launch => "launch",
            Command::NotifyDataChanged => "notify-data-changed",
            Command::NotifyConfigChanged => "notify-config-changed",
            Command::NotifyPermissionChanged => "notify-permission-changed",
            Command::EnsureActivationTappable => "ensure-activation-tappable",
            Command::Pause => "pause",
            Command::Play => "play",
        }
    }

    /// RPC method name for this command
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Command::Launch => "launch",
            Command::NotifyDataChanged => "notify_data_changed",
            Command::NotifyConfigChanged => "notify_config_changed",
            Command::NotifyPermissionChanged => "notify_permission_changed",
            Command::EnsureActivationTappable => "ensure_activation_tappable",
            Command::Pause => "pause",
            Command::Play => "play",
        }
    }

    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.method() == method)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// System broadcasts relevant to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemBroadcast {
    ScreenOn,
    ScreenOff,
    ConfigurationChanged { orientation: Orientation },
}

impl SystemBroadcast {
    #[must_use]
    pub const fn kind(&self) -> BroadcastKind {
        match self {
            SystemBroadcast::ScreenOn | SystemBroadcast::ScreenOff => BroadcastKind::Screen,
            SystemBroadcast::ConfigurationChanged { .. } => BroadcastKind::Configuration,
        }
    }
}

/// Broadcast filter used when subscribing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastKind {
    Screen,
    Configuration,
}

/// Toggle offered by the status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Pause,
    Play,
}

impl StatusAction {
    #[must_use]
    pub const fn command(self) -> Command {
        match self {
            StatusAction::Pause => Command::Pause,
            StatusAction::Play => Command::Play,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            StatusAction::Pause => "Pause",
            StatusAction::Play => "Resume",
        }
    }
}

/// Persistent user-visible indicator of the overlay policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    pub active: bool,
    pub title: String,
    pub text: String,
    pub action: StatusAction,
    /// Time the indicator was first posted (ms since epoch), kept across refreshes
    pub posted_at_ms: u64,
}

/// Snapshot of the controller reported by the `status` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub state: LifecycleState,
    pub policy_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip: Option<Rect>,
    pub permission_denied: bool,
    pub entries_loaded: bool,
    pub top_level_entries: usize,
}
