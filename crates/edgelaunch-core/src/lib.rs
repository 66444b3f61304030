//! Overlay lifecycle for an edge-activated launcher.
//!
//! A thin activation strip stays attached to one screen edge. Touching it
//! opens the launcher window, which receives the rest of the gesture until it
//! finishes. [`OverlayController`] owns that state machine; the host platform
//! is reached only through the traits in [`host`].

pub mod activation;
pub mod config;
pub mod controller;
pub mod entries;
mod error;
pub mod events;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod license;
pub mod service;
pub mod shaper;
pub mod status;
mod utils;

#[cfg(test)]
mod tests;

pub use activation::{ActivationWindowHandle, ActivationWindowManager};
pub use config::{ConfigSnapshot, Directories, PolicyFile, Settings, SettingsFile};
pub use controller::{ACTIVATION_VIBRATION, OverlayController};
pub use entries::JsonEntryStore;
pub use error::{Error, Result};
pub use events::{EventBus, Subscription};
pub use host::{DisplayMetrics, Host};
pub use service::OverlayService;
