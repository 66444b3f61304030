mod dirs;
mod policy;
mod settings;
mod snapshot;
mod validation;

pub use dirs::Directories;
pub use policy::{PolicyFile, PolicyState};
pub use settings::{Settings, SettingsFile};
pub use snapshot::ConfigSnapshot;
pub use validation::warn_unknown_fields;
