//! edgelaunch daemon: hosts one overlay controller behind a Unix socket.
//!
//! Control clients (the `edgelaunch` CLI) issue the command surface. A host
//! client stands in for the platform and reports broadcasts, strip touches and
//! permission changes. Edits to the settings and entries files are picked up
//! by a file watcher.

pub(crate) mod config_watcher;
pub mod error;
pub(crate) mod handlers;
pub mod server;
pub(crate) mod session;

pub use error::{DaemonError, Result};
pub use server::{DaemonOptions, DaemonState, run};
pub use session::{Session, SessionId};
