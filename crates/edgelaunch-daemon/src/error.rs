//! Error types for the edgelaunch daemon.

use edgelaunch_rpc::protocol::{self, RpcError, TransitionResult};
use edgelaunch_types::LifecycleState;

/// Errors that can occur in the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client not registered
    #[error("Client not registered")]
    NotRegistered,

    /// Client already registered
    #[error("Client already registered")]
    AlreadyRegistered,

    /// Method reserved for the host client
    #[error("Host client required")]
    HostRequired,

    /// Core error outside of a trigger (startup, storage)
    #[error("Core error: {0}")]
    Core(#[from] edgelaunch_core::Error),

    /// A controller trigger failed; `state` is where it left the overlay
    #[error("{message} (state: {state})")]
    Trigger {
        message: String,
        state: LifecycleState,
    },

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] edgelaunch_rpc::CodecError),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

impl DaemonError {
    #[must_use]
    pub fn trigger(err: &edgelaunch_core::Error, state: LifecycleState) -> Self {
        DaemonError::Trigger {
            message: err.to_string(),
            state,
        }
    }
}

impl From<DaemonError> for RpcError {
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::NotRegistered => RpcError::not_registered(),
            DaemonError::AlreadyRegistered => RpcError::already_registered(),
            DaemonError::HostRequired => RpcError::host_required(),
            DaemonError::Trigger { message, state } => RpcError::trigger_failed(message, state),
            DaemonError::InvalidParams(msg) => RpcError::invalid_params(msg),
            DaemonError::MethodNotFound(name) => {
                RpcError::new(protocol::METHOD_NOT_FOUND, format!("Method not found: {name}"))
            }
            DaemonError::Io(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Json(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Core(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Codec(e) => RpcError::internal_error(e.to_string()),
            DaemonError::Watcher(e) => RpcError::internal_error(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;

impl From<RpcError> for DaemonError {
    fn from(err: RpcError) -> Self {
        match err.code {
            protocol::NOT_REGISTERED => DaemonError::NotRegistered,
            protocol::ALREADY_REGISTERED => DaemonError::AlreadyRegistered,
            protocol::HOST_REQUIRED => DaemonError::HostRequired,
            protocol::TRIGGER_FAILED => {
                let state = err
                    .data
                    .and_then(|data| serde_json::from_value::<TransitionResult>(data).ok())
                    .map(|result| result.state)
                    .unwrap_or_default();
                DaemonError::Trigger {
                    message: err.message,
                    state,
                }
            }
            protocol::INVALID_PARAMS => DaemonError::InvalidParams(err.message),
            protocol::METHOD_NOT_FOUND => DaemonError::MethodNotFound(err.message),
            _ => DaemonError::Io(std::io::Error::other(err.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_registered() {
        assert_eq!(DaemonError::NotRegistered.to_string(), "Client not registered");
    }

    #[test]
    fn test_display_trigger_names_state() {
        let err = DaemonError::Trigger {
            message: "window rejected".to_string(),
            state: LifecycleState::Armed,
        };
        assert_eq!(err.to_string(), "window rejected (state: armed)");
    }

    #[test]
    fn test_trigger_from_core_error() {
        let core = edgelaunch_core::Error::Window("add failed".to_string());
        let err = DaemonError::trigger(&core, LifecycleState::Inactive);
        assert!(matches!(
            err,
            DaemonError::Trigger { ref message, state: LifecycleState::Inactive }
                if message.contains("add failed")
        ));
    }

    #[test]
    fn test_to_rpc_host_required() {
        let rpc: RpcError = DaemonError::HostRequired.into();
        assert_eq!(rpc.code, protocol::HOST_REQUIRED);
    }

    #[test]
    fn test_to_rpc_trigger_carries_state() {
        let rpc: RpcError = DaemonError::Trigger {
            message: "boom".to_string(),
            state: LifecycleState::Presenting,
        }
        .into();
        assert_eq!(rpc.code, protocol::TRIGGER_FAILED);
        assert_eq!(rpc.message, "boom");
        assert_eq!(
            rpc.data,
            Some(serde_json::json!({ "state": "presenting" }))
        );
    }

    #[test]
    fn test_to_rpc_internal_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let rpc: RpcError = DaemonError::Io(io).into();
        assert_eq!(rpc.code, protocol::INTERNAL_ERROR);
        assert!(rpc.message.contains("gone"));

        let core = edgelaunch_core::Error::Config("bad".to_string());
        let rpc: RpcError = DaemonError::Core(core).into();
        assert_eq!(rpc.code, protocol::INTERNAL_ERROR);

        let rpc: RpcError = DaemonError::Watcher(notify::Error::generic("watch failed")).into();
        assert!(rpc.message.contains("watch failed"));
    }

    #[test]
    fn test_to_rpc_method_not_found() {
        let rpc: RpcError = DaemonError::MethodNotFound("foo".to_string()).into();
        assert_eq!(rpc.code, protocol::METHOD_NOT_FOUND);
        assert!(rpc.message.contains("foo"));
    }

    #[test]
    fn test_roundtrip_registration_errors() {
        let back: DaemonError = RpcError::from(DaemonError::NotRegistered).into();
        assert!(matches!(back, DaemonError::NotRegistered));
        let back: DaemonError = RpcError::from(DaemonError::AlreadyRegistered).into();
        assert!(matches!(back, DaemonError::AlreadyRegistered));
        let back: DaemonError = RpcError::from(DaemonError::HostRequired).into();
        assert!(matches!(back, DaemonError::HostRequired));
    }

    #[test]
    fn test_roundtrip_trigger_keeps_state() {
        let rpc = RpcError::trigger_failed("no permission", LifecycleState::Armed);
        let back: DaemonError = rpc.into();
        assert!(matches!(
            back,
            DaemonError::Trigger { state: LifecycleState::Armed, .. }
        ));
    }

    #[test]
    fn test_trigger_without_data_defaults_to_inactive() {
        let rpc = RpcError::new(protocol::TRIGGER_FAILED, "lost");
        let back: DaemonError = rpc.into();
        assert!(matches!(
            back,
            DaemonError::Trigger { state: LifecycleState::Inactive, .. }
        ));
    }

    #[test]
    fn test_invalid_params_roundtrip() {
        let back: DaemonError = RpcError::invalid_params("missing key").into();
        assert!(matches!(back, DaemonError::InvalidParams(msg) if msg == "missing key"));
    }

    #[test]
    fn test_unknown_code_becomes_io() {
        let rpc = RpcError {
            code: 9999,
            message: "unknown error".to_string(),
            data: None,
        };
        let back: DaemonError = rpc.into();
        assert!(matches!(back, DaemonError::Io(_)));
    }
}
