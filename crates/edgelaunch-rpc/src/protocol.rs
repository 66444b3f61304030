//! JSON-RPC 2.0 protocol types.
//!
//! Message envelopes, error codes and the typed parameters of every method
//! the overlay daemon understands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use edgelaunch_types::{LifecycleState, Orientation, TouchEvent};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const NOT_REGISTERED: i32 = -32000;
pub const ALREADY_REGISTERED: i32 = -32001;
pub const HOST_REQUIRED: i32 = -32002;
pub const TRIGGER_FAILED: i32 = -32010;

/// Method names understood by the daemon
pub mod methods {
    pub const REGISTER: &str = "register";
    pub const STATUS: &str = "status";
    pub const LICENSES: &str = "licenses";
    pub const SHUTDOWN: &str = "shutdown";

    pub const SCREEN_ON: &str = "screen_on";
    pub const SCREEN_OFF: &str = "screen_off";
    pub const CONFIGURATION_CHANGED: &str = "configuration_changed";
    pub const STRIP_TOUCH: &str = "strip_touch";
    pub const STRIP_FOCUS_LOST: &str = "strip_focus_lost";
    pub const LAUNCHER_FINISHED: &str = "launcher_finished";
    pub const SET_PERMISSION: &str = "set_permission";
}

/// JSON-RPC 2.0 Request ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RequestId {
    fn from(n: u64) -> Self {
        RequestId::Number(n)
    }
}

/// JSON-RPC 2.0 Request. Without an `id` it is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Request {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: RequestId,
}

impl Response {
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error")
    }

    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request")
    }

    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found")
    }

    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    #[must_use]
    pub fn not_registered() -> Self {
        Self::new(NOT_REGISTERED, "Not registered")
    }

    #[must_use]
    pub fn already_registered() -> Self {
        Self::new(ALREADY_REGISTERED, "Already registered")
    }

    #[must_use]
    pub fn host_required() -> Self {
        Self::new(HOST_REQUIRED, "Host client required")
    }

    /// A controller trigger ran but failed; `state` is where it left the overlay.
    #[must_use]
    pub fn trigger_failed(message: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            code: TRIGGER_FAILED,
            message: message.into(),
            data: serde_json::to_value(TransitionResult { state }).ok(),
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Any frame on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Request(r) if r.id.is_none())
    }
}

/// Client role for registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRole {
    /// Issues commands and queries status
    Control,

    /// The platform side: forwards broadcasts, strip touches and
    /// permission changes
    Host { name: String },
}

impl ClientRole {
    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(self, ClientRole::Host { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterParams {
    pub role: ClientRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResult {
    pub session_id: String,
}

/// Result of every state-changing method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub state: LifecycleState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfigurationChangedParams {
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StripTouchParams {
    pub event: TouchEvent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetPermissionParams {
    pub granted: bool,
}
