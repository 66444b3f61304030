//! JSON-RPC 2.0 protocol shared by the edgelaunch daemon and its clients.
//!
//! - [`protocol`]: message envelopes, error codes, method parameters
//! - [`transport`]: length-prefixed framing codec
//! - [`client`]: async client for the daemon socket
//! - [`helpers`]: typed wrappers for the command surface
//!
//! # Example
//!
//! ```no_run
//! use edgelaunch_rpc::{ClientRole, helpers};
//! use edgelaunch_types::Command;
//!
//! # async fn example() -> Result<(), edgelaunch_rpc::ClientError> {
//! let client = helpers::connect_as(None, ClientRole::Control).await?;
//! let state = helpers::send_command(&client, Command::Launch).await?;
//! println!("overlay is {state}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod helpers;
pub mod protocol;
pub mod transport;

pub use client::{ClientError, RpcClient, socket_path};
pub use error::Result;
pub use protocol::{
    ALREADY_REGISTERED, ClientRole, ConfigurationChangedParams, HOST_REQUIRED, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, Message, NOT_REGISTERED,
    PARSE_ERROR, RegisterParams, RegisterResult, Request, RequestId, Response, RpcError,
    SetPermissionParams, StripTouchParams, TRIGGER_FAILED, TransitionResult, methods,
};
pub use transport::{CodecError, JsonRpcCodec};
