//! Typed wrappers over the raw request API.

use std::path::PathBuf;

use edgelaunch_types::{Command, ControllerStatus, LifecycleState};

use crate::client::{ClientError, RpcClient, socket_path};
use crate::protocol::{ClientRole, TransitionResult, methods};

/// Connect to `path` (or the default socket) and register with `role`.
///
/// # Errors
///
/// Returns an error if the connection or the registration fails.
pub async fn connect_as(path: Option<PathBuf>, role: ClientRole) -> Result<RpcClient, ClientError> {
    let mut client = RpcClient::connect_to(path.unwrap_or_else(socket_path)).await?;
    client.register(role).await?;
    Ok(client)
}

/// Run one command of the command surface and return the resulting state.
///
/// # Errors
///
/// Returns `ClientError::Rpc` if the trigger failed on the daemon side.
pub async fn send_command(
    client: &RpcClient,
    command: Command,
) -> Result<LifecycleState, ClientError> {
    let result: TransitionResult = client.request(command.method(), None).await?;
    Ok(result.state)
}

/// # Errors
///
/// Returns an error if the request fails.
pub async fn fetch_status(client: &RpcClient) -> Result<ControllerStatus, ClientError> {
    client.request(methods::STATUS, None).await
}
