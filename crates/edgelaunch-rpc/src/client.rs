//! Client side of the daemon socket.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::UnixStream;
use tokio::sync::{Mutex, oneshot};
use tokio_util::codec::Framed;
use tracing::debug;

use crate::protocol::{
    ClientRole, Message, RegisterParams, RegisterResult, Request, RequestId, Response, RpcError,
    methods,
};
use crate::transport::{CodecError, JsonRpcCodec};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket of the overlay daemon: `$XDG_RUNTIME_DIR/edgelaunch.sock`, or the
/// temp dir when no runtime dir is set.
#[must_use]
pub fn socket_path() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map_or_else(|_| std::env::temp_dir(), PathBuf::from)
        .join("edgelaunch.sock")
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error: {code} - {message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response type")]
    UnexpectedResponse,
}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        ClientError::Rpc {
            code: e.code,
            message: e.message,
            data: e.data,
        }
    }
}

type Pending = Arc<Mutex<HashMap<RequestId, oneshot::Sender<Response>>>>;
type Sink = SplitSink<Framed<UnixStream, JsonRpcCodec>, Message>;

pub struct RpcClient {
    sink: Mutex<Sink>,
    pending: Pending,
    next_id: AtomicU64,
    session_id: Option<String>,
}

impl RpcClient {
    /// Connect to the daemon at [`socket_path`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Io` if nobody listens on the socket.
    pub async fn connect() -> Result<Self, ClientError> {
        Self::connect_to(socket_path()).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Io` if nobody listens on `path`.
    pub async fn connect_to(path: PathBuf) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(&path).await?;
        let (sink, mut frames) = Framed::new(stream, JsonRpcCodec::new()).split();
        let pending: Pending = Arc::default();

        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(Message::Response(resp)) => {
                        if let Some(tx) = reader_pending.lock().await.remove(&resp.id) {
                            let _ = tx.send(resp);
                        }
                    }
                    Ok(Message::Request(req)) => {
                        debug!("Ignoring server message {}", req.method);
                    }
                    Err(e) => {
                        debug!("Daemon connection failed: {e}");
                        break;
                    }
                }
            }
            // Dropping the senders wakes every waiter with ConnectionClosed
            reader_pending.lock().await.clear();
        });

        Ok(Self {
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            session_id: None,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the daemon rejects the registration.
    pub async fn register(&mut self, role: ClientRole) -> Result<String, ClientError> {
        let params = serde_json::to_value(RegisterParams { role })?;
        let result: RegisterResult = self.request(methods::REGISTER, Some(params)).await?;
        self.session_id = Some(result.session_id.clone());
        Ok(result.session_id)
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Send a request and decode its result.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails, the daemon answers with an error,
    /// no answer arrives in time, or the result has the wrong shape.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, ClientError> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        self.sink
            .lock()
            .await
            .send(Message::Request(Request::new(method, params, id)))
            .await?;

        let response = tokio::time::timeout(REQUEST_TIMEOUT, rx)
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(|_| ClientError::ConnectionClosed)?;

        if let Some(error) = response.error {
            return Err(error.into());
        }
        let result = response.result.ok_or(ClientError::UnexpectedResponse)?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fire-and-forget request without an id.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        self.sink
            .lock()
            .await
            .send(Message::Request(Request::notification(method, params)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_path_name() {
        assert!(socket_path().ends_with("edgelaunch.sock"));
    }

    #[test]
    fn test_rpc_error_conversion_keeps_data() {
        let err: ClientError =
            RpcError::trigger_failed("boom", edgelaunch_types::LifecycleState::Armed).into();
        let ClientError::Rpc { code, data, .. } = err else {
            panic!("expected rpc error");
        };
        assert_eq!(code, crate::protocol::TRIGGER_FAILED);
        assert_eq!(data.unwrap()["state"], "armed");
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let dir = std::env::temp_dir().join("edgelaunch-missing-socket-test");
        let result = RpcClient::connect_to(dir.join("nobody.sock")).await;
        assert!(matches!(result, Err(ClientError::Io(_))));
    }
}
