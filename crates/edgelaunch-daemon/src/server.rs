//! Socket server for the edgelaunch daemon.
//!
//! One [`OverlayService`] lives for the whole daemon. Control clients send the
//! command surface; the host client forwards broadcasts, strip touches and
//! permission changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use edgelaunch_core::config::{PolicyFile, SettingsFile};
use edgelaunch_core::headless::{
    HeadlessViewFactory, HeadlessWindowSystem, LogStatusIndicator, LogVibrator, SharedPermission,
};
use edgelaunch_core::license::{LicenseAccess, LicenseDir};
use edgelaunch_core::{Directories, DisplayMetrics, EventBus, Host, JsonEntryStore, OverlayService};
use edgelaunch_rpc::client::socket_path;
use edgelaunch_rpc::protocol::Message;
use edgelaunch_rpc::transport::JsonRpcCodec;
use edgelaunch_types::{Point, Rect};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Notify, RwLock, mpsc};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use crate::config_watcher::spawn_config_watcher;
use crate::error::{DaemonError, Result};
use crate::handlers::{HandlerContext, handle_notification, handle_request};
use crate::session::{Session, SessionId};

/// Startup parameters of the daemon
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub socket_path: Option<PathBuf>,
    pub dirs: Directories,
    pub display: DisplayMetrics,
    /// Initial overlay permission of the headless host
    pub permission_granted: bool,
    pub launcher_origin: Point,
    pub watch_config: bool,
}

impl DaemonOptions {
    #[must_use]
    pub fn new(dirs: Directories) -> Self {
        Self {
            socket_path: None,
            dirs,
            display: DisplayMetrics::new(Rect::from_size(1080, 1920), 2.75),
            permission_granted: true,
            launcher_origin: Point::default(),
            watch_config: true,
        }
    }
}

pub struct DaemonState {
    pub service: OverlayService,
    pub windows: Arc<HeadlessWindowSystem>,
    pub permission: Arc<SharedPermission>,
    pub licenses_file: PathBuf,
    pub license_access: Arc<dyn LicenseAccess>,
    pub clients: HashMap<SessionId, Session>,
    pub client_senders: HashMap<SessionId, mpsc::UnboundedSender<Message>>,
    pub shutdown: bool,
}

impl DaemonState {
    #[must_use]
    pub fn new(options: &DaemonOptions) -> Self {
        let dirs = &options.dirs;
        let windows = Arc::new(HeadlessWindowSystem::new(options.display));
        let permission = Arc::new(SharedPermission::new(options.permission_granted));

        let host = Host {
            windows: windows.clone(),
            views: Arc::new(HeadlessViewFactory::new(options.launcher_origin)),
            permission: permission.clone(),
            vibrator: Arc::new(LogVibrator::new(true)),
            settings: Arc::new(SettingsFile::new(dirs.settings_file.clone())),
            entries: Arc::new(JsonEntryStore::new(dirs.entries_file.clone())),
            policy: Arc::new(PolicyFile::new(dirs.state_file.clone())),
            status: Arc::new(LogStatusIndicator::default()),
        };

        Self {
            service: OverlayService::new(host, EventBus::new()),
            windows,
            permission,
            licenses_file: dirs.licenses_file.clone(),
            license_access: Arc::new(LicenseDir::new(dirs.data.join("licenses"))),
            clients: HashMap::new(),
            client_senders: HashMap::new(),
            shutdown: false,
        }
    }

    pub fn remove_client(&mut self, session_id: &SessionId) {
        self.clients.remove(session_id);
        self.client_senders.remove(session_id);
    }

    pub fn create_handler_context<'a>(
        &'a mut self,
        session_id: &'a SessionId,
    ) -> HandlerContext<'a> {
        HandlerContext {
            service: &self.service,
            windows: &self.windows,
            permission: &self.permission,
            licenses_file: &self.licenses_file,
            license_access: &self.license_access,
            clients: &mut self.clients,
            client_id: session_id,
            shutdown: &mut self.shutdown,
        }
    }
}

/// Run the daemon server until a client requests `shutdown` or the process
/// receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound, another daemon is already
/// listening, or the config directories cannot be created.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let path = options.socket_path.clone().unwrap_or_else(socket_path);

    cleanup_stale_socket(&path).await?;
    options.dirs.ensure_exists()?;

    let listener = UnixListener::bind(&path)?;
    info!("Daemon listening on {:?}", path);

    let state = Arc::new(RwLock::new(DaemonState::new(&options)));
    let shutdown = Arc::new(Notify::new());

    {
        let state_guard = state.read().await;
        match state_guard.service.start() {
            Ok(lifecycle) => info!("Overlay service started ({lifecycle})"),
            Err(e) => warn!("Initial launch failed, waiting for commands: {e}"),
        }
    }

    let _config_watcher = if options.watch_config {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watcher = spawn_config_watcher(
            options.dirs.settings_file.clone(),
            options.dirs.entries_file.clone(),
            tx,
        );
        let state_clone = state.clone();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                info!("Config file change, running {command}");
                let state_guard = state_clone.read().await;
                if let Err(e) = state_guard.service.handle_command(command) {
                    error!("{command} after config change failed: {e}");
                }
            }
        });
        Some(watcher)
    } else {
        None
    };

    info!("Ready to accept connections");
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    debug!("Accepted connection");
                    let state = state.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state, shutdown).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            },
            () = shutdown.notified() => {
                info!("Shutdown requested, stopping server");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping server");
                state.read().await.service.shutdown();
                break;
            }
        }
    }

    if path.exists()
        && let Err(e) = std::fs::remove_file(&path)
    {
        warn!("Failed to remove socket file {:?}: {}", path, e);
    }

    Ok(())
}

async fn cleanup_stale_socket(path: &Path) -> Result<()> {
    if path.exists() {
        if UnixStream::connect(path).await.is_ok() {
            return Err(DaemonError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "Another daemon is already running",
            )));
        }
        info!("Removing stale socket at {}", path.display());
        std::fs::remove_file(path)?;
    }
    Ok(())
}

async fn handle_connection(
    stream: UnixStream,
    state: Arc<RwLock<DaemonState>>,
    shutdown: Arc<Notify>,
) -> Result<()> {
    let framed = Framed::new(stream, JsonRpcCodec::new());
    let (mut sink, mut stream) = framed.split();

    let session_id = SessionId::new();
    debug!("New connection: {}", session_id);

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    {
        let mut state_guard = state.write().await;
        state_guard
            .clients
            .insert(session_id.clone(), Session::Pending(session_id.clone()));
        state_guard.client_senders.insert(session_id.clone(), tx);
    }

    let session_id_clone = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sink.send(msg).await {
                warn!("Failed to send to {}: {}", session_id_clone, e);
                break;
            }
        }
        trace!("[{}] send_task ended", session_id_clone);
    });

    let mut stop_server = false;
    while let Some(result) = stream.next().await {
        match result {
            Ok(msg) => {
                let response = process_message(&session_id, msg, &state).await;

                let state_guard = state.read().await;
                if let Some(resp) = response
                    && let Some(tx) = state_guard.client_senders.get(&session_id)
                    && tx.send(resp).is_err()
                {
                    break;
                }

                if state_guard.shutdown {
                    stop_server = true;
                    break;
                }
            }
            Err(e) => {
                warn!("Read error from {}: {}", session_id, e);
                break;
            }
        }
    }

    debug!("Connection closed: {}", session_id);
    state.write().await.remove_client(&session_id);

    // Dropping the sender ends the send task once queued replies are flushed.
    if let Err(e) = send_task.await {
        debug!("Send task for {} ended abnormally: {}", session_id, e);
    }

    if stop_server {
        shutdown.notify_one();
    }

    Ok(())
}

async fn process_message(
    session_id: &SessionId,
    msg: Message,
    state: &Arc<RwLock<DaemonState>>,
) -> Option<Message> {
    match msg {
        Message::Request(request) if request.id.is_none() => {
            debug!("Processing notification: method={}", request.method);
            let mut state_guard = state.write().await;
            let mut ctx = state_guard.create_handler_context(session_id);
            handle_notification(&mut ctx, &request);
            None
        }

        Message::Request(request) => {
            trace!(
                "Processing request: method={}, id={:?}",
                request.method, request.id
            );
            let mut state_guard = state.write().await;
            let mut ctx = state_guard.create_handler_context(session_id);
            Some(Message::Response(handle_request(&mut ctx, &request)))
        }

        Message::Response(resp) => {
            warn!(
                "Ignoring unexpected response id={} from {}",
                resp.id, session_id
            );
            None
        }
    }
}
