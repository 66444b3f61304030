//! Request handlers for the daemon.
//!
//! - Registration
//! - Control methods (the command surface, status, licenses, shutdown)
//! - Host methods (broadcasts, strip touches, permission changes)

mod control;
mod host;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use edgelaunch_core::OverlayService;
use edgelaunch_core::headless::{HeadlessWindowSystem, SharedPermission};
use edgelaunch_core::license::LicenseAccess;
use edgelaunch_rpc::protocol::{
    RegisterParams, RegisterResult, Request, RequestId, Response, RpcError, TransitionResult,
    methods,
};
use edgelaunch_types::{Command, LifecycleState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{DaemonError, Result};
use crate::session::{Session, SessionId};

pub struct HandlerContext<'a> {
    pub service: &'a OverlayService,
    pub windows: &'a HeadlessWindowSystem,
    pub permission: &'a SharedPermission,
    pub licenses_file: &'a Path,
    pub license_access: &'a Arc<dyn LicenseAccess>,
    pub clients: &'a mut HashMap<SessionId, Session>,
    pub client_id: &'a SessionId,
    pub shutdown: &'a mut bool,
}

impl HandlerContext<'_> {
    pub fn current_session(&self) -> Option<&Session> {
        self.clients.get(self.client_id)
    }

    pub fn is_registered(&self) -> bool {
        self.current_session().is_some_and(Session::is_registered)
    }

    pub fn is_host(&self) -> bool {
        self.current_session().is_some_and(Session::is_host)
    }

    fn state(&self) -> LifecycleState {
        self.service.controller().state()
    }
}

pub fn handle_request(ctx: &mut HandlerContext<'_>, request: &Request) -> Response {
    let id = request.id.clone().unwrap_or(RequestId::Number(0));
    trace!("[{}] request {} id={}", ctx.client_id, request.method, id);

    match dispatch(ctx, &request.method, request.params.as_ref()) {
        Ok(result) => Response::success(id, result),
        Err(err) => {
            debug!("[{}] {} failed: {}", ctx.client_id, request.method, err);
            Response::error(id, RpcError::from(err))
        }
    }
}

/// Requests without an id. Failures are only logged.
pub fn handle_notification(ctx: &mut HandlerContext<'_>, request: &Request) {
    if let Err(e) = dispatch(ctx, &request.method, request.params.as_ref()) {
        warn!("Notification {} failed: {}", request.method, e);
    }
}

fn dispatch(ctx: &mut HandlerContext<'_>, method: &str, params: Option<&Value>) -> Result<Value> {
    if method == methods::REGISTER {
        return handle_register(ctx, params);
    }
    require_registered(ctx)?;

    if let Some(command) = Command::from_method(method) {
        return control::handle_command(ctx, command);
    }

    match method {
        methods::STATUS => control::handle_status(ctx),
        methods::LICENSES => control::handle_licenses(ctx),
        methods::SHUTDOWN => control::handle_shutdown(ctx),

        methods::SCREEN_ON => {
            require_host(ctx)?;
            host::handle_screen_on(ctx)
        }
        methods::SCREEN_OFF => {
            require_host(ctx)?;
            host::handle_screen_off(ctx)
        }
        methods::CONFIGURATION_CHANGED => {
            require_host(ctx)?;
            host::handle_configuration_changed(ctx, params)
        }
        methods::STRIP_TOUCH => {
            require_host(ctx)?;
            host::handle_strip_touch(ctx, params)
        }
        methods::STRIP_FOCUS_LOST => {
            require_host(ctx)?;
            host::handle_strip_focus_lost(ctx)
        }
        methods::LAUNCHER_FINISHED => {
            require_host(ctx)?;
            host::handle_launcher_finished(ctx)
        }
        methods::SET_PERMISSION => {
            require_host(ctx)?;
            host::handle_set_permission(ctx, params)
        }

        _ => Err(DaemonError::MethodNotFound(method.to_string())),
    }
}

fn handle_register(ctx: &mut HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    if ctx.is_registered() {
        return Err(DaemonError::AlreadyRegistered);
    }
    let params: RegisterParams = parse_params(params)?;
    debug!("[{}] registered as {:?}", ctx.client_id, params.role);

    ctx.clients.insert(
        ctx.client_id.clone(),
        Session::registered(ctx.client_id.clone(), params.role),
    );

    to_value(&RegisterResult {
        session_id: ctx.client_id.to_string(),
    })
}

fn require_registered(ctx: &HandlerContext<'_>) -> Result<()> {
    if ctx.is_registered() {
        Ok(())
    } else {
        Err(DaemonError::NotRegistered)
    }
}

fn require_host(ctx: &HandlerContext<'_>) -> Result<()> {
    if ctx.is_host() {
        Ok(())
    } else {
        Err(DaemonError::HostRequired)
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T> {
    let value = params.ok_or_else(|| DaemonError::InvalidParams("missing params".into()))?;
    serde_json::from_value(value.clone()).map_err(|e| DaemonError::InvalidParams(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Wrap the outcome of a controller trigger.
fn transition(
    ctx: &HandlerContext<'_>,
    result: edgelaunch_core::Result<LifecycleState>,
) -> Result<Value> {
    match result {
        Ok(state) => to_value(&TransitionResult { state }),
        Err(e) => Err(DaemonError::trigger(&e, ctx.state())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelaunch_core::config::{PolicyFile, SettingsFile};
    use edgelaunch_core::headless::{HeadlessViewFactory, LogStatusIndicator, LogVibrator};
    use edgelaunch_core::host::{PermissionCheck, WindowSystem};
    use edgelaunch_core::license::LicenseDir;
    use edgelaunch_core::{DisplayMetrics, EventBus, Host, JsonEntryStore};
    use edgelaunch_rpc::protocol::{self, ClientRole};
    use edgelaunch_types::{Point, Rect};
    use serde_json::json;
    use tempfile::TempDir;

    struct Harness {
        _temp: TempDir,
        service: OverlayService,
        windows: Arc<HeadlessWindowSystem>,
        permission: Arc<SharedPermission>,
        licenses_file: std::path::PathBuf,
        access: Arc<dyn LicenseAccess>,
        clients: HashMap<SessionId, Session>,
        shutdown: bool,
    }

    impl Harness {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let base = temp.path();
            let windows = Arc::new(HeadlessWindowSystem::new(DisplayMetrics::new(
                Rect::from_size(1080, 1920),
                1.0,
            )));
            let permission = Arc::new(SharedPermission::new(true));
            let host = Host {
                windows: windows.clone(),
                views: Arc::new(HeadlessViewFactory::new(Point::default())),
                permission: permission.clone(),
                vibrator: Arc::new(LogVibrator::new(true)),
                settings: Arc::new(SettingsFile::new(base.join("settings.json"))),
                entries: Arc::new(JsonEntryStore::new(base.join("entries.json"))),
                policy: Arc::new(PolicyFile::new(base.join("state.json"))),
                status: Arc::new(LogStatusIndicator::default()),
            };
            Self {
                licenses_file: base.join("licenses.json"),
                access: Arc::new(LicenseDir::new(base.to_path_buf())),
                _temp: temp,
                service: OverlayService::new(host, EventBus::new()),
                windows,
                permission,
                clients: HashMap::new(),
                shutdown: false,
            }
        }

        fn call(&mut self, client: &SessionId, method: &str, params: Option<Value>) -> Response {
            self.clients
                .entry(client.clone())
                .or_insert_with(|| Session::Pending(client.clone()));
            let mut ctx = HandlerContext {
                service: &self.service,
                windows: &self.windows,
                permission: &self.permission,
                licenses_file: &self.licenses_file,
                license_access: &self.access,
                clients: &mut self.clients,
                client_id: client,
                shutdown: &mut self.shutdown,
            };
            handle_request(&mut ctx, &Request::new(method, params, RequestId::Number(1)))
        }

        fn register(&mut self, client: &SessionId, role: &ClientRole) {
            let resp = self.call(client, methods::REGISTER, Some(json!({ "role": role })));
            assert!(resp.error.is_none(), "{:?}", resp.error);
        }
    }

    fn error_code(resp: &Response) -> i32 {
        resp.error.as_ref().map_or(0, |e| e.code)
    }

    fn state_of(resp: &Response) -> LifecycleState {
        let result: TransitionResult =
            serde_json::from_value(resp.result.clone().unwrap()).unwrap();
        result.state
    }

    fn host_role() -> ClientRole {
        ClientRole::Host {
            name: "test".to_string(),
        }
    }

    #[test]
    fn test_unregistered_client_rejected() {
        let mut h = Harness::new();
        let id = SessionId::new();
        let resp = h.call(&id, "launch", None);
        assert_eq!(error_code(&resp), protocol::NOT_REGISTERED);
    }

    #[test]
    fn test_register_twice_rejected() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);
        let resp = h.call(&id, methods::REGISTER, Some(json!({ "role": { "type": "control" } })));
        assert_eq!(error_code(&resp), protocol::ALREADY_REGISTERED);
    }

    #[test]
    fn test_register_without_params_is_invalid() {
        let mut h = Harness::new();
        let id = SessionId::new();
        let resp = h.call(&id, methods::REGISTER, None);
        assert_eq!(error_code(&resp), protocol::INVALID_PARAMS);
    }

    #[test]
    fn test_control_commands_drive_controller() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);

        assert_eq!(state_of(&h.call(&id, "launch", None)), LifecycleState::Armed);
        assert_eq!(h.windows.live_windows(), 1);
        assert_eq!(state_of(&h.call(&id, "pause", None)), LifecycleState::Inactive);
        assert_eq!(h.windows.live_windows(), 0);
        assert_eq!(state_of(&h.call(&id, "play", None)), LifecycleState::Armed);
    }

    #[test]
    fn test_host_methods_require_host_role() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);
        let resp = h.call(&id, methods::SCREEN_OFF, None);
        assert_eq!(error_code(&resp), protocol::HOST_REQUIRED);
    }

    #[test]
    fn test_host_touch_opens_launcher() {
        let mut h = Harness::new();
        let control = SessionId::new();
        let host = SessionId::new();
        h.register(&control, &ClientRole::Control);
        h.register(&host, &host_role());
        h.call(&control, "launch", None);

        let down = json!({ "event": { "action": "down", "x": 5.0, "y": 100.0 } });
        let resp = h.call(&host, methods::STRIP_TOUCH, Some(down));
        assert_eq!(state_of(&resp), LifecycleState::Presenting);
        assert_eq!(h.windows.live_launchers(), 1);

        let resp = h.call(&host, methods::STRIP_FOCUS_LOST, None);
        assert_eq!(state_of(&resp), LifecycleState::Armed);
        assert_eq!(h.windows.live_launchers(), 0);
    }

    #[test]
    fn test_permission_revoked_through_host() {
        let mut h = Harness::new();
        let host = SessionId::new();
        h.register(&host, &host_role());
        h.call(&host, "launch", None);

        let resp = h.call(&host, methods::SET_PERMISSION, Some(json!({ "granted": false })));
        assert_eq!(state_of(&resp), LifecycleState::Armed);
        assert!(!h.permission.has_overlay_permission());
        assert_eq!(h.windows.live_windows(), 1);
    }

    #[test]
    fn test_screen_off_then_on() {
        let mut h = Harness::new();
        let host = SessionId::new();
        h.register(&host, &host_role());
        h.service.start().unwrap();

        let resp = h.call(&host, methods::SCREEN_OFF, None);
        assert_eq!(state_of(&resp), LifecycleState::Inactive);
        let resp = h.call(&host, methods::SCREEN_ON, None);
        assert_eq!(state_of(&resp), LifecycleState::Armed);
    }

    #[test]
    fn test_configuration_changed_rotates_display() {
        let mut h = Harness::new();
        let host = SessionId::new();
        h.register(&host, &host_role());
        h.service.start().unwrap();

        let resp = h.call(
            &host,
            methods::CONFIGURATION_CHANGED,
            Some(json!({ "orientation": "landscape" })),
        );
        assert_eq!(state_of(&resp), LifecycleState::Armed);
        assert_eq!(
            h.windows.display().orientation(),
            edgelaunch_types::Orientation::Landscape
        );
        assert_eq!(h.windows.live_windows(), 1);
    }

    #[test]
    fn test_status_and_unknown_method() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);

        let resp = h.call(&id, methods::STATUS, None);
        let status: edgelaunch_types::ControllerStatus =
            serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(status.state, LifecycleState::Inactive);
        assert!(status.policy_active);

        let resp = h.call(&id, "reticulate", None);
        assert_eq!(error_code(&resp), protocol::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_licenses_without_file_is_empty() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);
        let resp = h.call(&id, methods::LICENSES, None);
        assert_eq!(resp.result, Some(json!([])));
    }

    #[test]
    fn test_shutdown_sets_flag_and_tears_down() {
        let mut h = Harness::new();
        let id = SessionId::new();
        h.register(&id, &ClientRole::Control);
        h.call(&id, "launch", None);

        let resp = h.call(&id, methods::SHUTDOWN, None);
        assert_eq!(state_of(&resp), LifecycleState::Inactive);
        assert!(h.shutdown);
        assert_eq!(h.windows.live_windows(), 0);
    }
}
