//! Host methods: what the platform side reports to the overlay.

use edgelaunch_core::DisplayMetrics;
use edgelaunch_core::host::WindowSystem;
use edgelaunch_rpc::protocol::{
    ConfigurationChangedParams, SetPermissionParams, StripTouchParams, TransitionResult,
};
use edgelaunch_types::{Rect, SystemBroadcast};
use serde_json::Value;
use tracing::debug;

use super::{HandlerContext, parse_params, to_value, transition};
use crate::error::Result;

/// Publish on the service bus and report where the adapters left the overlay.
/// Adapter failures are logged by the adapters themselves.
fn broadcast(ctx: &HandlerContext<'_>, broadcast: &SystemBroadcast) -> Result<Value> {
    let delivered = ctx.service.broadcast(broadcast);
    debug!("{broadcast:?} delivered to {delivered} receivers");
    to_value(&TransitionResult { state: ctx.state() })
}

pub fn handle_screen_on(ctx: &HandlerContext<'_>) -> Result<Value> {
    broadcast(ctx, &SystemBroadcast::ScreenOn)
}

pub fn handle_screen_off(ctx: &HandlerContext<'_>) -> Result<Value> {
    broadcast(ctx, &SystemBroadcast::ScreenOff)
}

pub fn handle_configuration_changed(
    ctx: &HandlerContext<'_>,
    params: Option<&Value>,
) -> Result<Value> {
    let params: ConfigurationChangedParams = parse_params(params)?;

    // The headless display follows the reported orientation so the strip is
    // rebuilt against the rotated screen.
    let metrics = ctx.windows.display();
    if metrics.orientation() != params.orientation {
        let screen = Rect::from_size(metrics.screen.height(), metrics.screen.width());
        ctx.windows
            .set_display(DisplayMetrics::new(screen, metrics.density));
    }

    broadcast(
        ctx,
        &SystemBroadcast::ConfigurationChanged {
            orientation: params.orientation,
        },
    )
}

pub fn handle_strip_touch(ctx: &HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params: StripTouchParams = parse_params(params)?;
    let result = ctx.service.controller().strip_touch(params.event);
    transition(ctx, result)
}

pub fn handle_strip_focus_lost(ctx: &HandlerContext<'_>) -> Result<Value> {
    let result = ctx.service.controller().strip_focus_lost();
    transition(ctx, result)
}

pub fn handle_launcher_finished(ctx: &HandlerContext<'_>) -> Result<Value> {
    let result = ctx.service.controller().launcher_finished();
    transition(ctx, result)
}

pub fn handle_set_permission(ctx: &HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params: SetPermissionParams = parse_params(params)?;
    ctx.permission.set(params.granted);
    let result = ctx.service.controller().notify_permission_changed();
    transition(ctx, result)
}
