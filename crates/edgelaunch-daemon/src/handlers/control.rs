//! Control methods: the command surface plus status, licenses and shutdown.

use edgelaunch_core::license::{PackageInfo, load_packages};
use edgelaunch_rpc::protocol::TransitionResult;
use edgelaunch_types::Command;
use serde_json::Value;
use tracing::info;

use super::{HandlerContext, to_value, transition};
use crate::error::Result;

pub fn handle_command(ctx: &HandlerContext<'_>, command: Command) -> Result<Value> {
    let result = ctx.service.handle_command(command);
    transition(ctx, result)
}

pub fn handle_status(ctx: &HandlerContext<'_>) -> Result<Value> {
    to_value(&ctx.service.controller().status())
}

pub fn handle_licenses(ctx: &HandlerContext<'_>) -> Result<Value> {
    let packages = load_packages(ctx.licenses_file, ctx.license_access)?;
    Ok(Value::Array(packages.iter().map(PackageInfo::to_json).collect()))
}

pub fn handle_shutdown(ctx: &mut HandlerContext<'_>) -> Result<Value> {
    info!("Shutdown requested by {}", ctx.client_id);
    ctx.service.shutdown();
    *ctx.shutdown = true;
    to_value(&TransitionResult { state: ctx.state() })
}
