//! edgelaunch control CLI
//!
//! Sends the overlay command surface to a running daemon, or runs the daemon
//! in the foreground.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use edgelaunch_rpc::{ClientRole, RpcClient, helpers, methods, socket_path};
use edgelaunch_types::{Command as OverlayCommand, LifecycleState};
use std::path::PathBuf;
use std::process::Command;

/// Find a binary, preferring one next to this executable (dev builds)
fn find_binary(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let sibling = dir.join(name);
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from(name)
}

/// edgelaunch - edge-activated launcher overlay
#[derive(Parser)]
#[command(name = "edgelaunch")]
#[command(about = "Control the edgelaunch overlay daemon")]
#[command(version)]
#[command(after_help = "\
Examples:
  edgelaunch daemon                  Run the daemon in the foreground
  edgelaunch launch                  Bring the activation strip up
  edgelaunch pause                   Hide the overlay until `play`
  edgelaunch notify-config-changed   Re-read settings.json
  edgelaunch status                  Show the overlay state
")]
struct Cli {
    /// Daemon socket (defaults to `$XDG_RUNTIME_DIR/edgelaunch.sock`)
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon in the foreground; extra arguments are passed through
    Daemon {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Start the overlay (no-op if the strip is already up)
    Launch,

    /// Reload the entry tree
    NotifyDataChanged,

    /// Reload settings and rebuild the strip
    NotifyConfigChanged,

    /// Retry the strip after the overlay permission changed
    NotifyPermissionChanged,

    /// Re-attach the strip so it is on top and tappable
    EnsureActivationTappable,

    /// Hide the overlay and remember it across restarts
    Pause,

    /// Show the overlay again
    Play,

    /// Show the overlay state
    Status {
        /// Print the raw JSON status
        #[arg(long)]
        json: bool,
    },

    /// List bundled third-party packages and their licenses
    Licenses,

    /// Stop the daemon
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let socket = cli.socket.unwrap_or_else(socket_path);

    match cli.command {
        Commands::Daemon { args } => run_daemon(&socket, &args),
        Commands::Launch => run_overlay_command(socket, OverlayCommand::Launch).await,
        Commands::NotifyDataChanged => {
            run_overlay_command(socket, OverlayCommand::NotifyDataChanged).await
        }
        Commands::NotifyConfigChanged => {
            run_overlay_command(socket, OverlayCommand::NotifyConfigChanged).await
        }
        Commands::NotifyPermissionChanged => {
            run_overlay_command(socket, OverlayCommand::NotifyPermissionChanged).await
        }
        Commands::EnsureActivationTappable => {
            run_overlay_command(socket, OverlayCommand::EnsureActivationTappable).await
        }
        Commands::Pause => run_overlay_command(socket, OverlayCommand::Pause).await,
        Commands::Play => run_overlay_command(socket, OverlayCommand::Play).await,
        Commands::Status { json } => run_status(socket, json).await,
        Commands::Licenses => run_licenses(socket).await,
        Commands::Shutdown => run_shutdown(socket).await,
    }
}

fn run_daemon(socket: &std::path::Path, args: &[String]) -> Result<()> {
    let binary = find_binary("edgelaunch-daemon");
    let status = Command::new(&binary)
        .arg("--socket-path")
        .arg(socket)
        .args(args)
        .status()
        .with_context(|| format!("Failed to start {}. Is it installed?", binary.display()))?;
    if !status.success() {
        bail!("edgelaunch-daemon exited with status: {status}");
    }
    Ok(())
}

async fn connect(socket: PathBuf) -> Result<RpcClient> {
    if !socket.exists() {
        bail!(
            "Daemon not running (socket not found at {}).\nStart with: edgelaunch daemon",
            socket.display()
        );
    }
    helpers::connect_as(Some(socket), ClientRole::Control)
        .await
        .context("Failed to connect to daemon. Is it running?")
}

async fn run_overlay_command(socket: PathBuf, command: OverlayCommand) -> Result<()> {
    let client = connect(socket).await?;
    let state = helpers::send_command(&client, command)
        .await
        .with_context(|| format!("{command} failed"))?;
    println!("{}", describe(state));
    Ok(())
}

fn describe(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Inactive => "Overlay inactive",
        LifecycleState::Armed => "Activation strip armed",
        LifecycleState::Presenting => "Launcher open",
    }
}

async fn run_status(socket: PathBuf, json: bool) -> Result<()> {
    if !socket.exists() {
        println!("Status: Not running");
        println!("Socket: {} (not found)", socket.display());
        return Ok(());
    }

    let client = connect(socket.clone()).await?;
    let status = helpers::fetch_status(&client)
        .await
        .context("Status request failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Status: {}", describe(status.state));
    println!("Socket: {}", socket.display());
    println!(
        "Policy: {}",
        if status.policy_active { "active" } else { "paused" }
    );
    match status.strip {
        Some(strip) => println!(
            "Strip: {}x{} at ({}, {})",
            strip.width(),
            strip.height(),
            strip.left,
            strip.top
        ),
        None if status.permission_denied => println!("Strip: waiting for overlay permission"),
        None => println!("Strip: none"),
    }
    println!(
        "Entries: {} top-level{}",
        status.top_level_entries,
        if status.entries_loaded { "" } else { " (stale)" }
    );
    Ok(())
}

async fn run_licenses(socket: PathBuf) -> Result<()> {
    let client = connect(socket).await?;
    let packages: Vec<serde_json::Value> = client
        .request(methods::LICENSES, None)
        .await
        .context("Licenses request failed")?;

    if packages.is_empty() {
        println!("No package metadata installed");
    }
    for package in &packages {
        println!(
            "{} ({}) - {}",
            str_field(package, "name"),
            str_field(package, "vendor"),
            str_field(package, "license")
        );
        println!("  {}", str_field(package, "url"));
    }
    Ok(())
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or("")
}

async fn run_shutdown(socket: PathBuf) -> Result<()> {
    let client = connect(socket).await?;
    let _: serde_json::Value = client
        .request(methods::SHUTDOWN, None)
        .await
        .context("Shutdown request failed")?;
    println!("Daemon stopped");
    Ok(())
}
