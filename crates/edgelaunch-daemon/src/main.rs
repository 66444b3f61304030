//! edgelaunch daemon entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use edgelaunch_core::{Directories, DisplayMetrics};
use edgelaunch_daemon::DaemonOptions;
use edgelaunch_types::Rect;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// edgelaunch daemon - hosts the edge-activated launcher overlay
#[derive(Parser, Debug)]
#[command(name = "edgelaunch-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Custom socket path (defaults to `$XDG_RUNTIME_DIR/edgelaunch.sock`)
    #[arg(long, value_name = "PATH")]
    socket_path: Option<PathBuf>,

    /// Keep settings, entries and state under this directory instead of the
    /// XDG locations
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Screen width in pixels
    #[arg(long, default_value_t = 1080)]
    width: i32,

    /// Screen height in pixels
    #[arg(long, default_value_t = 1920)]
    height: i32,

    /// Pixels per dip
    #[arg(long, default_value_t = 2.75, value_parser = parse_density)]
    density: f32,

    /// Start without the overlay permission
    #[arg(long)]
    no_permission: bool,

    /// Do not watch the config directory for edits
    #[arg(long)]
    no_watch: bool,
}

fn parse_density(value: &str) -> Result<f32, String> {
    let density: f32 = value
        .parse()
        .map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if density.is_finite() && density > 0.0 {
        Ok(density)
    } else {
        Err(format!("density must be greater than zero, got {value}"))
    }
}

/// Debug builds log at debug level to stderr and to a timestamped file in the
/// temp dir; release builds log at info level to stderr.
fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("edgelaunch={default_level}")));

    if cfg!(debug_assertions) {
        let temp_dir = std::env::temp_dir();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("edgelaunch-daemon-{timestamp}.log");
        let log_path = temp_dir.join(&log_filename);

        #[cfg(unix)]
        {
            let symlink_path = temp_dir.join("edgelaunch-daemon.log");
            let _ = std::fs::remove_file(&symlink_path);
            let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
        }

        let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true);

        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .with(filter)
            .init();

        eprintln!("Logging to: {} (and stderr)", log_path.display());
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    setup_logging();

    let dirs = match args.base_dir {
        Some(base) => Directories::with_base(base),
        None => Directories::new().context("Failed to resolve config directories")?,
    };

    let mut options = DaemonOptions::new(dirs);
    options.socket_path = args.socket_path;
    options.display = DisplayMetrics::new(Rect::from_size(args.width, args.height), args.density);
    options.permission_granted = !args.no_permission;
    options.watch_config = !args.no_watch;

    info!(
        "Starting edgelaunch daemon ({}x{} @ {})",
        args.width, args.height, args.density
    );

    edgelaunch_daemon::run(options)
        .await
        .context("Daemon stopped with an error")?;

    info!("edgelaunch daemon stopped");
    Ok(())
}
