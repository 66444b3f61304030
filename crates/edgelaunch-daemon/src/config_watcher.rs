//! Watches the config directory and turns file edits into commands.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use edgelaunch_types::Command;
use notify::Watcher;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info};

use crate::error::{DaemonError, Result};

const RELOAD_SETTLE_DELAY: Duration = Duration::from_millis(100);
const CONFIG_DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

pub struct ConfigWatcher {
    _watcher_thread: std::thread::JoinHandle<()>,
    _bridge_thread: std::thread::JoinHandle<()>,
}

/// Which command a change to `path` should trigger.
pub(crate) fn command_for(path: &Path, settings_file: &Path, entries_file: &Path) -> Option<Command> {
    let name = path.file_name()?;
    if Some(name) == settings_file.file_name() {
        Some(Command::NotifyConfigChanged)
    } else if Some(name) == entries_file.file_name() {
        Some(Command::NotifyDataChanged)
    } else {
        None
    }
}

pub fn spawn_config_watcher(
    settings_file: PathBuf,
    entries_file: PathBuf,
    tx: tokio_mpsc::UnboundedSender<Command>,
) -> ConfigWatcher {
    let (sync_tx, sync_rx) = mpsc::channel::<Command>();

    let watcher_thread = std::thread::spawn(move || {
        if let Err(e) = watch_config_dir(&settings_file, &entries_file, &sync_tx) {
            error!("Config watcher error: {e}");
        }
    });

    let bridge_thread = std::thread::spawn(move || {
        while let Ok(command) = sync_rx.recv() {
            debug!("Config file changed, queueing {command}");
            std::thread::sleep(RELOAD_SETTLE_DELAY);
            if tx.send(command).is_err() {
                debug!("Config change receiver dropped, stopping watcher");
                return;
            }
        }
        debug!("Config watcher channel closed");
    });

    ConfigWatcher {
        _watcher_thread: watcher_thread,
        _bridge_thread: bridge_thread,
    }
}

fn watch_config_dir(
    settings_file: &Path,
    entries_file: &Path,
    tx: &mpsc::Sender<Command>,
) -> Result<()> {
    let Some(dir) = settings_file.parent() else {
        return Err(DaemonError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Invalid config path",
        )));
    };

    let settings = settings_file.to_owned();
    let entries = entries_file.to_owned();
    let mut last_sent: HashMap<Command, Instant> = HashMap::new();
    let (watcher_tx, watcher_rx) = mpsc::channel();

    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    notify::EventKind::Modify(_)
                        | notify::EventKind::Create(_)
                        | notify::EventKind::Remove(_)
                ) {
                    return;
                }
                for command in event
                    .paths
                    .iter()
                    .filter_map(|p| command_for(p, &settings, &entries))
                {
                    let now = Instant::now();
                    let due = last_sent
                        .get(&command)
                        .is_none_or(|last| now.duration_since(*last) > CONFIG_DEBOUNCE_DURATION);
                    if due {
                        last_sent.insert(command, now);
                        let _ = watcher_tx.send(command);
                    }
                }
            }
            Err(e) => {
                error!("Watcher error: {}", e);
            }
        })?;

    watcher.watch(dir, notify::RecursiveMode::NonRecursive)?;
    info!("Watching config directory: {:?}", dir);

    while let Ok(command) = watcher_rx.recv() {
        if tx.send(command).is_err() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> (PathBuf, PathBuf) {
        (
            PathBuf::from("/cfg/settings.json"),
            PathBuf::from("/cfg/entries.json"),
        )
    }

    #[test]
    fn test_settings_change_maps_to_config_changed() {
        let (settings, entries) = files();
        assert_eq!(
            command_for(Path::new("/cfg/settings.json"), &settings, &entries),
            Some(Command::NotifyConfigChanged)
        );
    }

    #[test]
    fn test_entries_change_maps_to_data_changed() {
        let (settings, entries) = files();
        assert_eq!(
            command_for(Path::new("/cfg/entries.json"), &settings, &entries),
            Some(Command::NotifyDataChanged)
        );
    }

    #[test]
    fn test_other_files_ignored() {
        let (settings, entries) = files();
        assert_eq!(
            command_for(Path::new("/cfg/state.json"), &settings, &entries),
            None
        );
        assert_eq!(
            command_for(Path::new("/cfg/settings.json.swp"), &settings, &entries),
            None
        );
        assert_eq!(command_for(Path::new("/"), &settings, &entries), None);
    }
}
