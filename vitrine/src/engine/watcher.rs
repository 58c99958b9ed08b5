//! Reload requests for a scene file on disk.

use crossbeam_channel::{Receiver, unbounded};
use log::{trace, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum WatchError {
    #[snafu(display("Failed to watch {path}: {source}"))]
    Watch { path: String, source: notify::Error },
}

/// Whether `event` means `target` might have new contents.
pub fn is_reload_event(event: &Event, target: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    relevant_kind
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == target.file_name())
}

/// Watches the directory of one scene file.
///
/// Editors and exporters tend to replace files instead of writing in place, which is why the
/// parent directory is watched and events are filtered by file name.
pub struct SceneWatcher {
    path: PathBuf,
    events: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl SceneWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        let path = path.into();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let display = directory.display().to_string();

        let (tx, events) = unbounded();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let _ = tx.send(event);
        })
        .context(WatchErr { path: &display })?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .context(WatchErr { path: &display })?;

        Ok(Self {
            path,
            events,
            _watcher: watcher,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains pending events. Any number of changes since the last call count as one request.
    pub fn take_reload_request(&self) -> bool {
        let mut requested = false;

        for event in self.events.try_iter() {
            match event {
                Ok(event) if is_reload_event(&event, &self.path) => {
                    trace!("{} changed ({:?})", self.path.display(), event.kind);
                    requested = true;
                }
                Ok(_) => {}
                Err(e) => warn!("Error while watching {}: {e}", self.path.display()),
            }
        }

        requested
    }
}
