//! Filesystem event handler for the notify watcher (hot-reload).

use std::fs;
use std::path::Path;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{is_dotfile, is_yaml, parse_criteria, write, SharedStore};

/// Handle a single filesystem event from the notify watcher.
///
/// `on_change` is called once per criteria id that was added, replaced or removed.
pub(super) fn handle_fs_event(event: &Event, store: &SharedStore, on_change: &dyn Fn(&str)) {
    for path in &event.paths {
        // Dotfiles include editor swap and temp files.
        if !is_yaml(path) || is_dotfile(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_)) => {
                // Renames report the old path too; it no longer exists.
                if path.exists() {
                    reload(path, store, on_change);
                } else {
                    remove(path, store, on_change);
                }
            }
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                remove(path, store, on_change);
            }
            _ => {}
        }
    }
}

fn reload(path: &Path, store: &SharedStore, on_change: &dyn Fn(&str)) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file during hot-reload");
            return;
        }
    };

    let criteria = match parse_criteria(&contents, path) {
        Ok(criteria) => criteria,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to parse criteria during hot-reload, keeping previous version"
            );
            return;
        }
    };

    let id = criteria.id().to_string();
    let upserted = write(store).upsert(path, criteria);
    match upserted {
        Ok(replaced) => {
            info!(criteria_id = %id, path = %path.display(), "hot-reloaded criteria");
            if let Some(previous) = replaced {
                on_change(&previous);
            }
            on_change(&id);
        }
        Err(e) => warn!(path = %path.display(), error = %e, "rejected criteria during hot-reload"),
    }
}

fn remove(path: &Path, store: &SharedStore, on_change: &dyn Fn(&str)) {
    let removed = write(store).remove_path(path);
    if let Some(id) = removed {
        info!(criteria_id = %id, path = %path.display(), "removed criteria after file deletion");
        on_change(&id);
    }
}
