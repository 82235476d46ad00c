//! Core [`CriteriaLoader`] struct: filesystem-backed criteria loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::schema::Criteria;
use crate::service::CriteriaSource;
use crate::validation::validate_criteria;

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::watcher::handle_fs_event;

// ── Shared store ────────────────────────────────────────────────────

/// Loaded criteria by id, plus which file each id came from.
#[derive(Debug, Default)]
pub(super) struct Store {
    criteria: HashMap<String, Criteria>,
    paths: HashMap<PathBuf, String>,
}

impl Store {
    /// Insert criteria parsed from `path`.
    ///
    /// Returns the id previously loaded from the same file when it differs
    /// from the new one. Fails when another file already owns the id.
    pub(super) fn upsert(&mut self, path: &Path, criteria: Criteria) -> Result<Option<String>> {
        let id = criteria.id().to_string();
        if let Some((owner, _)) = self.paths.iter().find(|(p, owner)| **owner == id && p.as_path() != path) {
            return Err(RuleError::Validation(format!(
                "duplicate criteria id '{id}' (already loaded from {})",
                owner.display()
            )));
        }

        let replaced = self
            .paths
            .insert(path.to_path_buf(), id.clone())
            .filter(|previous| *previous != id);
        if let Some(previous) = &replaced {
            self.criteria.remove(previous);
        }
        self.criteria.insert(id, criteria);
        Ok(replaced)
    }

    /// Drop whatever was loaded from `path`, returning its id.
    pub(super) fn remove_path(&mut self, path: &Path) -> Option<String> {
        let id = self.paths.remove(path)?;
        self.criteria.remove(&id);
        Some(id)
    }
}

pub(super) type SharedStore = Arc<RwLock<Store>>;

pub(super) fn read(store: &SharedStore) -> RwLockReadGuard<'_, Store> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub(super) fn write(store: &SharedStore) -> RwLockWriteGuard<'_, Store> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// Parse and validate one criteria document. Validation errors reject it;
/// warnings are logged.
pub(super) fn parse_criteria(contents: &str, path: &Path) -> Result<Criteria> {
    let criteria = Criteria::from_yaml(contents)?;
    let validation = validate_criteria(&criteria);
    if !validation.valid {
        return Err(RuleError::Validation(format!(
            "criteria '{}' is invalid:\n{}",
            criteria.id(),
            validation.summary()
        )));
    }
    for warning in &validation.warnings {
        warn!(
            criteria_id = %criteria.id(),
            path = %path.display(),
            at = %warning.path,
            "{}",
            warning.message
        );
    }
    Ok(criteria)
}

pub(super) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

pub(super) fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

// ── Loader ──────────────────────────────────────────────────────────

/// Filesystem-backed criteria loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, parses and
/// validates each into a [`Criteria`], and keeps them in memory keyed by
/// `metadata.id`.
pub struct CriteriaLoader {
    /// Root directory containing criteria YAML files.
    criteria_dir: PathBuf,
    store: SharedStore,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl CriteriaLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(criteria_dir: PathBuf) -> Self {
        if !criteria_dir.exists() {
            if let Err(e) = fs::create_dir_all(&criteria_dir) {
                warn!(path = %criteria_dir.display(), error = %e, "failed to create criteria directory");
            }
        }
        // Watcher events carry absolute paths.
        let criteria_dir = fs::canonicalize(&criteria_dir).unwrap_or(criteria_dir);
        Self {
            criteria_dir,
            store: Arc::new(RwLock::new(Store::default())),
            _watcher: None,
        }
    }

    /// Recursively scan the criteria directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Parse and validation errors are
    /// reported per file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.criteria_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Deterministic order, so duplicate ids resolve the same way every run.
        paths.sort();

        for path in paths {
            if is_dotfile(&path) {
                if path.is_file() {
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Skipped {
                            reason: "dotfile".to_string(),
                        },
                    });
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_yaml(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path).and_then(|c| {
                let id = c.id().to_string();
                write(&self.store).upsert(&path, c).map(|_| id)
            }) {
                Ok(criteria_id) => {
                    info!(criteria_id = %criteria_id, path = %path.display(), "loaded criteria");
                    LoadStatus::Loaded { criteria_id }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load criteria file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse and validate a single YAML file without storing it.
    pub fn load_file(&self, path: &Path) -> Result<Criteria> {
        let contents = fs::read_to_string(path)?;
        parse_criteria(&contents, path)
    }

    /// Add criteria that did not come from a file.
    pub fn insert(&self, criteria: Criteria) {
        let mut store = write(&self.store);
        store.criteria.insert(criteria.id().to_string(), criteria);
    }

    /// Start a filesystem watcher.
    ///
    /// On file create/modify the criteria is re-parsed and upserted; on delete
    /// it is removed. Every change calls `on_change` with the affected id so
    /// cached evaluations can be invalidated. Parse errors are logged and the
    /// previous version is kept.
    pub fn watch<F>(&mut self, on_change: F) -> Result<()>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let store = Arc::clone(&self.store);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &store, &on_change),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.criteria_dir, RecursiveMode::Recursive)?;

        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.criteria_dir.display(), "watching criteria directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn shared_store(&self) -> &SharedStore {
        &self.store
    }

    pub fn criteria_dir(&self) -> &Path {
        &self.criteria_dir
    }

    pub fn get(&self, id: &str) -> Option<Criteria> {
        read(&self.store).criteria.get(id).cloned()
    }

    /// Loaded criteria ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = read(&self.store).criteria.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        read(&self.store).criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CriteriaSource for CriteriaLoader {
    fn criteria(&self, id: &str) -> Option<Criteria> {
        self.get(id)
    }

    fn ids(&self) -> Vec<String> {
        CriteriaLoader::ids(self)
    }
}
