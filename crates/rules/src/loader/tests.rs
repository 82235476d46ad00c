//! Tests for the criteria loader module.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tempfile::TempDir;

use super::watcher::handle_fs_event;
use super::*;
use crate::schema::{CommonMetadata, Criteria, CriteriaSpec, Rule};
use crate::service::CriteriaSource;

const VALID_CRITERIA_YAML: &str = r#"
apiVersion: v1
kind: Criteria
metadata:
  id: loan-basic
  name: Basic loan eligibility
spec:
  scoring_method: weighted
  threshold: 70
  groups:
    - id: identity
      combination: ALL
      rules:
        - id: adult
          field: age
          operator: gte
          expected: 18
        - id: resident
          field: country
          operator: in
          expected: [DE, AT, CH]
"#;

fn temp_loader() -> (TempDir, CriteriaLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = CriteriaLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

fn loaded_ids(results: &[LoadResult]) -> Vec<&str> {
    results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { criteria_id } => Some(criteria_id.as_str()),
            _ => None,
        })
        .collect()
}

/// Records every id passed to the change callback.
fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str)) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |id: &str| sink.lock().unwrap().push(id.to_string()))
}

fn event(kind: EventKind, path: PathBuf) -> Event {
    Event::new(kind).add_path(path)
}

// ── Loading ─────────────────────────────────────────────────────

#[test]
fn load_criteria_from_file() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("loan-basic.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();

    let criteria = loader.load_file(&path).unwrap();
    assert_eq!(criteria.id(), "loan-basic");
    assert_eq!(criteria.metadata.name, "Basic loan eligibility");
    assert_eq!(criteria.spec.groups.len(), 1);
    // load_file does not store
    assert!(loader.is_empty());
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("loan.yml"), VALID_CRITERIA_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), VALID_CRITERIA_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not criteria").unwrap();

    let results = loader.load_all().unwrap();

    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!(loaded_ids(&results), vec!["loan-basic"]);
    assert_eq!(skipped, 2);
    assert!(loader.get("loan-basic").is_some());
}

#[test]
fn load_all_recursive_subdirectories() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("loan.yml"), VALID_CRITERIA_YAML).unwrap();
    let sub = dir.path().join("scholarships");
    fs::create_dir(&sub).unwrap();
    let sub_yaml = VALID_CRITERIA_YAML.replace("loan-basic", "merit-award");
    fs::write(sub.join("merit.yaml"), sub_yaml).unwrap();

    let results = loader.load_all().unwrap();

    assert_eq!(loaded_ids(&results).len(), 2, "should load root and subdirectory");
    assert_eq!(loader.ids(), vec!["loan-basic", "merit-award"]);
}

#[test]
fn load_all_reports_failed_files() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("good.yml"), VALID_CRITERIA_YAML).unwrap();
    fs::write(dir.path().join("bad.yml"), "not valid yaml: [[[").unwrap();

    let results = loader.load_all().unwrap();

    let failed = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .count();
    assert_eq!(loaded_ids(&results).len(), 1);
    assert_eq!(failed, 1);
    assert_eq!(loader.len(), 1);
}

#[test]
fn duplicate_id_in_second_file_fails() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), VALID_CRITERIA_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), VALID_CRITERIA_YAML).unwrap();

    let results = loader.load_all().unwrap();

    // Paths are scanned in sorted order, so a.yml wins.
    assert_eq!(loaded_ids(&results), vec!["loan-basic"]);
    let failed: Vec<_> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Failed { error } => Some((r.path.clone(), error.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].0.ends_with("b.yml"));
    assert!(failed[0].1.contains("duplicate criteria id"));
}

#[test]
fn reloading_same_file_is_not_a_duplicate() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("loan.yml"), VALID_CRITERIA_YAML).unwrap();

    loader.load_all().unwrap();
    let results = loader.load_all().unwrap();
    assert_eq!(loaded_ids(&results), vec!["loan-basic"]);
    assert_eq!(loader.len(), 1);
}

#[test]
fn invalid_yaml_produces_error_not_panic() {
    let (dir, loader) = temp_loader();
    let bad_path = dir.path().join("bad.yml");
    fs::write(&bad_path, "this: is: not: valid: yaml: [[[").unwrap();

    let err = loader.load_file(&bad_path).unwrap_err();
    assert!(matches!(err, RuleError::Parse(_)));
}

#[test]
fn unknown_operator_fails_validation() {
    let (dir, loader) = temp_loader();
    let yaml = VALID_CRITERIA_YAML.replace("operator: gte", "operator: greater");
    let path = dir.path().join("typo.yml");
    fs::write(&path, yaml).unwrap();

    match loader.load_file(&path).unwrap_err() {
        RuleError::Validation(message) => {
            assert!(message.contains("loan-basic"));
            assert!(message.contains("greater"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn bad_id_fails_validation() {
    let (dir, loader) = temp_loader();
    let yaml = VALID_CRITERIA_YAML.replace("id: loan-basic", "id: \"\"");
    let path = dir.path().join("empty-id.yml");
    fs::write(&path, yaml).unwrap();

    assert!(matches!(loader.load_file(&path), Err(RuleError::Validation(_))));
}

#[test]
fn missing_file_is_io_error() {
    let (dir, loader) = temp_loader();
    let err = loader.load_file(&dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, RuleError::Io(_)));
}

#[test]
fn new_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("sub").join("criteria");
    assert!(!nested.exists());

    let loader = CriteriaLoader::new(nested.clone());
    assert!(nested.exists());
    assert!(loader.criteria_dir().is_absolute());
}

#[test]
fn insert_and_source_lookup() {
    let (_dir, loader) = temp_loader();
    let spec = CriteriaSpec {
        rules: vec![Rule::new("adult", "age", "gte", 18)],
        ..CriteriaSpec::default()
    };
    loader.insert(Criteria::new(CommonMetadata::new("inline", "Inline"), spec));

    let source: &dyn CriteriaSource = &loader;
    assert!(source.criteria("inline").is_some());
    assert!(source.criteria("missing").is_none());
    assert_eq!(source.ids(), vec!["inline"]);
}

#[test]
fn load_result_serializes_with_status_tag() {
    let result = LoadResult {
        path: PathBuf::from("loan.yml"),
        status: LoadStatus::Loaded {
            criteria_id: "loan-basic".into(),
        },
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"]["status"], "loaded");
    assert_eq!(json["status"]["criteria_id"], "loan-basic");
}

// ── Hot-reload events ───────────────────────────────────────────

#[test]
fn modify_event_reloads_and_notifies() {
    let (_dir, loader) = temp_loader();
    let path = loader.criteria_dir().join("loan.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();
    loader.load_all().unwrap();

    fs::write(&path, VALID_CRITERIA_YAML.replace("threshold: 70", "threshold: 85")).unwrap();
    let (seen, on_change) = recorder();
    handle_fs_event(
        &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), path),
        loader.shared_store(),
        &on_change,
    );

    assert_eq!(*seen.lock().unwrap(), vec!["loan-basic"]);
    assert_eq!(loader.get("loan-basic").unwrap().spec.threshold, 85.0);
}

#[test]
fn create_event_adds_criteria() {
    let (_dir, loader) = temp_loader();
    let path = loader.criteria_dir().join("new.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();

    let (seen, on_change) = recorder();
    handle_fs_event(
        &event(EventKind::Create(CreateKind::File), path),
        loader.shared_store(),
        &on_change,
    );

    assert_eq!(*seen.lock().unwrap(), vec!["loan-basic"]);
    assert_eq!(loader.ids(), vec!["loan-basic"]);
}

#[test]
fn broken_edit_keeps_previous_version() {
    let (_dir, loader) = temp_loader();
    let path = loader.criteria_dir().join("loan.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();
    loader.load_all().unwrap();

    fs::write(&path, "spec: [[[").unwrap();
    let (seen, on_change) = recorder();
    handle_fs_event(
        &event(EventKind::Modify(ModifyKind::Any), path),
        loader.shared_store(),
        &on_change,
    );

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(loader.get("loan-basic").unwrap().spec.threshold, 70.0);
}

#[test]
fn remove_event_drops_criteria() {
    let (_dir, loader) = temp_loader();
    let path = loader.criteria_dir().join("loan.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();
    loader.load_all().unwrap();

    fs::remove_file(&path).unwrap();
    let (seen, on_change) = recorder();
    handle_fs_event(
        &event(EventKind::Remove(RemoveKind::File), path),
        loader.shared_store(),
        &on_change,
    );

    assert_eq!(*seen.lock().unwrap(), vec!["loan-basic"]);
    assert!(loader.is_empty());
}

#[test]
fn changed_id_replaces_old_entry() {
    let (_dir, loader) = temp_loader();
    let path = loader.criteria_dir().join("loan.yml");
    fs::write(&path, VALID_CRITERIA_YAML).unwrap();
    loader.load_all().unwrap();

    fs::write(&path, VALID_CRITERIA_YAML.replace("loan-basic", "loan-plus")).unwrap();
    let (seen, on_change) = recorder();
    handle_fs_event(
        &event(EventKind::Modify(ModifyKind::Any), path),
        loader.shared_store(),
        &on_change,
    );

    assert_eq!(*seen.lock().unwrap(), vec!["loan-basic", "loan-plus"]);
    assert_eq!(loader.ids(), vec!["loan-plus"]);
}

#[test]
fn non_yaml_and_dotfile_events_are_ignored() {
    let (_dir, loader) = temp_loader();
    let notes = loader.criteria_dir().join("notes.txt");
    let swap = loader.criteria_dir().join(".loan.yml");
    fs::write(&notes, "hello").unwrap();
    fs::write(&swap, VALID_CRITERIA_YAML).unwrap();

    let (seen, on_change) = recorder();
    let store = loader.shared_store();
    handle_fs_event(&event(EventKind::Create(CreateKind::File), notes), store, &on_change);
    handle_fs_event(&event(EventKind::Create(CreateKind::File), swap), store, &on_change);

    assert!(seen.lock().unwrap().is_empty());
    assert!(loader.is_empty());
}
