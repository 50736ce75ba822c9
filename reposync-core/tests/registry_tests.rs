//! Registry error-message, atomic-write-safety, and add integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use reposync_core::{registry, ConfigError, RepoKind, RepoName};
use serde_json::Value;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_registry_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("repo-config.json");
    let err = registry::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::RegistryNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("registry not found"));
    assert!(err.to_string().contains("repo-config.json"));
}

#[test]
fn load_corrupt_json_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");
    file.write_str(r#"{"repositories": [ {"name": "a", }"#).expect("write");

    let err = registry::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseJson { .. }), "got: {err}");
    assert!(err.to_string().contains("repo-config.json"));
}

#[test]
fn load_wrong_shape_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repos.yaml");
    file.write_str("- this is a list, not a mapping\n").expect("write");

    let err = registry::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseYaml { .. }), "got: {err}");
}

#[test]
fn load_reports_duplicates_as_config_errors() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");
    file.write_str(r#"{"repositories":[{"name":"a","type":"lib"},{"name":"a","type":"docs"}]}"#)
        .expect("write");

    let err = registry::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateName { .. }), "got: {err}");
    assert!(err.to_string().contains("'a'"));
}

#[test]
fn load_keeps_declared_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");
    file.write_str(
        r#"{"org":"acme","repositories":[{"name":"zeta","type":"lib"},{"name":"alpha","type":"docs"}]}"#,
    )
    .expect("write");

    let reg = registry::load_at(file.path()).expect("load");
    let names: Vec<_> = reg.repositories.iter().map(|r| r.name.0.as_str()).collect();
    assert_eq!(names, ["zeta", "alpha"]);
    assert_eq!(reg.repositories[1].kind(), RepoKind::Docs);
}

// ---------------------------------------------------------------------------
// 2. Add
// ---------------------------------------------------------------------------

#[test]
fn add_creates_registry_file_when_absent() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");

    registry::add_repository_at(file.path(), RepoName::from("widgets"), Some("docs"))
        .expect("add");

    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("\"widgets\""));
    file.assert(predicate::str::contains("\"docs\""));
    dir.child("repo-config.json.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn add_is_idempotent() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repos.yaml");

    registry::add_repository_at(file.path(), RepoName::from("widgets"), None)
        .expect("first add");
    let second =
        registry::add_repository_at(file.path(), RepoName::from("widgets"), Some("docs"))
            .expect("second add");

    assert_eq!(second.kind(), RepoKind::Plain, "existing entry is returned unchanged");
    let reg = registry::load_at(file.path()).expect("load");
    assert_eq!(reg.repositories.len(), 1);
}

#[test]
fn add_preserves_existing_org() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");
    file.write_str(r#"{"org":"acme","repositories":[]}"#).expect("write");

    registry::add_repository_at(file.path(), RepoName::from("widgets"), None)
        .expect("add");

    let reg = registry::load_at(file.path()).expect("load");
    assert_eq!(reg.org.map(|o| o.0).as_deref(), Some("acme"));
}

#[test]
fn add_keeps_existing_type_labels_verbatim() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repo-config.json");
    file.write_str(
        r#"{"org":"acme","repositories":[{"name":"a","type":"python-library"},{"name":"b"}]}"#,
    )
    .expect("write");

    registry::add_repository_at(file.path(), RepoName::from("c"), Some("Go-Service"))
        .expect("add");

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(file.path()).expect("read")).expect("json");
    let repos = &saved["repositories"];
    assert_eq!(repos[0]["type"], "python-library");
    assert!(repos[1].get("type").is_none(), "absent type is not invented");
    assert_eq!(repos[2]["type"], "Go-Service");

    let reg = registry::load_at(file.path()).expect("load");
    assert!(reg.repositories.iter().all(|r| r.kind() == RepoKind::Plain));
}

#[test]
fn add_keeps_yaml_labels_verbatim() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("repos.yaml");
    file.write_str("org: acme\nrepositories:\n  - name: guide\n    type: Docs\n  - name: api\n    type: rust-service\n")
        .expect("write");

    registry::add_repository_at(file.path(), RepoName::from("web"), None).expect("add");

    file.assert(predicate::str::contains("type: rust-service"));
    file.assert(predicate::str::contains("type: Docs"));
    let reg = registry::load_at(file.path()).expect("load");
    assert_eq!(reg.repositories[0].kind(), RepoKind::Docs);
    assert_eq!(reg.repositories[2].label, None);
}
