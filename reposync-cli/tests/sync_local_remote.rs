use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(registry_json: &str) -> Self {
        let dir = TempDir::new().expect("workspace");
        let root = dir.path();
        fs::write(root.join("repo-config.json"), registry_json).expect("registry");
        write(root, "repository-files/always-sync/AGENTS.md", "# Agents\n");
        write(
            root,
            "repository-files/always-sync/.github/workflows/ci.yml",
            "run: echo ${{ github.sha }}\n",
        );
        write(root, "repository-files/initial-only/README.md", "# {{ REPO_NAME }}\n");
        write(root, "repository-files/docs/mkdocs.yml", "site_name: docs\n");
        fs::create_dir_all(root.join("remote")).expect("remote root");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn repo_dir(&self, name: &str) -> PathBuf {
        self.root().join("remote/acme").join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reposync"));
        cmd.current_dir(self.root())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .args(["--remote-dir", "remote"]);
        cmd
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

const TWO_REPOS: &str = r#"{
  "org": "acme",
  "repositories": [
    { "name": "widgets", "type": "service" },
    { "name": "handbook", "type": "docs" }
  ]
}"#;

#[test]
fn sync_converges_and_second_run_changes_nothing() {
    let ws = Workspace::new(TWO_REPOS);

    ws.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("acme/widgets"))
        .stdout(contains("+ AGENTS.md"));

    let widgets = ws.repo_dir("widgets");
    assert_eq!(fs::read_to_string(widgets.join("README.md")).unwrap(), "# widgets\n");
    assert_eq!(
        fs::read_to_string(widgets.join(".github/workflows/ci.yml")).unwrap(),
        "run: echo ${{ github.sha }}\n"
    );
    assert!(!widgets.join("mkdocs.yml").exists(), "docs files only go to docs repos");
    assert!(ws.repo_dir("handbook").join("mkdocs.yml").exists());

    ws.cmd()
        .arg("sync")
        .assert()
        .success()
        .stdout(contains("acme/widgets — up to date"))
        .stdout(contains("acme/handbook — up to date"));
}

#[test]
fn dry_run_reports_changes_and_writes_nothing() {
    let ws = Workspace::new(TWO_REPOS);
    write(ws.root(), "remote/acme/widgets/.github/workflows/old.yml", "stale\n");

    ws.cmd()
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("AGENTS.md (would create)"))
        .stdout(contains(".github/workflows/old.yml (would delete)"));

    let widgets = ws.repo_dir("widgets");
    assert!(!widgets.join("AGENTS.md").exists());
    assert!(widgets.join(".github/workflows/old.yml").exists());
    assert!(!ws.repo_dir("handbook").exists());
}

#[test]
fn stale_managed_file_is_deleted_and_unmanaged_file_kept() {
    let ws = Workspace::new(TWO_REPOS);
    write(ws.root(), "remote/acme/widgets/.github/workflows/old.yml", "stale\n");
    write(ws.root(), "remote/acme/widgets/.github/CODEOWNERS", "* @acme\n");

    ws.cmd()
        .args(["sync", "--repo", "widgets"])
        .assert()
        .success()
        .stdout(contains("- .github/workflows/old.yml"));

    let widgets = ws.repo_dir("widgets");
    assert!(!widgets.join(".github/workflows/old.yml").exists());
    assert!(widgets.join(".github/CODEOWNERS").exists());
    assert!(!ws.repo_dir("handbook").exists(), "--repo limits the run");
}

#[test]
fn json_output_carries_counts() {
    let ws = Workspace::new(TWO_REPOS);

    let output = ws
        .cmd()
        .args(["sync", "--repo", "widgets", "--json"])
        .output()
        .expect("run reposync");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["totals"]["created"], 3);
    assert_eq!(summary["totals"]["failed"], 0);
    assert_eq!(summary["reports"][0]["repository"], "acme/widgets");
    assert_eq!(summary["reports"][0]["outcomes"][0]["pass"], "always");
}

#[test]
fn per_path_failure_exits_non_zero_after_finishing_the_run() {
    let ws = Workspace::new(TWO_REPOS);
    // A directory where a file is expected cannot be read as a file.
    fs::create_dir_all(ws.repo_dir("widgets").join("AGENTS.md")).unwrap();

    ws.cmd()
        .arg("sync")
        .assert()
        .failure()
        .stdout(contains("AGENTS.md"))
        .stderr(contains("1 path(s) failed"));

    let widgets = ws.repo_dir("widgets");
    assert!(widgets.join(".github/workflows/ci.yml").exists());
    assert!(widgets.join("README.md").exists());
    assert!(ws.repo_dir("handbook").join("AGENTS.md").exists());
}

#[test]
fn configuration_error_fails_before_touching_the_remote() {
    let ws = Workspace::new(r#"{ "repositories": [ { "name": "widgets" } ] }"#);

    ws.cmd()
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("organization"));

    assert!(!ws.repo_dir("widgets").exists());
}

#[test]
fn org_flag_supplies_missing_organization() {
    let ws = Workspace::new(r#"{ "repositories": [ { "name": "widgets" } ] }"#);

    ws.cmd().args(["--org", "acme", "sync"]).assert().success();
    assert!(ws.repo_dir("widgets").join("AGENTS.md").exists());
}

#[test]
fn unknown_repository_is_rejected() {
    let ws = Workspace::new(TWO_REPOS);

    ws.cmd()
        .args(["sync", "--repo", "nope"])
        .assert()
        .failure()
        .stderr(contains("'nope' is not in the registry"));
    assert!(!ws.repo_dir("widgets").exists());
}

#[test]
fn diff_shows_remote_drift_without_writing() {
    let ws = Workspace::new(TWO_REPOS);
    ws.cmd().arg("sync").assert().success();
    let agents = ws.repo_dir("widgets").join("AGENTS.md");
    fs::write(&agents, "# Agents\nlocal edit\n").unwrap();

    ws.cmd()
        .args(["diff", "widgets"])
        .assert()
        .success()
        .stdout(contains("--- a/AGENTS.md"))
        .stdout(contains("-local edit"));
    assert_eq!(fs::read_to_string(&agents).unwrap(), "# Agents\nlocal edit\n");

    ws.cmd()
        .args(["diff", "handbook"])
        .assert()
        .success()
        .stdout(contains("No differences for 'acme/handbook'."));
}

#[test]
fn repos_add_then_list() {
    let ws = Workspace::new(r#"{ "org": "acme", "repositories": [] }"#);

    ws.cmd()
        .args(["repos", "add", "handbook", "--type", "docs"])
        .assert()
        .success()
        .stdout(contains("Registered 'handbook' (docs)"));
    ws.cmd()
        .args(["repos", "add", "widgets"])
        .assert()
        .success();

    ws.cmd()
        .args(["repos", "list"])
        .assert()
        .success()
        .stdout(contains("Organization: acme"))
        .stdout(contains("handbook").and(contains("widgets")));

    let registry = fs::read_to_string(ws.root().join("repo-config.json")).unwrap();
    let handbook = registry.find("handbook").unwrap();
    let widgets = registry.find("widgets").unwrap();
    assert!(handbook < widgets, "declared order is kept");
}

#[test]
fn repos_add_leaves_other_type_labels_alone() {
    let ws = Workspace::new(
        r#"{ "org": "acme", "repositories": [ { "name": "api", "type": "python-library" } ] }"#,
    );

    ws.cmd().args(["repos", "add", "web"]).assert().success();

    let registry: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.root().join("repo-config.json")).unwrap())
            .unwrap();
    assert_eq!(registry["repositories"][0]["type"], "python-library");
    ws.cmd()
        .args(["repos", "list"])
        .assert()
        .success()
        .stdout(contains("python-library"));
}

#[test]
fn templates_lists_collections_and_prefixes() {
    let ws = Workspace::new(TWO_REPOS);

    ws.cmd()
        .arg("templates")
        .assert()
        .success()
        .stdout(contains("always-sync"))
        .stdout(contains("README.md"))
        .stdout(contains(".cursor/rules/"))
        .stdout(contains(".github/workflows/"));
}
