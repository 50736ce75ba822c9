use reposync_core::{OrgName, RepoKind, RepoSlug, RepositoryTarget};
use reposync_sync::memory::{CallKind, MemoryRemote};
use reposync_sync::{
    reconcile, Action, LocalDirRemote, Pass, RemoteError, RemotePort, RunOptions, SkipReason,
};
use reposync_templates::{ManagedPathSet, TemplateSet};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn org() -> OrgName {
    OrgName::from("acme")
}

fn widgets() -> RepositoryTarget {
    RepositoryTarget::new("widgets", RepoKind::Plain)
}

fn slug(target: &RepositoryTarget) -> RepoSlug {
    target.slug(&org())
}

fn fleet_templates() -> TemplateSet {
    TemplateSet::builder()
        .always("AGENTS.md", "# Agents\n")
        .always(".cursor/rules/style.mdc", "style\n")
        .always(".github/workflows/ci.yml", "on: [push]\n")
        .initial_only("README.md", "# {{ REPO_NAME }}\n")
        .initial_only(".cursor/rules/local.mdc", "owned by {{ REPO_NAME }}\n")
        .docs("mkdocs.yml", "site_name: docs\n")
        .managed(ManagedPathSet::new([".cursor/rules/", ".github/workflows/"]).unwrap())
        .build()
}

#[test]
fn second_run_is_all_skips() {
    init_logging();
    let remote = MemoryRemote::new();
    let target = RepositoryTarget::new("handbook", RepoKind::Docs);
    remote.insert(&slug(&target), ".github/workflows/retired.yml", "old\n");
    let templates = fleet_templates();
    let options = RunOptions::default();

    let first = reconcile(&remote, &org(), &target, &templates, &options);
    assert_eq!(first.counts().failed, 0);
    assert_eq!(first.counts().deleted, 1);
    assert!(first.counts().upserted() > 0);

    remote.clear_calls();
    let second = reconcile(&remote, &org(), &target, &templates, &options);
    let counts = second.counts();
    assert_eq!(counts.upserted(), 0, "second run must not write: {second:#?}");
    assert_eq!(counts.deleted, 0);
    assert_eq!(counts.failed, 0);
    assert_eq!(counts.skipped, second.outcomes.len());
    assert!(remote.calls_of(CallKind::Write).is_empty());
    assert!(remote.calls_of(CallKind::Delete).is_empty());
}

#[test]
fn identical_content_is_skipped_without_write() {
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.insert(&slug(&target), "AGENTS.md", "# Agents\n");
    let templates = TemplateSet::builder().always("AGENTS.md", "# Agents\n").build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(
        report.outcome(Pass::Always, "AGENTS.md"),
        Some(&Action::Skipped {
            reason: SkipReason::Unchanged
        })
    );
    assert!(remote.calls_of(CallKind::Write).is_empty());
}

#[test]
fn deletion_never_leaves_managed_territory() {
    let remote = MemoryRemote::new();
    let target = widgets();
    let s = slug(&target);
    remote.insert(&s, "src/main.rs", "fn main() {}\n");
    remote.insert(&s, ".github/CODEOWNERS", "* @acme\n");
    remote.insert(&s, ".cursor/rules/retired.mdc", "old\n");
    let templates = fleet_templates();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    let deleted: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.pass == Pass::Deletion)
        .map(|o| o.path.as_str())
        .collect();
    assert_eq!(deleted, [".cursor/rules/retired.mdc"]);
    assert!(remote.content(&s, "src/main.rs").is_some());
    assert!(remote.content(&s, ".github/CODEOWNERS").is_some());
}

#[test]
fn initial_only_path_under_managed_prefix_is_never_deleted() {
    let remote = MemoryRemote::new();
    let target = widgets();
    let s = slug(&target);
    remote.insert(&s, ".cursor/rules/local.mdc", "customised by the team\n");
    let templates = fleet_templates();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    assert_eq!(report.outcome(Pass::Deletion, ".cursor/rules/local.mdc"), None);
    assert_eq!(
        report.outcome(Pass::Initial, ".cursor/rules/local.mdc"),
        Some(&Action::Skipped {
            reason: SkipReason::AlreadyExists
        })
    );
    assert_eq!(
        remote.content(&s, ".cursor/rules/local.mdc").unwrap(),
        b"customised by the team\n"
    );
}

#[test]
fn docs_paths_under_managed_prefix_survive_on_plain_repositories() {
    let remote = MemoryRemote::new();
    let target = widgets();
    let s = slug(&target);
    remote.insert(&s, ".github/workflows/docs.yml", "deploy\n");
    let templates = TemplateSet::builder()
        .docs(".github/workflows/docs.yml", "deploy docs\n")
        .build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert!(report.outcomes.is_empty(), "{report:#?}");
    assert!(remote.content(&s, ".github/workflows/docs.yml").is_some());
}

#[test]
fn initial_only_file_is_never_overwritten() {
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.insert(&slug(&target), "README.md", "hand-written readme\n");
    let templates = fleet_templates();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(
        report.outcome(Pass::Initial, "README.md"),
        Some(&Action::Skipped {
            reason: SkipReason::AlreadyExists
        })
    );
    assert_eq!(
        remote.content(&slug(&target), "README.md").unwrap(),
        b"hand-written readme\n"
    );
}

#[test]
fn initial_only_content_gets_repository_name() {
    let remote = MemoryRemote::new();
    let target = widgets();
    let templates = TemplateSet::builder()
        .initial_only("README.md", "# {{ REPO_NAME }}\n\nclone {{ REPO_NAME }} and run ${{ env.X }}\n")
        .build();

    reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(
        remote.content(&slug(&target), "README.md").unwrap(),
        b"# widgets\n\nclone widgets and run ${{ env.X }}\n"
    );
    let writes = remote.calls_of(CallKind::Write);
    assert_eq!(writes[0].message.as_deref(), Some("chore: initial setup for README.md"));
}

#[test]
fn one_failed_write_does_not_stop_the_others() {
    init_logging();
    let remote = MemoryRemote::new();
    remote.fail_nth(CallKind::Write, 2, RemoteError::transient("503 Service Unavailable"));
    let target = widgets();
    let templates = TemplateSet::builder()
        .always("a.md", "a")
        .always("b.md", "b")
        .always("c.md", "c")
        .build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    assert_eq!(report.outcome(Pass::Always, "a.md"), Some(&Action::Created));
    assert!(matches!(
        report.outcome(Pass::Always, "b.md"),
        Some(Action::Failed { .. })
    ));
    assert_eq!(report.outcome(Pass::Always, "c.md"), Some(&Action::Created));
    assert_eq!(remote.calls_of(CallKind::Write).len(), 3, "all three attempted");
    assert_eq!(report.failures().count(), 1);
}

#[test]
fn one_failed_delete_does_not_stop_the_others() {
    init_logging();
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.insert(&slug(&target), ".github/workflows/a-retired.yml", "a\n");
    remote.insert(&slug(&target), ".github/workflows/b-retired.yml", "b\n");
    remote.fail_nth(CallKind::Delete, 1, RemoteError::transient("500 Internal Server Error"));
    let templates = TemplateSet::builder()
        .managed(ManagedPathSet::new([".github/workflows/"]).unwrap())
        .build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    assert!(matches!(
        report.outcome(Pass::Deletion, ".github/workflows/a-retired.yml"),
        Some(Action::Failed { .. })
    ));
    assert_eq!(
        report.outcome(Pass::Deletion, ".github/workflows/b-retired.yml"),
        Some(&Action::Deleted)
    );
    assert_eq!(remote.calls_of(CallKind::Delete).len(), 2, "both attempted");
    assert!(remote.content(&slug(&target), ".github/workflows/a-retired.yml").is_some());
    assert!(remote.content(&slug(&target), ".github/workflows/b-retired.yml").is_none());
}

#[test]
fn delete_of_vanished_file_is_skipped_not_failed() {
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.insert(&slug(&target), ".cursor/rules/gone.mdc", "x\n");
    remote.fail_path(CallKind::Delete, ".cursor/rules/gone.mdc", RemoteError::NotFound);
    let templates = TemplateSet::builder()
        .managed(ManagedPathSet::new([".cursor/rules/"]).unwrap())
        .build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    assert_eq!(
        report.outcome(Pass::Deletion, ".cursor/rules/gone.mdc"),
        Some(&Action::Skipped {
            reason: SkipReason::AlreadyAbsent
        })
    );
    assert_eq!(report.counts().failed, 0);
}

#[test]
fn unreadable_initial_file_fails_without_writing() {
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.fail_path(CallKind::Read, "README.md", RemoteError::transient("502 Bad Gateway"));
    let templates = TemplateSet::builder()
        .initial_only("README.md", "# {{ REPO_NAME }}\n")
        .initial_only("CONTRIBUTING.md", "be kind\n")
        .build();

    let report = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());

    assert!(matches!(
        report.outcome(Pass::Initial, "README.md"),
        Some(Action::Failed { .. })
    ));
    assert_eq!(report.outcome(Pass::Initial, "CONTRIBUTING.md"), Some(&Action::Created));
    let writes = remote.calls_of(CallKind::Write);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "CONTRIBUTING.md");
    assert!(remote.content(&slug(&target), "README.md").is_none());
}

#[test]
fn docs_collection_is_ignored_for_plain_repositories() {
    let remote = MemoryRemote::new();
    let templates = fleet_templates();

    let plain = reconcile(&remote, &org(), &widgets(), &templates, &RunOptions::default());
    assert!(plain.outcomes.iter().all(|o| o.pass != Pass::Docs));
    assert!(remote.content(&slug(&widgets()), "mkdocs.yml").is_none());

    let docs_target = RepositoryTarget::new("handbook", RepoKind::Docs);
    let docs = reconcile(&remote, &org(), &docs_target, &templates, &RunOptions::default());
    assert_eq!(docs.outcome(Pass::Docs, "mkdocs.yml"), Some(&Action::Created));
    let writes = remote.calls_of(CallKind::Write);
    assert!(writes
        .iter()
        .any(|c| c.message.as_deref() == Some("chore: sync specialized docs file mkdocs.yml")));
}

#[test]
fn conflict_is_reported_and_rerun_converges() {
    let remote = MemoryRemote::new();
    let target = widgets();
    remote.fail_nth(
        CallKind::Write,
        1,
        RemoteError::conflict("sha does not match"),
    );
    let templates = TemplateSet::builder().always("AGENTS.md", "# Agents\n").build();

    let first = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(first.counts().failed, 1);

    let second = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(second.outcome(Pass::Always, "AGENTS.md"), Some(&Action::Created));
}

#[test]
fn local_directory_remote_converges_end_to_end() {
    init_logging();
    let root = TempDir::new().expect("root");
    let remote = LocalDirRemote::new(root.path());
    let target = widgets();
    let repo_dir = remote.repo_dir(&slug(&target));
    std::fs::create_dir_all(repo_dir.join(".cursor/rules")).unwrap();
    std::fs::write(repo_dir.join(".cursor/rules/retired.mdc"), "old\n").unwrap();
    std::fs::write(repo_dir.join("notes.txt"), "mine\n").unwrap();
    let templates = fleet_templates();

    let first = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(first.counts().failed, 0, "{first:#?}");
    assert_eq!(
        std::fs::read_to_string(repo_dir.join("README.md")).unwrap(),
        "# widgets\n"
    );
    assert!(!repo_dir.join(".cursor/rules/retired.mdc").exists());
    assert!(repo_dir.join("notes.txt").exists());

    let second = reconcile(&remote, &org(), &target, &templates, &RunOptions::default());
    assert_eq!(second.counts().changes(), 0, "{second:#?}");
    assert!(remote.exists(&slug(&target), "AGENTS.md").unwrap());
}
