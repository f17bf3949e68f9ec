//! Installer tests against a temp project whose actions run locally.
#![cfg(unix)]

use std::fs;
use std::path::Path;

use addon_core::{
    Error, ErrorKind, InstallReport, InstallRequest, Installer, Level, ManifestStore, Project,
    RecordingOutput, ReleaseSelector, Result,
};
use addon_test_utils::{AddonFixture, StaticReleaseSource, TestProject};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const HOST_VERSION: &str = "1.24.3";

const SAMPLE: &str = r#"name: sample
project_files:
  - extra/*.txt
post_install_actions:
  - |
    ## description: Sample is ready
    echo post >> install.log
removal_actions:
  - rm -f install.log
"#;

fn sample() -> AddonFixture {
    AddonFixture::new(SAMPLE)
        .with_file("extra/a.txt", "#ddev-generated\na\n")
        .with_file("extra/b.txt", "#ddev-generated\nb\n")
}

fn install_with(
    project: &TestProject,
    output: &RecordingOutput,
    releases: &StaticReleaseSource,
    base: &Path,
    request: InstallRequest,
) -> Result<InstallReport> {
    Installer::new(project, output, releases, releases, HOST_VERSION, base).install(&request)
}

fn install(project: &TestProject, output: &RecordingOutput, base: &Path, reference: &str) -> Result<InstallReport> {
    install_with(
        project,
        output,
        &StaticReleaseSource::new(),
        base,
        InstallRequest::new(reference),
    )
}

fn store(project: &TestProject) -> ManifestStore {
    ManifestStore::new(&project.config_dir())
}

#[test]
fn test_local_directory_install() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = sample();

    let report = install(&project, &output, addon.path(), &addon.reference()).unwrap();

    project.assert_file_exists("extra/a.txt");
    project.assert_file_exists("extra/b.txt");
    assert_eq!(project.log_lines("install.log"), vec!["post"]);
    assert!(
        output
            .messages(Level::Success)
            .contains(&"✓ Sample is ready".to_string())
    );

    project.assert_file_exists("addon-metadata/sample/manifest.yaml");
    let manifest = store(&project).find("sample").unwrap().unwrap();
    assert_eq!(manifest.project_files, vec!["extra/a.txt", "extra/b.txt"]);
    let canonical = fs::canonicalize(addon.path()).unwrap();
    assert_eq!(manifest.repository, canonical.display().to_string());
    assert_eq!(manifest.version, "");
    assert_eq!(report.root().map(|m| m.name.as_str()), Some("sample"));
}

#[test]
fn test_user_file_is_not_overwritten() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = sample().with_file("extra/user.txt", "#ddev-generated\nfrom add-on\n");
    project.write("extra/user.txt", "my own settings\n");

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert_eq!(project.read("extra/user.txt"), "my own settings\n");
    let warnings = output.messages(Level::Warning);
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("Not overwriting") && w.contains("user.txt")),
        "warnings: {warnings:?}"
    );

    let manifest = store(&project).find("sample").unwrap().unwrap();
    assert_eq!(manifest.project_files, vec!["extra/a.txt", "extra/b.txt"]);

    // A second run leaves the file alone as well.
    install(&project, &output, addon.path(), &addon.reference()).unwrap();
    assert_eq!(project.read("extra/user.txt"), "my own settings\n");
}

#[test]
fn test_generated_and_empty_files_are_replaced() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = sample();
    project.write("extra/a.txt", "#ddev-generated\nstale\n");
    project.write("extra/b.txt", "");

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert_eq!(project.read("extra/a.txt"), "#ddev-generated\na\n");
    assert_eq!(project.read("extra/b.txt"), "#ddev-generated\nb\n");
}

#[test]
fn test_manifest_files_stay_owned() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = sample().with_file("extra/user.txt", "#ddev-generated\n");
    project.write("extra/user.txt", "mine\n");

    let report = install(&project, &output, addon.path(), &addon.reference()).unwrap();

    for rel in &report.root().unwrap().project_files {
        let path = project.path(rel);
        if path.exists() {
            let content = fs::read_to_string(&path).unwrap();
            assert!(
                content.is_empty() || content.contains("#ddev-generated"),
                "{rel} is not owned by the add-on"
            );
        }
    }
}

#[test]
fn test_unmarked_file_is_not_tracked() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = AddonFixture::new("name: plain\nproject_files: [plain.conf]\n")
        .with_file("plain.conf", "key=value\n");

    let first = install(&project, &output, addon.path(), &addon.reference()).unwrap();
    assert_eq!(project.read("plain.conf"), "key=value\n");
    assert!(first.root().unwrap().project_files.is_empty());
    assert!(
        output
            .messages(Level::Warning)
            .iter()
            .any(|w| w.contains("plain.conf") && w.contains("#ddev-generated"))
    );

    let second = install(&project, &output, addon.path(), &addon.reference()).unwrap();
    let mut a = first.root().unwrap().clone();
    let b = second.root().unwrap().clone();
    a.install_date = b.install_date;
    assert_eq!(a, b);
}

#[test]
fn test_static_dependency_installed_first() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "test/dependencyB",
        "name: dependencyB\npost_install_actions:\n  - echo dependencyB >> order.log\n",
    );
    AddonFixture::at(
        root.path(),
        "dependerA",
        r#"name: dependerA
dependencies:
  - test/dependencyB
pre_install_actions:
  - |
    test -f addon-metadata/dependencyB/manifest.yaml
    echo dependerA >> order.log
"#,
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, root.path(), "dependerA").unwrap();

    let order: Vec<&str> = report.installed.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["dependencyB", "dependerA"]);
    assert_eq!(project.log_lines("order.log"), vec!["dependencyB", "dependerA"]);

    let store = store(&project);
    let b = store.find("dependencyB").unwrap().unwrap();
    let a = store.find("dependerA").unwrap().unwrap();
    assert!(b.install_date <= a.install_date);
    assert_eq!(a.dependencies, vec!["test/dependencyB"]);
}

#[test]
fn test_shared_dependency_installed_once() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "shared",
        "name: shared\npost_install_actions:\n  - echo shared >> order.log\n",
    );
    AddonFixture::at(root.path(), "left", "name: left\ndependencies: [shared]\n");
    AddonFixture::at(root.path(), "right", "name: right\ndependencies: [shared]\n");
    AddonFixture::at(root.path(), "top", "name: top\ndependencies: [left, right]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, root.path(), "top").unwrap();

    let order: Vec<&str> = report.installed.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["shared", "left", "right", "top"]);
    assert_eq!(project.log_lines("order.log"), vec!["shared"]);
}

#[test]
fn test_installed_dependency_is_skipped() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "base",
        "name: base\npost_install_actions:\n  - echo base >> order.log\n",
    );
    AddonFixture::at(root.path(), "app", "name: app\ndependencies: [base]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    install(&project, &output, root.path(), "base").unwrap();
    let report = install(&project, &output, root.path(), "app").unwrap();

    assert_eq!(report.installed.len(), 1);
    assert_eq!(project.log_lines("order.log"), vec!["base"]);
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let holder = AddonFixture::new("name: self\n");
    let reference = holder.reference();
    let addon = holder.with_file(
        "install.yaml",
        &format!("name: self\ndependencies:\n  - {reference}\n"),
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &reference).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cycle);
    assert!(err.to_string().contains("circular dependency"));
    project.assert_file_not_exists("addon-metadata/self/manifest.yaml");
    assert!(project.executions().is_empty());
}

#[test]
fn test_transitive_cycle_writes_nothing() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "a",
        "name: a\ndependencies: [b]\npost_install_actions:\n  - touch a.ran\n",
    );
    AddonFixture::at(root.path(), "b", "name: b\ndependencies: [c]\n");
    AddonFixture::at(root.path(), "c", "name: c\ndependencies: [a]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, root.path(), "a").unwrap_err();

    match err {
        Error::Cycle { path } => assert_eq!(path, vec!["a", "b", "c", "a"]),
        other => panic!("expected a cycle, got {other}"),
    }
    assert!(store(&project).list().unwrap().is_empty());
    project.assert_file_not_exists("a.ran");
}

#[test]
fn test_constraint_failure_changes_nothing() {
    let addon = AddonFixture::new(
        r#"name: future
ddev_version_constraint: ">= 999.0.0"
project_files:
  - extra/*.txt
pre_install_actions:
  - touch pre.ran
"#,
    )
    .with_file("extra/a.txt", "#ddev-generated\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &addon.reference()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Constraint);
    assert!(err.to_string().contains(">= 999.0.0"));
    project.assert_file_not_exists("extra/a.txt");
    project.assert_file_not_exists("pre.ran");
    project.assert_file_not_exists("addon-metadata/future/manifest.yaml");
    assert!(project.executions().is_empty());
}

#[test]
fn test_satisfied_constraint_installs() {
    let addon = AddonFixture::new("name: current\nddev_version_constraint: '>= v1.23.0'\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    project.assert_file_exists("addon-metadata/current/manifest.yaml");
}

#[test]
fn test_warning_flag_continues_install() {
    let addon = AddonFixture::new(
        r#"name: flaky
post_install_actions:
  - |
    #ddev-warning-exit-code
    ## description: Optional tuning
    exit 3
  - echo second >> order.log
"#,
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert_eq!(project.log_lines("order.log"), vec!["second"]);
    assert!(
        output
            .messages(Level::Warning)
            .contains(&"⚠ Optional tuning".to_string())
    );
    project.assert_file_exists("addon-metadata/flaky/manifest.yaml");
}

#[test]
fn test_failing_action_aborts_with_partial_hint() {
    let addon = AddonFixture::new(
        r#"name: broken
pre_install_actions:
  - |
    ## description: Check prerequisites
    exit 4
  - touch never.ran
"#,
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &addon.reference()).unwrap_err();

    match &err {
        Error::ActionFailed {
            addon,
            description,
            exit_code,
        } => {
            assert_eq!(addon, "broken");
            assert_eq!(description.as_deref(), Some("Check prerequisites"));
            assert_eq!(*exit_code, Some(4));
        }
        other => panic!("expected an action failure, got {other}"),
    }
    project.assert_file_not_exists("never.ran");
    project.assert_file_not_exists("addon-metadata/broken/manifest.yaml");
    assert!(
        output
            .messages(Level::Failure)
            .contains(&"✗ Check prerequisites".to_string())
    );
    assert!(
        output
            .messages(Level::Warning)
            .iter()
            .any(|w| w.contains("add-on remove broken"))
    );
}

#[test]
fn test_dependency_failure_is_wrapped() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(root.path(), "dep", "name: dep\npre_install_actions:\n  - exit 2\n");
    AddonFixture::at(root.path(), "app", "name: app\ndependencies: [dep]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, root.path(), "app").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyInstall);
    assert_eq!(err.root_cause().kind(), ErrorKind::ActionFailed);
    assert!(store(&project).list().unwrap().is_empty());
}

#[test]
fn test_reinstall_yields_same_manifest() {
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let addon = sample();

    let first = install(&project, &output, addon.path(), &addon.reference()).unwrap();
    let second = install(&project, &output, addon.path(), &addon.reference()).unwrap();

    let mut a = first.root().unwrap().clone();
    let b = second.root().unwrap().clone();
    a.install_date = b.install_date;
    assert_eq!(a, b);
    assert_eq!(store(&project).list().unwrap().len(), 1);
}

#[test]
fn test_skip_deps_installs_only_root() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(root.path(), "dep", "name: dep\n");
    AddonFixture::at(root.path(), "app", "name: app\ndependencies: [dep]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let mut request = InstallRequest::new("app");
    request.skip_deps = true;
    let report = install_with(
        &project,
        &output,
        &StaticReleaseSource::new(),
        root.path(),
        request,
    )
    .unwrap();

    assert_eq!(report.installed.len(), 1);
    assert!(!store(&project).contains("dep"));
    assert!(store(&project).contains("app"));
}

#[test]
fn test_runtime_dependency_installed_before_manifest() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(root.path(), "late", "name: late\n");
    let late = root.path().join("late");
    AddonFixture::at(
        root.path(),
        "asker",
        &format!(
            "name: asker\npost_install_actions:\n  - echo {} >> \"$DDEV_RUNTIME_DEPS_FILE\"\n",
            late.display()
        ),
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, root.path(), "asker").unwrap();

    let order: Vec<&str> = report.installed.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["late", "asker"]);
    let asker = store(&project).find("asker").unwrap().unwrap();
    assert_eq!(asker.dependencies, vec![late.display().to_string()]);
    project.assert_file_not_exists(".runtime-deps-asker");
}

#[test]
fn test_runtime_request_for_planned_sibling_installs_it_first() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "b",
        "name: b\npost_install_actions:\n  - |\n    echo c >> \"$DDEV_RUNTIME_DEPS_FILE\"\n    echo b >> order.log\n",
    );
    AddonFixture::at(
        root.path(),
        "c",
        "name: c\npost_install_actions:\n  - echo c >> order.log\n",
    );
    AddonFixture::at(
        root.path(),
        "a",
        "name: a\ndependencies: [b, c]\npost_install_actions:\n  - echo a >> order.log\n",
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, root.path(), "a").unwrap();

    let order: Vec<&str> = report.installed.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["c", "b", "a"]);
    assert_eq!(project.log_lines("order.log"), vec!["b", "c", "a"]);
    let store = store(&project);
    let b = store.find("b").unwrap().unwrap();
    let c = store.find("c").unwrap().unwrap();
    assert!(c.install_date <= b.install_date);
    assert_eq!(b.dependencies, vec!["c"]);
}

#[test]
fn test_runtime_request_for_ancestor_is_a_cycle() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(
        root.path(),
        "b",
        "name: b\npost_install_actions:\n  - echo a >> \"$DDEV_RUNTIME_DEPS_FILE\"\n",
    );
    AddonFixture::at(root.path(), "a", "name: a\ndependencies: [b]\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, root.path(), "a").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyInstall);
    match err.root_cause() {
        Error::Cycle { path } => assert_eq!(path, &vec!["a", "b", "a"]),
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert!(store(&project).list().unwrap().is_empty());
    project.assert_file_not_exists(".runtime-deps-b");
}

#[test]
fn test_failed_action_removes_runtime_request_file() {
    let addon = AddonFixture::new(
        "name: halfway\npost_install_actions:\n  - |\n    echo other >> \"$DDEV_RUNTIME_DEPS_FILE\"\n    exit 3\n",
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &addon.reference()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ActionFailed);
    project.assert_file_not_exists(".runtime-deps-halfway");
}

#[test]
fn test_dependency_manifest_failure_is_wrapped() {
    let root = TempDir::new().unwrap();
    AddonFixture::at(root.path(), "dep", "name: dep\n");
    AddonFixture::at(root.path(), "app", "name: app\ndependencies: [dep]\n");
    let project = TestProject::new();
    project.write("addon-metadata/dep", "not a directory\n");
    let output = RecordingOutput::new();

    let err = install(&project, &output, root.path(), "app").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyInstall);
    assert_eq!(err.root_cause().kind(), ErrorKind::Persist);
    project.assert_file_not_exists("addon-metadata/app/manifest.yaml");
}

#[test]
fn test_runtime_self_reference_is_a_cycle() {
    let holder = AddonFixture::new("name: looper\n");
    let reference = holder.reference();
    let addon = holder.with_file(
        "install.yaml",
        &format!(
            "name: looper\npost_install_actions:\n  - echo {reference} >> \"$DDEV_RUNTIME_DEPS_FILE\"\n"
        ),
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &reference).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyInstall);
    assert_eq!(err.root_cause().kind(), ErrorKind::Cycle);
    project.assert_file_not_exists("addon-metadata/looper/manifest.yaml");
}

#[test]
fn test_action_environment() {
    let addon = AddonFixture::new(
        "name: envcheck\npost_install_actions:\n  - echo \"$DDEV_PROJECT:$DDEV_PROJECT_TYPE:$DDEV_ADDON_NAME\" > env.out\n",
    );
    let project = TestProject::new();
    let output = RecordingOutput::new();

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert_eq!(project.read("env.out"), "testproj:php:envcheck\n");
    let record = &project.executions()[0];
    assert_eq!(record.command[0], "sh");
    assert!(record.command[1].starts_with(".addon-action-"));
    assert_eq!(
        record.env.get("DDEV_RUNTIME_DEPS_FILE").map(String::as_str),
        Some(".runtime-deps-envcheck")
    );
}

#[test]
fn test_templates_see_project_and_yaml_files() {
    let project = TestProject::new();
    project.write("settings.yaml", "cache:\n  size: 64\n");
    let addon = AddonFixture::new(
        r#"name: templated
yaml_read_files:
  settings: settings.yaml
post_install_actions:
  - echo "{{ project.name }} {{ settings.cache.size }}" > rendered.out
"#,
    );
    let output = RecordingOutput::new();

    install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert_eq!(project.read("rendered.out"), "testproj 64\n");
}

#[test]
fn test_global_files_deployed() {
    let addon = AddonFixture::new("name: globals\nglobal_files:\n  - commands/host/hello\n")
        .with_file("commands/host/hello", "#!/bin/sh\n#ddev-generated\necho hello\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, addon.path(), &addon.reference()).unwrap();

    assert!(project.global_path("commands/host/hello").is_file());
    assert_eq!(report.root().unwrap().global_files, vec!["commands/host/hello"]);
}

#[test]
fn test_missing_project_file_fails_copy() {
    let addon = AddonFixture::new("name: gaps\nproject_files:\n  - missing.conf\n");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, addon.path(), &addon.reference()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Copy);
    assert!(!store(&project).contains("gaps"));
}

#[test]
fn test_slug_installs_latest_stable_release() {
    let addon = sample();
    let releases = StaticReleaseSource::new()
        .with_release("acme", "ddev-sample", "v1.0.0", false, addon.tarball("acme-ddev-sample-111"))
        .with_release("acme", "ddev-sample", "v2.0.0-rc1", true, addon.tarball("acme-ddev-sample-222"));
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let base = TempDir::new().unwrap();

    let report = install_with(
        &project,
        &output,
        &releases,
        base.path(),
        InstallRequest::new("acme/ddev-sample"),
    )
    .unwrap();

    let manifest = report.root().unwrap();
    assert_eq!(manifest.repository, "acme/ddev-sample");
    assert_eq!(manifest.version, "v1.0.0");
    project.assert_file_exists("extra/a.txt");
    assert_eq!(
        releases.downloads(),
        vec!["https://archive.test/acme/ddev-sample/tarball/v1.0.0"]
    );
    assert!(
        output
            .messages(Level::Success)
            .contains(&"✓ Installed sample v1.0.0".to_string())
    );
}

#[test]
fn test_slug_with_explicit_version_and_pr() {
    let addon = sample();
    let releases = StaticReleaseSource::new()
        .with_ref("acme", "ddev-sample", "main", addon.tarball("acme-ddev-sample-333"))
        .with_ref("acme", "ddev-sample", "refs/pull/7/head", addon.tarball("acme-ddev-sample-444"))
        .with_default_branch("acme", "ddev-sample", "main");
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let base = TempDir::new().unwrap();

    let mut request = InstallRequest::new("acme/ddev-sample");
    request.selector = ReleaseSelector::PullRequest(7);
    let report = install_with(&project, &output, &releases, base.path(), request).unwrap();
    assert_eq!(report.root().unwrap().version, "pr-7");

    let mut request = InstallRequest::new("acme/ddev-sample");
    request.selector = ReleaseSelector::DefaultBranch;
    let report = install_with(&project, &output, &releases, base.path(), request).unwrap();
    assert_eq!(report.root().unwrap().version, "main");
}

#[test]
fn test_slug_without_releases_fails() {
    let releases = StaticReleaseSource::new();
    let project = TestProject::new();
    let output = RecordingOutput::new();
    let base = TempDir::new().unwrap();

    let err = install_with(
        &project,
        &output,
        &releases,
        base.path(),
        InstallRequest::new("acme/ddev-nothing"),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoRelease);
}

#[test]
fn test_local_archive_install() {
    let addon = sample();
    let dir = TempDir::new().unwrap();
    let archive = addon.write_tarball(&dir.path().join("sample.tar.gz"), "sample-main");
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let report = install(&project, &output, dir.path(), "sample.tar.gz").unwrap();

    let canonical = fs::canonicalize(&archive).unwrap();
    assert_eq!(report.root().unwrap().repository, canonical.display().to_string());
    project.assert_file_exists("extra/b.txt");
}

#[test]
fn test_missing_descriptor() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    let project = TestProject::new();
    let output = RecordingOutput::new();

    let err = install(&project, &output, dir.path(), "empty").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Descriptor);
}
