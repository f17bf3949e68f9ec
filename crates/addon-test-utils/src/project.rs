//! [`TestProject`]: a throwaway project for installer and remover tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use addon_core::project::{ExecOutput, ExecTarget, Project, capture};
use tempfile::TempDir;

/// One recorded exec call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRecord {
    pub target: ExecTarget,
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// A project in a temp directory with its own temp global config dir.
///
/// Service and host execution both run the command locally with the
/// project configuration directory as working directory, so actions are
/// plain `sh` scripts touching the temp tree.
pub struct TestProject {
    approot: TempDir,
    global: TempDir,
    name: String,
    project_type: String,
    execs: Mutex<Vec<ExecRecord>>,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self::named("testproj", "php")
    }

    pub fn named(name: &str, project_type: &str) -> Self {
        let approot = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let config_dir = approot.path().join(".ddev");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.yaml"),
            format!("name: {name}\ntype: {project_type}\n"),
        )
        .unwrap();
        Self {
            approot,
            global,
            name: name.to_string(),
            project_type: project_type.to_string(),
            execs: Mutex::new(Vec::new()),
        }
    }

    /// Path inside the project configuration directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.config_dir().join(rel)
    }

    /// Path inside the global configuration directory.
    pub fn global_path(&self, rel: &str) -> PathBuf {
        self.global.path().join(rel)
    }

    /// Write a file inside the project configuration directory.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Lines of a log file that actions append to, empty if absent.
    pub fn log_lines(&self, rel: &str) -> Vec<String> {
        fs::read_to_string(self.path(rel))
            .map(|c| c.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn executions(&self) -> Vec<ExecRecord> {
        self.execs.lock().unwrap().clone()
    }

    /// Assert that `rel` (inside the configuration directory) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that `rel` (inside the configuration directory) does **not** exist.
    pub fn assert_file_not_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    fn run_local(
        &self,
        target: ExecTarget,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput> {
        self.execs.lock().unwrap().push(ExecRecord {
            target,
            command: command.to_vec(),
            env: env.clone(),
        });
        let (program, args) = command
            .split_first()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"))?;
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(self.config_dir()).envs(env);
        capture(cmd)
    }
}

impl Project for TestProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn project_type(&self) -> &str {
        &self.project_type
    }

    fn approot(&self) -> &Path {
        self.approot.path()
    }

    fn global_config_path(&self) -> PathBuf {
        self.global.path().to_path_buf()
    }

    fn exec_in_service(
        &self,
        service: &str,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput> {
        self.run_local(ExecTarget::Service(service.to_string()), command, env)
    }

    fn exec_on_host(
        &self,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput> {
        self.run_local(ExecTarget::Host, command, env)
    }
}
