//! Project handle.
//!
//! Every component receives the project explicitly; nothing discovers an
//! ambient "current project" on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use addon_fs::ConfigPath;
use serde::Serialize;

/// Captured result of running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, trimmed.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Run a prepared [`Command`] and capture its output.
pub fn capture(mut cmd: Command) -> std::io::Result<ExecOutput> {
    let output = cmd.output()?;
    Ok(ExecOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Where an action executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    Host,
    Service(String),
}

impl Default for ExecTarget {
    fn default() -> Self {
        Self::Service("web".to_string())
    }
}

/// The project an add-on is installed into.
///
/// Commands passed to the exec methods run with the project configuration
/// directory as working directory (on the host, or its mount inside the
/// container).
pub trait Project {
    fn name(&self) -> &str;

    /// Project type identifier (e.g. `php`, `drupal10`).
    fn project_type(&self) -> &str;

    fn approot(&self) -> &Path;

    /// The project configuration directory (`<approot>/.ddev`).
    fn config_dir(&self) -> PathBuf {
        self.approot().join(ConfigPath::ProjectConfigDir)
    }

    fn config_path(&self, rel: &str) -> PathBuf {
        self.config_dir().join(rel)
    }

    /// The user-global configuration directory.
    fn global_config_path(&self) -> PathBuf;

    /// Hostnames the project's web service answers on.
    fn hostnames(&self) -> Vec<String> {
        vec![format!("{}.ddev.site", self.name())]
    }

    fn exec_in_service(
        &self,
        service: &str,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput>;

    fn exec_on_host(
        &self,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput>;
}

/// Serializable snapshot of a project, exposed to templates as `project`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContext {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub approot: PathBuf,
    pub config_path: PathBuf,
    pub global_config_path: PathBuf,
    pub hostnames: Vec<String>,
    pub primary_url: String,
}

impl ProjectContext {
    pub fn from_project(project: &dyn Project) -> Self {
        let hostnames = project.hostnames();
        let primary_url = hostnames
            .first()
            .map(|h| format!("https://{h}"))
            .unwrap_or_default();
        Self {
            name: project.name().to_string(),
            project_type: project.project_type().to_string(),
            approot: project.approot().to_path_buf(),
            config_path: project.config_dir(),
            global_config_path: project.global_config_path(),
            hostnames,
            primary_url,
        }
    }
}
