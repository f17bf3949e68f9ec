//! Project context detection
//!
//! Finds the project a command operates on, either by walking up from the
//! working directory to a `.ddev/config.yaml` or by name through the global
//! project list, and wires it to the container runtime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use addon_core::project::{ExecOutput, Project, capture};
use addon_core::github::DEFAULT_API_BASE_URL;
use addon_fs::ConfigPath;
use serde::Deserialize;

use crate::error::{CliError, Result};

/// Overrides the version add-on constraints are checked against.
pub const HOST_VERSION_ENV: &str = "DDEV_ADDON_HOST_VERSION";

/// Overrides the provider API base URL.
pub const API_URL_ENV: &str = "DDEV_GITHUB_API_URL";

/// Where the approot is mounted inside the project's containers.
const CONTAINER_APPROOT: &str = "/var/www/html";

const DEFAULT_PROJECT_TYPE: &str = "php";

#[derive(Debug, Default, Deserialize)]
struct ProjectConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    project_type: Option<String>,
    #[serde(default)]
    additional_hostnames: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectListEntry {
    approot: PathBuf,
}

/// A project backed by the container runtime.
#[derive(Debug, Clone)]
pub struct DdevProject {
    name: String,
    project_type: String,
    approot: PathBuf,
    global_dir: PathBuf,
    hostnames: Vec<String>,
}

impl DdevProject {
    /// Load the project rooted at `approot`.
    pub fn load(approot: &Path, global_dir: PathBuf) -> Result<Self> {
        let config_path = approot
            .join(ConfigPath::ProjectConfigDir)
            .join(ConfigPath::ProjectConfigFile);
        let content = std::fs::read_to_string(&config_path)?;
        let config: ProjectConfig = if content.trim().is_empty() {
            ProjectConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| CliError::Config {
                path: config_path.clone(),
                reason: e.to_string(),
            })?
        };

        let name = config.name.filter(|n| !n.is_empty()).unwrap_or_else(|| {
            approot
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let mut hostnames = vec![format!("{name}.ddev.site")];
        hostnames.extend(
            config
                .additional_hostnames
                .iter()
                .map(|h| format!("{h}.ddev.site")),
        );

        tracing::debug!(project = %name, approot = %approot.display(), "Loaded project");
        Ok(Self {
            name,
            project_type: config
                .project_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_TYPE.to_string()),
            approot: approot.to_path_buf(),
            global_dir,
            hostnames,
        })
    }

    fn container(&self, service: &str) -> String {
        format!("ddev-{}-{service}", self.name)
    }
}

impl Project for DdevProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn project_type(&self) -> &str {
        &self.project_type
    }

    fn approot(&self) -> &Path {
        &self.approot
    }

    fn global_config_path(&self) -> PathBuf {
        self.global_dir.clone()
    }

    fn hostnames(&self) -> Vec<String> {
        self.hostnames.clone()
    }

    fn exec_in_service(
        &self,
        service: &str,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput> {
        let workdir = format!("{CONTAINER_APPROOT}/{}", ConfigPath::ProjectConfigDir.as_str());
        let mut cmd = Command::new("docker");
        cmd.args(["exec", "-i", "-w", &workdir]);
        for (key, value) in env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        cmd.arg(self.container(service)).args(command);
        tracing::debug!(service, container = %self.container(service), "Executing in service");
        capture(cmd)
    }

    fn exec_on_host(
        &self,
        command: &[String],
        env: &BTreeMap<String, String>,
    ) -> std::io::Result<ExecOutput> {
        let (program, args) = command.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
        })?;
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(self.config_dir()).envs(env);
        capture(cmd)
    }
}

/// Walk up from `cwd` to the first directory holding `.ddev/config.yaml`.
pub fn find_approot(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| {
            dir.join(ConfigPath::ProjectConfigDir)
                .join(ConfigPath::ProjectConfigFile)
                .is_file()
        })
        .map(Path::to_path_buf)
}

/// Resolve the project a command targets.
pub fn resolve_project(cwd: &Path, name: Option<&str>, global_dir: &Path) -> Result<DdevProject> {
    let approot = match name {
        Some(name) => lookup_project(global_dir, name)?,
        None => find_approot(cwd).ok_or_else(|| {
            CliError::user(format!(
                "no project found in {} or its parents; run inside a project or pass --project",
                cwd.display()
            ))
        })?,
    };
    DdevProject::load(&approot, global_dir.to_path_buf())
}

fn lookup_project(global_dir: &Path, name: &str) -> Result<PathBuf> {
    let list_path = global_dir.join(ConfigPath::ProjectList);
    let content = match std::fs::read_to_string(&list_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let projects: BTreeMap<String, ProjectListEntry> = if content.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_yaml::from_str(&content).map_err(|e| CliError::Config {
            path: list_path.clone(),
            reason: e.to_string(),
        })?
    };

    projects
        .get(name)
        .map(|entry| entry.approot.clone())
        .ok_or_else(|| {
            let known: Vec<&str> = projects.keys().map(String::as_str).collect();
            CliError::user(if known.is_empty() {
                format!("unknown project '{name}'")
            } else {
                format!("unknown project '{name}'; known projects: {}", known.join(", "))
            })
        })
}

/// The user-global configuration directory: `$XDG_CONFIG_HOME/ddev` when
/// it exists, otherwise `~/.ddev`.
pub fn global_config_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let dir = PathBuf::from(xdg).join("ddev");
        if dir.is_dir() {
            return Ok(dir);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(ConfigPath::ProjectConfigDir))
        .ok_or_else(|| CliError::user("cannot determine the home directory"))
}

/// Version add-on constraints are checked against.
pub fn host_version() -> String {
    std::env::var(HOST_VERSION_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

pub fn api_base_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}
