//! Add-on descriptor parsing for `install.yaml` files.
//!
//! # Example YAML
//!
//! ```yaml
//! name: redis
//! ddev_version_constraint: ">= v1.23.0"
//! dependencies:
//!   - ddev/ddev-redis-commander
//! project_files:
//!   - docker-compose.redis.yaml
//!   - redis/
//! global_files:
//!   - commands/host/redis-cli
//! pre_install_actions:
//!   - |
//!     ## description: Check docker-compose version
//!     docker-compose version
//! post_install_actions: []
//! removal_actions:
//!   - rm -f redis/extra.conf
//! yaml_read_files:
//!   config: config.yaml
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use addon_fs::ConfigPath;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{Error, Result};

/// Parsed `install.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Descriptor {
    /// Stable identifier used as the manifest directory name.
    pub name: String,
    /// Semver range the host tool's version must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddev_version_constraint: Option<String>,
    /// Source references installed before this add-on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Glob patterns deployed under the project configuration directory.
    #[serde(default)]
    pub project_files: Vec<String>,
    /// Glob patterns deployed under the global configuration directory.
    #[serde(default)]
    pub global_files: Vec<String>,
    #[serde(default)]
    pub pre_install_actions: Vec<String>,
    #[serde(default)]
    pub post_install_actions: Vec<String>,
    /// Run in reverse order when the add-on is removed.
    #[serde(default)]
    pub removal_actions: Vec<String>,
    /// Template variable name to YAML file path, relative to the project
    /// configuration directory.
    #[serde(default)]
    pub yaml_read_files: BTreeMap<String, String>,
    /// Fields this version does not understand; reported, then ignored.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl Descriptor {
    /// Parse a descriptor from raw `install.yaml` bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let descriptor: Self = serde_yaml::from_slice(bytes).map_err(|e| Error::Descriptor {
            reason: e.to_string(),
        })?;
        descriptor.validate()?;
        for field in descriptor.unknown.keys() {
            tracing::warn!(addon = %descriptor.name, field = %field, "Ignoring unknown install.yaml field");
        }
        Ok(descriptor)
    }

    /// Read the descriptor at the root of an add-on working directory.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(ConfigPath::DescriptorFile);
        if !path.is_file() {
            return Err(Error::DescriptorNotFound(dir.to_path_buf()));
        }
        let bytes = std::fs::read(&path)?;
        Self::parse(&bytes)
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        let constraint = self.version_constraint();
        if !constraint.trim().is_empty() {
            crate::version::VersionConstraint::parse(constraint)?;
        }
        for (key, path) in &self.yaml_read_files {
            if key.is_empty() || path.trim().is_empty() {
                return Err(Error::Descriptor {
                    reason: format!("yaml_read_files entry '{key}' needs a name and a path"),
                });
            }
        }
        Ok(())
    }

    /// The version constraint, empty when none is declared.
    pub fn version_constraint(&self) -> &str {
        self.ddev_version_constraint.as_deref().unwrap_or_default()
    }

    pub fn pre_install(&self) -> Vec<Action> {
        self.pre_install_actions.iter().map(|a| Action::parse(a)).collect()
    }

    pub fn post_install(&self) -> Vec<Action> {
        self.post_install_actions.iter().map(|a| Action::parse(a)).collect()
    }
}

/// Parse a descriptor from raw bytes.
pub fn parse_descriptor(bytes: &[u8]) -> Result<Descriptor> {
    Descriptor::parse(bytes)
}

/// Names become directory names under `addon-metadata/`, so they must be
/// a single safe path segment.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::Descriptor {
        reason: format!("invalid add-on name '{name}': {reason}"),
    };
    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(invalid("name must not start with '.'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid(
            "name must contain only alphanumeric characters, '-', '_' or '.'",
        ));
    }
    Ok(())
}
