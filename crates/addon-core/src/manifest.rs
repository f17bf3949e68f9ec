//! Installed add-on manifests.
//!
//! One YAML file per add-on at
//! `<project-config>/addon-metadata/<name>/manifest.yaml`. A manifest's
//! presence is what makes an add-on "installed".

use std::path::{Path, PathBuf};

use addon_fs::ConfigPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::descriptor::validate_name;
use crate::error::{Error, Result};

/// Record of one installed add-on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    pub name: String,
    /// Source reference the add-on was installed from.
    pub repository: String,
    /// Release label; empty for directory and archive installs.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub install_date: DateTime<Utc>,
    /// Deployed files, relative to the project configuration directory.
    #[serde(default)]
    pub project_files: Vec<String>,
    /// Deployed files, relative to the global configuration directory.
    #[serde(default)]
    pub global_files: Vec<String>,
    #[serde(default)]
    pub removal_actions: Vec<String>,
}

impl Manifest {
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Last path segment of `repository` (`owner/ddev-redis` -> `ddev-redis`).
    pub fn repository_segment(&self) -> &str {
        self.repository
            .trim_end_matches('/')
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.repository)
    }

    fn loosely_matches(&self, identifier: &str) -> bool {
        let segment = self.repository_segment();
        self.repository == identifier
            || segment == identifier
            || segment.strip_prefix("ddev-") == Some(identifier)
    }
}

/// The manifests of one project.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    /// Store rooted in `config_dir/addon-metadata`.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            root: config_dir.join(ConfigPath::AddonMetadataDir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(ConfigPath::ManifestFile)
    }

    /// Every installed add-on, sorted by name.
    ///
    /// Unreadable manifests are logged and left out.
    pub fn list(&self) -> Result<Vec<Manifest>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(addon_fs::Error::io(&self.root, e).into()),
        };

        let mut manifests = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| addon_fs::Error::io(&self.root, e))?;
            let path = entry.path().join(ConfigPath::ManifestFile);
            if !path.is_file() {
                continue;
            }
            match self.read(&path) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable manifest"),
            }
        }
        manifests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(manifests)
    }

    /// The manifest named exactly `name`, if installed.
    pub fn find(&self, name: &str) -> Result<Option<Manifest>> {
        if validate_name(name).is_err() {
            return Ok(None);
        }
        let path = self.manifest_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    /// Whether an add-on named `name` is installed.
    pub fn contains(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.manifest_path(name).is_file()
    }

    /// Resolve a user-supplied identifier: the add-on name, its repository,
    /// the repository's last segment, or that segment without `ddev-`.
    pub fn get(&self, identifier: &str) -> Result<Manifest> {
        let identifier = identifier.trim();
        let manifests = self.list()?;

        if let Some(exact) = manifests.iter().find(|m| m.name == identifier) {
            return Ok(exact.clone());
        }

        let mut candidates: Vec<&Manifest> = manifests
            .iter()
            .filter(|m| m.loosely_matches(identifier))
            .collect();
        match candidates.len() {
            1 => Ok(candidates.remove(0).clone()),
            0 => Err(Error::Unknown {
                identifier: identifier.to_string(),
                installed: manifests.iter().map(|m| m.name.clone()).collect(),
            }),
            _ => Err(Error::Ambiguous {
                identifier: identifier.to_string(),
                candidates: candidates.iter().map(|m| m.name.clone()).collect(),
            }),
        }
    }

    /// Write `manifest`, replacing any previous one of the same name.
    pub fn write(&self, manifest: &Manifest) -> Result<()> {
        validate_name(&manifest.name)?;
        let path = self.manifest_path(&manifest.name);
        let persist_err = |reason: String| Error::Persist {
            path: path.clone(),
            reason,
        };
        let yaml = manifest.to_yaml().map_err(|e| persist_err(e.to_string()))?;
        addon_fs::io::write_text(&path, &yaml).map_err(|e| persist_err(e.to_string()))?;
        tracing::info!(addon = %manifest.name, path = %path.display(), "Wrote manifest");
        Ok(())
    }

    /// Remove the metadata directory of `name`.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let dir = self.root.join(name);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!(addon = name, "Deleted manifest");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Persist {
                path: dir,
                reason: e.to_string(),
            }),
        }
    }

    fn read(&self, path: &Path) -> Result<Manifest> {
        let content = addon_fs::io::read_text(path)?;
        Manifest::from_yaml(&content).map_err(|e| Error::Persist {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
