//! Dependency bookkeeping shared by the installer.
//!
//! [`DependencyChain`] mirrors the depth-first install stack and turns a
//! repeated entry into [`Error::Cycle`]. [`RuntimeDeps`] is the side channel
//! through which actions request further installs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use addon_fs::ConfigPath;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Link {
    key: String,
    name: Option<String>,
}

impl Link {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// The add-ons currently being planned or installed, outermost first.
///
/// Entries are identified by their source reference key until the
/// descriptor has been read, and by add-on name from then on.
#[derive(Debug, Clone, Default)]
pub struct DependencyChain {
    links: Vec<Link>,
}

impl DependencyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.links.len()
    }

    /// Push a not-yet-fetched reference, failing if it is already on the chain.
    pub fn enter(&mut self, key: &str) -> Result<()> {
        if let Some(pos) = self
            .links
            .iter()
            .position(|l| l.key == key || l.name.as_deref() == Some(key))
        {
            return Err(self.cycle_from(pos, key));
        }
        self.links.push(Link {
            key: key.to_string(),
            name: None,
        });
        Ok(())
    }

    /// Attach the parsed add-on name to the innermost entry, failing if an
    /// outer entry already carries it.
    pub fn name_current(&mut self, name: &str) -> Result<()> {
        let Some(current) = self.links.len().checked_sub(1) else {
            return Ok(());
        };
        if let Some(pos) = self.links[..current]
            .iter()
            .position(|l| l.name.as_deref() == Some(name) || l.key == name)
        {
            return Err(self.cycle_from(pos, name));
        }
        self.links[current].name = Some(name.to_string());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.links.pop();
    }

    /// Whether `name_or_key` is anywhere on the chain.
    pub fn contains(&self, name_or_key: &str) -> bool {
        self.links
            .iter()
            .any(|l| l.key == name_or_key || l.name.as_deref() == Some(name_or_key))
    }

    /// Labels of the chain, outermost first.
    pub fn labels(&self) -> Vec<String> {
        self.links.iter().map(|l| l.label().to_string()).collect()
    }

    fn cycle_from(&self, pos: usize, repeated: &str) -> Error {
        let mut path: Vec<String> = self.links[pos..].iter().map(|l| l.label().to_string()).collect();
        path.push(self.links[pos].label().to_string());
        tracing::debug!(repeated, path = ?path, "Dependency cycle");
        Error::Cycle { path }
    }
}

/// The runtime dependency side channel of one add-on.
///
/// Actions append source references, one per line, to the file named by
/// `DDEV_RUNTIME_DEPS_FILE` (relative to the project configuration
/// directory, which is also the working directory of every action).
#[derive(Debug, Clone)]
pub struct RuntimeDeps {
    path: PathBuf,
    file_name: String,
}

impl RuntimeDeps {
    pub fn for_addon(config_dir: &Path, addon: &str) -> Self {
        let file_name = ConfigPath::runtime_deps_file(addon);
        Self {
            path: config_dir.join(&file_name),
            file_name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value exported to actions as `DDEV_RUNTIME_DEPS_FILE`.
    pub fn env_value(&self) -> &str {
        &self.file_name
    }

    /// Request `reference` as a runtime dependency.
    pub fn add(&self, reference: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| addon_fs::Error::io(&self.path, e))?;
        writeln!(file, "{}", reference.trim()).map_err(|e| addon_fs::Error::io(&self.path, e))?;
        Ok(())
    }

    /// Remove the side channel file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        let removed = addon_fs::io::remove_file_if_exists(&self.path)?;
        if removed {
            tracing::debug!(path = %self.path.display(), "Removed runtime dependency file");
        }
        Ok(removed)
    }

    /// Read every requested reference and delete the file.
    pub fn take(&self) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(addon_fs::Error::io(&self.path, e).into()),
        };
        self.clear()?;
        let refs = parse_refs(&content);
        if !refs.is_empty() {
            tracing::debug!(refs = ?refs, "Collected runtime dependencies");
        }
        Ok(refs)
    }
}

/// One reference per line; blank lines and `#` comments are ignored.
pub fn parse_refs(content: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !refs.iter().any(|r| r == line) {
            refs.push(line.to_string());
        }
    }
    refs
}
