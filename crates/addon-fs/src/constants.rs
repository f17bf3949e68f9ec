//! Constants and enums for project configuration paths.

use std::path::Path;

/// Marker line embedded in every file the add-on system owns.
///
/// Files carrying it may be overwritten or deleted by the add-on system;
/// files without it belong to the user.
pub const SIGNATURE_MARKER: &str = "#ddev-generated";

/// Well-known names inside a project's configuration directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPath {
    /// The `.ddev` directory (project configuration root)
    ProjectConfigDir,
    /// The `config.yaml` project configuration file
    ProjectConfigFile,
    /// The `addon-metadata` directory holding one manifest per add-on
    AddonMetadataDir,
    /// The `manifest.yaml` file inside an add-on metadata directory
    ManifestFile,
    /// The `install.yaml` descriptor at an add-on's archive root
    DescriptorFile,
    /// The project-level `.env` file
    ProjectEnvFile,
    /// The `project_list.yaml` file in the global configuration directory
    ProjectList,
}

impl ConfigPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectConfigDir => ".ddev",
            Self::ProjectConfigFile => "config.yaml",
            Self::AddonMetadataDir => "addon-metadata",
            Self::ManifestFile => "manifest.yaml",
            Self::DescriptorFile => "install.yaml",
            Self::ProjectEnvFile => ".env",
            Self::ProjectList => "project_list.yaml",
        }
    }

    /// Name of the add-on specific environment file, `.env.<addon>`.
    pub fn addon_env_file(addon: &str) -> String {
        format!("{}.{addon}", Self::ProjectEnvFile.as_str())
    }

    /// Name of the runtime dependency side channel, `.runtime-deps-<addon>`.
    pub fn runtime_deps_file(addon: &str) -> String {
        format!(".runtime-deps-{addon}")
    }
}

impl AsRef<Path> for ConfigPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ConfigPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
