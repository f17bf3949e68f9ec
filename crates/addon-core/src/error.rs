use std::path::PathBuf;

/// Errors that can occur while installing, resolving or removing add-ons.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source reference is none of directory, archive, slug or URL.
    #[error("invalid add-on source '{reference}': {reason}")]
    RefInvalid { reference: String, reason: String },

    /// The release selector flags are invalid.
    #[error("invalid release selector: {reason}")]
    InvalidSelector { reason: String },

    /// A local path named by the source reference does not exist.
    #[error("add-on source not found: {0}")]
    NotFound(PathBuf),

    /// A downloaded or local archive could not be extracted.
    #[error("failed to extract archive {archive}: {reason}")]
    Extract { archive: String, reason: String },

    /// Network failure talking to the provider or downloading an archive.
    #[error("network error fetching {url}: {reason} (check your network connection)")]
    Network { url: String, reason: String },

    /// The provider rejected the request because of rate limiting.
    #[error(
        "rate limited by provider while fetching {url}; set DDEV_GITHUB_TOKEN or GITHUB_TOKEN to raise the limit"
    )]
    RateLimited { url: String },

    /// The repository has no releases to choose from.
    #[error("no releases found for {owner}/{repo}; use --default-branch or --version")]
    NoRelease { owner: String, repo: String },

    /// `install.yaml` is missing from the working directory.
    #[error("no install.yaml found in {0}")]
    DescriptorNotFound(PathBuf),

    /// `install.yaml` failed to parse or validate.
    #[error("invalid install.yaml: {reason}")]
    Descriptor { reason: String },

    /// A template in an action could not be rendered.
    #[error("template error in add-on '{addon}': {reason}")]
    Template { addon: String, reason: String },

    /// The host version does not satisfy the add-on's constraint.
    #[error("add-on '{addon}' requires version '{constraint}', but this is {host_version}")]
    Constraint {
        addon: String,
        constraint: String,
        host_version: String,
    },

    /// A version constraint expression could not be parsed.
    #[error("invalid version constraint '{constraint}': {reason}")]
    ConstraintParse { constraint: String, reason: String },

    /// The dependency graph contains a cycle.
    #[error("circular dependency detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// A dependency failed to install.
    #[error("failed to install dependency '{dependency}': {source}")]
    DependencyInstall {
        dependency: String,
        #[source]
        source: Box<Error>,
    },

    /// An action exited non-zero without the warning flag.
    #[error("action failed for add-on '{addon}'{}: exit code {}", description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default(), exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ActionFailed {
        addon: String,
        description: Option<String>,
        exit_code: Option<i32>,
    },

    /// A file named by the descriptor could not be deployed.
    #[error("failed to copy {path}: {reason}")]
    Copy { path: PathBuf, reason: String },

    /// A manifest could not be read or written.
    #[error("failed to persist manifest at {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    /// An identifier matched more than one installed add-on.
    #[error("'{identifier}' matches several installed add-ons: {}", candidates.join(", "))]
    Ambiguous {
        identifier: String,
        candidates: Vec<String>,
    },

    /// An identifier matched no installed add-on.
    #[error("no installed add-on matches '{identifier}'{}", if installed.is_empty() { String::new() } else { format!("; installed: {}", installed.join(", ")) })]
    Unknown {
        identifier: String,
        installed: Vec<String>,
    },

    /// The user interrupted the command.
    #[error("interrupted; the add-on being installed has no manifest")]
    Cancelled,

    /// Filesystem error from addon-fs.
    #[error(transparent)]
    Fs(#[from] addon_fs::Error),

    /// Standard I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Flat classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RefInvalid,
    NotFound,
    Extract,
    Network,
    RateLimited,
    NoRelease,
    Descriptor,
    Template,
    Constraint,
    Cycle,
    DependencyInstall,
    ActionFailed,
    Copy,
    Persist,
    Ambiguous,
    Unknown,
    Cancelled,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RefInvalid { .. } | Self::InvalidSelector { .. } => ErrorKind::RefInvalid,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Extract { .. } => ErrorKind::Extract,
            Self::Network { .. } => ErrorKind::Network,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::NoRelease { .. } => ErrorKind::NoRelease,
            Self::DescriptorNotFound(_) | Self::Descriptor { .. } => ErrorKind::Descriptor,
            Self::Template { .. } => ErrorKind::Template,
            Self::Constraint { .. } | Self::ConstraintParse { .. } => ErrorKind::Constraint,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::DependencyInstall { .. } => ErrorKind::DependencyInstall,
            Self::ActionFailed { .. } => ErrorKind::ActionFailed,
            Self::Copy { .. } => ErrorKind::Copy,
            Self::Persist { .. } => ErrorKind::Persist,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Fs(_) | Self::Io(_) => ErrorKind::Io,
        }
    }

    /// True when the failure happened after the install started changing
    /// the project, so files may have been left behind.
    pub fn is_partial(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ActionFailed
                | ErrorKind::Copy
                | ErrorKind::Persist
                | ErrorKind::DependencyInstall
        )
    }

    /// Follow `DependencyInstall` wrappers down to the original failure.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::DependencyInstall { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
