//! Error types for addon-cli

use std::path::PathBuf;

/// Exit code after a user interrupt, as shells report SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from addon-core
    #[error(transparent)]
    Core(#[from] addon_core::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A project or global configuration file could not be read
    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code: 130 after an interrupt, 2 when the project may
    /// have been partially changed, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(addon_core::Error::Cancelled) => INTERRUPTED_EXIT_CODE,
            Self::Core(e) if e.is_partial() => 2,
            _ => 1,
        }
    }
}
