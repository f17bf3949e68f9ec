//! Signature guard
//!
//! A file is owned by the add-on system when it is absent, empty, or carries
//! [`SIGNATURE_MARKER`]. Anything else was written or edited by the user and
//! must never be overwritten or deleted.

use std::fs;
use std::path::Path;

use crate::SIGNATURE_MARKER;

/// Decision returned by [`may_overwrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The path is owned by the add-on system.
    Yes,
    /// The path belongs to the user.
    No { reason: String },
}

impl Verdict {
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }

    fn no(reason: impl Into<String>) -> Self {
        Self::No {
            reason: reason.into(),
        }
    }
}

/// Decide whether `path` may be overwritten.
///
/// Never opens the file for writing. I/O errors other than "not found" are
/// treated as a refusal.
pub fn may_overwrite(path: &Path) -> Verdict {
    may_overwrite_with(path, SIGNATURE_MARKER)
}

/// [`may_overwrite`] with an explicit marker.
pub fn may_overwrite_with(path: &Path, marker: &str) -> Verdict {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Verdict::Yes,
        Err(e) => return Verdict::no(format!("cannot inspect file: {e}")),
    };

    if metadata.is_dir() {
        return Verdict::no("path is a directory");
    }
    if metadata.len() == 0 {
        return Verdict::Yes;
    }

    match fs::read(path) {
        Ok(content) if contains(&content, marker.as_bytes()) => Verdict::Yes,
        Ok(_) => Verdict::no("user-modified file without marker"),
        Err(e) => Verdict::no(format!("cannot read file: {e}")),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
