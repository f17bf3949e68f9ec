//! Source references.
//!
//! A user-supplied reference is discriminated once, in this order:
//! existing directory, existing `.tar.gz`/`.tgz` file, `owner/repo` slug,
//! and finally an `http(s)` archive URL.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9_.-]+$").expect("slug regex is valid")
});

const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];

/// Where an add-on comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A local directory containing `install.yaml`.
    Directory(PathBuf),
    /// A local gzip-compressed tarball.
    LocalArchive(PathBuf),
    /// A repository on the hosting provider.
    ProviderSlug { owner: String, repo: String },
    /// A remote gzip-compressed tarball.
    ArchiveUrl(String),
}

impl SourceRef {
    /// Discriminate `reference`, resolving relative paths against `base_dir`.
    pub fn parse(reference: &str, base_dir: &Path) -> Result<Self> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(Error::RefInvalid {
                reference: reference.to_string(),
                reason: "source must not be empty".to_string(),
            });
        }

        let candidate = base_dir.join(expand_home(trimmed));
        if candidate.is_dir() {
            return Ok(Self::Directory(canonical(&candidate)));
        }
        if candidate.is_file() {
            if is_archive_name(trimmed) {
                return Ok(Self::LocalArchive(canonical(&candidate)));
            }
            return Err(Error::RefInvalid {
                reference: reference.to_string(),
                reason: "local files must be .tar.gz or .tgz archives".to_string(),
            });
        }

        if SLUG_RE.is_match(trimmed) && !looks_like_path(trimmed) {
            let (owner, repo) = trimmed.split_once('/').unwrap_or_default();
            return Ok(Self::ProviderSlug {
                owner: owner.to_string(),
                repo: repo.trim_end_matches(".git").to_string(),
            });
        }

        if looks_like_path(trimmed) {
            return Err(Error::NotFound(candidate));
        }

        match reqwest::Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Ok(Self::ArchiveUrl(url.to_string()))
            }
            Ok(url) => Err(Error::RefInvalid {
                reference: reference.to_string(),
                reason: format!("unsupported URL scheme '{}'", url.scheme()),
            }),
            Err(_) => Err(Error::RefInvalid {
                reference: reference.to_string(),
                reason: "expected a directory, a .tar.gz archive, owner/repo, or an archive URL"
                    .to_string(),
            }),
        }
    }

    /// Stable identity used for cycle detection and the manifest's
    /// `repository` field.
    pub fn key(&self) -> String {
        match self {
            Self::Directory(p) | Self::LocalArchive(p) => p.to_string_lossy().into_owned(),
            Self::ProviderSlug { owner, repo } => format!("{owner}/{repo}"),
            Self::ArchiveUrl(url) => url.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Directory(_) | Self::LocalArchive(_))
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Expand a leading `~` or `~/` to the home directory.
fn expand_home(reference: &str) -> PathBuf {
    let home_relative = match reference.strip_prefix('~') {
        Some("") => Some(""),
        Some(rest) => rest.strip_prefix('/'),
        None => None,
    };
    match (home_relative, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(reference),
    }
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_archive_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn looks_like_path(reference: &str) -> bool {
    reference.starts_with('/')
        || reference.starts_with("./")
        || reference.starts_with("../")
        || reference.starts_with('~')
        || reference == "."
        || reference == ".."
        || (is_archive_name(reference) && !reference.contains("://"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn existing_directory_wins_over_slug() {
        let base = tempdir().unwrap();
        fs::create_dir_all(base.path().join("test/dependencyB")).unwrap();
        let parsed = SourceRef::parse("test/dependencyB", base.path()).unwrap();
        assert!(matches!(parsed, SourceRef::Directory(_)));
    }

    #[test]
    fn local_archive_by_extension() {
        let base = tempdir().unwrap();
        fs::write(base.path().join("addon.tar.gz"), b"").unwrap();
        let parsed = SourceRef::parse("addon.tar.gz", base.path()).unwrap();
        assert!(matches!(parsed, SourceRef::LocalArchive(_)));
    }

    #[test]
    fn local_non_archive_file_rejected() {
        let base = tempdir().unwrap();
        fs::write(base.path().join("notes.txt"), b"").unwrap();
        let err = SourceRef::parse("notes.txt", base.path()).unwrap_err();
        assert!(matches!(err, Error::RefInvalid { .. }));
    }

    #[test]
    fn slug() {
        let base = tempdir().unwrap();
        assert_eq!(
            SourceRef::parse("ddev/ddev-redis", base.path()).unwrap(),
            SourceRef::ProviderSlug {
                owner: "ddev".to_string(),
                repo: "ddev-redis".to_string()
            }
        );
    }

    #[test]
    fn url_fallback() {
        let base = tempdir().unwrap();
        let parsed = SourceRef::parse(
            "https://github.com/ddev/ddev-redis/archive/refs/tags/v1.0.4.tar.gz",
            base.path(),
        )
        .unwrap();
        assert!(matches!(parsed, SourceRef::ArchiveUrl(_)));
    }

    #[test]
    fn missing_path_is_not_found() {
        let base = tempdir().unwrap();
        let err = SourceRef::parse("./absent", base.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn garbage_is_invalid() {
        let base = tempdir().unwrap();
        let err = SourceRef::parse("not a ref", base.path()).unwrap_err();
        assert!(matches!(err, Error::RefInvalid { .. }));
        let err = SourceRef::parse("ftp://example.com/a.tar.gz", base.path()).unwrap_err();
        assert!(matches!(err, Error::RefInvalid { .. }));
    }

    #[test]
    fn home_relative_paths_are_expanded() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let base = tempdir().unwrap();
        assert_eq!(expand_home("~/addons/redis"), home.join("addons/redis"));
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~other/addon"), PathBuf::from("~other/addon"));

        let err = SourceRef::parse("~/no-such-addon-dir-4f1c", base.path()).unwrap_err();
        match err {
            Error::NotFound(path) => assert_eq!(path, home.join("no-such-addon-dir-4f1c")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
