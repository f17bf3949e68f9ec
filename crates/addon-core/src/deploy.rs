//! File deployment.
//!
//! Expands descriptor glob patterns against the add-on working directory
//! and copies each match to the destination root, consulting the signature
//! guard first. Each copy is atomic; the deployment as a whole is not.
//!
//! Only files that still pass the guard after the copy (empty, or carrying
//! the marker) are reported as copied. Anything else would be treated as
//! user-owned by the next install or removal, so it is not tracked.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use addon_fs::{SIGNATURE_MARKER, Verdict};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::output::Output;

/// What [`deploy`] did, as paths relative to the destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deployment {
    /// Copied files the add-on owns.
    pub copied: Vec<String>,
    /// Existing user-owned files left untouched.
    pub skipped: Vec<String>,
    /// Copied files without the marker; left in place but not tracked.
    pub unmarked: Vec<String>,
}

/// Deploy every file matched by `patterns` from `source_root` to `dest_root`.
pub fn deploy(
    patterns: &[String],
    source_root: &Path,
    dest_root: &Path,
    output: &dyn Output,
) -> Result<Deployment> {
    let mut deployment = Deployment::default();
    for relative in expand(patterns, source_root)? {
        let src = source_root.join(&relative);
        let dest = dest_root.join(&relative);
        let display = to_slash(&relative);

        match addon_fs::may_overwrite(&dest) {
            Verdict::Yes => {
                addon_fs::io::copy_atomic(&src, &dest).map_err(|e| Error::Copy {
                    path: dest.clone(),
                    reason: e.to_string(),
                })?;
                tracing::debug!(src = %src.display(), dest = %dest.display(), "Deployed file");
                output.success(&format!("✓ Installed file {}", dest.display()));
                if addon_fs::may_overwrite(&dest).is_yes() {
                    deployment.copied.push(display);
                } else {
                    tracing::warn!(dest = %dest.display(), "Deployed file has no signature marker");
                    output.warning(&format!(
                        "⚠ {} has no {SIGNATURE_MARKER} marker; it will not be updated or removed with the add-on",
                        dest.display()
                    ));
                    deployment.unmarked.push(display);
                }
            }
            Verdict::No { reason } => {
                tracing::warn!(dest = %dest.display(), %reason, "Skipping user-owned file");
                output.warning(&format!(
                    "⚠ Not overwriting {}: {reason}. Remove it and run `add-on get` again to replace it",
                    dest.display()
                ));
                deployment.skipped.push(display);
            }
        }
    }
    Ok(deployment)
}

/// Expand `patterns` to file paths relative to `source_root`, in pattern
/// order, without duplicates. Directories are walked recursively.
pub fn expand(patterns: &[String], source_root: &Path) -> Result<Vec<PathBuf>> {
    let escaped_root = glob::Pattern::escape(&source_root.to_string_lossy());
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let trimmed = pattern.trim().trim_end_matches('/');
        check_confined(trimmed, source_root)?;

        let full = format!("{escaped_root}/{trimmed}");
        let matches = glob::glob(&full).map_err(|e| Error::Descriptor {
            reason: format!("invalid file pattern '{pattern}': {e}"),
        })?;

        let mut matched = false;
        for entry in matches {
            let path = entry.map_err(|e| Error::Copy {
                path: e.path().to_path_buf(),
                reason: e.error().to_string(),
            })?;
            matched = true;
            let mut found = Vec::new();
            if path.is_dir() {
                walk(&path, source_root, &mut found)?;
            } else if confined_file(&path, source_root) {
                found.push(path);
            }
            for file in found {
                let relative = file
                    .strip_prefix(source_root)
                    .map(Path::to_path_buf)
                    .map_err(|_| Error::Copy {
                        path: file.clone(),
                        reason: "matched outside the add-on directory".to_string(),
                    })?;
                if seen.insert(relative.clone()) {
                    files.push(relative);
                }
            }
        }

        if !matched {
            return Err(Error::Copy {
                path: source_root.join(trimmed),
                reason: "no such file in the add-on".to_string(),
            });
        }
    }
    Ok(files)
}

fn check_confined(pattern: &str, source_root: &Path) -> Result<()> {
    let path = Path::new(pattern);
    if pattern.is_empty()
        || path.is_absolute()
        || path.components().any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::Copy {
            path: source_root.join(pattern),
            reason: format!("file pattern '{pattern}' must stay inside the add-on"),
        });
    }
    Ok(())
}

fn walk(dir: &Path, source_root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Copy {
            path: e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            reason: e.to_string(),
        })?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() && !confined_file(entry.path(), source_root) {
            continue;
        }
        out.push(entry.into_path());
    }
    Ok(())
}

/// Whether `path` is a regular file, or a link to one, inside `source_root`.
fn confined_file(path: &Path, source_root: &Path) -> bool {
    let (Ok(target), Ok(root)) = (dunce::canonicalize(path), dunce::canonicalize(source_root)) else {
        return false;
    };
    if !target.starts_with(&root) {
        tracing::warn!(path = %path.display(), target = %target.display(), "Skipping link that leaves the add-on");
        return false;
    }
    target.is_file()
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Level, RecordingOutput};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn source() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("extra")).unwrap();
        fs::create_dir_all(dir.path().join("redis/conf")).unwrap();
        fs::write(dir.path().join("extra/a.txt"), "#ddev-generated\na\n").unwrap();
        fs::write(dir.path().join("extra/b.txt"), "#ddev-generated\nb\n").unwrap();
        fs::write(dir.path().join("extra/skip.md"), "x").unwrap();
        fs::write(dir.path().join("redis/conf/redis.conf"), "#ddev-generated\n").unwrap();
        fs::write(dir.path().join("docker-compose.redis.yaml"), "#ddev-generated\n").unwrap();
        dir
    }

    #[test]
    fn expands_globs_and_directories() {
        let src = source();
        let files = expand(
            &[
                "extra/*.txt".to_string(),
                "redis/".to_string(),
                "docker-compose.redis.yaml".to_string(),
                "extra/a.txt".to_string(),
            ],
            src.path(),
        )
        .unwrap();
        let names: Vec<String> = files.iter().map(|p| to_slash(p)).collect();
        assert_eq!(
            names,
            vec![
                "extra/a.txt",
                "extra/b.txt",
                "redis/conf/redis.conf",
                "docker-compose.redis.yaml"
            ]
        );
    }

    #[test]
    fn missing_source_is_error() {
        let src = source();
        let err = expand(&["nothing-here.yaml".to_string()], src.path()).unwrap_err();
        assert!(matches!(err, Error::Copy { .. }));
    }

    #[test]
    fn escaping_patterns_rejected() {
        let src = source();
        assert!(expand(&["../etc/passwd".to_string()], src.path()).is_err());
        assert!(expand(&["/etc/passwd".to_string()], src.path()).is_err());
    }

    #[test]
    fn user_owned_destination_is_skipped() {
        let src = source();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir_all(dest.path().join("extra")).unwrap();
        fs::write(dest.path().join("extra/b.txt"), "mine").unwrap();

        let out = RecordingOutput::new();
        let result = deploy(&["extra/*.txt".to_string()], src.path(), dest.path(), &out).unwrap();

        assert_eq!(result.copied, vec!["extra/a.txt"]);
        assert_eq!(result.skipped, vec!["extra/b.txt"]);
        assert!(result.unmarked.is_empty());
        assert_eq!(fs::read_to_string(dest.path().join("extra/b.txt")).unwrap(), "mine");
        assert_eq!(out.messages(Level::Warning).len(), 1);
        assert!(out.messages(Level::Warning)[0].contains("b.txt"));
    }

    #[test]
    fn owned_destination_is_replaced() {
        let src = source();
        let dest = tempfile::tempdir().unwrap();
        fs::create_dir_all(dest.path().join("extra")).unwrap();
        fs::write(dest.path().join("extra/a.txt"), "#ddev-generated\nold\n").unwrap();

        let result = deploy(
            &["extra/a.txt".to_string()],
            src.path(),
            dest.path(),
            &crate::output::NullOutput,
        )
        .unwrap();
        assert_eq!(result.copied, vec!["extra/a.txt"]);
        assert_eq!(
            fs::read_to_string(dest.path().join("extra/a.txt")).unwrap(),
            "#ddev-generated\na\n"
        );
    }

    #[test]
    fn unmarked_file_is_copied_but_not_tracked() {
        let src = source();
        let dest = tempfile::tempdir().unwrap();
        let out = RecordingOutput::new();

        let result = deploy(&["extra/skip.md".to_string()], src.path(), dest.path(), &out).unwrap();

        assert!(result.copied.is_empty());
        assert_eq!(result.unmarked, vec!["extra/skip.md"]);
        assert_eq!(fs::read_to_string(dest.path().join("extra/skip.md")).unwrap(), "x");
        assert!(out.messages(Level::Warning)[0].contains("#ddev-generated"));
    }

    #[cfg(unix)]
    #[test]
    fn links_leaving_the_addon_are_not_walked() {
        let src = source();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), "#ddev-generated\nsecret\n").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), src.path().join("redis/secret")).unwrap();
        std::os::unix::fs::symlink(src.path().join("extra/a.txt"), src.path().join("redis/a-link.txt")).unwrap();

        let files = expand(&["redis".to_string()], src.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| to_slash(p)).collect();
        assert_eq!(names, vec!["redis/a-link.txt", "redis/conf/redis.conf"]);
    }
}
