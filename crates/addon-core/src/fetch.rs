//! Archive fetcher.
//!
//! Materializes a source reference as a local working directory. Archives
//! are extracted into a fresh temp directory with the leading path component
//! of every entry stripped, since provider tarballs wrap everything in a
//! `<owner>-<repo>-<sha>/` directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::source::SourceRef;

/// Streams a remote archive into a writer.
pub trait Downloader {
    /// Download `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// A materialized add-on working directory.
///
/// Temp directories are removed by [`WorkDir::cleanup`] or on drop,
/// whichever comes first; local directories are never touched.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl WorkDir {
    fn borrowed(path: PathBuf) -> Self {
        Self { path, temp: None }
    }

    fn owned(temp: TempDir) -> Self {
        Self {
            path: temp.path().to_path_buf(),
            temp: Some(temp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this directory is a temp extraction owned by the fetcher.
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Remove the temp directory. Safe to call any number of times.
    pub fn cleanup(&mut self) {
        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            if let Err(e) = temp.close() {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove working directory");
            } else {
                tracing::debug!(path = %path.display(), "Removed working directory");
            }
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Materializes [`SourceRef`]s.
pub struct Fetcher<'a> {
    downloader: &'a dyn Downloader,
    keep_failed_downloads: bool,
}

impl<'a> Fetcher<'a> {
    pub fn new(downloader: &'a dyn Downloader) -> Self {
        Self {
            downloader,
            keep_failed_downloads: false,
        }
    }

    /// Keep downloaded archives that fail to extract, for diagnosis.
    pub fn keep_failed_downloads(mut self, keep: bool) -> Self {
        self.keep_failed_downloads = keep;
        self
    }

    /// Materialize `source` as a working directory.
    ///
    /// Provider slugs must be resolved to an archive URL first.
    pub fn materialize(&self, source: &SourceRef) -> Result<WorkDir> {
        match source {
            SourceRef::Directory(path) => {
                if !path.is_dir() {
                    return Err(Error::NotFound(path.clone()));
                }
                tracing::debug!(path = %path.display(), "Using local add-on directory");
                Ok(WorkDir::borrowed(path.clone()))
            }
            SourceRef::LocalArchive(path) => {
                if !path.is_file() {
                    return Err(Error::NotFound(path.clone()));
                }
                let temp = new_temp_dir()?;
                extract_archive(path, temp.path())?;
                Ok(WorkDir::owned(temp))
            }
            SourceRef::ArchiveUrl(url) => self.download_and_extract(url),
            SourceRef::ProviderSlug { owner, repo } => Err(Error::RefInvalid {
                reference: format!("{owner}/{repo}"),
                reason: "provider slugs must be resolved to a release before fetching".to_string(),
            }),
        }
    }

    fn download_and_extract(&self, url: &str) -> Result<WorkDir> {
        let archive = tempfile::Builder::new()
            .prefix("addon-download-")
            .suffix(".tar.gz")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(archive.as_file());
            let bytes = self.downloader.download(url, &mut writer)?;
            writer.flush()?;
            tracing::debug!(url, bytes, "Downloaded archive");
        }
        archive.as_file().sync_all()?;

        let temp = new_temp_dir()?;
        match extract_archive(archive.path(), temp.path()) {
            Ok(()) => Ok(WorkDir::owned(temp)),
            Err(Error::Extract { reason, .. }) if self.keep_failed_downloads => {
                let kept = archive.into_temp_path().keep().map_err(|e| e.error)?;
                tracing::warn!(path = %kept.display(), "Kept archive that failed to extract");
                Err(Error::Extract {
                    archive: url.to_string(),
                    reason: format!("{reason} (download kept at {})", kept.display()),
                })
            }
            Err(Error::Extract { reason, .. }) => Err(Error::Extract {
                archive: url.to_string(),
                reason,
            }),
            Err(e) => Err(e),
        }
    }
}

fn new_temp_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("addon-").tempdir()?)
}

/// Extract a gzip-compressed tarball into `dest`, stripping the first path
/// component of every entry.
///
/// Entries must stay inside `dest`: paths with `..` or a root, symlinks
/// pointing outside, and writes through links that leave `dest` are all
/// rejected.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let extract_err = |reason: String| Error::Extract {
        archive: archive.display().to_string(),
        reason,
    };

    let root = dunce::canonicalize(dest).map_err(|e| extract_err(e.to_string()))?;
    let file = File::open(archive).map_err(|e| extract_err(e.to_string()))?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries = tar.entries().map_err(|e| extract_err(e.to_string()))?;

    let mut extracted = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| extract_err(e.to_string()))?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
            continue;
        }

        let entry_path = entry.path().map_err(|e| extract_err(e.to_string()))?.into_owned();
        let Some(relative) = strip_first_component(&entry_path) else {
            continue;
        };
        if !is_plain_relative(&relative) {
            return Err(extract_err(format!(
                "entry escapes the archive root: {}",
                entry_path.display()
            )));
        }

        let target = root.join(&relative);
        let parent = target.parent().unwrap_or(&root);
        if !resolves_inside(parent, &root) {
            return Err(extract_err(format!(
                "entry is written through a link outside the archive root: {}",
                entry_path.display()
            )));
        }
        fs::create_dir_all(parent).map_err(|e| extract_err(e.to_string()))?;

        let link = entry
            .link_name()
            .map_err(|e| extract_err(e.to_string()))?
            .map(|l| l.into_owned());
        if kind.is_symlink() {
            let link = link.unwrap_or_default();
            if link_escapes(relative.parent().unwrap_or(Path::new("")), &link) {
                return Err(extract_err(format!(
                    "symlink {} points outside the archive root: {}",
                    entry_path.display(),
                    link.display()
                )));
            }
        } else if kind.is_hard_link() {
            // Hard link names are archive paths, so they carry the top directory too.
            let source = link
                .as_deref()
                .and_then(strip_first_component)
                .filter(|p| is_plain_relative(p))
                .map(|p| root.join(p))
                .filter(|p| resolves_inside(p, &root) && p.is_file())
                .ok_or_else(|| {
                    extract_err(format!(
                        "hard link {} does not point at a file inside the archive",
                        entry_path.display()
                    ))
                })?;
            fs::copy(&source, &target).map_err(|e| extract_err(format!("{}: {e}", relative.display())))?;
            extracted += 1;
            continue;
        }

        entry
            .unpack(&target)
            .map_err(|e| extract_err(format!("{}: {e}", relative.display())))?;
        extracted += 1;
    }

    if extracted == 0 {
        return Err(extract_err("archive contains no files".to_string()));
    }
    tracing::debug!(archive = %archive.display(), dest = %dest.display(), entries = extracted, "Extracted archive");
    Ok(())
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Whether the deepest existing ancestor of `path` canonicalizes inside `root`.
fn resolves_inside(path: &Path, root: &Path) -> bool {
    let mut existing = path;
    while existing.symlink_metadata().is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return false,
        }
    }
    dunce::canonicalize(existing).is_ok_and(|p| p.starts_with(root))
}

/// Whether symlink target `link`, read relative to the directory `base`
/// (itself relative to the archive root), leaves the root.
fn link_escapes(base: &Path, link: &Path) -> bool {
    if link.as_os_str().is_empty() {
        return true;
    }
    let mut depth = base.components().count();
    for component in link.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

fn strip_first_component(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}
