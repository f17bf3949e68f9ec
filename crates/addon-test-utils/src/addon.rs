//! [`AddonFixture`]: add-on source trees written to disk.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// An add-on directory containing `install.yaml` and any extra files.
///
/// # Example
///
/// ```rust,no_run
/// use addon_test_utils::AddonFixture;
///
/// let addon = AddonFixture::new("name: sample\nproject_files: [extra/*.txt]\n")
///     .with_file("extra/a.txt", "#ddev-generated\na\n");
/// let reference = addon.reference();
/// ```
pub struct AddonFixture {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl AddonFixture {
    /// An add-on in its own temp directory.
    pub fn new(install_yaml: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let path = temp.path().to_path_buf();
        Self::write_descriptor(&path, install_yaml);
        Self {
            path,
            _temp: Some(temp),
        }
    }

    /// An add-on at `root/rel`, for tests that resolve relative references
    /// against `root`.
    pub fn at(root: &Path, rel: &str, install_yaml: &str) -> Self {
        let path = root.join(rel);
        Self::write_descriptor(&path, install_yaml);
        Self { path, _temp: None }
    }

    fn write_descriptor(dir: &Path, install_yaml: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("install.yaml"), install_yaml).unwrap();
    }

    /// Add a file relative to the add-on root.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.path.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The add-on's absolute path as a source reference.
    pub fn reference(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// The add-on packed the way providers serve it: a gzip tarball whose
    /// entries live under a single `<top>/` directory.
    pub fn tarball(&self, top: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        builder.append_dir_all(top, &self.path).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Write [`AddonFixture::tarball`] to `dest` and return its path.
    pub fn write_tarball(&self, dest: &Path, top: &str) -> PathBuf {
        fs::write(dest, self.tarball(top)).unwrap();
        dest.to_path_buf()
    }
}
