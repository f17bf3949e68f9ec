use addon_fs::io;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("addon-metadata/redis/manifest.yaml");

    io::write_atomic(&path, b"name: redis\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "name: redis\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");
    fs::write(&path, "original").unwrap();

    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");

    io::write_atomic(&path, b"content").unwrap();

    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["test.txt".to_string()]);
}

#[cfg(unix)]
#[test]
fn test_copy_atomic_preserves_mode() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src/commands/web/redis-cli");
    fs::create_dir_all(src.parent().unwrap()).unwrap();
    fs::write(&src, "#!/bin/bash\n#ddev-generated\n").unwrap();
    fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();

    let dest = temp.path().join("dest/commands/web/redis-cli");
    io::copy_atomic(&src, &dest).unwrap();

    let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);
    assert_eq!(
        fs::read_to_string(&dest).unwrap(),
        "#!/bin/bash\n#ddev-generated\n"
    );
}

#[test]
fn test_copy_atomic_missing_source_is_error() {
    let temp = TempDir::new().unwrap();
    let result = io::copy_atomic(&temp.path().join("absent"), &temp.path().join("dest"));
    assert!(result.is_err());
    assert!(!temp.path().join("dest").exists());
}

#[test]
fn test_remove_file_if_exists() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gone.txt");
    fs::write(&path, "x").unwrap();

    assert!(io::remove_file_if_exists(&path).unwrap());
    assert!(!io::remove_file_if_exists(&path).unwrap());
}

#[test]
fn test_read_text_nonexistent_file() {
    let result = io::read_text(std::path::Path::new("/nonexistent/file.txt"));
    assert!(result.is_err());
}
