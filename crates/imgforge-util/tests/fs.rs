use std::path::Path;

use imgforge_util::fs::{find_ancestor_with, resolve_relative};
use tempfile::TempDir;

#[test]
fn test_find_ancestor_with_direct() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("imgforge.toml"), "").unwrap();
    let result = find_ancestor_with(tmp.path(), "imgforge.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_nested() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("imgforge.toml"), "").unwrap();
    let nested = tmp.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&nested).unwrap();
    let result = find_ancestor_with(&nested, "imgforge.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_not_found() {
    let tmp = TempDir::new().unwrap();
    let result = find_ancestor_with(tmp.path(), "NonExistent.file");
    assert_eq!(result, None);
}

#[test]
fn test_resolve_relative_joins_base() {
    let joined = resolve_relative(Path::new("/srv/images"), Path::new("catalogs/main.json"));
    assert_eq!(joined, Path::new("/srv/images/catalogs/main.json"));
}

#[test]
fn test_resolve_relative_keeps_absolute() {
    let joined = resolve_relative(Path::new("/srv/images"), Path::new("/var/cache/main.json"));
    assert_eq!(joined, Path::new("/var/cache/main.json"));
}
