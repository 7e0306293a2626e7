use imgforge_core::catalog::{load_catalog, load_catalogs};
use tempfile::TempDir;

#[test]
fn test_load_catalogs_concatenates_in_order() {
    let tmp = TempDir::new().unwrap();
    let main = tmp.path().join("main.json");
    let updates = tmp.path().join("updates.json");
    std::fs::write(&main, r#"[{"name": "bash", "version": "5.2.15-2"}]"#).unwrap();
    std::fs::write(
        &updates,
        r#"[{"name": "bash", "version": "5.2.15-2+b2", "provides": ["sh"]}]"#,
    )
    .unwrap();

    let all = load_catalogs(&[main, updates]).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].version, "5.2.15-2");
    assert_eq!(all[1].provides, vec!["sh"]);
}

#[test]
fn test_load_catalog_reports_path_on_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    std::fs::write(&path, "not json").unwrap();
    let err = load_catalog(&path).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Catalog error"), "got: {msg}");
    assert!(msg.contains("broken.json"), "got: {msg}");
}

#[test]
fn test_load_catalog_missing_file() {
    let tmp = TempDir::new().unwrap();
    let err = load_catalog(&tmp.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}
