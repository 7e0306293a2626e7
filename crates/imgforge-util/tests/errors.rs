use imgforge_util::errors::ImgforgeError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = ImgforgeError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_template_error_display() {
    let err = ImgforgeError::Template {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Template error: bad syntax");
}

#[test]
fn test_catalog_error_display() {
    let err = ImgforgeError::Catalog {
        message: "not an array".to_string(),
    };
    assert_eq!(err.to_string(), "Catalog error: not an array");
}

#[test]
fn test_resolution_error_display() {
    let err = ImgforgeError::Resolution {
        message: "conflict".to_string(),
    };
    assert_eq!(err.to_string(), "Dependency resolution failed: conflict");
}

#[test]
fn test_generic_error_display() {
    let err = ImgforgeError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: ImgforgeError = io_err.into();
    assert!(matches!(err, ImgforgeError::Io(_)));
}
