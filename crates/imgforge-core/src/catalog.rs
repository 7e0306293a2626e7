//! Loading of flattened package catalogs.
//!
//! Repository metadata (Packages.gz, primary.xml) is parsed elsewhere and
//! handed over as a JSON array of [`PackageInfo`] records.

use std::path::Path;

use imgforge_util::errors::ImgforgeError;

use crate::package::PackageInfo;

/// Load one catalog file.
pub fn load_catalog(path: &Path) -> miette::Result<Vec<PackageInfo>> {
    let content = std::fs::read_to_string(path).map_err(|e| ImgforgeError::Catalog {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    let packages = parse_catalog(&content).map_err(|e| ImgforgeError::Catalog {
        message: format!("Failed to parse {}: {e}", path.display()),
    })?;
    tracing::debug!(path = %path.display(), packages = packages.len(), "loaded catalog");
    Ok(packages)
}

/// Load several catalog files and concatenate them in order.
pub fn load_catalogs<P: AsRef<Path>>(paths: &[P]) -> miette::Result<Vec<PackageInfo>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(load_catalog(path.as_ref())?);
    }
    Ok(all)
}

/// Parse catalog JSON content.
pub fn parse_catalog(content: &str) -> Result<Vec<PackageInfo>, serde_json::Error> {
    serde_json::from_str(content)
}
