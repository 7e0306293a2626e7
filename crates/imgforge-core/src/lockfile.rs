use std::path::Path;

use imgforge_util::errors::ImgforgeError;
use serde::{Deserialize, Serialize};

use crate::package::EcosystemKind;

/// Deterministic lockfile recording the exact package set of an image.
///
/// The download stage reads it to fetch every `url`; `dependencies` keeps
/// the edges so install order can be recomputed without the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLock {
    pub image: String,
    #[serde(default)]
    pub ecosystem: EcosystemKind,
    #[serde(default)]
    pub package: Vec<LockedPackage>,
}

/// A single locked package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub url: String,
    /// Names of the resolved packages this one depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ImageLock {
    /// Load and parse an `imgforge.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ImgforgeError::Generic {
            message: format!("Failed to read lockfile: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            ImgforgeError::Generic {
                message: format!("Failed to parse lockfile: {e}"),
            }
            .into()
        })
    }

    /// Serialize the lockfile to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write the lockfile to `path`.
    pub fn write(&self, path: &Path) -> miette::Result<()> {
        let content = self.to_string_pretty().map_err(|e| ImgforgeError::Generic {
            message: format!("Failed to serialize lockfile: {e}"),
        })?;
        std::fs::write(path, content).map_err(ImgforgeError::Io)?;
        Ok(())
    }

    /// Version locked for `name`, if any.
    pub fn locked_version(&self, name: &str) -> Option<&str> {
        self.package
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.version.as_str())
    }
}
