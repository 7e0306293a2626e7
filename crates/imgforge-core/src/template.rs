use std::path::{Path, PathBuf};

use imgforge_util::errors::ImgforgeError;
use imgforge_util::fs::resolve_relative;
use serde::{Deserialize, Serialize};

use crate::package::{EcosystemKind, ImageFormat};

/// The parsed representation of an `imgforge.toml` image template.
///
/// Only the parts the package pipeline needs are modelled here; disk layout
/// and bootloader sections are consumed by other stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTemplate {
    pub image: ImageSection,

    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<CatalogSource>,
}

/// The `[image]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSection {
    pub name: String,
    #[serde(default)]
    pub distro: Option<String>,
    #[serde(default)]
    pub ecosystem: EcosystemKind,
    #[serde(default)]
    pub format: ImageFormat,
    /// Root packages requested for the image.
    #[serde(default)]
    pub packages: Vec<String>,
}

/// Resolver settings from `[resolver]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSection {
    /// Prefer candidates from the same repository as the package requiring them.
    #[serde(
        default = "default_prefer_same_repository",
        rename = "prefer-same-repository"
    )]
    pub prefer_same_repository: bool,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            prefer_same_repository: default_prefer_same_repository(),
        }
    }
}

fn default_prefer_same_repository() -> bool {
    true
}

/// A `[[catalog]]` entry pointing at a flattened catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSource {
    pub path: PathBuf,
}

impl ImageTemplate {
    /// Load and parse a template file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ImgforgeError::Template {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a template from a TOML string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        let template: Self = toml::from_str(content).map_err(|e| ImgforgeError::Template {
            message: format!("Failed to parse imgforge.toml: {e}"),
        })?;
        if template.image.name.trim().is_empty() {
            return Err(ImgforgeError::Template {
                message: "[image] name must not be empty".to_string(),
            }
            .into());
        }
        Ok(template)
    }

    /// Catalog paths, with relative entries resolved against `template_dir`.
    pub fn catalog_paths(&self, template_dir: &Path) -> Vec<PathBuf> {
        self.catalogs
            .iter()
            .map(|c| resolve_relative(template_dir, &c.path))
            .collect()
    }
}
