//! Operation: resolve the package set of an image template.

use std::path::Path;

use imgforge_core::catalog::load_catalogs;
use imgforge_core::package::PackageInfo;
use imgforge_core::template::ImageTemplate;
use imgforge_resolver::{for_kind, Resolution, ResolveOptions, Resolver};
use imgforge_util::errors::ImgforgeError;
use tracing::{debug, info};

/// A template together with its resolved package set.
pub struct ImageResolution {
    pub template: ImageTemplate,
    pub resolution: Resolution,
}

/// Load the template at `template_path` and its catalogs, then resolve the
/// requested packages.
pub fn resolve_image(template_path: &Path) -> miette::Result<ImageResolution> {
    let template = ImageTemplate::from_path(template_path)?;
    let template_dir = template_path.parent().unwrap_or_else(|| Path::new("."));
    let catalog_paths = template.catalog_paths(template_dir);
    if catalog_paths.is_empty() {
        return Err(ImgforgeError::Template {
            message: "no [[catalog]] entries; nothing to resolve against".to_string(),
        }
        .into());
    }
    let catalog = load_catalogs(&catalog_paths)?;
    info!(
        image = %template.image.name,
        ecosystem = %template.image.ecosystem,
        catalog = catalog.len(),
        "resolving image"
    );

    let resolver = Resolver::new(for_kind(template.image.ecosystem)).with_options(ResolveOptions {
        prefer_same_repository: template.resolver.prefer_same_repository,
        image_name: template.image.name.clone(),
    });
    let requested = requested_packages(&template.image.packages);
    debug!(roots = requested.len(), "requested packages");
    let resolution = resolver
        .resolve(&requested, &catalog)
        .map_err(|e| ImgforgeError::Resolution {
            message: e.to_string(),
        })?;

    Ok(ImageResolution {
        template,
        resolution,
    })
}

/// Turn template package entries into resolver roots.
///
/// `name=version` pins a version. A bare name leaves the version open, so the
/// resolver starts from the top catalog version but may move off it when a
/// dependency asks for an older one.
pub fn requested_packages(entries: &[String]) -> Vec<PackageInfo> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((name, version)) => PackageInfo::new(name.trim(), version.trim()),
            None => PackageInfo::new(entry.trim(), ""),
        })
        .collect()
}

/// Print the resolved package set, one `name version url` line per package
/// or as a JSON array.
pub fn resolve(template_path: &Path, json: bool) -> miette::Result<()> {
    let resolved = resolve_image(template_path)?;
    let packages = &resolved.resolution.packages;

    if json {
        let out = serde_json::to_string_pretty(packages).map_err(|e| ImgforgeError::Generic {
            message: format!("Failed to serialize resolution: {e}"),
        })?;
        println!("{out}");
    } else {
        for pkg in packages {
            if pkg.url.is_empty() {
                println!("{} {}", pkg.name, pkg.version);
            } else {
                println!("{} {} {}", pkg.name, pkg.version, pkg.url);
            }
        }
    }

    if !resolved.resolution.overrides.is_empty() {
        eprintln!(
            "note: {} version override(s); run `imgforge tree --conflicts` for details",
            resolved.resolution.overrides.len()
        );
    }
    eprintln!(
        "Resolved {} packages for {}",
        packages.len(),
        resolved.template.image.name
    );
    Ok(())
}
