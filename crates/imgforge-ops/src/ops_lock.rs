//! Operation: resolve an image and write imgforge.lock next to its template.

use std::path::{Path, PathBuf};

use imgforge_core::lockfile::{ImageLock, LockedPackage};
use imgforge_core::LOCK_FILE;

use crate::ops_resolve::{resolve_image, ImageResolution};

/// Resolve the template and regenerate the lockfile. Returns the lockfile path.
pub fn lock(template_path: &Path) -> miette::Result<PathBuf> {
    let resolved = resolve_image(template_path)?;
    let lockfile = to_lockfile(&resolved);

    let dir = template_path.parent().unwrap_or_else(|| Path::new("."));
    let lock_path = dir.join(LOCK_FILE);
    lockfile.write(&lock_path)?;

    eprintln!(
        "Locked {} packages into {}",
        lockfile.package.len(),
        lock_path.display()
    );
    Ok(lock_path)
}

/// Build the lockfile content, keeping resolution order and graph edges.
pub fn to_lockfile(resolved: &ImageResolution) -> ImageLock {
    let graph = &resolved.resolution.graph;
    let package = resolved
        .resolution
        .packages
        .iter()
        .map(|pkg| {
            let dependencies = graph
                .find(&pkg.name)
                .map(|idx| {
                    graph
                        .dependencies_of(idx)
                        .into_iter()
                        .map(|(dep, _)| graph.node(dep).name.clone())
                        .collect()
                })
                .unwrap_or_default();
            LockedPackage {
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                url: pkg.url.clone(),
                dependencies,
            }
        })
        .collect();

    ImageLock {
        image: resolved.template.image.name.clone(),
        ecosystem: resolved.template.image.ecosystem,
        package,
    }
}
