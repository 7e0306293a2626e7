//! Operation: display the dependency tree of a resolved image.

use std::path::Path;

use imgforge_util::errors::ImgforgeError;

use crate::ops_resolve::{resolve_image, ImageResolution};

/// Options for `imgforge tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show how one package is reached.
    pub why: Option<String>,
    /// With `why`: show the packages depending on it instead.
    pub inverted: bool,
    /// Show the installation order.
    pub order: bool,
    /// Show version overrides applied during resolution.
    pub conflicts: bool,
}

/// Print the requested view of the image's dependency graph.
pub fn tree(template_path: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let resolved = resolve_image(template_path)?;
    print!("{}", render(&resolved, opts)?);
    Ok(())
}

/// Render the view selected by `opts`.
pub fn render(resolved: &ImageResolution, opts: &TreeOptions) -> miette::Result<String> {
    let graph = &resolved.resolution.graph;

    if opts.inverted {
        let Some(target) = opts.why.as_deref() else {
            return Err(ImgforgeError::Generic {
                message: "--inverted needs a package name given with --why".to_string(),
            }
            .into());
        };
        let out = graph.print_inverted_tree(target);
        if out.is_empty() {
            return Ok(format!("Package '{target}' is not part of the image.\n"));
        }
        return Ok(out);
    }

    if let Some(target) = opts.why.as_deref() {
        let Some(path) = graph.find_path(target) else {
            return Ok(format!("Package '{target}' is not part of the image.\n"));
        };
        let mut out = format!("Path to {target}:\n");
        for (i, node) in path.iter().enumerate() {
            out.push_str(&format!("{}{node}\n", "  ".repeat(i)));
        }
        return Ok(out);
    }

    if opts.conflicts {
        let mut out = resolved.resolution.overrides.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        return Ok(out);
    }

    if opts.order {
        let mut out = String::new();
        for (i, group) in graph.install_order().iter().enumerate() {
            let names: Vec<String> = group.iter().map(ToString::to_string).collect();
            let cycle = if group.len() > 1 { " (cycle)" } else { "" };
            out.push_str(&format!("{:>4}. {}{cycle}\n", i + 1, names.join(", ")));
        }
        return Ok(out);
    }

    Ok(graph.print_tree(opts.depth))
}
