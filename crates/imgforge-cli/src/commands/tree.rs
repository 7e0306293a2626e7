//! Handler for `imgforge tree`.

use std::path::PathBuf;

use imgforge_ops::ops_tree::{self, TreeOptions};
use miette::Result;

pub fn exec(
    template: Option<PathBuf>,
    depth: Option<u32>,
    why: Option<String>,
    inverted: bool,
    order: bool,
    conflicts: bool,
) -> Result<()> {
    let path = super::template_path(template)?;
    let opts = TreeOptions {
        depth: depth.map(|d| d as usize),
        why,
        inverted,
        order,
        conflicts,
    };
    ops_tree::tree(&path, &opts)
}
