//! Handler for `imgforge resolve`.

use std::path::PathBuf;

use imgforge_ops::ops_resolve;
use miette::Result;

pub fn exec(template: Option<PathBuf>, json: bool) -> Result<()> {
    let path = super::template_path(template)?;
    ops_resolve::resolve(&path, json)
}
