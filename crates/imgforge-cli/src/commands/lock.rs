//! Handler for `imgforge lock`.

use std::path::PathBuf;

use imgforge_ops::ops_lock;
use miette::Result;

pub fn exec(template: Option<PathBuf>) -> Result<()> {
    let path = super::template_path(template)?;
    ops_lock::lock(&path)?;
    Ok(())
}
