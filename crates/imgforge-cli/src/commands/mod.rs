//! Command dispatch and handler modules.

mod lock;
mod resolve;
mod tree;
mod vercmp;

use std::path::PathBuf;

use imgforge_core::TEMPLATE_FILE;
use imgforge_util::errors::ImgforgeError;
use imgforge_util::fs::find_ancestor_with;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve { template, json } => resolve::exec(template, json),
        Command::Lock { template } => lock::exec(template),
        Command::Tree {
            template,
            depth,
            why,
            inverted,
            order,
            conflicts,
        } => tree::exec(template, depth, why, inverted, order, conflicts),
        Command::Vercmp { a, b, ecosystem } => vercmp::exec(&a, &b, ecosystem),
    }
}

/// The template given on the command line, or the nearest `imgforge.toml`
/// in the current directory or its ancestors.
pub(crate) fn template_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ImgforgeError::Template {
                message: format!("{} does not exist", path.display()),
            }
            .into());
        }
        return Ok(path);
    }

    let cwd = std::env::current_dir().map_err(ImgforgeError::Io)?;
    find_ancestor_with(&cwd, TEMPLATE_FILE)
        .map(|dir| dir.join(TEMPLATE_FILE))
        .ok_or_else(|| {
            ImgforgeError::Template {
                message: format!(
                    "No {TEMPLATE_FILE} found in current directory or any parent"
                ),
            }
            .into()
        })
}
