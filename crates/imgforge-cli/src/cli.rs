//! CLI argument definitions for imgforge.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use imgforge_core::package::EcosystemKind;

#[derive(Parser, Debug)]
#[command(
    name = "imgforge",
    version,
    about = "Resolve the package set of an OS image",
    long_about = "imgforge turns an image template and flattened repository catalogs into a \
                  closed, conflict-free package set for Debian- or RPM-based images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the image's packages and print them
    Resolve {
        /// Image template (defaults to the nearest imgforge.toml)
        #[arg(short, long)]
        template: Option<PathBuf>,
        /// Print the resolved packages as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve and write imgforge.lock next to the template
    Lock {
        /// Image template (defaults to the nearest imgforge.toml)
        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// Display the dependency tree
    Tree {
        /// Image template (defaults to the nearest imgforge.toml)
        #[arg(short, long)]
        template: Option<PathBuf>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<u32>,
        /// Show why a package is part of the image
        #[arg(long)]
        why: Option<String>,
        /// With --why: show what depends on the package
        #[arg(long)]
        inverted: bool,
        /// Show the installation order
        #[arg(long)]
        order: bool,
        /// Show version overrides applied during resolution
        #[arg(long)]
        conflicts: bool,
    },

    /// Compare two version strings
    Vercmp {
        a: String,
        b: String,
        /// Version ordering to use: deb or rpm
        #[arg(short, long, default_value = "deb")]
        ecosystem: EcosystemKind,
    },
}

/// Parse command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}
