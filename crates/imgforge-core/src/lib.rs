//! Core data types for imgforge.
//!
//! This crate defines the records exchanged between the image-build
//! pipeline and the resolver: package metadata, the ecosystem selector,
//! image templates, flattened catalog files and the image lockfile.
//!
//! This crate is intentionally free of async code and network I/O.

/// Default template file name looked up by the CLI.
pub const TEMPLATE_FILE: &str = "imgforge.toml";

/// Default lockfile name written next to the template.
pub const LOCK_FILE: &str = "imgforge.lock";

pub mod catalog;
pub mod lockfile;
pub mod package;
pub mod template;
