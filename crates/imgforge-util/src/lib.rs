//! Shared utilities for imgforge.
//!
//! Cross-cutting concerns used by the other imgforge crates: the unified
//! error type and a couple of filesystem helpers.

pub mod errors;
pub mod fs;
