//! Operations behind the `imgforge` commands.
//!
//! Each operation takes explicit paths and options, loads what it needs
//! from disk and hands pure data to the resolver.

pub mod ops_lock;
pub mod ops_resolve;
pub mod ops_tree;
pub mod ops_vercmp;
