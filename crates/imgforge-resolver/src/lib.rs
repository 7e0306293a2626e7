//! Dependency resolution for OS images.
//!
//! Given the packages an image asks for and a flattened repository catalog,
//! the resolver computes a closed, conflict-free installation set. Version
//! ordering and clause syntax come from an injected [`Ecosystem`] strategy
//! ([`Debian`] or [`Rpm`]); the worklist algorithm is shared.
//!
//! Resolution is pure and synchronous: no I/O and no shared state between calls.

pub mod catalog;
pub mod conflict;
pub mod constraint;
pub mod ecosystem;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod version;

pub use conflict::{ConflictReport, VersionOverride};
pub use constraint::{Bound, ClauseError, DependencyClause, MalformedConstraint, VersionConstraint};
pub use ecosystem::{
    clean_dependency_name, compare_versions, extract_version_requirement, for_kind, satisfies,
    Debian, Ecosystem, Rpm,
};
pub use error::ResolveError;
pub use graph::DependencyGraph;
pub use resolver::{
    resolve, resolve_top_package_conflicts, Resolution, ResolveOptions, Resolver,
};
pub use version::ConstraintOp;
