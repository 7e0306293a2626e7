//! Per-ecosystem strategy injected into the resolver.
//!
//! The resolution algorithm is the same for every package format; only the
//! version ordering and the clause syntax differ.

use std::cmp::Ordering;
use std::fmt;

use imgforge_core::package::EcosystemKind;

use crate::constraint::{
    self, Bound, DependencyClause, MalformedConstraint, VersionConstraint,
};
use crate::version;

/// Version ordering plus dependency clause syntax of one package format.
pub trait Ecosystem: fmt::Debug + Send + Sync {
    fn kind(&self) -> EcosystemKind;

    /// Total order over version strings. Never fails.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Whether `version` satisfies `bound`.
    fn satisfies(&self, version: &str, bound: &Bound) -> bool {
        bound.op.accepts(self.compare(version, &bound.version))
    }

    fn parse_clause(&self, raw: &str) -> Result<DependencyClause, MalformedConstraint>;

    /// Bare name of the first alternative in a raw clause.
    fn clean_dependency_name(&self, raw: &str) -> String;

    /// Constraints that `clauses` place on `dep_name`; `None` when no clause
    /// mentions it. Malformed clauses are skipped.
    fn extract_version_requirement(
        &self,
        clauses: &[String],
        dep_name: &str,
    ) -> Option<Vec<VersionConstraint>> {
        let parsed: Vec<DependencyClause> = clauses
            .iter()
            .filter_map(|raw| match self.parse_clause(raw) {
                Ok(clause) => Some(clause),
                Err(e) => {
                    tracing::debug!("{e}");
                    None
                }
            })
            .collect();
        constraint::constraints_for(&parsed, dep_name)
    }
}

/// Debian / Ubuntu: dpkg ordering and control-file relation syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct Debian;

impl Ecosystem for Debian {
    fn kind(&self) -> EcosystemKind {
        EcosystemKind::Deb
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        version::compare_debian(a, b)
    }

    fn parse_clause(&self, raw: &str) -> Result<DependencyClause, MalformedConstraint> {
        constraint::parse_debian_clause(raw)
    }

    fn clean_dependency_name(&self, raw: &str) -> String {
        constraint::clean_debian_name(raw)
    }
}

/// Fedora / RHEL / openSUSE: rpmvercmp ordering and RPM requirement syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rpm;

impl Ecosystem for Rpm {
    fn kind(&self) -> EcosystemKind {
        EcosystemKind::Rpm
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        version::compare_rpm(a, b)
    }

    fn satisfies(&self, version: &str, bound: &Bound) -> bool {
        bound
            .op
            .accepts(version::compare_rpm_to_target(version, &bound.version))
    }

    fn parse_clause(&self, raw: &str) -> Result<DependencyClause, MalformedConstraint> {
        constraint::parse_rpm_clause(raw)
    }

    fn clean_dependency_name(&self, raw: &str) -> String {
        constraint::clean_rpm_name(raw)
    }
}

/// The strategy for an ecosystem selected in configuration.
pub fn for_kind(kind: EcosystemKind) -> &'static dyn Ecosystem {
    match kind {
        EcosystemKind::Deb => &Debian,
        EcosystemKind::Rpm => &Rpm,
    }
}

/// Compare two Debian versions.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Debian.compare(a, b)
}

/// Whether a Debian `version` satisfies `bound`.
pub fn satisfies(version: &str, bound: &Bound) -> bool {
    Debian.satisfies(version, bound)
}

/// Constraints placed on `dep_name` by Debian `clauses`; `None` when not mentioned.
pub fn extract_version_requirement(
    clauses: &[String],
    dep_name: &str,
) -> Option<Vec<VersionConstraint>> {
    Debian.extract_version_requirement(clauses, dep_name)
}

/// Bare name of the first alternative of a Debian clause.
pub fn clean_dependency_name(raw: &str) -> String {
    Debian.clean_dependency_name(raw)
}
