//! Conflict detection across direct requesters, and reporting of the
//! non-fatal overrides applied during resolution.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use imgforge_core::package::PackageInfo;

use crate::constraint::Bound;
use crate::ecosystem::Ecosystem;
use crate::error::ResolveError;
use crate::version::ConstraintOp;

/// A version bound demanded by one direct requester.
///
/// The requester is identified by name and version, so the demands of a
/// selection that gets replaced can be withdrawn without touching the ones
/// its successor records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    pub requirer: String,
    pub requirer_version: String,
    pub bound: Bound,
}

impl Demand {
    pub fn new(requirer: impl Into<String>, requirer_version: impl Into<String>, bound: Bound) -> Self {
        Self {
            requirer: requirer.into(),
            requirer_version: requirer_version.into(),
            bound,
        }
    }

    fn same_requester(&self, other: &Demand) -> bool {
        self.requirer == other.requirer && self.requirer_version == other.requirer_version
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (required by {})", self.bound, self.requirer)
    }
}

/// Tracks the bounds direct requesters put on each capability.
///
/// Exact demands for different versions fail as soon as the second one is
/// recorded. Range demands are intersected lazily against the candidates the
/// engine is choosing from.
///
/// Requesters marked inactive (selected, but not reachable from any root)
/// keep their demands stored; those demands are ignored until the requester
/// is marked active again.
#[derive(Debug, Default)]
pub struct ConflictDetector {
    demands: HashMap<String, Vec<Demand>>,
    /// Inactive requesters, name to version.
    inactive: HashMap<String, String>,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a direct demand on `capability`.
    pub fn record(
        &mut self,
        ecosystem: &dyn Ecosystem,
        capability: &str,
        demand: Demand,
    ) -> Result<(), ResolveError> {
        let stored = self.demands.get(capability).map(Vec::as_slice).unwrap_or(&[]);
        if stored
            .iter()
            .any(|d| d.same_requester(&demand) && d.bound == demand.bound)
        {
            return Ok(());
        }

        if demand.bound.op == ConstraintOp::Eq && self.is_active(&demand) {
            let clash = self.demands(capability).find(|d| {
                d.bound.op == ConstraintOp::Eq
                    && d.requirer != demand.requirer
                    && ecosystem.compare(&d.bound.version, &demand.bound.version) != Ordering::Equal
            });
            if let Some(previous) = clash {
                return Err(conflicting(capability, previous, &demand));
            }
        }

        self.demands
            .entry(capability.to_string())
            .or_default()
            .push(demand);
        Ok(())
    }

    /// Drop every demand recorded by `requirer` at `version`.
    pub fn retract(&mut self, requirer: &str, version: &str) {
        for demands in self.demands.values_mut() {
            demands.retain(|d| !(d.requirer == requirer && d.requirer_version == version));
        }
    }

    /// Replace the set of inactive requesters, given as name to version.
    pub fn set_inactive(&mut self, inactive: HashMap<String, String>) {
        self.inactive = inactive;
    }

    fn is_active(&self, demand: &Demand) -> bool {
        self.inactive.get(&demand.requirer) != Some(&demand.requirer_version)
    }

    /// Active direct demands recorded for `capability`.
    pub fn demands<'s>(&'s self, capability: &str) -> impl Iterator<Item = &'s Demand> + 's {
        self.demands
            .get(capability)
            .into_iter()
            .flatten()
            .filter(move |d| self.is_active(d))
    }

    /// Every stored demand, active or not, with its capability.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Demand)> + '_ {
        self.demands
            .iter()
            .flat_map(|(capability, demands)| demands.iter().map(move |d| (capability.as_str(), d)))
    }

    /// Whether `version` satisfies every active demand on `capability`.
    pub fn admits(&self, ecosystem: &dyn Ecosystem, capability: &str, version: &str) -> bool {
        self.demands(capability)
            .all(|d| ecosystem.satisfies(version, &d.bound))
    }

    /// The error for a capability whose demands no candidate satisfies together.
    ///
    /// Names the first pair of active demands that no single candidate satisfies.
    pub fn unsatisfiable(
        &self,
        ecosystem: &dyn Ecosystem,
        capability: &str,
        candidates: &[&PackageInfo],
    ) -> ResolveError {
        let demands: Vec<&Demand> = self.demands(capability).collect();
        let both = |a: &Demand, b: &Demand| {
            candidates.iter().any(|c| {
                ecosystem.satisfies(&c.version, &a.bound) && ecosystem.satisfies(&c.version, &b.bound)
            })
        };
        for (i, &a) in demands.iter().enumerate() {
            for &b in &demands[i + 1..] {
                if !both(a, b) {
                    return conflicting(capability, a, b);
                }
            }
        }
        match (demands.first(), demands.last()) {
            (Some(&first), Some(&last)) => conflicting(capability, first, last),
            _ => ResolveError::Conflicting {
                capability: capability.to_string(),
                first: "no demands".to_string(),
                second: "no candidates".to_string(),
            },
        }
    }
}

fn conflicting(capability: &str, a: &Demand, b: &Demand) -> ResolveError {
    ResolveError::Conflicting {
        capability: capability.to_string(),
        first: a.to_string(),
        second: b.to_string(),
    }
}

/// A report of the constraints that were overridden during resolution.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub overrides: Vec<VersionOverride>,
}

/// A constraint that lost to another requirement without failing the resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOverride {
    pub capability: String,
    pub requested: String,
    pub requirer: String,
    pub resolved: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: VersionOverride) {
        self.overrides.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.overrides.is_empty() {
            return write!(f, "No version overrides.");
        }
        writeln!(f, "Version overrides ({}):", self.overrides.len())?;
        for o in &self.overrides {
            writeln!(
                f,
                "  {} requested {} by {} but resolved {} ({})",
                o.capability, o.requested, o.requirer, o.resolved, o.reason
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.capability, self.requested, self.resolved, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecosystem::Debian;

    #[test]
    fn exact_demands_from_distinct_requesters_conflict() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "shared-lib", Demand::new("app-a", "1", Bound::new(ConstraintOp::Eq, "1.0")))
            .unwrap();
        let err = detector
            .record(&Debian, "shared-lib", Demand::new("app-b", "1", Bound::new(ConstraintOp::Eq, "2.0")))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("conflicting"), "got: {msg}");
        assert!(msg.contains("= 1.0 (required by app-a)"), "got: {msg}");
        assert!(msg.contains("= 2.0 (required by app-b)"), "got: {msg}");
    }

    #[test]
    fn equal_exact_demands_are_fine() {
        let mut detector = ConflictDetector::new();
        let bound = Bound::new(ConstraintOp::Eq, "1.0");
        detector
            .record(&Debian, "lib", Demand::new("a", "1", bound.clone()))
            .unwrap();
        detector
            .record(&Debian, "lib", Demand::new("b", "1", Bound::new(ConstraintOp::Eq, "0:1.0")))
            .unwrap();
        detector
            .record(&Debian, "lib", Demand::new("a", "1", bound))
            .unwrap();
        assert_eq!(detector.demands("lib").count(), 2);
    }

    #[test]
    fn ranges_intersect() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "lib", Demand::new("a", "1", Bound::new(ConstraintOp::GreaterEq, "1.0")))
            .unwrap();
        detector
            .record(&Debian, "lib", Demand::new("b", "1", Bound::new(ConstraintOp::Less, "2.0")))
            .unwrap();
        assert!(detector.admits(&Debian, "lib", "1.5"));
        assert!(!detector.admits(&Debian, "lib", "2.0"));
        assert!(!detector.admits(&Debian, "lib", "0.9"));
        assert!(detector.admits(&Debian, "other", "0.1"));
    }

    #[test]
    fn unsatisfiable_names_exclusive_pair() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "lib", Demand::new("a", "1", Bound::new(ConstraintOp::GreaterEq, "2.0")))
            .unwrap();
        detector
            .record(&Debian, "lib", Demand::new("b", "1", Bound::new(ConstraintOp::Less, "1.5")))
            .unwrap();
        let v1 = PackageInfo::new("lib", "1.0");
        let v2 = PackageInfo::new("lib", "2.1");
        let err = detector.unsatisfiable(&Debian, "lib", &[&v1, &v2]);
        assert_eq!(
            err,
            ResolveError::Conflicting {
                capability: "lib".into(),
                first: ">= 2.0 (required by a)".into(),
                second: "<< 1.5 (required by b)".into(),
            }
        );
    }

    #[test]
    fn retracted_demands_no_longer_clash() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "zlib", Demand::new("y", "2.0", Bound::new(ConstraintOp::Eq, "2.0")))
            .unwrap();
        detector.retract("y", "2.0");
        detector
            .record(&Debian, "zlib", Demand::new("k", "1", Bound::new(ConstraintOp::Eq, "1.0")))
            .unwrap();
        assert!(detector.admits(&Debian, "zlib", "1.0"));
        assert_eq!(detector.iter().count(), 1);
    }

    #[test]
    fn retract_only_touches_that_version() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "zlib", Demand::new("y", "1.0", Bound::new(ConstraintOp::Less, "2.0")))
            .unwrap();
        detector.retract("y", "2.0");
        assert_eq!(detector.demands("zlib").count(), 1);
    }

    #[test]
    fn inactive_requesters_are_ignored_until_reactivated() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "zlib", Demand::new("h", "1", Bound::new(ConstraintOp::Eq, "2.0")))
            .unwrap();
        detector.set_inactive(HashMap::from([("h".to_string(), "1".to_string())]));
        detector
            .record(&Debian, "zlib", Demand::new("k", "1", Bound::new(ConstraintOp::Eq, "1.0")))
            .unwrap();
        assert!(detector.admits(&Debian, "zlib", "1.0"));

        detector.set_inactive(HashMap::new());
        assert!(!detector.admits(&Debian, "zlib", "1.0"));
        assert_eq!(detector.demands("zlib").count(), 2);
    }

    #[test]
    fn inactive_requester_does_not_fail_on_record() {
        let mut detector = ConflictDetector::new();
        detector
            .record(&Debian, "zlib", Demand::new("k", "1", Bound::new(ConstraintOp::Eq, "1.0")))
            .unwrap();
        detector.set_inactive(HashMap::from([("h".to_string(), "1".to_string())]));
        detector
            .record(&Debian, "zlib", Demand::new("h", "1", Bound::new(ConstraintOp::Eq, "2.0")))
            .unwrap();
        assert_eq!(detector.demands("zlib").count(), 1);
    }

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No version overrides.");
    }

    #[test]
    fn report_with_overrides() {
        let mut report = ConflictReport::new();
        report.add(VersionOverride {
            capability: "e2fsprogs".to_string(),
            requested: "<< 1.45.3-1~".to_string(),
            requirer: "initramfs-tools".to_string(),
            resolved: "1.47.0-2".to_string(),
            reason: "direct dependency wins over alternative".to_string(),
        });
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.contains("e2fsprogs requested << 1.45.3-1~ by initramfs-tools"));
        assert!(s.contains("but resolved 1.47.0-2"));
    }
}
