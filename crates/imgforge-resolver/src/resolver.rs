//! Worklist resolution of a requested package set into its transitive closure.
//!
//! Roots are selected first, then each selected package pushes its literal
//! requirements and its version clauses onto a FIFO worklist. Items reached
//! through an OR-group are *alternative*: their constraints never override a
//! selection made for a literal (*direct*) requirement. Replacing a selection
//! keeps its position in the output; anything left unreachable by a
//! replacement is pruned once the worklist drains.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ptr;

use imgforge_core::package::PackageInfo;
use tracing::{debug, info, warn};

use crate::catalog::CatalogIndex;
use crate::conflict::{ConflictDetector, ConflictReport, Demand, VersionOverride};
use crate::constraint::{Bound, ClauseTerm, DependencyClause};
use crate::ecosystem::{Debian, Ecosystem};
use crate::error::ResolveError;
use crate::graph::{DepEdge, DependencyGraph, ResolvedNode};
use crate::version::ConstraintOp;

/// Requester label used for the packages the caller asked for.
pub const REQUESTED: &str = "<requested>";

/// Knobs for a resolve call, passed in explicitly by the caller.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Prefer candidates served from the requester's repository.
    pub prefer_same_repository: bool,
    /// Label of the synthetic root node in the dependency graph.
    pub image_name: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            prefer_same_repository: true,
            image_name: "image".to_string(),
        }
    }
}

/// The output of a successful resolve call.
pub struct Resolution {
    /// Roots first, then packages in the order they were first selected.
    pub packages: Vec<PackageInfo>,
    pub graph: DependencyGraph,
    pub overrides: ConflictReport,
}

/// Dependency resolver parameterised over the package ecosystem.
pub struct Resolver<'e> {
    ecosystem: &'e dyn Ecosystem,
    options: ResolveOptions,
}

impl<'e> Resolver<'e> {
    pub fn new(ecosystem: &'e dyn Ecosystem) -> Self {
        Self {
            ecosystem,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `requested` against the catalog `all`.
    ///
    /// Either every requirement is satisfied or the call fails as a whole;
    /// there is no partial result.
    pub fn resolve(
        &self,
        requested: &[PackageInfo],
        all: &[PackageInfo],
    ) -> Result<Resolution, ResolveError> {
        let mut session = Session::new(self.ecosystem, &self.options, all);
        for root in requested {
            session.seed_root(root)?;
        }
        while let Some(item) = session.queue.pop_front() {
            session.process(item)?;
        }
        session.finish()
    }

    /// Highest version among the candidates called `name`; ties keep the first.
    pub fn top_package(&self, name: &str, candidates: &[PackageInfo]) -> Option<PackageInfo> {
        let mut best: Option<&PackageInfo> = None;
        for pkg in candidates.iter().filter(|p| p.name == name) {
            best = match best {
                Some(current)
                    if self.ecosystem.compare(&pkg.version, &current.version)
                        != Ordering::Greater =>
                {
                    Some(current)
                }
                _ => Some(pkg),
            };
        }
        best.cloned()
    }
}

/// Resolve with Debian version semantics and default options.
pub fn resolve(
    requested: &[PackageInfo],
    all: &[PackageInfo],
) -> Result<Vec<PackageInfo>, ResolveError> {
    Resolver::new(&Debian)
        .resolve(requested, all)
        .map(|resolution| resolution.packages)
}

/// Pick the highest Debian version of `name` among `candidates`.
pub fn resolve_top_package_conflicts(name: &str, candidates: &[PackageInfo]) -> Option<PackageInfo> {
    Resolver::new(&Debian).top_package(name, candidates)
}

/// The repository a package URL is served from.
///
/// Debian pools and RPM `Packages/` trees cut at the tree marker; anything
/// else uses the parent directory.
pub fn repository_base(url: &str) -> Option<&str> {
    if url.is_empty() {
        return None;
    }
    for marker in ["/pool/", "/Packages/"] {
        if let Some(idx) = url.find(marker) {
            return Some(&url[..idx]);
        }
    }
    match url.rfind('/') {
        Some(idx) if idx > 0 => Some(&url[..idx]),
        _ => None,
    }
}

struct WorkItem<'a> {
    terms: Vec<ClauseTerm>,
    requirer: Option<&'a PackageInfo>,
    direct: bool,
}

struct Selected<'a> {
    pkg: &'a PackageInfo,
    direct: bool,
    /// Bounds collected from alternative requesters; empty once direct.
    bounds: Vec<Bound>,
    requirer: String,
}

enum TermOutcome {
    /// Satisfied by the named package.
    Satisfied(String),
    /// Already selected for a direct requirement that this term's bound rejects.
    HeldByDirect,
    Unavailable,
}

struct Session<'r, 'a> {
    ecosystem: &'r dyn Ecosystem,
    options: &'r ResolveOptions,
    index: CatalogIndex<'a>,
    selected: HashMap<String, Selected<'a>>,
    order: Vec<String>,
    roots: Vec<String>,
    queue: VecDeque<WorkItem<'a>>,
    expanded: HashSet<(String, String, bool)>,
    edges: HashMap<(String, String), Vec<(String, bool)>>,
    detector: ConflictDetector,
    /// Selections not reachable from any root as of the last liveness pass.
    orphans: HashSet<String>,
    report: ConflictReport,
}

fn label(requirer: Option<&PackageInfo>) -> String {
    requirer.map_or_else(|| REQUESTED.to_string(), |p| p.name.clone())
}

fn bounds_text(bounds: &[Bound]) -> String {
    if bounds.is_empty() {
        "any version".to_string()
    } else {
        bounds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'r, 'a> Session<'r, 'a> {
    fn new(ecosystem: &'r dyn Ecosystem, options: &'r ResolveOptions, all: &'a [PackageInfo]) -> Self {
        let index = CatalogIndex::build(ecosystem, all);
        if index.is_empty() {
            warn!("resolving against an empty catalog");
        } else {
            debug!(names = index.len(), entries = all.len(), "indexed catalog");
        }
        Self {
            ecosystem,
            options,
            index,
            selected: HashMap::new(),
            order: Vec::new(),
            roots: Vec::new(),
            queue: VecDeque::new(),
            expanded: HashSet::new(),
            edges: HashMap::new(),
            detector: ConflictDetector::new(),
            orphans: HashSet::new(),
            report: ConflictReport::new(),
        }
    }

    fn seed_root(&mut self, req: &PackageInfo) -> Result<(), ResolveError> {
        if !self.index.contains_name(&req.name) {
            return Err(ResolveError::Missing {
                capability: req.name.clone(),
                requirer: REQUESTED.to_string(),
            });
        }
        let versions = self.index.by_name(&req.name);

        let chosen = if req.version.is_empty() {
            self.best(versions, None)
        } else {
            let matching: Vec<&'a PackageInfo> = versions
                .iter()
                .copied()
                .filter(|p| self.ecosystem.compare(&p.version, &req.version) == Ordering::Equal)
                .collect();
            matching
                .iter()
                .copied()
                .find(|p| !req.url.is_empty() && p.url == req.url)
                .or_else(|| matching.first().copied())
        };
        let Some(pkg) = chosen else {
            return Err(ResolveError::Missing {
                capability: format!("{} (= {})", req.name, req.version),
                requirer: REQUESTED.to_string(),
            });
        };

        if let Some(existing) = self.selected.get(&pkg.name) {
            if self.ecosystem.compare(&existing.pkg.version, &pkg.version) == Ordering::Equal {
                return Ok(());
            }
            return Err(ResolveError::Conflicting {
                capability: pkg.name.clone(),
                first: format!("= {} (required by {REQUESTED})", existing.pkg.version),
                second: format!("= {} (required by {REQUESTED})", pkg.version),
            });
        }

        if !req.version.is_empty() {
            let pin = Bound::new(ConstraintOp::Eq, pkg.version.clone());
            self.detector
                .record(self.ecosystem, &pkg.name, Demand::new(REQUESTED, "", pin))?;
        }

        debug!(package = %pkg.name, version = %pkg.version, "selected root");
        self.insert(pkg, true, Vec::new(), REQUESTED.to_string());
        self.roots.push(pkg.name.clone());
        self.expand(pkg, true);
        Ok(())
    }

    /// Push the requirements of `pkg` onto the worklist.
    fn expand(&mut self, pkg: &'a PackageInfo, direct: bool) {
        if !self
            .expanded
            .insert((pkg.name.clone(), pkg.version.clone(), direct))
        {
            return;
        }

        let mut clauses = Vec::with_capacity(pkg.requires_ver.len());
        for raw in &pkg.requires_ver {
            match self.ecosystem.parse_clause(raw) {
                Ok(clause) => clauses.push(clause),
                Err(err) => warn!(package = %pkg.name, "{err}; skipping clause"),
            }
        }
        let mut covered = vec![false; clauses.len()];
        let mut seen = HashSet::new();

        for raw in &pkg.requires {
            let literal = match self.ecosystem.parse_clause(raw) {
                Ok(clause) => clause,
                Err(err) => {
                    warn!(package = %pkg.name, "{err}; skipping requirement");
                    continue;
                }
            };
            if literal.is_alternative_group() {
                self.push(literal.terms, pkg, false);
                continue;
            }
            let Some(term) = literal.terms.into_iter().next() else {
                continue;
            };
            if !seen.insert(term.name.clone()) {
                continue;
            }

            let mut bounds: Vec<Bound> = term.bound.into_iter().collect();
            for (i, clause) in clauses.iter().enumerate() {
                if !clause.is_alternative_group() && clause.terms[0].name == term.name {
                    covered[i] = true;
                    bounds.extend(clause.terms[0].bound.iter().cloned());
                }
            }

            if bounds.is_empty() {
                self.push(vec![ClauseTerm::bare(term.name)], pkg, direct);
            } else {
                for bound in bounds {
                    let term = ClauseTerm {
                        name: term.name.clone(),
                        bound: Some(bound),
                    };
                    self.push(vec![term], pkg, direct);
                }
            }
        }

        for (clause, done) in clauses.into_iter().zip(covered) {
            if done {
                continue;
            }
            let item_direct = direct && !clause.is_alternative_group();
            self.push(clause.terms, pkg, item_direct);
        }
    }

    fn push(&mut self, terms: Vec<ClauseTerm>, requirer: &'a PackageInfo, direct: bool) {
        self.queue.push_back(WorkItem {
            terms,
            requirer: Some(requirer),
            direct,
        });
    }

    fn process(&mut self, item: WorkItem<'a>) -> Result<(), ResolveError> {
        if let Some(requirer) = item.requirer {
            let current = self
                .selected
                .get(&requirer.name)
                .is_some_and(|sel| ptr::eq(sel.pkg, requirer));
            if !current {
                // queued by a selection that has since been replaced
                return Ok(());
            }
        }

        let alternative = item.terms.len() > 1;
        if alternative {
            if let Some(target) = self.group_already_satisfied(&item) {
                self.link(item.requirer, &target, true);
                return Ok(());
            }
        }

        let mut fallback: Option<&ClauseTerm> = None;
        for term in &item.terms {
            match self.try_term(&item, term)? {
                TermOutcome::Satisfied(target) => {
                    self.link(item.requirer, &target, alternative);
                    return Ok(());
                }
                TermOutcome::HeldByDirect => {
                    fallback.get_or_insert(term);
                }
                TermOutcome::Unavailable => {}
            }
        }

        if let Some(term) = fallback {
            if let Some(sel) = self.selected.get(&term.name) {
                let resolved = sel.pkg.version.clone();
                self.record_override(term, &item, resolved, "direct selection kept");
                self.link(item.requirer, &term.name, alternative);
                return Ok(());
            }
        }

        Err(ResolveError::Missing {
            capability: DependencyClause {
                terms: item.terms.clone(),
            }
            .to_string(),
            requirer: label(item.requirer),
        })
    }

    /// An OR-group is already met when one of its terms is resolved and
    /// either satisfies its bound or was selected directly.
    fn group_already_satisfied(&mut self, item: &WorkItem<'a>) -> Option<String> {
        for term in &item.terms {
            let bound = term.bound.as_ref();
            if let Some(sel) = self.selected.get(&term.name) {
                if self.bound_ok(&sel.pkg.version, bound) {
                    return Some(term.name.clone());
                }
                if sel.direct {
                    let resolved = sel.pkg.version.clone();
                    self.record_override(
                        term,
                        item,
                        resolved,
                        "direct dependency wins over alternative constraint",
                    );
                    return Some(term.name.clone());
                }
            } else if let Some(provider) = self.resolved_provider(&term.name, bound) {
                return Some(provider.name.clone());
            }
        }
        None
    }

    fn try_term(&mut self, item: &WorkItem<'a>, term: &ClauseTerm) -> Result<TermOutcome, ResolveError> {
        let bound = term.bound.as_ref();
        if item.direct {
            if let Some(bound) = bound {
                let version = item.requirer.map_or("", |p| p.version.as_str());
                let demand = Demand::new(label(item.requirer), version, bound.clone());
                self.detector.record(self.ecosystem, &term.name, demand)?;
            }
        }

        let Some(sel) = self.selected.get(&term.name) else {
            return self.select_new(item, term);
        };
        let current = sel.pkg;
        let was_direct = sel.direct;

        if item.direct && !was_direct {
            return self.promote(item, term, current);
        }
        if self.bound_ok(&current.version, bound) {
            if !item.direct {
                if let (Some(bound), Some(sel)) = (bound, self.selected.get_mut(&term.name)) {
                    if !sel.direct && !sel.bounds.contains(bound) {
                        sel.bounds.push(bound.clone());
                    }
                }
            }
            return Ok(TermOutcome::Satisfied(term.name.clone()));
        }

        match (was_direct, item.direct) {
            (true, true) => self.replace_direct(item, term, current),
            (true, false) => Ok(TermOutcome::HeldByDirect),
            _ => self.reselect_shared(item, term),
        }
    }

    /// A direct requirement reached a package chosen only through alternatives:
    /// re-select it using direct bounds alone.
    fn promote(
        &mut self,
        item: &WorkItem<'a>,
        term: &ClauseTerm,
        current: &'a PackageInfo,
    ) -> Result<TermOutcome, ResolveError> {
        let bound = term.bound.as_ref();
        let versions = self.index.by_name(&term.name);
        let admissible: Vec<&'a PackageInfo> = versions
            .iter()
            .copied()
            .filter(|p| {
                self.bound_ok(&p.version, bound)
                    && self.detector.admits(self.ecosystem, &term.name, &p.version)
            })
            .collect();
        let Some(chosen) = self.best(&admissible, item.requirer) else {
            if versions.iter().any(|p| self.bound_ok(&p.version, bound)) {
                return Err(self
                    .detector
                    .unsatisfiable(self.ecosystem, &term.name, versions));
            }
            return Ok(TermOutcome::Unavailable);
        };

        if !ptr::eq(chosen, current) {
            if let Some(previous) = self.selected.get(&term.name) {
                self.report.add(VersionOverride {
                    capability: term.name.clone(),
                    requested: bounds_text(&previous.bounds),
                    requirer: previous.requirer.clone(),
                    resolved: chosen.version.clone(),
                    reason: "direct dependency wins over alternative constraint".to_string(),
                });
            }
            debug!(
                package = %term.name,
                from = %current.version,
                to = %chosen.version,
                "direct requirement replaced alternative selection"
            );
        }
        self.insert(chosen, true, Vec::new(), label(item.requirer));
        self.expand(chosen, true);
        Ok(TermOutcome::Satisfied(term.name.clone()))
    }

    /// Two direct requirements disagree: move to a version every direct
    /// requester accepts, or fail.
    fn replace_direct(
        &mut self,
        item: &WorkItem<'a>,
        term: &ClauseTerm,
        current: &'a PackageInfo,
    ) -> Result<TermOutcome, ResolveError> {
        let bound = term.bound.as_ref();
        let versions = self.index.by_name(&term.name);
        if !versions.iter().any(|p| self.bound_ok(&p.version, bound)) {
            return Ok(TermOutcome::Unavailable);
        }
        let admissible: Vec<&'a PackageInfo> = versions
            .iter()
            .copied()
            .filter(|p| self.detector.admits(self.ecosystem, &term.name, &p.version))
            .collect();
        let Some(chosen) = self.best(&admissible, item.requirer) else {
            return Err(self
                .detector
                .unsatisfiable(self.ecosystem, &term.name, versions));
        };

        debug!(
            package = %term.name,
            from = %current.version,
            to = %chosen.version,
            "replaced selection to satisfy every direct requirement"
        );
        self.record_override(
            term,
            item,
            chosen.version.clone(),
            "replaced to satisfy every direct requirement",
        );
        self.insert(chosen, true, Vec::new(), label(item.requirer));
        self.expand(chosen, true);
        Ok(TermOutcome::Satisfied(term.name.clone()))
    }

    /// Both the selection and the new item come from alternatives: find a
    /// version that satisfies both sets of bounds.
    fn reselect_shared(
        &mut self,
        item: &WorkItem<'a>,
        term: &ClauseTerm,
    ) -> Result<TermOutcome, ResolveError> {
        let Some(sel) = self.selected.get(&term.name) else {
            return Ok(TermOutcome::Unavailable);
        };
        let mut bounds = sel.bounds.clone();
        let requirer = sel.requirer.clone();
        bounds.extend(term.bound.iter().cloned());

        let admissible: Vec<&'a PackageInfo> = self
            .index
            .by_name(&term.name)
            .iter()
            .copied()
            .filter(|p| {
                bounds.iter().all(|b| self.ecosystem.satisfies(&p.version, b))
                    && self.detector.admits(self.ecosystem, &term.name, &p.version)
            })
            .collect();
        let Some(chosen) = self.best(&admissible, item.requirer) else {
            return Ok(TermOutcome::Unavailable);
        };

        debug!(package = %term.name, to = %chosen.version, "narrowed alternative selection");
        self.insert(chosen, false, bounds, requirer);
        self.expand(chosen, false);
        Ok(TermOutcome::Satisfied(term.name.clone()))
    }

    fn select_new(&mut self, item: &WorkItem<'a>, term: &ClauseTerm) -> Result<TermOutcome, ResolveError> {
        let bound = term.bound.as_ref();
        if let Some(provider) = self.resolved_provider(&term.name, bound) {
            return Ok(TermOutcome::Satisfied(provider.name.clone()));
        }

        let pool: Vec<&'a PackageInfo> = self
            .index
            .providers(&term.name)
            .iter()
            .copied()
            .filter(|p| !self.selected.contains_key(&p.name) && self.provides_ok(p, &term.name, bound))
            .collect();
        if pool.is_empty() {
            return Ok(TermOutcome::Unavailable);
        }
        let admissible: Vec<&'a PackageInfo> = pool
            .iter()
            .copied()
            .filter(|p| {
                p.name != term.name || self.detector.admits(self.ecosystem, &term.name, &p.version)
            })
            .collect();
        let Some(chosen) = self.best(&admissible, item.requirer) else {
            return Err(self.detector.unsatisfiable(self.ecosystem, &term.name, &pool));
        };

        debug!(
            capability = %term.name,
            package = %chosen.name,
            version = %chosen.version,
            direct = item.direct,
            "selected"
        );
        let bounds = match bound {
            Some(b) if !item.direct && chosen.name == term.name => vec![b.clone()],
            _ => Vec::new(),
        };
        self.insert(chosen, item.direct, bounds, label(item.requirer));
        self.expand(chosen, item.direct);
        Ok(TermOutcome::Satisfied(chosen.name.clone()))
    }

    /// An already selected package, other than `capability` itself, that provides it.
    fn resolved_provider(&self, capability: &str, bound: Option<&Bound>) -> Option<&'a PackageInfo> {
        self.index
            .by_provides(capability)
            .iter()
            .copied()
            .find(|p| {
                self.selected
                    .get(&p.name)
                    .is_some_and(|sel| ptr::eq(sel.pkg, *p))
                    && self.provides_ok(p, capability, bound)
            })
    }

    /// Whether `pkg` satisfies `capability` under `bound`. A virtual provide
    /// only satisfies a bounded requirement when it declares an exact version.
    fn provides_ok(&self, pkg: &PackageInfo, capability: &str, bound: Option<&Bound>) -> bool {
        let Some(bound) = bound else {
            return true;
        };
        if pkg.name == capability {
            return self.ecosystem.satisfies(&pkg.version, bound);
        }
        pkg.provides
            .iter()
            .filter_map(|raw| self.ecosystem.parse_clause(raw).ok())
            .filter_map(|clause| clause.terms.into_iter().next())
            .filter(|t| t.name == capability)
            .any(|t| match &t.bound {
                Some(provided) if provided.op == ConstraintOp::Eq => {
                    self.ecosystem.satisfies(&provided.version, bound)
                }
                _ => false,
            })
    }

    fn bound_ok(&self, version: &str, bound: Option<&Bound>) -> bool {
        bound.map_or(true, |b| self.ecosystem.satisfies(version, b))
    }

    /// Pick among equally valid candidates: same repository as the requester
    /// first, then highest version, then smallest name, then catalog order.
    fn best(&self, candidates: &[&'a PackageInfo], requirer: Option<&PackageInfo>) -> Option<&'a PackageInfo> {
        let affinity = requirer
            .filter(|_| self.options.prefer_same_repository)
            .and_then(|r| repository_base(&r.url));
        let preferred: Vec<&'a PackageInfo> = match affinity {
            Some(base) => candidates
                .iter()
                .copied()
                .filter(|c| repository_base(&c.url) == Some(base))
                .collect(),
            None => Vec::new(),
        };
        let pool = if preferred.is_empty() {
            candidates
        } else {
            preferred.as_slice()
        };

        let mut best: Option<&'a PackageInfo> = None;
        for &candidate in pool {
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let better = match self.ecosystem.compare(&candidate.version, &current.version) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => candidate.name < current.name,
                    };
                    Some(if better { candidate } else { current })
                }
            };
        }
        best
    }

    fn insert(&mut self, pkg: &'a PackageInfo, direct: bool, bounds: Vec<Bound>, requirer: String) {
        let mut replaced = None;
        match self.selected.get(&pkg.name) {
            None => self.order.push(pkg.name.clone()),
            Some(previous) if !ptr::eq(previous.pkg, pkg) => {
                // its queued items are now stale; allow a later reinstatement to expand again
                let version = previous.pkg.version.clone();
                for direct in [false, true] {
                    self.expanded
                        .remove(&(pkg.name.clone(), version.clone(), direct));
                }
                replaced = Some(version);
            }
            Some(_) => {}
        }
        self.selected.insert(
            pkg.name.clone(),
            Selected {
                pkg,
                direct,
                bounds,
                requirer,
            },
        );

        if let Some(version) = replaced {
            self.detector.retract(&pkg.name, &version);
            self.refresh_liveness();
        }
    }

    /// Names of the selections reachable from the roots through the edges of
    /// their current versions.
    fn reachable(&self) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = self.roots.iter().map(String::as_str).collect();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.to_string()) {
                continue;
            }
            let Some(sel) = self.selected.get(name) else {
                continue;
            };
            let key = (sel.pkg.name.clone(), sel.pkg.version.clone());
            for (target, _) in self.edges.get(&key).into_iter().flatten() {
                queue.push_back(target);
            }
        }
        seen
    }

    /// Mark selections cut off from every root as inactive requesters, so
    /// their demands stop constraining the live part of the closure.
    fn refresh_liveness(&mut self) {
        let live = self.reachable();
        let inactive: HashMap<String, String> = self
            .selected
            .iter()
            .filter(|(name, _)| !live.contains(*name))
            .map(|(name, sel)| (name.clone(), sel.pkg.version.clone()))
            .collect();
        if !inactive.is_empty() {
            debug!(count = inactive.len(), "requesters cut off from the roots");
        }
        self.orphans = inactive.keys().cloned().collect();
        self.detector.set_inactive(inactive);
    }

    /// Check every demand of a reachable requester against the final selection.
    fn verify_demands(&self, reachable: &HashSet<String>) -> Result<(), ResolveError> {
        let current = |name: &str| {
            self.selected
                .get(name)
                .filter(|_| reachable.contains(name))
                .map(|sel| sel.pkg)
        };
        let mut demands: Vec<(&str, &Demand)> = self.detector.iter().collect();
        demands.sort_by(|a, b| a.0.cmp(b.0));
        for (capability, demand) in demands {
            let live = demand.requirer == REQUESTED
                || current(demand.requirer.as_str()).is_some_and(|p| p.version == demand.requirer_version);
            if !live {
                continue;
            }
            let bound = Some(&demand.bound);
            let met = current(capability).is_some_and(|p| self.provides_ok(p, capability, bound))
                || self.index.by_provides(capability).iter().any(|p| {
                    current(p.name.as_str()).is_some_and(|sel| ptr::eq(sel, *p))
                        && self.provides_ok(p, capability, bound)
                });
            if !met {
                let resolved = current(capability)
                    .map_or_else(|| "nothing selected".to_string(), |p| format!("{} selected", p.version));
                return Err(ResolveError::Conflicting {
                    capability: capability.to_string(),
                    first: demand.to_string(),
                    second: resolved,
                });
            }
        }
        Ok(())
    }

    fn record_override(&mut self, term: &ClauseTerm, item: &WorkItem<'a>, resolved: String, reason: &str) {
        self.report.add(VersionOverride {
            capability: term.name.clone(),
            requested: term
                .bound
                .as_ref()
                .map_or_else(|| "any version".to_string(), ToString::to_string),
            requirer: label(item.requirer),
            resolved,
            reason: reason.to_string(),
        });
    }

    fn link(&mut self, requirer: Option<&PackageInfo>, target: &str, alternative: bool) {
        let Some(requirer) = requirer else {
            return;
        };
        let deps = self
            .edges
            .entry((requirer.name.clone(), requirer.version.clone()))
            .or_default();
        if !deps.iter().any(|(name, _)| name == target) {
            deps.push((target.to_string(), alternative));
        }
        if self.orphans.contains(target) {
            self.refresh_liveness();
        }
    }

    fn build_graph(&self, keep: Option<&HashSet<String>>) -> DependencyGraph {
        let kept = |name: &str| keep.map_or(true, |k| k.contains(name));
        let mut graph = DependencyGraph::new();
        let root = graph.add_node(ResolvedNode::new(self.options.image_name.clone(), "", ""));
        graph.set_root(root);

        for name in self.order.iter().filter(|n| kept(n)) {
            if let Some(sel) = self.selected.get(name) {
                graph.add_node(ResolvedNode::new(
                    sel.pkg.name.clone(),
                    sel.pkg.version.clone(),
                    sel.pkg.url.clone(),
                ));
            }
        }
        for name in &self.roots {
            if let Some(idx) = graph.find(name) {
                graph.add_edge(root, idx, DepEdge { alternative: false });
            }
        }
        for name in self.order.iter().filter(|n| kept(n)) {
            let Some(sel) = self.selected.get(name) else {
                continue;
            };
            let Some(from) = graph.find(name) else {
                continue;
            };
            let key = (sel.pkg.name.clone(), sel.pkg.version.clone());
            for (target, alternative) in self.edges.get(&key).into_iter().flatten() {
                if let Some(to) = graph.find(target) {
                    graph.add_edge(
                        from,
                        to,
                        DepEdge {
                            alternative: *alternative,
                        },
                    );
                }
            }
        }
        graph
    }

    fn finish(self) -> Result<Resolution, ResolveError> {
        let mut graph = self.build_graph(None);
        let reachable = graph.reachable_from_root();
        if reachable.len() != self.order.len() {
            debug!(
                pruned = self.order.len() - reachable.len(),
                "pruned packages left behind by replaced selections"
            );
            graph = self.build_graph(Some(&reachable));
        }
        self.verify_demands(&reachable)?;

        let packages: Vec<PackageInfo> = self
            .order
            .iter()
            .filter(|name| reachable.contains(*name))
            .filter_map(|name| self.selected.get(name))
            .map(|sel| sel.pkg.clone())
            .collect();

        info!(
            packages = packages.len(),
            overrides = self.report.len(),
            "resolution complete"
        );
        Ok(Resolution {
            packages,
            graph,
            overrides: self.report,
        })
    }
}
