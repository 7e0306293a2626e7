//! Name- and capability-indexed view over a flat package catalog.

use std::collections::{HashMap, HashSet};

use imgforge_core::package::PackageInfo;

use crate::ecosystem::Ecosystem;

/// Immutable lookup index built once per resolve call.
///
/// Entries borrow from the caller's catalog; nothing is copied or mutated.
#[derive(Debug)]
pub struct CatalogIndex<'a> {
    by_name: HashMap<&'a str, Vec<&'a PackageInfo>>,
    by_provides: HashMap<String, Vec<&'a PackageInfo>>,
}

impl<'a> CatalogIndex<'a> {
    pub fn build(ecosystem: &dyn Ecosystem, all: &'a [PackageInfo]) -> Self {
        let mut by_name: HashMap<&'a str, Vec<&'a PackageInfo>> = HashMap::new();
        let mut by_provides: HashMap<String, Vec<&'a PackageInfo>> = HashMap::new();
        let mut seen: HashSet<(&'a str, &'a str, &'a str)> = HashSet::new();

        for pkg in all {
            if !seen.insert((pkg.name.as_str(), pkg.version.as_str(), pkg.url.as_str())) {
                continue;
            }
            by_name.entry(pkg.name.as_str()).or_default().push(pkg);

            let mut capabilities = vec![pkg.name.clone()];
            for raw in &pkg.provides {
                let cap = ecosystem.clean_dependency_name(raw);
                if !cap.is_empty() && !capabilities.contains(&cap) {
                    capabilities.push(cap);
                }
            }
            for cap in capabilities {
                by_provides.entry(cap).or_default().push(pkg);
            }
        }

        Self {
            by_name,
            by_provides,
        }
    }

    /// Every catalog version of the package called `name`.
    pub fn by_name(&self, name: &str) -> &[&'a PackageInfo] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every package providing `capability`, including the package of that name.
    pub fn by_provides(&self, capability: &str) -> &[&'a PackageInfo] {
        self.by_provides
            .get(capability)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidates for a capability: exact name matches when there are any,
    /// otherwise virtual providers.
    pub fn providers(&self, capability: &str) -> &[&'a PackageInfo] {
        let exact = self.by_name(capability);
        if exact.is_empty() {
            self.by_provides(capability)
        } else {
            exact
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of distinct package names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
