use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One entry of a flattened repository catalog.
///
/// `provides` implicitly includes `name`; `requires` holds plain capability
/// names while `requires_ver` keeps the raw clauses, which may carry
/// alternatives and version constraints in the ecosystem's syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Download location. The resolver only uses it for repository affinity.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, alias = "requiresVer")]
    pub requires_ver: Vec<String>,
}

impl PackageInfo {
    /// A bare record with no dependencies, mostly useful for building catalogs in code.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_provides<I, S>(mut self, provides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides = provides.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires_ver<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_ver = clauses.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Package ecosystem, selecting version ordering and dependency clause syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemKind {
    /// Debian / Ubuntu (`.deb`, dpkg ordering, `a | b (>= 1)` clauses).
    #[default]
    #[serde(alias = "debian", alias = "apt")]
    Deb,
    /// Fedora / RHEL / openSUSE (`.rpm`, rpmvercmp, `a >= 1` clauses).
    #[serde(alias = "fedora", alias = "dnf")]
    Rpm,
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcosystemKind::Deb => f.write_str("deb"),
            EcosystemKind::Rpm => f.write_str("rpm"),
        }
    }
}

impl FromStr for EcosystemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deb" | "debian" | "apt" => Ok(EcosystemKind::Deb),
            "rpm" | "fedora" | "dnf" => Ok(EcosystemKind::Rpm),
            other => Err(format!("unknown ecosystem '{other}' (expected deb or rpm)")),
        }
    }
}

/// Output format of the composed image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Raw,
    Iso,
    Qcow2,
}
