//! Dependency clause parsing and per-capability constraint extraction.
//!
//! A raw `requires_ver` clause is an OR-group of alternatives. In Debian
//! syntax each alternative may carry a parenthesised relation
//! (`logsave | e2fsprogs (<< 1.45.3-1~)`); in RPM syntax a term is
//! `name [op version]` and groups use rich `(a or b)` notation. A version
//! relation binds only to the alternative it is written against.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::version::ConstraintOp;

/// An operator/version pair attached to one alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub op: ConstraintOp,
    pub version: String,
}

impl Bound {
    pub fn new(op: ConstraintOp, version: impl Into<String>) -> Self {
        Self {
            op,
            version: version.into(),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// One alternative of a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseTerm {
    pub name: String,
    pub bound: Option<Bound>,
}

impl ClauseTerm {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }
}

impl fmt::Display for ClauseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bound {
            Some(bound) => write!(f, "{} ({bound})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed clause: alternatives in listed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyClause {
    pub terms: Vec<ClauseTerm>,
}

impl DependencyClause {
    /// True when the clause offers more than one alternative.
    pub fn is_alternative_group(&self) -> bool {
        self.terms.len() > 1
    }

    /// The constraint this clause places on `name`, if `name` is one of its alternatives.
    pub fn constraint_for(&self, name: &str) -> Option<VersionConstraint> {
        let idx = self.terms.iter().position(|t| t.name == name)?;
        let term = &self.terms[idx];
        let alternative = self
            .terms
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, t)| t.name.as_str())
            .collect::<Vec<_>>()
            .join("|");
        Some(VersionConstraint {
            op: term.bound.as_ref().map(|b| b.op),
            version: term
                .bound
                .as_ref()
                .map(|b| b.version.clone())
                .unwrap_or_default(),
            alternative,
        })
    }
}

impl fmt::Display for DependencyClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// The constraint a clause places on one capability.
///
/// `op == None` means unconstrained. `alternative` lists the other names of
/// the same OR-group joined by `|` (empty for single-name clauses).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConstraint {
    pub op: Option<ConstraintOp>,
    pub version: String,
    pub alternative: String,
}

impl VersionConstraint {
    pub fn is_unconstrained(&self) -> bool {
        self.op.is_none()
    }
}

/// A `requires_ver` clause that could not be parsed. Tolerated by the
/// resolver: the clause is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("malformed dependency clause '{clause}': {reason}")]
#[diagnostic(code(imgforge::resolve::malformed_constraint))]
pub struct MalformedConstraint {
    pub clause: String,
    pub reason: String,
}

/// The error [`crate::Ecosystem::parse_clause`] returns.
pub type ClauseError = MalformedConstraint;

impl MalformedConstraint {
    fn new(clause: &str, reason: impl Into<String>) -> Self {
        Self {
            clause: clause.to_string(),
            reason: reason.into(),
        }
    }
}

/// Constraints that already-parsed clauses place on `dep_name`, or `None`
/// when no clause mentions it.
pub fn constraints_for(
    clauses: &[DependencyClause],
    dep_name: &str,
) -> Option<Vec<VersionConstraint>> {
    let found: Vec<VersionConstraint> = clauses
        .iter()
        .filter_map(|c| c.constraint_for(dep_name))
        .collect();
    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

/// Parse a clause in Debian control-file syntax.
pub fn parse_debian_clause(raw: &str) -> Result<DependencyClause, MalformedConstraint> {
    if raw.trim().is_empty() {
        return Err(MalformedConstraint::new(raw, "empty clause"));
    }
    let terms = raw
        .split('|')
        .map(|token| parse_debian_term(raw, token))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DependencyClause { terms })
}

fn parse_debian_term(clause: &str, token: &str) -> Result<ClauseTerm, MalformedConstraint> {
    let token = token.trim();
    let name_end = token
        .find(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '<'))
        .unwrap_or(token.len());
    let name = strip_arch_qualifier(&token[..name_end]);
    if name.is_empty() {
        return Err(MalformedConstraint::new(clause, "empty alternative"));
    }

    let mut rest = token[name_end..].trim_start();
    let mut bound = None;
    if let Some(after_paren) = rest.strip_prefix('(') {
        let close = after_paren
            .find(')')
            .ok_or_else(|| MalformedConstraint::new(clause, "unclosed parenthesis"))?;
        bound = Some(parse_debian_relation(clause, &after_paren[..close])?);
        rest = after_paren[close + 1..].trim_start();
    }

    // Architecture restrictions `[amd64]` and build profiles `<!nocheck>`
    // do not affect binary package resolution.
    while !rest.is_empty() {
        let closing = match rest.as_bytes()[0] {
            b'[' => ']',
            b'<' => '>',
            _ => {
                return Err(MalformedConstraint::new(
                    clause,
                    format!("unexpected text '{rest}'"),
                ))
            }
        };
        let end = rest.find(closing).ok_or_else(|| {
            MalformedConstraint::new(clause, format!("unclosed restriction '{rest}'"))
        })?;
        rest = rest[end + 1..].trim_start();
    }

    Ok(ClauseTerm {
        name: name.to_string(),
        bound,
    })
}

fn parse_debian_relation(clause: &str, inner: &str) -> Result<Bound, MalformedConstraint> {
    let inner = inner.trim();
    let op_end = inner
        .find(|c: char| !matches!(c, '<' | '>' | '='))
        .unwrap_or(inner.len());
    let op_str = &inner[..op_end];
    let version = inner[op_end..].trim();
    if op_str.is_empty() {
        return Err(MalformedConstraint::new(clause, "missing relation operator"));
    }
    let op = ConstraintOp::parse_debian(op_str)
        .ok_or_else(|| MalformedConstraint::new(clause, format!("unknown operator '{op_str}'")))?;
    if version.is_empty() {
        return Err(MalformedConstraint::new(clause, "missing version"));
    }
    if version.contains(char::is_whitespace) {
        return Err(MalformedConstraint::new(
            clause,
            format!("unexpected whitespace in version '{version}'"),
        ));
    }
    Ok(Bound::new(op, version))
}

/// `libc6:amd64` and `python3:any` name the same package as `libc6` / `python3`.
fn strip_arch_qualifier(name: &str) -> &str {
    name.split_once(':').map(|(n, _)| n).unwrap_or(name)
}

/// Bare name of the first alternative of a Debian clause.
pub fn clean_debian_name(raw: &str) -> String {
    let first = raw.split('|').next().unwrap_or("").trim();
    let end = first
        .find(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '<'))
        .unwrap_or(first.len());
    strip_arch_qualifier(&first[..end]).to_string()
}

const RPM_UNSUPPORTED_RICH_OPS: &[&str] = &["and", "if", "else", "with", "without", "unless"];

/// Parse a clause in RPM syntax.
pub fn parse_rpm_clause(raw: &str) -> Result<DependencyClause, MalformedConstraint> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MalformedConstraint::new(raw, "empty clause"));
    }

    let Some(inner) = trimmed.strip_prefix('(') else {
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        return Ok(DependencyClause {
            terms: vec![parse_rpm_term(raw, &tokens)?],
        });
    };
    let inner = inner
        .strip_suffix(')')
        .ok_or_else(|| MalformedConstraint::new(raw, "unclosed parenthesis"))?;

    let mut terms = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for token in inner.split_whitespace() {
        if token == "or" {
            terms.push(parse_rpm_term(raw, &current)?);
            current.clear();
        } else if RPM_UNSUPPORTED_RICH_OPS.contains(&token) {
            return Err(MalformedConstraint::new(
                raw,
                format!("unsupported rich dependency operator '{token}'"),
            ));
        } else if token.starts_with('(') {
            return Err(MalformedConstraint::new(raw, "nested rich dependency"));
        } else {
            current.push(token);
        }
    }
    terms.push(parse_rpm_term(raw, &current)?);
    Ok(DependencyClause { terms })
}

fn parse_rpm_term(clause: &str, tokens: &[&str]) -> Result<ClauseTerm, MalformedConstraint> {
    match tokens {
        [] => Err(MalformedConstraint::new(clause, "empty alternative")),
        [name] => Ok(ClauseTerm::bare(*name)),
        [name, op, version] => {
            let op = ConstraintOp::parse_rpm(op)
                .ok_or_else(|| MalformedConstraint::new(clause, format!("unknown operator '{op}'")))?;
            Ok(ClauseTerm {
                name: name.to_string(),
                bound: Some(Bound::new(op, *version)),
            })
        }
        [_, _] => Err(MalformedConstraint::new(clause, "missing version")),
        _ => Err(MalformedConstraint::new(clause, "unexpected tokens")),
    }
}

/// Bare name of the first alternative of an RPM clause.
pub fn clean_rpm_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('(').unwrap_or(trimmed);
    trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const E2FS: &str = "logsave | e2fsprogs (<< 1.45.3-1~)";

    #[test]
    fn debian_group_with_trailing_relation() {
        let clause = parse_debian_clause(E2FS).unwrap();
        assert!(clause.is_alternative_group());
        assert_eq!(clause.terms[0], ClauseTerm::bare("logsave"));
        assert_eq!(clause.terms[1].name, "e2fsprogs");
        assert_eq!(
            clause.terms[1].bound,
            Some(Bound::new(ConstraintOp::Less, "1.45.3-1~"))
        );
        assert_eq!(clause.to_string(), "logsave | e2fsprogs (<< 1.45.3-1~)");
    }

    #[test]
    fn constraint_binds_to_its_own_alternative() {
        let clause = parse_debian_clause(E2FS).unwrap();
        let c = clause.constraint_for("e2fsprogs").unwrap();
        assert_eq!(c.op, Some(ConstraintOp::Less));
        assert_eq!(c.version, "1.45.3-1~");
        assert_eq!(c.alternative, "logsave");

        let c = clause.constraint_for("logsave").unwrap();
        assert!(c.is_unconstrained());
        assert!(c.version.is_empty());
        assert_eq!(c.alternative, "e2fsprogs");

        assert!(clause.constraint_for("unrelated").is_none());
    }

    #[test]
    fn debian_relation_without_space_and_arch_qualifiers() {
        let clause = parse_debian_clause("python3:any(>=3.11~)").unwrap();
        assert_eq!(clause.terms[0].name, "python3");
        assert_eq!(
            clause.terms[0].bound,
            Some(Bound::new(ConstraintOp::GreaterEq, "3.11~"))
        );
    }

    #[test]
    fn debian_restrictions_are_dropped() {
        let clause = parse_debian_clause("libc6-dev (>= 2.36) [linux-any] <!nocheck>").unwrap();
        assert_eq!(clause.terms.len(), 1);
        assert_eq!(clause.terms[0].name, "libc6-dev");
    }

    #[test]
    fn debian_malformed_clauses() {
        assert!(parse_debian_clause("").is_err());
        assert!(parse_debian_clause("foo | | bar").is_err());
        assert!(parse_debian_clause("foo (>= 1.0").is_err());
        assert!(parse_debian_clause("foo (~> 1.0)").is_err());
        assert!(parse_debian_clause("foo (>=)").is_err());
        assert!(parse_debian_clause("foo bar").is_err());
        let err = parse_debian_clause("foo (1.0)").unwrap_err();
        assert!(err.to_string().contains("malformed dependency clause"));
    }

    #[test]
    fn rpm_simple_and_rich_clauses() {
        let clause = parse_rpm_clause("glibc >= 2.34").unwrap();
        assert_eq!(
            clause.terms,
            vec![ClauseTerm {
                name: "glibc".into(),
                bound: Some(Bound::new(ConstraintOp::GreaterEq, "2.34")),
            }]
        );

        let clause = parse_rpm_clause("libc.so.6()(64bit)").unwrap();
        assert_eq!(clause.terms[0].name, "libc.so.6()(64bit)");

        let clause = parse_rpm_clause("(systemd-udev or eudev < 3.2)").unwrap();
        assert_eq!(clause.terms.len(), 2);
        assert_eq!(
            clause.terms[1].bound,
            Some(Bound::new(ConstraintOp::Less, "3.2"))
        );
    }

    #[test]
    fn rpm_malformed_clauses() {
        assert!(parse_rpm_clause("glibc >=").is_err());
        assert!(parse_rpm_clause("glibc ~ 2.0").is_err());
        assert!(parse_rpm_clause("(foo and bar)").is_err());
        assert!(parse_rpm_clause("(foo or bar").is_err());
        assert!(parse_rpm_clause("(foo or (bar or baz))").is_err());
    }

    #[test]
    fn clean_names() {
        assert_eq!(clean_debian_name(E2FS), "logsave");
        assert_eq!(clean_debian_name("e2fsprogs (<< 1.45.3-1~)"), "e2fsprogs");
        assert_eq!(clean_debian_name("libc6:amd64 (>= 2.36)"), "libc6");
        assert_eq!(clean_debian_name(""), "");
        assert_eq!(clean_rpm_name("glibc >= 2.34"), "glibc");
        assert_eq!(clean_rpm_name("(systemd-udev or eudev)"), "systemd-udev");
        assert_eq!(clean_rpm_name(""), "");
    }

    #[test]
    fn constraints_for_collects_every_mention() {
        let clauses = vec![
            parse_debian_clause("libc6 (>= 2.34)").unwrap(),
            parse_debian_clause("libc6 (<< 2.37)").unwrap(),
            parse_debian_clause("zlib1g").unwrap(),
        ];
        let found = constraints_for(&clauses, "libc6").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].op, Some(ConstraintOp::Less));
        assert_eq!(found[1].version, "2.37");
        assert!(constraints_for(&clauses, "bash").is_none());
    }
}
