//! Version ordering for Debian and RPM package versions.
//!
//! Both orderings are total over arbitrary strings: malformed epochs fall
//! back to epoch 0, and digit runs are compared by length and then
//! lexically so very long numbers never overflow.
//!
//! Debian (`[epoch:]upstream[-revision]`):
//! - the epoch is compared numerically first
//! - upstream and revision are compared by alternating non-digit and digit runs
//! - in non-digit runs `~` sorts before everything, even the end of the string,
//!   then letters, then all other characters
//!
//! RPM (`[epoch:]version[-release]`) follows rpmvercmp: separators are
//! ignored, numeric segments beat alphabetic ones, `~` sorts before
//! everything and `^` sorts after the base version but before any
//! further segment.

use std::cmp::Ordering;
use std::fmt;

/// A version relation operator, displayed in Debian notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOp {
    /// `<<` (strictly less)
    Less,
    /// `<=`
    LessEq,
    /// `=`
    Eq,
    /// `>=`
    GreaterEq,
    /// `>>` (strictly greater)
    Greater,
}

impl ConstraintOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintOp::Less => "<<",
            ConstraintOp::LessEq => "<=",
            ConstraintOp::Eq => "=",
            ConstraintOp::GreaterEq => ">=",
            ConstraintOp::Greater => ">>",
        }
    }

    /// Whether a comparison result `candidate.cmp(target)` satisfies this operator.
    pub fn accepts(self, ord: Ordering) -> bool {
        match self {
            ConstraintOp::Less => ord == Ordering::Less,
            ConstraintOp::LessEq => ord != Ordering::Greater,
            ConstraintOp::Eq => ord == Ordering::Equal,
            ConstraintOp::GreaterEq => ord != Ordering::Less,
            ConstraintOp::Greater => ord == Ordering::Greater,
        }
    }

    /// Parse a Debian relation. The obsolete `<` and `>` mean `<=` and `>=`.
    pub fn parse_debian(s: &str) -> Option<Self> {
        match s {
            "<<" => Some(ConstraintOp::Less),
            "<=" | "<" => Some(ConstraintOp::LessEq),
            "=" => Some(ConstraintOp::Eq),
            ">=" | ">" => Some(ConstraintOp::GreaterEq),
            ">>" => Some(ConstraintOp::Greater),
            _ => None,
        }
    }

    /// Parse an RPM relation.
    pub fn parse_rpm(s: &str) -> Option<Self> {
        match s {
            "<" => Some(ConstraintOp::Less),
            "<=" | "=<" => Some(ConstraintOp::LessEq),
            "=" | "==" => Some(ConstraintOp::Eq),
            ">=" | "=>" => Some(ConstraintOp::GreaterEq),
            ">" => Some(ConstraintOp::Greater),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[epoch:]version[-release]` split shared by both orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Evr<'a> {
    epoch: &'a str,
    version: &'a str,
    release: Option<&'a str>,
}

impl<'a> Evr<'a> {
    fn split(raw: &'a str) -> Self {
        let raw = raw.trim();
        let (epoch, rest) = match raw.split_once(':') {
            Some((e, rest)) if !e.is_empty() && e.bytes().all(|c| c.is_ascii_digit()) => {
                (e, rest)
            }
            _ => ("0", raw),
        };
        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v, Some(r)),
            None => (rest, None),
        };
        Self {
            epoch,
            version,
            release,
        }
    }
}

/// Compare two Debian version strings.
pub fn compare_debian(a: &str, b: &str) -> Ordering {
    let a = Evr::split(a);
    let b = Evr::split(b);
    compare_numeric(a.epoch.as_bytes(), b.epoch.as_bytes())
        .then_with(|| verrevcmp(a.version, b.version))
        .then_with(|| verrevcmp(a.release.unwrap_or(""), b.release.unwrap_or("")))
}

/// Compare two RPM EVR strings.
pub fn compare_rpm(a: &str, b: &str) -> Ordering {
    let a = Evr::split(a);
    let b = Evr::split(b);
    compare_numeric(a.epoch.as_bytes(), b.epoch.as_bytes())
        .then_with(|| rpmvercmp(a.version, b.version))
        .then_with(|| rpmvercmp(a.release.unwrap_or(""), b.release.unwrap_or("")))
}

/// Compare a candidate RPM EVR against a requirement target.
///
/// A target without a release matches any release of the same version, so
/// `foo = 1.2` is satisfied by `1.2-3.fc40`.
pub(crate) fn compare_rpm_to_target(candidate: &str, target: &str) -> Ordering {
    let c = Evr::split(candidate);
    let t = Evr::split(target);
    let base = compare_numeric(c.epoch.as_bytes(), t.epoch.as_bytes())
        .then_with(|| rpmvercmp(c.version, t.version));
    match t.release {
        Some(release) => base.then_with(|| rpmvercmp(c.release.unwrap_or(""), release)),
        None => base,
    }
}

/// Compare two runs of ASCII digits by value.
fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&c| c != b'0').unwrap_or(s.len());
    &s[start..]
}

/// Sort weight of a byte in a Debian non-digit run.
fn debian_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn verrevcmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() || j < b.len() {
        while a.get(i).is_some_and(|c| !c.is_ascii_digit())
            || b.get(j).is_some_and(|c| !c.is_ascii_digit())
        {
            let ac = debian_order(a.get(i).copied());
            let bc = debian_order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while a.get(i).is_some_and(u8::is_ascii_digit) && b.get(j).is_some_and(u8::is_ascii_digit)
        {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if a.get(i).is_some_and(u8::is_ascii_digit) {
            return Ordering::Greater;
        }
        if b.get(j).is_some_and(u8::is_ascii_digit) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}

fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);
    let is_sep = |c: &u8| !c.is_ascii_alphanumeric() && *c != b'~' && *c != b'^';

    while i < a.len() || j < b.len() {
        while a.get(i).is_some_and(is_sep) {
            i += 1;
        }
        while b.get(j).is_some_and(is_sep) {
            j += 1;
        }

        let (ca, cb) = (a.get(i).copied(), b.get(j).copied());
        if ca == Some(b'~') || cb == Some(b'~') {
            if ca != Some(b'~') {
                return Ordering::Greater;
            }
            if cb != Some(b'~') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }
        if ca == Some(b'^') || cb == Some(b'^') {
            if ca.is_none() {
                return Ordering::Less;
            }
            if cb.is_none() {
                return Ordering::Greater;
            }
            if ca != Some(b'^') {
                return Ordering::Greater;
            }
            if cb != Some(b'^') {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }
        if ca.is_none() || cb.is_none() {
            break;
        }

        let (start_a, start_b) = (i, j);
        let numeric = a[i].is_ascii_digit();
        let in_segment = |c: &u8| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        };
        while a.get(i).is_some_and(in_segment) {
            i += 1;
        }
        while b.get(j).is_some_and(in_segment) {
            j += 1;
        }

        let seg_a = &a[start_a..i];
        let seg_b = &b[start_b..j];
        if seg_b.is_empty() {
            // Segment types differ: numbers are newer than letters.
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        let ord = if numeric {
            compare_numeric(seg_a, seg_b)
        } else {
            seg_a.cmp(seg_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    match (i >= a.len(), j >= b.len()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_dominates_upstream() {
        assert_eq!(compare_debian("2.0", "1:1.0"), Ordering::Less);
        assert_eq!(compare_debian("1:1.0", "2.0"), Ordering::Greater);
    }

    #[test]
    fn tilde_sorts_before_end() {
        assert_eq!(compare_debian("1.0", "1.0~rc1"), Ordering::Greater);
        assert_eq!(compare_debian("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(compare_debian("1.0~~", "1.0~"), Ordering::Less);
    }

    #[test]
    fn binnmu_suffix_is_newer() {
        assert_eq!(compare_debian("6.6.4-5+b1", "6.6.4-5"), Ordering::Greater);
    }

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(compare_debian("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_debian("1.0", "1.00"), Ordering::Equal);
        assert_eq!(compare_debian("0:1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn letters_before_other_characters() {
        assert_eq!(compare_debian("1.0a", "1.0+"), Ordering::Less);
        assert_eq!(compare_debian("1.0a", "1.0"), Ordering::Greater);
    }

    #[test]
    fn revision_split_at_last_dash() {
        assert_eq!(compare_debian("1.2-3-4", "1.2-3-10"), Ordering::Less);
        assert_eq!(compare_debian("1.45.3-1~", "1.45.3-1"), Ordering::Less);
        assert_eq!(compare_debian("1.44.5-1", "1.45.3-1~"), Ordering::Less);
    }

    #[test]
    fn malformed_debian_versions_do_not_panic() {
        assert_eq!(compare_debian("", ""), Ordering::Equal);
        assert_eq!(compare_debian("", "0"), Ordering::Equal);
        assert_eq!(compare_debian("abc:1.0", "0:1.0"), Ordering::Greater);
        let long_a = "9".repeat(400);
        let long_b = format!("{}8", "9".repeat(399));
        assert_eq!(compare_debian(&long_a, &long_b), Ordering::Greater);
        assert_eq!(compare_debian(&format!("{long_a}:1"), "1:1"), Ordering::Greater);
    }

    #[test]
    fn rpm_basic_ordering() {
        assert_eq!(compare_rpm("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_rpm("2.34-100.fc40", "2.34-99.fc40"), Ordering::Greater);
        assert_eq!(compare_rpm("1:1.0", "2.0"), Ordering::Greater);
    }

    #[test]
    fn rpm_tilde_and_caret() {
        assert_eq!(compare_rpm("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(compare_rpm("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(compare_rpm("1.0^git1", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn rpm_separators_ignored_and_numbers_beat_letters() {
        assert_eq!(compare_rpm("1.0", "1_0"), Ordering::Equal);
        assert_eq!(compare_rpm("1.0a", "1.0.1"), Ordering::Less);
        assert_eq!(compare_rpm("1.a", "1.1"), Ordering::Less);
        assert_eq!(compare_rpm("1.1", "1.a"), Ordering::Greater);
    }

    #[test]
    fn rpm_target_without_release_ignores_release() {
        assert_eq!(compare_rpm_to_target("1.2-3.fc40", "1.2"), Ordering::Equal);
        assert_eq!(compare_rpm_to_target("1.2-3.fc40", "1.2-4"), Ordering::Less);
        assert_eq!(compare_rpm("1.2-3.fc40", "1.2"), Ordering::Greater);
    }

    #[test]
    fn operators_accept() {
        assert!(ConstraintOp::Less.accepts(Ordering::Less));
        assert!(!ConstraintOp::Less.accepts(Ordering::Equal));
        assert!(ConstraintOp::LessEq.accepts(Ordering::Equal));
        assert!(ConstraintOp::GreaterEq.accepts(Ordering::Greater));
        assert!(!ConstraintOp::Greater.accepts(Ordering::Equal));
        assert!(ConstraintOp::Eq.accepts(Ordering::Equal));
    }

    #[test]
    fn operator_parsing() {
        assert_eq!(ConstraintOp::parse_debian("<<"), Some(ConstraintOp::Less));
        assert_eq!(ConstraintOp::parse_debian("<"), Some(ConstraintOp::LessEq));
        assert_eq!(ConstraintOp::parse_rpm("<"), Some(ConstraintOp::Less));
        assert_eq!(ConstraintOp::parse_rpm(">"), Some(ConstraintOp::Greater));
        assert_eq!(ConstraintOp::parse_debian("~="), None);
        assert_eq!(ConstraintOp::Greater.to_string(), ">>");
    }
}
