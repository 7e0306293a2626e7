//! Operation: compare two version strings.

use std::cmp::Ordering;

use imgforge_core::package::EcosystemKind;
use imgforge_resolver::for_kind;

/// Compare `a` with `b` under the ordering of `ecosystem`.
pub fn vercmp(a: &str, b: &str, ecosystem: EcosystemKind) -> Ordering {
    for_kind(ecosystem).compare(a, b)
}

/// `<`, `=` or `>`.
pub fn symbol(ord: Ordering) -> &'static str {
    match ord {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debian_and_rpm_orderings() {
        assert_eq!(vercmp("1.0~rc1", "1.0", EcosystemKind::Deb), Ordering::Less);
        assert_eq!(vercmp("1:1.0", "2.0", EcosystemKind::Rpm), Ordering::Greater);
        assert_eq!(vercmp("1.0^git1", "1.0", EcosystemKind::Rpm), Ordering::Greater);
        assert_eq!(symbol(Ordering::Equal), "=");
        assert_eq!(symbol(vercmp("6.6.4-5+b1", "6.6.4-5", EcosystemKind::Deb)), ">");
    }
}
