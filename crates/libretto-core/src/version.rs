//! Version and version-constraint algebra.
//!
//! A [`Version`] is either the distinguished symbol `head` ("latest trunk")
//! or a semantic `(major, minor, patch, pre)` triple. `head` outranks every
//! numeric version; numeric versions compare component-wise, with a
//! pre-release tag sorting *below* the same release version (matching
//! `semver`'s precedence rules).
//!
//! A [`Constraint`] is a half- or fully-bounded interval of versions built
//! from one of the six operators `==`, `>=`, `<=`, `>`, `<`, `~>`, or the
//! universal `*`. Constraints intersect in closed form, which is what lets
//! the dependency graph (`libretto-resolver`) detect conflicts without
//! consulting a solver.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single version: `head`, or a semantic `major.minor.patch[-pre]` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// The distinguished "latest trunk" version. Outranks everything.
    Head,
    /// A semantic version triple.
    Number(NumericVersion),
}

/// A `major.minor.patch` triple with an optional pre-release tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl NumericVersion {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// The first version of the next minor line: `x.(y+1).0`, pre stripped.
    /// Used to implement the `~>` (compatible-with) operator.
    #[must_use]
    pub fn next_minor(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
            patch: 0,
            pre: None,
        }
    }
}

impl Ord for NumericVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // a release outranks any pre-release of the same triple
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for NumericVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Head, Self::Head) => Ordering::Equal,
            (Self::Head, Self::Number(_)) => Ordering::Greater,
            (Self::Number(_), Self::Head) => Ordering::Less,
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Number(n) => match &n.pre {
                Some(pre) => write!(f, "{}.{}.{}-{pre}", n.major, n.minor, n.patch),
                None => write!(f, "{}.{}.{}", n.major, n.minor, n.patch),
            },
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("head") {
            return Ok(Self::Head);
        }
        Ok(Self::Number(parse_numeric(trimmed)?))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a bare version string (no operator), normalizing missing
/// components to zero: `"1"` -> `1.0.0`, `"1.2"` -> `1.2.0`.
fn parse_numeric(s: &str) -> Result<NumericVersion> {
    let s = s.trim().trim_start_matches('v');
    let (core, pre) = match s.split_once('-') {
        Some((core, pre)) => (core, Some(pre.to_string())),
        None => (s, None),
    };

    let mut parts = core.split('.');
    let major = parts
        .next()
        .filter(|p| !p.is_empty())
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| Error::InvalidVersion { raw: s.to_string() })?;
    let minor = parts.next().map_or(Ok(0), |p| {
        p.parse().map_err(|_| Error::InvalidVersion { raw: s.to_string() })
    })?;
    let patch = parts.next().map_or(Ok(0), |p| {
        p.parse().map_err(|_| Error::InvalidVersion { raw: s.to_string() })
    })?;
    if parts.next().is_some() {
        return Err(Error::InvalidVersion { raw: s.to_string() });
    }

    Ok(NumericVersion { major, minor, patch, pre })
}

/// One side of a [`Constraint`]'s interval.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: Version,
    inclusive: bool,
}

/// A half- or fully-bounded interval of versions.
///
/// The invalid/empty constraint (an interval with no satisfying version) is
/// represented explicitly via the `invalid` flag rather than by panicking or
/// by `Option<Constraint>`, so that a dependency whose constraint turned
/// invalid through intersection can still be carried around and surfaced
/// later (see the resolver's "missing but invalid" edge case).
#[derive(Debug, Clone)]
pub struct Constraint {
    lower: Option<Bound>,
    upper: Option<Bound>,
    invalid: bool,
    /// Original operator-version text, kept so a constraint parsed from a
    /// manifest serializes back to the same string. `None` for constraints
    /// synthesized by intersection.
    raw: Option<String>,
}

/// Equality ignores `raw`: two constraints built through different paths
/// (parsed vs. intersected) are equal iff they describe the same interval.
/// The resolver's progress check relies on this to detect a fixpoint.
impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper && self.invalid == other.invalid
    }
}

impl Eq for Constraint {}

impl Constraint {
    /// The universal constraint (`*`): matches every version.
    #[must_use]
    pub fn any() -> Self {
        Self {
            lower: None,
            upper: None,
            invalid: false,
            raw: Some("*".to_string()),
        }
    }

    /// The distinguished empty constraint.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lower: None,
            upper: None,
            invalid: true,
            raw: None,
        }
    }

    /// An exact-version constraint (`== v`).
    #[must_use]
    pub fn exact(version: Version) -> Self {
        let raw = format!("=={version}");
        Self {
            lower: Some(Bound { version: version.clone(), inclusive: true }),
            upper: Some(Bound { version, inclusive: true }),
            invalid: false,
            raw: Some(raw),
        }
    }

    /// Is this not the distinguished empty constraint?
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.invalid
    }

    /// Does `version` satisfy this constraint?
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        if self.invalid {
            return false;
        }
        let above_lower = self.lower.as_ref().is_none_or(|b| {
            if b.inclusive { version >= &b.version } else { version > &b.version }
        });
        let below_upper = self.upper.as_ref().is_none_or(|b| {
            if b.inclusive { version <= &b.version } else { version < &b.version }
        });
        above_lower && below_upper
    }

    /// Intersect two constraints. Intersection is commutative and
    /// associative; the empty constraint is absorbing.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if self.invalid || other.invalid {
            return Self::empty();
        }

        let lower = tighter_lower(self.lower.as_ref(), other.lower.as_ref());
        let upper = tighter_upper(self.upper.as_ref(), other.upper.as_ref());

        let invalid = match (&lower, &upper) {
            (Some(lo), Some(hi)) => match lo.version.cmp(&hi.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(lo.inclusive && hi.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        };

        if invalid {
            return Self::empty();
        }

        Self { lower, upper, invalid: false, raw: None }
    }

    /// Parse a constraint string: `"*"`, or `op ws? version` where
    /// `op ∈ { "==", ">=", "<=", ">", "<", "~>" }`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Ok(Self::any());
        }

        let invalid_err = || Error::InvalidConstraint { raw: raw.to_string() };

        let (op, rest) = if let Some(r) = trimmed.strip_prefix("==") {
            ("==", r)
        } else if let Some(r) = trimmed.strip_prefix(">=") {
            (">=", r)
        } else if let Some(r) = trimmed.strip_prefix("<=") {
            ("<=", r)
        } else if let Some(r) = trimmed.strip_prefix("~>") {
            ("~>", r)
        } else if let Some(r) = trimmed.strip_prefix('>') {
            (">", r)
        } else if let Some(r) = trimmed.strip_prefix('<') {
            ("<", r)
        } else {
            return Err(invalid_err());
        };

        let version: Version = rest.trim().parse().map_err(|_| invalid_err())?;

        let built = match op {
            "==" => Self::exact(version),
            ">=" => Self {
                lower: Some(Bound { version, inclusive: true }),
                upper: None,
                invalid: false,
                raw: None,
            },
            "<=" => Self {
                lower: None,
                upper: Some(Bound { version, inclusive: true }),
                invalid: false,
                raw: None,
            },
            ">" => Self {
                lower: Some(Bound { version, inclusive: false }),
                upper: None,
                invalid: false,
                raw: None,
            },
            "<" => Self {
                lower: None,
                upper: Some(Bound { version, inclusive: false }),
                invalid: false,
                raw: None,
            },
            "~>" => {
                let Version::Number(n) = &version else {
                    return Err(invalid_err());
                };
                let upper_version = Version::Number(n.next_minor());
                Self {
                    lower: Some(Bound { version, inclusive: true }),
                    upper: Some(Bound { version: upper_version, inclusive: false }),
                    invalid: false,
                    raw: None,
                }
            }
            _ => unreachable!(),
        };

        Ok(Self { raw: Some(trimmed.to_string()), ..built })
    }
}

fn tighter_lower(a: Option<&Bound>, b: Option<&Bound>) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (Some(x), Some(y)) => Some(match x.version.cmp(&y.version) {
            Ordering::Greater => x.clone(),
            Ordering::Less => y.clone(),
            Ordering::Equal => Bound {
                version: x.version.clone(),
                inclusive: x.inclusive && y.inclusive,
            },
        }),
    }
}

fn tighter_upper(a: Option<&Bound>, b: Option<&Bound>) -> Option<Bound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x.clone()),
        (None, Some(y)) => Some(y.clone()),
        (Some(x), Some(y)) => Some(match x.version.cmp(&y.version) {
            Ordering::Less => x.clone(),
            Ordering::Greater => y.clone(),
            Ordering::Equal => Bound {
                version: x.version.clone(),
                inclusive: x.inclusive && y.inclusive,
            },
        }),
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return write!(f, "{raw}");
        }
        if self.invalid {
            return write!(f, "<empty>");
        }
        match (&self.lower, &self.upper) {
            (None, None) => write!(f, "*"),
            (Some(lo), None) => write!(f, "{}{}", if lo.inclusive { ">=" } else { ">" }, lo.version),
            (None, Some(hi)) => write!(f, "{}{}", if hi.inclusive { "<=" } else { "<" }, hi.version),
            (Some(lo), Some(hi)) => write!(
                f,
                "{}{}, {}{}",
                if lo.inclusive { ">=" } else { ">" },
                lo.version,
                if hi.inclusive { "<=" } else { "<" },
                hi.version
            ),
        }
    }
}

impl FromStr for Constraint {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Constraint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn v(major: u64, minor: u64, patch: u64) -> Version {
        Version::Number(NumericVersion::new(major, minor, patch))
    }

    #[test]
    fn head_outranks_numeric() {
        assert!(Version::Head > v(999, 999, 999));
    }

    #[test]
    fn wildcard_matches_everything() {
        let c = Constraint::any();
        assert!(c.matches(&v(0, 0, 0)));
        assert!(c.matches(&Version::Head));
    }

    #[test_case(">=1.0.0", 1, 0, 0, true; "gte matches exact")]
    #[test_case(">=1.0.0", 0, 9, 9, false; "gte rejects lower")]
    #[test_case("<=1.0.0", 1, 0, 0, true; "lte matches exact")]
    #[test_case("<=1.0.0", 1, 0, 1, false; "lte rejects higher")]
    #[test_case(">1.0.0", 1, 0, 0, false; "gt rejects exact")]
    #[test_case("<1.0.0", 0, 9, 9, true; "lt matches lower")]
    #[test_case("==1.2.3", 1, 2, 3, true; "eq matches exact")]
    #[test_case("==1.2.3", 1, 2, 4, false; "eq rejects other")]
    #[test_case("~>1.2.0", 1, 2, 9, true; "tilde matches higher patch")]
    #[test_case("~>1.2.0", 1, 3, 0, false; "tilde rejects next minor")]
    fn operator_matching(raw: &str, major: u64, minor: u64, patch: u64, expected: bool) {
        let c = Constraint::parse(raw).unwrap();
        assert_eq!(c.matches(&v(major, minor, patch)), expected);
    }

    #[test]
    fn intersection_narrows() {
        let a = Constraint::parse(">=1.0.0").unwrap();
        let b = Constraint::parse("<2.0.0").unwrap();
        let c = a.intersect(&b);
        assert!(c.is_valid());
        assert!(c.matches(&v(1, 5, 0)));
        assert!(!c.matches(&v(2, 0, 0)));
        assert!(!c.matches(&v(0, 9, 0)));
    }

    #[test]
    fn disjoint_intersection_is_invalid() {
        let a = Constraint::parse(">=2.0.0").unwrap();
        let b = Constraint::parse("<1.0.0").unwrap();
        let c = a.intersect(&b);
        assert!(!c.is_valid());
        assert!(!c.matches(&v(1, 5, 0)));
    }

    #[test]
    fn empty_is_absorbing() {
        let any = Constraint::any();
        let empty = Constraint::empty();
        assert!(!any.intersect(&empty).is_valid());
        assert!(!empty.intersect(&any).is_valid());
    }

    #[test]
    fn manifest_round_trip_preserves_raw() {
        for raw in [">=1.0.0", "<=2.3.4", "~>1.2.0", "==1.0.0", "*", ">1.0.0", "<1.0.0"] {
            let c = Constraint::parse(raw).unwrap();
            assert_eq!(c.to_string(), raw);
        }
    }

    proptest! {
        #[test]
        fn prop_intersection_commutative(
            a_minor in 0u64..10,
            b_minor in 0u64..10,
        ) {
            let a = Constraint::parse(&format!(">=0.{a_minor}.0")).unwrap();
            let b = Constraint::parse(&format!("<=0.{b_minor}.0")).unwrap();
            let ab = a.intersect(&b);
            let ba = b.intersect(&a);
            prop_assert_eq!(ab.is_valid(), ba.is_valid());
            for probe in [(0,0,0), (0,5,5), (0,9,9)] {
                let version = Version::Number(NumericVersion::new(probe.0, probe.1, probe.2));
                prop_assert_eq!(ab.matches(&version), ba.matches(&version));
            }
        }

        #[test]
        fn prop_intersection_associative(minor in 0u64..5) {
            let a = Constraint::parse(">=1.0.0").unwrap();
            let b = Constraint::parse(&format!(">=1.{minor}.0")).unwrap();
            let c = Constraint::parse("<9.0.0").unwrap();
            let left = a.intersect(&b).intersect(&c);
            let right = a.intersect(&b.intersect(&c));
            for probe in [(0,0,0), (1,4,0), (8,9,9)] {
                let version = Version::Number(NumericVersion::new(probe.0, probe.1, probe.2));
                prop_assert_eq!(left.matches(&version), right.matches(&version));
            }
        }
    }
}
