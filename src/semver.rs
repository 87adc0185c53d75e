//! Semantic version parsing and precedence.
//!
//! Implements the SemVer 2.0 grammar (`MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`)
//! and the full precedence rules, including prerelease identifier ordering.
//! Build metadata is parsed and round-tripped but never participates in
//! equality or ordering.

use std::cmp::Ordering;
use std::fmt;

/// A parsed semantic version.
///
/// Equality and ordering follow SemVer 2.0 precedence: major, minor and patch
/// compare numerically, then prerelease identifiers compare per the spec.
/// Build metadata is ignored by both.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<String>,
    pub build: Vec<String>,
}

impl Version {
    /// Parse a version string.
    ///
    /// Returns `None` for anything that deviates from the grammar: a missing
    /// patch component, a leading `v`, non-numeric core components, empty
    /// identifiers, or an empty string. Never panics.
    pub fn parse(text: &str) -> Option<Self> {
        let (rest, build) = match text.split_once('+') {
            Some((rest, build)) => (rest, parse_identifiers(build)?),
            None => (text, Vec::new()),
        };

        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => (core, parse_identifiers(pre)?),
            None => (rest, Vec::new()),
        };

        let mut parts = core.splitn(3, '.');
        let major = parse_numeric(parts.next()?)?;
        let minor = parse_numeric(parts.next()?)?;
        let patch = parse_numeric(parts.next()?)?;

        Some(Self {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }

    /// True when this version has no prerelease identifiers.
    pub fn is_stable(&self) -> bool {
        self.prerelease.is_empty()
    }
}

/// Parse a dot-separated identifier list (prerelease or build metadata).
/// Each identifier must be a non-empty run of `[0-9A-Za-z-]`.
fn parse_identifiers(text: &str) -> Option<Vec<String>> {
    if text.is_empty() {
        return None;
    }
    let mut out = Vec::new();
    for token in text.split('.') {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return None;
        }
        out.push(token.to_string());
    }
    Some(out)
}

/// Parse a core version component: a non-empty digit sequence.
fn parse_numeric(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Compare two prerelease identifiers per SemVer 2.0:
/// numeric < alphanumeric, numerics compare numerically, alphanumerics
/// compare in byte order.
fn compare_identifier(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| {
                // A release without prerelease identifiers outranks any
                // prerelease of the same core version.
                match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        for (a, b) in self.prerelease.iter().zip(other.prerelease.iter()) {
                            match compare_identifier(a, b) {
                                Ordering::Equal => continue,
                                ord => return ord,
                            }
                        }
                        // Prefix of the other: the longer sequence wins.
                        self.prerelease.len().cmp(&other.prerelease.len())
                    }
                }
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.join("."))?;
        }
        Ok(())
    }
}

/// True iff both strings parse as valid versions and `candidate` has strictly
/// higher precedence than `current`.
///
/// An unparseable version on either side yields `false`, never an error: a
/// client reporting a malformed version must not be pushed an update it might
/// not actually need.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    match (Version::parse(current), Version::parse(candidate)) {
        (Some(cur), Some(cand)) => cand > cur,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap_or_else(|| panic!("'{text}' should parse"))
    }

    #[test]
    fn test_parse_plain_version() {
        let parsed = v("1.2.3");
        assert_eq!(parsed.major, 1);
        assert_eq!(parsed.minor, 2);
        assert_eq!(parsed.patch, 3);
        assert!(parsed.prerelease.is_empty());
        assert!(parsed.build.is_empty());
    }

    #[test]
    fn test_parse_prerelease_and_build() {
        let parsed = v("1.0.0-beta.1+001");
        assert_eq!(parsed.prerelease, vec!["beta", "1"]);
        assert_eq!(parsed.build, vec!["001"]);
    }

    #[test]
    fn test_parse_build_only() {
        let parsed = v("2.0.0+exp.sha.5114f85");
        assert!(parsed.prerelease.is_empty());
        assert_eq!(parsed.build, vec!["exp", "sha", "5114f85"]);
    }

    #[test]
    fn test_parse_hyphen_in_prerelease_identifier() {
        let parsed = v("1.0.0-alpha-1.x-y");
        assert_eq!(parsed.prerelease, vec!["alpha-1", "x-y"]);
    }

    #[test]
    fn test_parse_rejects_invalid_input() {
        for bad in [
            "",
            "1",
            "1.2",
            "v1.2.3",
            "1.2.x",
            "1.a.3",
            "1.2.3-",
            "1.2.3+",
            "1.2.3-beta..1",
            "1.2.3-beta.",
            "1.2.3-béta",
            "not a version",
            "1.2.3.4",
        ] {
            assert!(Version::parse(bad).is_none(), "'{bad}' should not parse");
        }
    }

    #[test]
    fn test_format_round_trips_canonical_forms() {
        for text in ["1.2.3", "0.0.0", "1.0.0-beta.1+001", "2.0.0-rc.1", "3.1.4+meta"] {
            assert_eq!(v(text).to_string(), text);
        }
    }

    #[test]
    fn test_core_version_ordering() {
        assert!(v("2.0.0") > v("1.9.9"));
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("1.0.10") > v("1.0.9"));
    }

    #[test]
    fn test_release_outranks_prerelease() {
        assert!(v("1.0.0") > v("1.0.0-alpha"));
        assert!(v("1.0.0-alpha") < v("1.0.0"));
    }

    #[test]
    fn test_prerelease_precedence_chain() {
        // The canonical ordering example from the SemVer spec.
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        for pair in ordered.windows(2) {
            assert!(
                v(pair[0]) < v(pair[1]),
                "{} should be lower precedence than {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_numeric_identifier_below_alphanumeric() {
        assert!(v("1.0.0-1") < v("1.0.0-alpha"));
        assert!(v("1.0.0-999") < v("1.0.0-0a"));
    }

    #[test]
    fn test_prerelease_prefix_is_lower() {
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
    }

    #[test]
    fn test_build_metadata_ignored_in_comparison() {
        assert_eq!(v("1.2.3+001"), v("1.2.3+002"));
        assert_eq!(v("1.2.3"), v("1.2.3+build"));
        assert!(v("1.2.3+zzz") < v("1.2.4"));
    }

    #[test]
    fn test_compare_is_reflexive() {
        for text in ["1.2.3", "1.0.0-beta.2", "0.1.0+m"] {
            assert_eq!(v(text).cmp(&v(text)), Ordering::Equal);
        }
    }

    #[test]
    fn test_compare_antisymmetric_and_transitive() {
        let a = v("1.0.0-alpha.1");
        let b = v("1.0.0-beta");
        let c = v("1.0.0");
        assert!(a < b && b < c && a < c);
        assert!(c > b && b > a && c > a);
    }

    #[test]
    fn test_is_newer_basic() {
        assert!(is_newer("1.0.0", "1.0.1"));
        assert!(is_newer("1.0.0-alpha", "1.0.0"));
        assert!(!is_newer("1.0.0", "1.0.0-alpha"));
        assert!(!is_newer("1.0.0", "1.0.0"));
        assert!(!is_newer("2.0.0", "1.9.9"));
    }

    #[test]
    fn test_is_newer_unparseable_never_updates() {
        assert!(!is_newer("invalid", "1.0.0"));
        assert!(!is_newer("1.0.0", "invalid"));
        assert!(!is_newer("", ""));
        assert!(!is_newer("v1.0.0", "2.0.0"));
    }
}
