//! Semantic version parsing and comparison.
//!
//! Parsing is deliberately tolerant: a leading `v` is optional, missing minor
//! and patch components default to zero, and anything after the last numeric
//! component (pre-release tags, build metadata) is ignored. Ordering is
//! lexicographic over `(major, minor, patch)`.

use std::{cmp::Ordering, fmt, num::ParseIntError, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(\d+)(?:\.(\d+)(?:\.(\d+))?)?.*$").expect("version pattern is valid")
});

/// Errors raised while parsing a version string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("`{input}` is not a semantic version")]
    Malformed { input: String },
    #[error("version component `{component}` in `{input}` is out of range")]
    OutOfRange {
        input: String,
        component: &'static str,
        #[source]
        source: ParseIntError,
    },
}

/// A `(major, minor, patch)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string such as `v1.2.3`, `1.2` or `1.2.3-alpha+build`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let captures = VERSION_PATTERN
            .captures(trimmed)
            .ok_or_else(|| VersionError::Malformed {
                input: input.to_string(),
            })?;

        let component = |index: usize, name: &'static str| -> Result<u64, VersionError> {
            match captures.get(index) {
                Some(found) => {
                    found
                        .as_str()
                        .parse::<u64>()
                        .map_err(|source| VersionError::OutOfRange {
                            input: input.to_string(),
                            component: name,
                            source,
                        })
                }
                None => Ok(0),
            }
        };

        Ok(Self {
            major: component(1, "major")?,
            minor: component(2, "minor")?,
            patch: component(3, "patch")?,
        })
    }

    /// True when every component matches.
    pub fn equal(&self, other: &Self) -> bool {
        self == other
    }

    pub fn greater_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    pub fn same_major(&self, other: &Self) -> bool {
        self.major == other.major
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tolerant_forms() {
        let cases = [
            ("v1.2.3", SemanticVersion::new(1, 2, 3)),
            ("1.2.3", SemanticVersion::new(1, 2, 3)),
            ("v1", SemanticVersion::new(1, 0, 0)),
            ("1", SemanticVersion::new(1, 0, 0)),
            ("v1.2", SemanticVersion::new(1, 2, 0)),
            ("1.2", SemanticVersion::new(1, 2, 0)),
            ("v1.2.3-alpha+build", SemanticVersion::new(1, 2, 3)),
        ];

        for (input, expected) in cases {
            assert_eq!(SemanticVersion::parse(input).expect(input), expected, "{input}");
        }
    }

    #[test]
    fn rejects_strings_without_leading_number() {
        for input in ["invalid", "", "v", "v.1.2"] {
            let err = SemanticVersion::parse(input).expect_err("should reject");
            assert!(matches!(err, VersionError::Malformed { .. }), "{input}");
        }
    }

    #[test]
    fn rejects_overflowing_components() {
        let err = SemanticVersion::parse("1.99999999999999999999999").expect_err("overflow");
        assert!(matches!(
            err,
            VersionError::OutOfRange {
                component: "minor",
                ..
            }
        ));
    }

    #[test]
    fn compares_major_first() {
        let older = SemanticVersion::new(1, 9, 9);
        let newer = SemanticVersion::new(2, 0, 0);
        assert!(newer.greater_than(&older));
        assert!(!older.greater_than(&newer));
        assert!(!older.greater_than(&older));
        assert!(older.equal(&SemanticVersion::new(1, 9, 9)));
        assert!(!older.same_major(&newer));
    }

    #[test]
    fn displays_with_prefix() {
        assert_eq!(SemanticVersion::new(0, 4, 1).to_string(), "v0.4.1");
    }
}
