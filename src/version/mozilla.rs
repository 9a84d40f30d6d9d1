//! Product version parsing and ordering
//!
//! Accepted forms:
//! - `1.2`, `1.2.3` - two or three numeric components
//! - `1.2.3a1`, `1.2b2`, `3.6.3pre1`, `3.6.3plugin1` - with a pre-release marker
//! - `1.5.0.12` - legacy four component form, the single-digit third component is dropped
//!
//! Pre-release tags are case-insensitive and reduced to their first letter,
//! so `plugin1` and `pre1` both render as `p1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::MalformedVersionError;

static MODERN_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(\d+)\.(\d+)(?:\.(\d+))?(?:(a|b|pre|plugin|p)(\d+))?$")
        .expect("valid version regex")
});

static LEGACY_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(\d+)\.(\d+)\.\d\.(\d+)(?:(a|b|pre|plugin|p)(\d+))?$")
        .expect("valid legacy version regex")
});

/// Pre-release marker, ordered by tag letter then number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreRelease {
    pub tag: char,
    pub number: u64,
}

/// A parsed product version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<PreRelease>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    pub fn with_prerelease(mut self, tag: char, number: u64) -> Self {
        self.prerelease = Some(PreRelease { tag, number });
        self
    }

    /// Parse a version string, failing on anything outside the accepted grammar
    pub fn parse(text: &str) -> Result<Self, MalformedVersionError> {
        let malformed = || MalformedVersionError(text.to_string());

        let caps = if let Some(caps) = MODERN_VERSION.captures(text) {
            caps
        } else if text.matches('.').count() == 3 {
            LEGACY_VERSION.captures(text).ok_or_else(malformed)?
        } else {
            return Err(malformed());
        };

        let number = |idx: usize| -> Result<u64, MalformedVersionError> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u64>().map_err(|_| malformed()),
                None => Ok(0),
            }
        };

        let mut version = Version::new(number(1)?, number(2)?, number(3)?);

        if let Some(tag) = caps.get(4) {
            let letter = tag
                .as_str()
                .chars()
                .next()
                .map(|c| c.to_ascii_lowercase())
                .ok_or_else(malformed)?;
            version.prerelease = Some(PreRelease {
                tag: letter,
                number: number(5)?,
            });
        }

        Ok(version)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

impl FromStr for Version {
    type Err = MalformedVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                // A final release sorts after any of its pre-releases
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)?;
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        }
        if let Some(pre) = &self.prerelease {
            write!(f, "{}{}", pre.tag, pre.number)?;
        }
        Ok(())
    }
}

/// Compare two version strings, failing if either is malformed
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, MalformedVersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}
