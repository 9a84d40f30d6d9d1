//! Build identifier ordering
//!
//! Build ids are decimal timestamps such as `20200101123000`. Older builds
//! used shorter ids, so ordering is numeric at any length rather than
//! lexicographic on the raw text.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::error::MalformedBuildIdError;

#[derive(Debug, Clone)]
pub struct BuildId {
    raw: String,
}

impl BuildId {
    pub fn parse(text: &str) -> Result<Self, MalformedBuildIdError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedBuildIdError(text.to_string()));
        }
        Ok(Self {
            raw: text.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Digits with leading zeros removed ("0" for an all-zero id)
    fn significant(&self) -> &str {
        let trimmed = self.raw.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl FromStr for BuildId {
    type Err = MalformedBuildIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildId::parse(s)
    }
}

impl PartialEq for BuildId {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for BuildId {}

impl Ord for BuildId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl PartialOrd for BuildId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
