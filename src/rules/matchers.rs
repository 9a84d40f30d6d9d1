//! Field matchers: one predicate per rule column
//!
//! Each matcher takes the rule-side pattern and the query-side value. An
//! absent or empty pattern matches anything.
//!
//! Comparison patterns (version, buildID, memory) accept comma-separated
//! clauses that must all hold:
//! - `>=X`, `>X`, `<=X`, `<X` - ordered comparison
//! - `=X` or `X` - equality

use std::fmt::Display;

use crate::error::ResolveError;
use crate::version::{BuildId, Version};

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl Comparison {
    /// Split a clause into its operator and operand
    fn split(clause: &str) -> (Self, &str) {
        let clause = clause.trim();
        if let Some(rest) = clause.strip_prefix(">=") {
            (Comparison::Gte, rest.trim())
        } else if let Some(rest) = clause.strip_prefix('>') {
            (Comparison::Gt, rest.trim())
        } else if let Some(rest) = clause.strip_prefix("<=") {
            (Comparison::Lte, rest.trim())
        } else if let Some(rest) = clause.strip_prefix('<') {
            (Comparison::Lt, rest.trim())
        } else if let Some(rest) = clause.strip_prefix('=') {
            (Comparison::Eq, rest.trim())
        } else {
            (Comparison::Eq, clause)
        }
    }

    fn holds<T: Ord>(self, value: &T, operand: &T) -> bool {
        match self {
            Comparison::Gte => value >= operand,
            Comparison::Gt => value > operand,
            Comparison::Lte => value <= operand,
            Comparison::Lt => value < operand,
            Comparison::Eq => value == operand,
        }
    }
}

/// Pattern with surrounding whitespace removed, or None when it matches anything
fn active(pattern: Option<&str>) -> Option<&str> {
    pattern.map(str::trim).filter(|p| !p.is_empty())
}

fn tokens(pattern: &str) -> impl Iterator<Item = &str> {
    pattern.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Evaluate every clause of `pattern` against an already parsed query value
fn match_comparisons<T, E, F>(
    field: &str,
    pattern: &str,
    value: &T,
    parse: F,
) -> Result<bool, ResolveError>
where
    T: Ord,
    E: Display,
    F: Fn(&str) -> Result<T, E>,
{
    for clause in pattern.split(',') {
        let (comparison, operand) = Comparison::split(clause);
        let operand = parse(operand).map_err(|e| {
            ResolveError::BadData(format!("{field} pattern '{pattern}': {e}"))
        })?;
        if !comparison.holds(value, &operand) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Match a literal or `prefix*` form against one channel
fn match_channel_form(form: &str, channel: &str) -> bool {
    match form.strip_suffix('*') {
        Some(prefix) => channel.starts_with(prefix),
        None => form == channel,
    }
}

/// Channel patterns may be a literal, a `prefix*` wildcard, or a comma-separated
/// set of those. The fallback channel is tried when the real one doesn't match.
pub fn match_channel(pattern: Option<&str>, value: &str, fallback: &str) -> bool {
    let Some(pattern) = active(pattern) else {
        return true;
    };
    tokens(pattern).any(|form| match_channel_form(form, value))
        || tokens(pattern).any(|form| match_channel_form(form, fallback))
}

pub fn match_version(pattern: Option<&str>, value: &str) -> Result<bool, ResolveError> {
    let Some(pattern) = active(pattern) else {
        return Ok(true);
    };
    let version = Version::parse(value)?;
    match_comparisons("version", pattern, &version, Version::parse)
}

pub fn match_build_id(pattern: Option<&str>, value: &str) -> Result<bool, ResolveError> {
    let Some(pattern) = active(pattern) else {
        return Ok(true);
    };
    let build_id = BuildId::parse(value)?;
    match_comparisons("buildID", pattern, &build_id, BuildId::parse)
}

/// Memory patterns are thresholds in MB, e.g. `>=2048`
pub fn match_memory(pattern: Option<&str>, value: Option<u64>) -> Result<bool, ResolveError> {
    let Some(pattern) = active(pattern) else {
        return Ok(true);
    };
    let Some(memory) = value else {
        return Ok(false);
    };
    match_comparisons("memory", pattern, &memory, str::parse::<u64>)
}

/// Comma-separated tokens; `prefix*` tokens match by prefix, literal tokens by substring
pub fn match_simple_expression(pattern: Option<&str>, value: &str) -> bool {
    let Some(pattern) = active(pattern) else {
        return true;
    };
    tokens(pattern).any(|token| match token.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value.contains(token),
    })
}

pub fn match_csv(pattern: Option<&str>, value: &str, substring: bool) -> bool {
    let Some(pattern) = active(pattern) else {
        return true;
    };
    tokens(pattern).any(|token| {
        if substring {
            value.contains(token)
        } else {
            value == token
        }
    })
}

/// Locales are exact matches only
pub fn match_locale(pattern: Option<&str>, value: &str) -> bool {
    match_csv(pattern, value, false)
}

pub fn match_boolean(pattern: Option<bool>, value: Option<bool>) -> bool {
    match pattern {
        None => true,
        Some(expected) => value == Some(expected),
    }
}
