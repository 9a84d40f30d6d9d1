//! Rule selection
//!
//! Rules are evaluated from highest to lowest priority. Rules with equal
//! priority keep the order the catalog returned them in (the sort is
//! stable), which is otherwise unspecified.

use tracing::{debug, info};

use crate::error::ResolveError;
use crate::query::UpdateQuery;
use crate::rules::Rule;
use crate::rules::matchers::{
    match_boolean, match_build_id, match_channel, match_csv, match_locale, match_memory,
    match_simple_expression, match_version,
};
use crate::source::RuleSource;

/// Name of the first exact filter that disagrees with the query
fn exact_mismatch(rule: &Rule, query: &UpdateQuery) -> Option<&'static str> {
    let filters = [
        ("product", rule.product.as_deref(), Some(query.product.as_str())),
        (
            "buildTarget",
            rule.build_target.as_deref(),
            query.build_target.as_deref(),
        ),
        (
            "headerArchitecture",
            rule.header_architecture.as_deref(),
            query.header_architecture.as_deref(),
        ),
        (
            "distVersion",
            rule.dist_version.as_deref(),
            query.dist_version.as_deref(),
        ),
    ];

    filters
        .into_iter()
        .find(|(_, expected, actual)| match expected {
            Some(expected) if !expected.is_empty() => Some(*expected) != *actual,
            _ => false,
        })
        .map(|(field, _, _)| field)
}

/// Name of the first pattern filter that rejects the query
fn pattern_mismatch(
    rule: &Rule,
    query: &UpdateQuery,
) -> Result<Option<&'static str>, ResolveError> {
    let mismatch = if !match_channel(
        rule.channel.as_deref(),
        &query.channel,
        query.fallback_channel(),
    ) {
        Some("channel")
    } else if !match_version(rule.version.as_deref(), &query.version)? {
        Some("version")
    } else if !match_build_id(rule.build_id.as_deref(), &query.build_id)? {
        Some("buildID")
    } else if !match_memory(rule.memory.as_deref(), query.memory)? {
        Some("memory")
    } else if !match_simple_expression(rule.os_version.as_deref(), &query.os_version) {
        Some("osVersion")
    } else if !match_csv(
        rule.instruction_set.as_deref(),
        query.instruction_set.as_deref().unwrap_or(""),
        false,
    ) {
        Some("instructionSet")
    } else if !match_csv(
        rule.distribution.as_deref(),
        query.distribution.as_deref().unwrap_or(""),
        false,
    ) {
        Some("distribution")
    } else if !match_locale(rule.locale.as_deref(), query.locale.as_deref().unwrap_or("")) {
        Some("locale")
    } else if !match_boolean(rule.mig64, query.mig64) {
        Some("mig64")
    } else if !match_boolean(rule.jaws, query.jaws) {
        Some("jaws")
    } else {
        None
    };
    Ok(mismatch)
}

/// Every rule matching the query, highest priority first
///
/// A malformed pattern on any rule that passes the exact filters fails the
/// whole lookup instead of being skipped.
pub async fn matching_rules<R: RuleSource + ?Sized>(
    source: &R,
    query: &UpdateQuery,
) -> Result<Vec<Rule>, ResolveError> {
    let mut rules = source.list_rules().await?;
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut candidates = Vec::new();
    for rule in rules {
        if let Some(field) = exact_mismatch(&rule, query) {
            debug!("{} didn't match {}", field, rule.label());
            continue;
        }
        if let Some(field) = pattern_mismatch(&rule, query)? {
            debug!("{} didn't match {}", field, rule.label());
            continue;
        }
        candidates.push(rule);
    }

    Ok(candidates)
}

/// Highest-priority rule matching the query, or [`ResolveError::NoMatch`]
pub async fn select_rule<R: RuleSource + ?Sized>(
    source: &R,
    query: &UpdateQuery,
) -> Result<Rule, ResolveError> {
    let rule = matching_rules(source, query)
        .await?
        .into_iter()
        .next()
        .ok_or(ResolveError::NoMatch)?;

    info!(
        "Matched {} (priority {}) for {}/{}",
        rule.label(),
        rule.priority,
        query.product,
        query.channel
    );
    Ok(rule)
}
