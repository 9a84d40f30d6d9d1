//! Single-product application releases

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::catalog::{XML_DECLARATION, XML_UPDATES_CLOSE, XML_UPDATES_OPEN};
use crate::query::{RolloutOverride, UpdateQuery};
use crate::release::{Release, RenderContext, UPDATE_TYPE};
use crate::version::{BuildId, Version};

fn default_hash_function() -> String {
    "sha512".to_string()
}

/// Downloadable update file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    /// `complete` or `partial`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(default = "default_hash_function")]
    pub hash_function: String,
    pub hash_value: String,
    pub size: u64,
}

impl Patch {
    /// `None` when the download domain is not whitelisted
    fn render(&self, query: &UpdateQuery, ctx: &RenderContext<'_>) -> Option<String> {
        if !is_whitelisted(&self.url, ctx.whitelisted_domains) {
            warn!("Skipping patch with non-whitelisted URL {}", self.url);
            return None;
        }

        let url = forced_url(&self.url, query, ctx.special_force_hosts);
        Some(format!(
            "<patch type=\"{}\" URL=\"{}\" hashFunction=\"{}\" hashValue=\"{}\" size=\"{}\"/>",
            self.kind, url, self.hash_function, self.hash_value, self.size
        ))
    }
}

fn is_whitelisted(url: &str, domains: &[String]) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| domains.iter().any(|domain| domain == host))
        })
        .unwrap_or(false)
}

/// Forced requests to special hosts pass `force=1` through to the download server
fn forced_url<'a>(url: &'a str, query: &UpdateQuery, special_force_hosts: &[String]) -> Cow<'a, str> {
    let forced = query.force == RolloutOverride::ForceInclude
        && special_force_hosts
            .iter()
            .any(|host| url.starts_with(host.as_str()));
    if !forced {
        return Cow::Borrowed(url);
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    Cow::Owned(format!("{url}{separator}force=1"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRelease {
    #[serde(skip)]
    pub name: String,
    pub app_version: String,
    #[serde(default)]
    pub display_version: Option<String>,
    #[serde(rename = "buildID")]
    pub build_id: String,
    #[serde(default, rename = "detailsURL")]
    pub details_url: Option<String>,
    #[serde(default)]
    pub patches: Vec<Patch>,
}

impl AppRelease {
    fn update_line(&self) -> String {
        let display_version = self.display_version.as_deref().unwrap_or(&self.app_version);
        let mut line = format!(
            "<update type=\"{}\" displayVersion=\"{}\" appVersion=\"{}\" buildID=\"{}\"",
            UPDATE_TYPE, display_version, self.app_version, self.build_id
        );
        if let Some(details_url) = &self.details_url {
            line.push_str(&format!(" detailsURL=\"{details_url}\""));
        }
        line.push('>');
        line
    }
}

impl Release for AppRelease {
    fn name(&self) -> &str {
        &self.name
    }

    /// Never offer an older version, or the same version with an older or equal build
    fn should_serve_update(&self, query: &UpdateQuery) -> bool {
        let (offered, current) = match (
            Version::parse(&self.app_version),
            Version::parse(&query.version),
        ) {
            (Ok(offered), Ok(current)) => (offered, current),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Not serving {}: {}", self.name, e);
                return false;
            }
        };

        match offered.cmp(&current) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => {
                match (BuildId::parse(&self.build_id), BuildId::parse(&query.build_id)) {
                    (Ok(offered), Ok(current)) => offered > current,
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Not serving {}: {}", self.name, e);
                        false
                    }
                }
            }
        }
    }

    fn render_header(&self) -> Vec<String> {
        vec![XML_DECLARATION.to_string(), XML_UPDATES_OPEN.to_string()]
    }

    fn render_inner(&self, query: &UpdateQuery, ctx: &RenderContext<'_>) -> Vec<String> {
        let patches: Vec<String> = self
            .patches
            .iter()
            .filter_map(|patch| patch.render(query, ctx))
            .collect();
        if patches.is_empty() {
            warn!("{} has no servable patches for {}", self.name, query.product);
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(patches.len() + 2);
        lines.push(self.update_line());
        lines.extend(patches);
        lines.push("</update>".to_string());
        lines
    }

    fn render_footer(&self) -> Vec<String> {
        vec![XML_UPDATES_CLOSE.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn app() -> AppRelease {
        AppRelease {
            name: "Firefox-10.0-build1".to_string(),
            app_version: "10.0".to_string(),
            display_version: Some("10.0 Beta 1".to_string()),
            build_id: "20200101".to_string(),
            details_url: None,
            patches: vec![Patch {
                kind: "complete".to_string(),
                url: "https://download.example.com/firefox-10.0.mar".to_string(),
                hash_function: "sha512".to_string(),
                hash_value: "abc".to_string(),
                size: 42,
            }],
        }
    }

    fn query(version: &str, build_id: &str) -> UpdateQuery {
        UpdateQuery {
            product: "Firefox".to_string(),
            version: version.to_string(),
            build_id: build_id.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("9.0", "20190101", true)]
    #[case("10.0b3", "20200201", true)]
    #[case("10.0", "20191231", true)]
    #[case("10.0", "20200101", false)]
    #[case("10.0", "20200102", false)]
    #[case("11.0", "20190101", false)]
    #[case("not-a-version", "20190101", false)]
    #[case("10.0", "garbage", false)]
    fn should_serve_update_only_offers_newer_builds(
        #[case] version: &str,
        #[case] build_id: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(app().should_serve_update(&query(version, build_id)), expected);
    }

    #[test]
    fn render_inner_emits_update_and_patch() {
        let domains = vec!["download.example.com".to_string()];
        let ctx = RenderContext {
            whitelisted_domains: &domains,
            special_force_hosts: &[],
        };

        let lines = app().render_inner(&query("9.0", "1"), &ctx);

        assert_eq!(
            lines,
            [
                "<update type=\"minor\" displayVersion=\"10.0 Beta 1\" appVersion=\"10.0\" buildID=\"20200101\">",
                "<patch type=\"complete\" URL=\"https://download.example.com/firefox-10.0.mar\" hashFunction=\"sha512\" hashValue=\"abc\" size=\"42\"/>",
                "</update>",
            ]
        );
    }

    #[test]
    fn render_inner_drops_non_whitelisted_patches() {
        let domains = vec!["other.example.com".to_string()];
        let ctx = RenderContext {
            whitelisted_domains: &domains,
            special_force_hosts: &[],
        };

        assert!(app().render_inner(&query("9.0", "1"), &ctx).is_empty());
    }

    #[rstest]
    #[case(RolloutOverride::ForceInclude, "https://download.example.com/a.mar", "https://download.example.com/a.mar?force=1")]
    #[case(RolloutOverride::ForceInclude, "https://download.example.com/a?os=win", "https://download.example.com/a?os=win&force=1")]
    #[case(RolloutOverride::Unset, "https://download.example.com/a.mar", "https://download.example.com/a.mar")]
    #[case(RolloutOverride::ForceInclude, "https://cdn.example.com/a.mar", "https://cdn.example.com/a.mar")]
    fn forced_url_only_for_forced_special_hosts(
        #[case] force: RolloutOverride,
        #[case] url: &str,
        #[case] expected: &str,
    ) {
        let hosts = vec!["https://download.example.com".to_string()];
        let query = UpdateQuery {
            force,
            ..Default::default()
        };

        assert_eq!(forced_url(url, &query, &hosts), expected);
    }
}
