//! Rule records as read from the catalog

use serde::Deserialize;

fn full_rollout() -> u8 {
    100
}

/// A prioritized predicate → release mapping
///
/// Every filter is optional; an absent filter matches any query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, rename = "rule_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub alias: Option<String>,
    pub priority: i64,

    // Exact filters
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub build_target: Option<String>,
    #[serde(default)]
    pub header_architecture: Option<String>,
    #[serde(default)]
    pub dist_version: Option<String>,

    // Pattern filters
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "buildID")]
    pub build_id: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub instruction_set: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub mig64: Option<bool>,
    #[serde(default)]
    pub jaws: Option<bool>,

    #[serde(default)]
    pub mapping: Option<String>,
    #[serde(default)]
    pub fallback_mapping: Option<String>,
    /// Percent of eligible clients that receive `mapping`
    #[serde(default = "full_rollout")]
    pub background_rate: u8,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            id: None,
            alias: None,
            priority: 0,
            product: None,
            build_target: None,
            header_architecture: None,
            dist_version: None,
            channel: None,
            version: None,
            build_id: None,
            memory: None,
            os_version: None,
            instruction_set: None,
            distribution: None,
            locale: None,
            mig64: None,
            jaws: None,
            mapping: None,
            fallback_mapping: None,
            background_rate: full_rollout(),
        }
    }
}

impl Rule {
    /// Name used in log lines: alias, then id, then mapping
    pub fn label(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if let Some(id) = self.id {
            return format!("rule {id}");
        }
        self.mapping.clone().unwrap_or_else(|| "<no mapping>".to_string())
    }

    /// Mapping name, treating an empty string as no mapping
    pub fn mapping(&self) -> Option<&str> {
        self.mapping.as_deref().filter(|m| !m.is_empty())
    }

    pub fn fallback_mapping(&self) -> Option<&str> {
        self.fallback_mapping.as_deref().filter(|m| !m.is_empty())
    }
}
