//! Update-check requests
//!
//! Clients ask for updates with a URL path whose layout depends on the
//! protocol ("query") version:
//!
//! ```text
//! /update/1/<product>/<version>/<buildID>/<buildTarget>/<locale>/<channel>/update.xml
//! /update/2/.../<channel>/<osVersion>/update.xml
//! /update/3/.../<channel>/<osVersion>/<distribution>/<distVersion>/update.xml
//! /update/4/.../<distVersion>/<platformVersion>/update.xml
//! /update/5/.../<platformVersion>/<IMEI>/update.xml
//! /update/6/.../<channel>/<osVersion>/<systemCapabilities>/<distribution>/<distVersion>/update.xml
//! ```

use tracing::debug;

use crate::error::ResolveError;

/// Partner builds publish on `<channel>-cck-<partner>`
const PARTNER_CHANNEL_SEPARATOR: &str = "-cck-";

/// Operator override for staged-rollout sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloutOverride {
    #[default]
    Unset,
    /// Always include the client, skipping sampling
    ForceInclude,
    /// Always exclude the client from a partial rollout
    ForceExclude,
}

impl RolloutOverride {
    /// Decode the `force` request parameter (`1` or `-1`)
    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "1" => RolloutOverride::ForceInclude,
            "-1" => RolloutOverride::ForceExclude,
            _ => RolloutOverride::Unset,
        }
    }
}

/// A single update-check request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateQuery {
    pub query_version: u8,
    pub product: String,
    pub version: String,
    pub build_id: String,
    pub channel: String,
    pub os_version: String,
    pub build_target: Option<String>,
    pub locale: Option<String>,
    pub header_architecture: Option<String>,
    pub distribution: Option<String>,
    pub dist_version: Option<String>,
    pub instruction_set: Option<String>,
    /// Physical memory in MB
    pub memory: Option<u64>,
    pub mig64: Option<bool>,
    pub jaws: Option<bool>,
    pub force: RolloutOverride,
}

impl UpdateQuery {
    /// Channel with any partner suffix stripped
    pub fn fallback_channel(&self) -> &str {
        fallback_channel(&self.channel)
    }

    /// Copy of this query targeting another product
    pub fn for_product(&self, product: &str) -> Self {
        Self {
            product: product.to_string(),
            ..self.clone()
        }
    }

    /// Decode a client URL path such as `/update/6/Firefox/.../update.xml`
    pub fn from_path(path: &str) -> Result<Self, ResolveError> {
        let segments = path
            .trim_matches('/')
            .split('/')
            .map(decode_segment)
            .collect::<Result<Vec<_>, _>>()?;

        let [update, version, rest @ ..] = segments.as_slice() else {
            return Err(ResolveError::BadRequest(format!("unrecognised path {path}")));
        };
        if update != "update" {
            return Err(ResolveError::BadRequest(format!("unrecognised path {path}")));
        }

        let query_version: u8 = version
            .parse()
            .map_err(|_| ResolveError::BadRequest(format!("invalid query version {version}")))?;

        let rest = match rest.split_last() {
            Some((last, fields)) if last == "update.xml" => fields,
            _ => {
                return Err(ResolveError::BadRequest(format!(
                    "path must end with update.xml: {path}"
                )));
            }
        };

        let expected = match query_version {
            1 => 6,
            2 => 7,
            3 => 9,
            4 => 10,
            5 => 11,
            6 => 10,
            other => {
                return Err(ResolveError::BadRequest(format!(
                    "unsupported query version {other}"
                )));
            }
        };
        if rest.len() != expected {
            return Err(ResolveError::BadRequest(format!(
                "query version {query_version} expects {expected} fields, got {}",
                rest.len()
            )));
        }

        let mut query = UpdateQuery {
            query_version,
            product: rest[0].clone(),
            version: rest[1].clone(),
            build_id: rest[2].clone(),
            build_target: Some(rest[3].clone()),
            locale: Some(rest[4].clone()),
            channel: rest[5].clone(),
            ..Default::default()
        };

        if query_version >= 2 {
            query.os_version = rest[6].clone();
        }
        match query_version {
            3..=5 => {
                query.distribution = Some(rest[7].clone());
                query.dist_version = Some(rest[8].clone());
            }
            6 => {
                query.apply_system_capabilities(&rest[7])?;
                query.distribution = Some(rest[8].clone());
                query.dist_version = Some(rest[9].clone());
            }
            _ => {}
        }

        debug!(
            "Decoded v{} query for {}/{} on {}",
            query.query_version, query.product, query.version, query.channel
        );
        Ok(query)
    }

    /// Apply URL query-string parameters (`force`, `mig64`)
    pub fn with_params<'a>(mut self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (key, value) in params {
            match key {
                "force" => self.force = RolloutOverride::from_param(value),
                "mig64" => self.mig64 = parse_flag(value),
                _ => {}
            }
        }
        self
    }

    /// `systemCapabilities` is either a bare instruction set or
    /// `ISET:<set>,MEM:<mb>,JAWS:<0|1>`
    fn apply_system_capabilities(&mut self, capabilities: &str) -> Result<(), ResolveError> {
        if !capabilities.contains(':') {
            self.instruction_set = Some(capabilities.to_string());
            return Ok(());
        }

        for item in capabilities.split(',') {
            let Some((key, value)) = item.split_once(':') else {
                return Err(ResolveError::BadRequest(format!(
                    "invalid system capability {item}"
                )));
            };
            match key {
                "ISET" => self.instruction_set = Some(value.to_string()),
                "MEM" => {
                    let memory = value.parse().map_err(|_| {
                        ResolveError::BadRequest(format!("invalid memory value {value}"))
                    })?;
                    self.memory = Some(memory);
                }
                "JAWS" => self.jaws = parse_flag(value),
                other => debug!("Ignoring unknown system capability {}", other),
            }
        }
        Ok(())
    }
}

pub fn fallback_channel(channel: &str) -> &str {
    channel
        .split(PARTNER_CHANNEL_SEPARATOR)
        .next()
        .unwrap_or(channel)
}

fn decode_segment(segment: &str) -> Result<String, ResolveError> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|e| ResolveError::BadRequest(format!("invalid path encoding: {e}")))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
