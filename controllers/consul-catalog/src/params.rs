//! Invocation parameters and their validation.
//!
//! `ModuleParams` mirrors the flat record an automation host hands over.
//! Nothing in it is trusted until [`ModuleParams::validate`] turns it into an
//! [`Invocation`]; that happens before any network call.

use crate::error::ControllerError;
use crate::reconciler::ChangeDetection;
use crate::target::{CatalogTarget, DesiredState, NodeSpec, ServiceSpec};
use consul_client::config::{DEFAULT_PORT, DEFAULT_TIMEOUT};
use consul_client::{ConnectionConfig, Scheme};
use serde::de;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Keys the host framework injects into every module call
const HOST_INTERNAL_PREFIX: &str = "_ansible_";

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Templated values reach the module as strings ("8500", "yes", "a,b").
// The helpers below accept both the typed and the string form.

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseList {
    List(Vec<String>),
    Text(String),
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LooseInt::Int(n)) => Ok(Some(n)),
        Some(LooseInt::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid integer '{s}'"))),
    }
}

fn lenient_int_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int(deserializer)?.unwrap_or_default())
}

/// Boolean spellings the host accepts for `type: bool`
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "on" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseBool>::deserialize(deserializer)? {
        None => Ok(false),
        Some(LooseBool::Bool(b)) => Ok(b),
        Some(LooseBool::Int(0)) => Ok(false),
        Some(LooseBool::Int(1)) => Ok(true),
        Some(LooseBool::Int(n)) => Err(de::Error::custom(format!("invalid boolean '{n}'"))),
        Some(LooseBool::Text(s)) => parse_bool(&s).ok_or_else(|| de::Error::custom(format!("invalid boolean '{s}'"))),
    }
}

/// A list, or a comma separated string of items
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(LooseList::List(items)) => items,
        Some(LooseList::Text(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Raw parameter record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModuleParams {
    #[serde(default)]
    pub consul_host: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub consul_port: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dc: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub scheme: Option<Scheme>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub verify: bool,
    #[serde(default)]
    pub state: Option<DesiredState>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_id: String,
    #[serde(default, deserialize_with = "lenient_int_or_zero")]
    pub service_port: i64,
    #[serde(default, deserialize_with = "lenient_list")]
    pub service_tags: Vec<String>,
    /// Request timeout in seconds
    #[serde(default, deserialize_with = "lenient_int")]
    pub timeout: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub detect_changes: bool,
    /// Dry run requested by the host; this module does not support one
    #[serde(rename = "_ansible_check_mode", default, deserialize_with = "lenient_bool")]
    pub check_mode: bool,
    /// Anything else; host-internal keys are tolerated, the rest rejected
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Validated, strongly typed view of one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub connection: ConnectionConfig,
    pub target: CatalogTarget,
    pub state: DesiredState,
    pub change_detection: ChangeDetection,
    /// Skip the catalog entirely and report the run as skipped
    pub check_mode: bool,
}

impl ModuleParams {
    /// Check required fields and ranges and build the typed invocation
    ///
    /// # Errors
    /// Returns `ControllerError::Validation` for a missing or empty `node`,
    /// out-of-range ports, a zero timeout, or unsupported parameters.
    pub fn validate(self) -> Result<Invocation, ControllerError> {
        let unsupported: Vec<&str> = self
            .extra
            .keys()
            .map(String::as_str)
            .filter(|k| !k.starts_with(HOST_INTERNAL_PREFIX))
            .collect();
        if !unsupported.is_empty() {
            return Err(ControllerError::Validation(format!(
                "unsupported parameters: {}",
                unsupported.join(", ")
            )));
        }

        let node = self
            .node
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ControllerError::Validation("missing required parameter: node".to_string()))?;

        let port = match self.consul_port {
            None => DEFAULT_PORT,
            Some(p) => u16::try_from(p)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| ControllerError::Validation(format!("consul_port must be between 1 and 65535, got {p}")))?,
        };

        let service_port = u16::try_from(self.service_port).map_err(|_| {
            ControllerError::Validation(format!(
                "service_port must be between 0 and 65535, got {}",
                self.service_port
            ))
        })?;

        let request_timeout = match self.timeout {
            None => DEFAULT_TIMEOUT,
            Some(secs) => u64::try_from(secs)
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ControllerError::Validation(format!("timeout must be at least 1 second, got {secs}")))?,
        };

        let connection = ConnectionConfig {
            host: self.consul_host.unwrap_or_else(|| "localhost".to_string()),
            port,
            scheme: self.scheme.unwrap_or_default(),
            verify_tls: self.verify,
            token: Some(self.token).filter(|t| !t.is_empty()),
            datacenter: Some(self.dc).filter(|dc| !dc.is_empty()),
            request_timeout,
        };

        let target = CatalogTarget {
            node: NodeSpec {
                node,
                address: self.address,
            },
            service: ServiceSpec {
                name: self.service_name,
                id: self.service_id,
                port: service_port,
                tags: self.service_tags,
            },
        };

        Ok(Invocation {
            connection,
            target,
            state: self.state.unwrap_or_default(),
            change_detection: if self.detect_changes {
                ChangeDetection::Diff
            } else {
                ChangeDetection::Always
            },
            check_mode: self.check_mode,
        })
    }
}
