#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic)]
//! Shared HTTP DTOs for the crawl backend REST API.
//!
//! Every endpoint answers with the same `{success, data?, message?}` envelope.
//! The payload types here are lenient: missing, `null` or mistyped fields fall
//! back to their defaults because the backend omits zero values and emits
//! `null` for unset optionals, and the dashboard must keep rendering.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// REST paths consumed by the dashboard.
pub mod paths {
    /// Task list.
    pub const TASKS: &str = "/api/tasks";
    /// Task creation.
    pub const TASKS_CREATE: &str = "/api/tasks/create";
    /// Local IP collection.
    pub const LOCAL_IPS: &str = "/api/ip/local";
    /// Whitelist collection.
    pub const WHITELIST: &str = "/api/ip/whitelist";
    /// Blacklist collection.
    pub const BLACKLIST: &str = "/api/ip/blacklist";
    /// IP pool policy.
    pub const IP_SETTINGS: &str = "/api/ip/settings";
    /// Connection pool metrics.
    pub const POOL_STATS: &str = "/api/pool/stats";

    /// Path addressing a single local IP record; the id is percent-encoded.
    #[must_use]
    pub fn local_ip(id: &str) -> String {
        format!("{LOCAL_IPS}/{}", urlencoding::encode(id))
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope {
    /// Explicit success flag; `None` when the server omitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Endpoint payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable message, usually present on failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Successful envelope wrapping `data`.
    #[must_use]
    pub const fn ok(data: Value) -> Self {
        Self {
            success: Some(true),
            data: Some(data),
            message: None,
        }
    }

    /// Failed envelope carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            data: None,
            message: Some(message.into()),
        }
    }

    /// Read an envelope out of any parsed JSON document.
    ///
    /// Non-object documents produce an empty envelope rather than an error; the
    /// caller decides from the transport status whether that is a failure.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        Self {
            success: object.get("success").and_then(Value::as_bool),
            data: object.get("data").filter(|data| !data.is_null()).cloned(),
            message: object
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_string),
        }
    }

    /// Whether the server explicitly flagged the call as failed.
    #[must_use]
    pub fn is_explicit_failure(&self) -> bool {
        self.success == Some(false)
    }
}

/// Body for `POST /api/tasks/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    /// Display name.
    pub name: String,
    /// Task type (`http`, `google_earth`, `custom`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Crawl target URL.
    pub url: String,
    /// Scheduling priority.
    pub priority: i64,
    /// Per-execution timeout in seconds.
    pub timeout: i64,
    /// Schedule mode (`once`, `cron`, `interval`).
    pub schedule: String,
    /// Cron expression, empty unless the schedule is `cron`.
    pub cron_expression: String,
}

/// Body for `POST /api/ip/local`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalIpRequest {
    /// IP address to register.
    pub address: String,
    /// Free-form origin label.
    pub source: String,
}

/// Body for whitelist/blacklist `POST`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessIpRequest {
    /// Address to add.
    pub ip: String,
}

/// Which access list an operation targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessListKind {
    /// Allowed addresses.
    Whitelist,
    /// Blocked addresses.
    Blacklist,
}

impl AccessListKind {
    /// REST collection path for the list.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Whitelist => paths::WHITELIST,
            Self::Blacklist => paths::BLACKLIST,
        }
    }

    /// Lower-case label used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

/// Local IP record owned by the backend IP manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpRecord {
    /// Backend identifier (string or numeric on the wire).
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// IP address.
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    /// Address family or classification.
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    /// Origin label supplied when the record was added.
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    /// Health status reported by the backend.
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

/// IP pool policy; absent or unreadable fields are zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct IpPolicy {
    /// Connections to warm up per address.
    #[serde(deserialize_with = "lenient_u64")]
    pub preheat_connections: u64,
    /// Failures tolerated before an address is benched.
    #[serde(deserialize_with = "lenient_u64")]
    pub max_failures: u64,
    /// Rotation period in seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub rotate_interval_seconds: u64,
    /// Delay before a benched address is retried, in seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub auto_recover_seconds: u64,
}

/// Connection pool metrics snapshot as served by `/api/pool/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolStats {
    /// Connections currently held.
    #[serde(rename = "TotalConnections", deserialize_with = "lenient_u64")]
    pub total_connections: u64,
    /// Connections in use.
    #[serde(rename = "ActiveConnections", deserialize_with = "lenient_u64")]
    pub active_connections: u64,
    /// Connections parked in the pool.
    #[serde(rename = "IdleConnections", deserialize_with = "lenient_u64")]
    pub idle_connections: u64,
    /// Connections passing health checks.
    #[serde(rename = "HealthyConnections", deserialize_with = "lenient_u64")]
    pub healthy_connections: u64,
    /// Request success rate, either a ratio (0-1) or a percentage.
    #[serde(rename = "SuccessRate", deserialize_with = "lenient_f64")]
    pub success_rate: Option<f64>,
    /// Connection reuse rate, either a ratio (0-1) or a percentage.
    #[serde(rename = "ConnReuseRate", deserialize_with = "lenient_f64")]
    pub conn_reuse_rate: Option<f64>,
    /// Whitelist size.
    #[serde(rename = "WhitelistIPs", deserialize_with = "lenient_u64")]
    pub whitelist_ips: u64,
    /// Blacklist size.
    #[serde(rename = "BlacklistIPs", deserialize_with = "lenient_u64")]
    pub blacklist_ips: u64,
    /// RFC 3339 timestamp of the last pool update.
    #[serde(rename = "LastUpdateTime", deserialize_with = "lenient_text")]
    pub last_update_time: Option<String>,
}

/// Strings pass through, numbers are printed, anything else is empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}

/// Non-empty strings only.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string))
}

/// Counters: non-negative numbers (fractions truncated) or numeric strings, else zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_u64().unwrap_or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && *float > 0.0)
                .map_or(0, |float| float as u64)
        }),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// Finite numbers or numeric strings, else absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let float = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(float.filter(|float| float.is_finite()))
}
