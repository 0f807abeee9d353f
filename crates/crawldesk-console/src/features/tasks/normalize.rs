//! Raw backend task record to canonical [`Task`].
//!
//! The backend omits zero values and older records miss whole fields, so every
//! field falls back to a default. Running a normalized task back through
//! [`normalize_task`] yields the same task.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::state::{Task, TaskSchedule, TaskStatus, TaskType};

/// Name shown for tasks without one.
pub const UNTITLED_TASK: &str = "Untitled task";
/// Priority assumed when the record carries none.
pub const DEFAULT_PRIORITY: i64 = 5;

/// Normalize using the current clock for missing timestamps.
#[must_use]
pub fn normalize_task(raw: &Value) -> Task {
    normalize_task_at(raw, Utc::now())
}

/// Normalize with an explicit `now` for missing timestamps.
#[must_use]
pub fn normalize_task_at(raw: &Value, now: DateTime<Utc>) -> Task {
    let created_at = timestamp(raw.get("createdAt"));
    let last_execution = timestamp(raw.get("lastExecution")).or(created_at);

    Task {
        id: identifier(raw.get("id")),
        name: text(raw.get("name")).unwrap_or_else(|| UNTITLED_TASK.to_string()),
        kind: text(raw.get("type")).map_or(TaskType::Custom, TaskType::from),
        status: text(raw.get("status")).map_or(TaskStatus::Pending, TaskStatus::from),
        priority: raw
            .get("priority")
            .and_then(integral)
            .unwrap_or(DEFAULT_PRIORITY),
        schedule: text(raw.get("schedule")).map_or(TaskSchedule::Once, TaskSchedule::from),
        last_execution: last_execution.unwrap_or(now),
        created_at: created_at.unwrap_or(now),
        success_rate: number(raw.get("successRate")),
        target: raw
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        progress: number(raw.get("progress")),
    }
}

fn identifier(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("task-{}", Uuid::new_v4().simple()),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[allow(clippy::cast_possible_truncation)]
fn integral(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|float| float.trunc() as i64))
}

fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
