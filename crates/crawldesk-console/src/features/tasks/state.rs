//! Canonical task model and pure list transformations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Crawl task as held by the store. Every field is populated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Task type.
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Scheduling priority; unbounded, displayed clamped to 1-10.
    pub priority: i64,
    /// Schedule mode.
    pub schedule: TaskSchedule,
    /// Last execution instant.
    pub last_execution: DateTime<Utc>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Success rate as a percentage (0-100).
    pub success_rate: f64,
    /// Crawl target URL.
    pub target: String,
    /// Progress indicator.
    pub progress: f64,
}

/// Task type; unknown server values are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskType {
    /// Plain HTTP crawl.
    Http,
    /// Google Earth tile crawl.
    GoogleEarth,
    /// User-defined crawler.
    Custom,
    /// Any other server value.
    Other(String),
}

impl TaskType {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "http",
            Self::GoogleEarth => "google_earth",
            Self::Custom => "custom",
            Self::Other(raw) => raw,
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::GoogleEarth => "Google Earth",
            Self::Custom => "Custom",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "http" => Self::Http,
            "google_earth" => Self::GoogleEarth,
            "custom" => Self::Custom,
            _ => Self::Other(value),
        }
    }
}

impl From<TaskType> for String {
    fn from(value: TaskType) -> Self {
        value.as_str().to_string()
    }
}

/// Task lifecycle status; unknown server values are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Waiting to run.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled by an operator.
    Cancelled,
    /// Waiting for a retry.
    Retrying,
    /// Any other server value.
    Other(String),
}

impl TaskStatus {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Retrying => "retrying",
            Self::Other(raw) => raw,
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Retrying => "Retrying",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "retrying" => Self::Retrying,
            _ => Self::Other(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Schedule mode; unknown server values are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskSchedule {
    /// Run a single time.
    Once,
    /// Cron expression driven.
    Cron,
    /// Fixed interval.
    Interval,
    /// Any other server value.
    Other(String),
}

impl TaskSchedule {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Once => "once",
            Self::Cron => "cron",
            Self::Interval => "interval",
            Self::Other(raw) => raw,
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Once => "One-off",
            Self::Cron => "Cron",
            Self::Interval => "Interval",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskSchedule {
    fn from(value: String) -> Self {
        match value.as_str() {
            "once" => Self::Once,
            "cron" => Self::Cron,
            "interval" => Self::Interval,
            _ => Self::Other(value),
        }
    }
}

impl From<TaskSchedule> for String {
    fn from(value: TaskSchedule) -> Self {
        value.as_str().to_string()
    }
}

/// Find a task by id.
#[must_use]
pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|task| task.id == id)
}

/// Set the status of the task with `id`; `None` when absent.
pub fn set_status<'a>(tasks: &'a mut [Task], id: &str, status: TaskStatus) -> Option<&'a Task> {
    let task = tasks.iter_mut().find(|task| task.id == id)?;
    task.status = status;
    Some(task)
}

/// Remove the task with `id`, returning it when present.
pub fn remove_task(tasks: &mut Vec<Task>, id: &str) -> Option<Task> {
    let index = tasks.iter().position(|task| task.id == id)?;
    Some(tasks.remove(index))
}

/// Insert at the front, replacing any task with the same id.
pub fn prepend_task(tasks: &mut Vec<Task>, task: Task) {
    tasks.retain(|existing| existing.id != task.id);
    tasks.insert(0, task);
}

/// Drop later duplicates so ids stay unique; returns the number removed.
pub fn dedupe_by_id(tasks: &mut Vec<Task>) -> usize {
    let before = tasks.len();
    let mut seen = HashSet::with_capacity(before);
    tasks.retain(|task| seen.insert(task.id.clone()));
    before - tasks.len()
}

#[cfg(test)]
pub(crate) fn sample_task(id: &str, status: TaskStatus) -> Task {
    let instant = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
        .expect("timestamp")
        .with_timezone(&Utc);
    Task {
        id: id.to_string(),
        name: format!("task {id}"),
        kind: TaskType::Http,
        status,
        priority: 5,
        schedule: TaskSchedule::Once,
        last_execution: instant,
        created_at: instant,
        success_rate: 0.0,
        target: String::new(),
        progress: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn open_enums_preserve_unknown_values() {
        assert_eq!(TaskStatus::from("paused".to_string()).as_str(), "paused");
        assert_eq!(TaskType::from("google_earth".to_string()), TaskType::GoogleEarth);
        assert_eq!(TaskSchedule::from("weekly".to_string()).label(), "weekly");
        assert_eq!(TaskSchedule::Once.label(), "One-off");
    }

    #[test]
    fn set_status_targets_matching_task_only() {
        let mut tasks = vec![
            sample_task("a", TaskStatus::Pending),
            sample_task("b", TaskStatus::Pending),
        ];
        let updated = set_status(&mut tasks, "b", TaskStatus::Running).expect("present");
        assert_eq!(updated.id, "b");
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[1].status, TaskStatus::Running);
        assert!(set_status(&mut tasks, "zz", TaskStatus::Running).is_none());
    }

    #[test]
    fn remove_task_drops_exactly_one() {
        let mut tasks = vec![
            sample_task("a", TaskStatus::Pending),
            sample_task("b", TaskStatus::Running),
            sample_task("c", TaskStatus::Failed),
        ];
        let removed = remove_task(&mut tasks, "b").expect("removed");
        assert_eq!(removed.id, "b");
        assert_eq!(ids(&tasks), vec!["a", "c"]);
        assert!(remove_task(&mut tasks, "b").is_none());
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn prepend_replaces_same_identity() {
        let mut tasks = vec![
            sample_task("a", TaskStatus::Pending),
            sample_task("b", TaskStatus::Pending),
        ];
        prepend_task(&mut tasks, sample_task("b", TaskStatus::Running));
        assert_eq!(ids(&tasks), vec!["b", "a"]);
        assert_eq!(tasks[0].status, TaskStatus::Running);
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut tasks = vec![
            sample_task("a", TaskStatus::Pending),
            sample_task("a", TaskStatus::Failed),
            sample_task("b", TaskStatus::Pending),
        ];
        assert_eq!(dedupe_by_id(&mut tasks), 1);
        assert_eq!(ids(&tasks), vec!["a", "b"]);
        assert_eq!(tasks[0].status, TaskStatus::Pending);
    }
}
