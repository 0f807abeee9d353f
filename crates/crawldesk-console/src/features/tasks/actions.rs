//! Task commands and the create-task form.

use crawldesk_api_models::TaskCreateRequest;

use super::state::{TaskSchedule, TaskStatus, TaskType};
use crate::core::notify::NotificationKind;
use crate::error::ValidationError;

/// Status-changing task commands issued from the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskAction {
    /// Mark the task running.
    Start,
    /// Return the task to pending.
    Stop,
    /// Remove the task after confirmation.
    Delete,
}

impl TaskAction {
    /// Local status applied by the command, if it changes status.
    #[must_use]
    pub const fn target_status(self) -> Option<TaskStatus> {
        match self {
            Self::Start => Some(TaskStatus::Running),
            Self::Stop => Some(TaskStatus::Pending),
            Self::Delete => None,
        }
    }

    /// Notification tone for a completed command.
    #[must_use]
    pub const fn notification_kind(self) -> NotificationKind {
        match self {
            Self::Start | Self::Delete => NotificationKind::Success,
            Self::Stop => NotificationKind::Info,
        }
    }
}

/// Notification text for a completed command.
#[must_use]
pub fn success_message(action: TaskAction, name: &str) -> String {
    match action {
        TaskAction::Start => format!("task \"{name}\" started"),
        TaskAction::Stop => format!("task \"{name}\" stopped"),
        TaskAction::Delete => format!("task \"{name}\" deleted"),
    }
}

/// Confirmation prompt for deleting a task.
#[must_use]
pub fn delete_prompt(name: &str) -> String {
    format!("delete task \"{name}\"?")
}

/// Create-task form input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDraft {
    /// Display name; required.
    pub name: String,
    /// Task type.
    pub kind: TaskType,
    /// Crawl target URL.
    pub url: String,
    /// Scheduling priority.
    pub priority: i64,
    /// Per-execution timeout in seconds.
    pub timeout: i64,
    /// Schedule mode.
    pub schedule: TaskSchedule,
    /// Cron expression; required when `schedule` is cron.
    pub cron_expression: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: TaskType::Http,
            url: String::new(),
            priority: 5,
            timeout: 30,
            schedule: TaskSchedule::Once,
            cron_expression: String::new(),
        }
    }
}

/// Validate the form and build the request body.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a blank name or a cron schedule without
/// an expression.
pub fn build_create_request(draft: &TaskDraft) -> Result<TaskCreateRequest, ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField { field: "task name" });
    }
    let cron_expression = draft.cron_expression.trim();
    if draft.schedule == TaskSchedule::Cron && cron_expression.is_empty() {
        return Err(ValidationError::MissingCronExpression);
    }

    Ok(TaskCreateRequest {
        name: name.to_string(),
        kind: draft.kind.as_str().to_string(),
        url: draft.url.trim().to_string(),
        priority: draft.priority,
        timeout: draft.timeout,
        schedule: draft.schedule.as_str().to_string(),
        cron_expression: cron_expression.to_string(),
    })
}
