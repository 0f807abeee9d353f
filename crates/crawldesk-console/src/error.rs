//! Error taxonomy shared by the gateway and the command dispatcher.

use thiserror::Error;

/// Result alias for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Failures surfaced by gateway calls and commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// The exchange failed or returned an unparseable failure body.
    #[error("network error: {status_text}")]
    Network {
        /// Transport description or HTTP reason phrase.
        status_text: String,
    },
    /// The backend answered and rejected the call.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Server message, or a fallback when none was sent.
        message: String,
    },
    /// Input was rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Local input checks performed by commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Human-readable field name.
        field: &'static str,
    },
    /// A cron schedule was requested without an expression.
    #[error("cron schedule requires a cron expression")]
    MissingCronExpression,
}

impl DashboardError {
    /// Message suitable for an end-user notification.
    ///
    /// Server messages win; otherwise `fallback` is used for failures that
    /// carry no useful description.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Network { status_text } if !status_text.trim().is_empty() => {
                status_text.clone()
            }
            Self::Network { .. } => fallback.to_string(),
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Api { .. } => fallback.to_string(),
            Self::Validation(err) => err.to_string(),
        }
    }

    /// Short label used in structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Api { .. } => "api",
            Self::Validation(_) => "validation",
        }
    }

    /// Whether the failure happened before reaching the backend.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let api = DashboardError::Api {
            status: 409,
            message: "duplicate name".into(),
        };
        assert_eq!(api.user_message("failed"), "duplicate name");

        let blank = DashboardError::Network {
            status_text: "  ".into(),
        };
        assert_eq!(blank.user_message("failed"), "failed");
    }

    #[test]
    fn validation_errors_convert_and_render() {
        let err: DashboardError = ValidationError::EmptyField { field: "task name" }.into();
        assert!(err.is_validation());
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.user_message("unused"), "task name must not be empty");
    }
}
