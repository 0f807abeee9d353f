//! Shared CLI plumbing: error type, exit codes and the command context.

use std::fmt::{self, Display, Formatter};
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::anyhow;
use crawldesk_api_models::AccessListKind;

use crate::app::{CommandOutcome, Confirm, Dashboard};
use crate::cli::OutputFormat;
use crate::core::notify::{Notification, NotificationKind};
use crate::core::store::{Domain, DomainStore};
use crate::error::DashboardError;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) dashboard: Dashboard,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Load `domain` and fail when it never produced data.
    pub(crate) async fn load_required(&self, domain: Domain) -> CliResult<()> {
        self.dashboard.load(&[domain]).await;
        let store = self.dashboard.engine().store();
        if store.is_loaded(domain) {
            return Ok(());
        }
        let reason = load_error(&store, domain).unwrap_or("no response");
        Err(CliError::failure(anyhow!(
            "failed to load {}: {reason}",
            domain.label()
        )))
    }

    /// Notifications raised by the last command.
    pub(crate) fn take_notifications(&self) -> Vec<Notification> {
        self.dashboard.engine().notifications().borrow_mut().drain()
    }
}

fn load_error(store: &DomainStore, domain: Domain) -> Option<&str> {
    match domain {
        Domain::Tasks => store.tasks().load_error(),
        Domain::LocalIps => store.local_ips().load_error(),
        Domain::Whitelist => store.access_list(AccessListKind::Whitelist).load_error(),
        Domain::Blacklist => store.access_list(AccessListKind::Blacklist).load_error(),
        Domain::Policy => store.policy().load_error(),
        Domain::PoolStats => store.pool_stats().load_error(),
    }
}

/// Map a command outcome onto the CLI exit semantics.
///
/// `notifications` are the ones the command raised; a rejection reports the
/// error notification text so the operator sees the same message as in the
/// dashboard.
pub(crate) fn outcome_to_result(
    outcome: CommandOutcome,
    notifications: &[Notification],
) -> CliResult<()> {
    let reported = || {
        notifications
            .iter()
            .rev()
            .find(|note| note.kind == NotificationKind::Error)
            .map(|note| note.message.clone())
    };
    match outcome {
        CommandOutcome::Applied => Ok(()),
        CommandOutcome::Cancelled => Err(CliError::validation("cancelled")),
        CommandOutcome::NotFound => Err(CliError::validation("target not found")),
        CommandOutcome::Rejected(DashboardError::Validation(err)) => {
            Err(CliError::validation(err.to_string()))
        }
        CommandOutcome::Rejected(err) => {
            let message = reported().unwrap_or_else(|| err.to_string());
            Err(CliError::failure(anyhow!(message)))
        }
    }
}

/// Interactive y/N prompt on stderr; declines when stdin is not a terminal.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            eprintln!("{prompt} (pass --yes to confirm non-interactively)");
            return false;
        }
        eprint!("{prompt} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
