//! Self-expiring notification queue.
//!
//! Entries keep insertion order and are never deduplicated. Expiry is lazy:
//! reads prune anything past its display deadline.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

/// How long a notification stays visible by default.
pub const DEFAULT_DISPLAY_DURATION: Duration = Duration::from_millis(3000);

/// Notification tone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Command succeeded.
    Success,
    /// Something failed.
    Error,
    /// Neutral information.
    Info,
}

impl NotificationKind {
    /// Lower-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One queued notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic identifier.
    pub id: u64,
    /// Tone.
    pub kind: NotificationKind,
    /// Display text.
    pub message: String,
    /// Instant after which the entry is dropped.
    pub expires_at: Instant,
}

/// Insertion-ordered queue of notifications.
#[derive(Debug)]
pub struct NotificationSink {
    next_id: u64,
    display_for: Duration,
    entries: VecDeque<Notification>,
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_DURATION)
    }
}

impl NotificationSink {
    /// Sink whose entries live for `display_for`.
    #[must_use]
    pub const fn new(display_for: Duration) -> Self {
        Self {
            next_id: 1,
            display_for,
            entries: VecDeque::new(),
        }
    }

    /// Append a notification and mirror it to the log.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let message = message.into();
        match kind {
            NotificationKind::Error => warn!(kind = kind.as_str(), %message, "notification"),
            NotificationKind::Success | NotificationKind::Info => {
                info!(kind = kind.as_str(), %message, "notification");
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(Notification {
            id,
            kind,
            message,
            expires_at: Instant::now() + self.display_for,
        });
        id
    }

    /// Drop entries expired at `now`; returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Visible notifications, oldest first.
    pub fn active(&mut self) -> Vec<Notification> {
        self.prune(Instant::now());
        self.entries.iter().cloned().collect()
    }

    /// Remove one notification early.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    /// Take every queued notification, expired or not.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.entries.drain(..).collect()
    }

    /// Number of queued entries, including expired ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
