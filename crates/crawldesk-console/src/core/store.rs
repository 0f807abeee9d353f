//! Per-domain snapshot store with sequenced overwrites.
//!
//! # Design
//! - One entry per polled or command-refreshed domain, each with its own
//!   `loaded` flag so "never loaded" and "reload failed" stay distinct.
//! - Fetches take a ticket; an overwrite lands only if its sequence number is
//!   newer than the last applied one, so late responses cannot roll state back.
//! - Optimistic task status edits survive exactly one authoritative snapshot.
//! - The store is plain data owned by the application root; no globals.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crawldesk_api_models::{AccessListKind, IpPolicy, IpRecord, PoolStats};
use serde::Serialize;
use tracing::{debug, warn};

use crate::features::tasks::state::{
    Task, TaskStatus, dedupe_by_id, find_task, prepend_task, remove_task, set_status,
};

/// Independently loaded slices of dashboard state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Task table.
    Tasks,
    /// Local IP table.
    LocalIps,
    /// Whitelist chips.
    Whitelist,
    /// Blacklist chips.
    Blacklist,
    /// IP pool policy form.
    Policy,
    /// Connection pool stats card.
    PoolStats,
}

impl Domain {
    /// Every domain, in render order.
    pub const ALL: [Self; 6] = [
        Self::Tasks,
        Self::LocalIps,
        Self::Whitelist,
        Self::Blacklist,
        Self::Policy,
        Self::PoolStats,
    ];

    /// Machine name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::LocalIps => "local_ips",
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
            Self::Policy => "policy",
            Self::PoolStats => "pool_stats",
        }
    }

    /// Human label used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tasks => "task list",
            Self::LocalIps => "local IPs",
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
            Self::Policy => "IP policy",
            Self::PoolStats => "pool stats",
        }
    }

    /// Domain holding the given access list.
    #[must_use]
    pub const fn access_list(kind: AccessListKind) -> Self {
        match kind {
            AccessListKind::Whitelist => Self::Whitelist,
            AccessListKind::Blacklist => Self::Blacklist,
        }
    }

    /// Whether a failed refresh of already loaded data is worth a notification.
    ///
    /// Pool stats poll every few seconds and would flood the sink.
    #[must_use]
    pub const fn notifies_on_refresh_failure(self) -> bool {
        !matches!(self, Self::PoolStats)
    }

    /// Whether a failed first load is worth a notification.
    ///
    /// Polled domains retry on their own; the others only reload on command.
    #[must_use]
    pub const fn notifies_on_first_failure(self) -> bool {
        !matches!(self, Self::Tasks | Self::PoolStats)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "tasks" => Ok(Self::Tasks),
            "local_ips" | "ips" | "local" => Ok(Self::LocalIps),
            "whitelist" => Ok(Self::Whitelist),
            "blacklist" => Ok(Self::Blacklist),
            "policy" | "settings" => Ok(Self::Policy),
            "pool_stats" | "pool" | "stats" => Ok(Self::PoolStats),
            other => Err(format!("unknown domain '{other}'")),
        }
    }
}

/// Proof that a fetch was issued; carries its sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    domain: Domain,
    seq: u64,
}

impl FetchTicket {
    /// Domain the fetch targets.
    #[must_use]
    pub const fn domain(self) -> Domain {
        self.domain
    }

    /// Sequence number within the domain.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }
}

/// Result of an authoritative overwrite attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot replaced the domain data.
    Applied,
    /// A newer snapshot was already applied; this one was dropped.
    Stale {
        /// Sequence number currently applied.
        latest: u64,
    },
    /// The snapshot does not belong to the ticket's domain.
    DomainMismatch,
}

/// How a failed refresh affected the domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Nothing was ever loaded; the view shows a placeholder.
    NeverLoaded,
    /// The last good snapshot stays visible.
    KeptLastGood,
}

/// Authoritative data for one domain.
#[derive(Clone, Debug, PartialEq)]
pub enum Snapshot {
    /// Normalized task list.
    Tasks(Vec<Task>),
    /// Local IP records.
    LocalIps(Vec<IpRecord>),
    /// Whitelisted addresses.
    Whitelist(Vec<String>),
    /// Blacklisted addresses.
    Blacklist(Vec<String>),
    /// IP policy, absent when the server has none.
    Policy(Option<IpPolicy>),
    /// Pool stats, absent when the server has none.
    PoolStats(Option<PoolStats>),
}

impl Snapshot {
    /// Domain this snapshot belongs to.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        match self {
            Self::Tasks(_) => Domain::Tasks,
            Self::LocalIps(_) => Domain::LocalIps,
            Self::Whitelist(_) => Domain::Whitelist,
            Self::Blacklist(_) => Domain::Blacklist,
            Self::Policy(_) => Domain::Policy,
            Self::PoolStats(_) => Domain::PoolStats,
        }
    }
}

/// One domain's data plus its load bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainEntry<T> {
    data: T,
    loaded: bool,
    issued_seq: u64,
    applied_seq: u64,
    load_error: Option<String>,
}

impl<T> DomainEntry<T> {
    /// Current data (default until first load).
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Whether a snapshot was ever applied.
    pub const fn loaded(&self) -> bool {
        self.loaded
    }

    /// Error from the last failed load while never loaded.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Sequence number of the applied snapshot (0 before the first).
    pub const fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    fn begin(&mut self, domain: Domain) -> FetchTicket {
        self.issued_seq += 1;
        FetchTicket {
            domain,
            seq: self.issued_seq,
        }
    }

    const fn is_stale(&self, ticket: FetchTicket) -> bool {
        ticket.seq <= self.applied_seq
    }

    fn apply(&mut self, ticket: FetchTicket, data: T) -> ApplyOutcome {
        if self.is_stale(ticket) {
            return ApplyOutcome::Stale {
                latest: self.applied_seq,
            };
        }
        self.data = data;
        self.loaded = true;
        self.applied_seq = ticket.seq;
        self.load_error = None;
        ApplyOutcome::Applied
    }

    fn fail(&mut self, message: String) -> FailureOutcome {
        if self.loaded {
            FailureOutcome::KeptLastGood
        } else {
            self.load_error = Some(message);
            FailureOutcome::NeverLoaded
        }
    }
}

/// Store for every dashboard domain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainStore {
    tasks: DomainEntry<Vec<Task>>,
    local_ips: DomainEntry<Vec<IpRecord>>,
    whitelist: DomainEntry<Vec<String>>,
    blacklist: DomainEntry<Vec<String>>,
    policy: DomainEntry<Option<IpPolicy>>,
    pool_stats: DomainEntry<Option<PoolStats>>,
    pending_status: HashMap<String, TaskStatus>,
}

impl DomainStore {
    /// Empty store; nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Task table entry.
    #[must_use]
    pub const fn tasks(&self) -> &DomainEntry<Vec<Task>> {
        &self.tasks
    }

    /// Local IP entry.
    #[must_use]
    pub const fn local_ips(&self) -> &DomainEntry<Vec<IpRecord>> {
        &self.local_ips
    }

    /// Whitelist or blacklist entry.
    #[must_use]
    pub const fn access_list(&self, kind: AccessListKind) -> &DomainEntry<Vec<String>> {
        match kind {
            AccessListKind::Whitelist => &self.whitelist,
            AccessListKind::Blacklist => &self.blacklist,
        }
    }

    /// IP policy entry.
    #[must_use]
    pub const fn policy(&self) -> &DomainEntry<Option<IpPolicy>> {
        &self.policy
    }

    /// Pool stats entry.
    #[must_use]
    pub const fn pool_stats(&self) -> &DomainEntry<Option<PoolStats>> {
        &self.pool_stats
    }

    /// Whether `domain` has ever loaded.
    #[must_use]
    pub const fn is_loaded(&self, domain: Domain) -> bool {
        match domain {
            Domain::Tasks => self.tasks.loaded,
            Domain::LocalIps => self.local_ips.loaded,
            Domain::Whitelist => self.whitelist.loaded,
            Domain::Blacklist => self.blacklist.loaded,
            Domain::Policy => self.policy.loaded,
            Domain::PoolStats => self.pool_stats.loaded,
        }
    }

    /// Sequence number currently applied for `domain`.
    #[must_use]
    pub const fn applied_seq(&self, domain: Domain) -> u64 {
        match domain {
            Domain::Tasks => self.tasks.applied_seq,
            Domain::LocalIps => self.local_ips.applied_seq,
            Domain::Whitelist => self.whitelist.applied_seq,
            Domain::Blacklist => self.blacklist.applied_seq,
            Domain::Policy => self.policy.applied_seq,
            Domain::PoolStats => self.pool_stats.applied_seq,
        }
    }

    /// Issue a ticket for a fetch of `domain`.
    pub fn begin_fetch(&mut self, domain: Domain) -> FetchTicket {
        match domain {
            Domain::Tasks => self.tasks.begin(domain),
            Domain::LocalIps => self.local_ips.begin(domain),
            Domain::Whitelist => self.whitelist.begin(domain),
            Domain::Blacklist => self.blacklist.begin(domain),
            Domain::Policy => self.policy.begin(domain),
            Domain::PoolStats => self.pool_stats.begin(domain),
        }
    }

    /// Authoritative overwrite of the ticket's domain.
    pub fn apply(&mut self, ticket: FetchTicket, snapshot: Snapshot) -> ApplyOutcome {
        if snapshot.domain() != ticket.domain {
            warn!(
                domain = %ticket.domain,
                snapshot = %snapshot.domain(),
                "snapshot does not match fetch ticket"
            );
            return ApplyOutcome::DomainMismatch;
        }

        let outcome = match snapshot {
            Snapshot::Tasks(tasks) => self.apply_tasks(ticket, tasks),
            Snapshot::LocalIps(records) => self.local_ips.apply(ticket, records),
            Snapshot::Whitelist(list) => self.whitelist.apply(ticket, list),
            Snapshot::Blacklist(list) => self.blacklist.apply(ticket, list),
            Snapshot::Policy(policy) => self.policy.apply(ticket, policy),
            Snapshot::PoolStats(stats) => self.pool_stats.apply(ticket, stats),
        };
        if let ApplyOutcome::Stale { latest } = outcome {
            debug!(
                domain = %ticket.domain,
                seq = ticket.seq,
                latest,
                "dropping stale snapshot"
            );
        }
        outcome
    }

    fn apply_tasks(&mut self, ticket: FetchTicket, mut tasks: Vec<Task>) -> ApplyOutcome {
        if self.tasks.is_stale(ticket) {
            return ApplyOutcome::Stale {
                latest: self.tasks.applied_seq,
            };
        }
        let duplicates = dedupe_by_id(&mut tasks);
        if duplicates > 0 {
            warn!(duplicates, "task snapshot contained duplicate ids");
        }
        for task in &mut tasks {
            if let Some(status) = self.pending_status.get(&task.id) {
                debug!(task_id = %task.id, status = status.as_str(), "keeping local status for one cycle");
                task.status = status.clone();
            }
        }
        self.pending_status.clear();
        self.tasks.apply(ticket, tasks)
    }

    /// Record a failed fetch; never clears `loaded` or data.
    pub fn record_failure(&mut self, ticket: FetchTicket, message: impl Into<String>) -> FailureOutcome {
        let message = message.into();
        match ticket.domain {
            Domain::Tasks => self.tasks.fail(message),
            Domain::LocalIps => self.local_ips.fail(message),
            Domain::Whitelist => self.whitelist.fail(message),
            Domain::Blacklist => self.blacklist.fail(message),
            Domain::Policy => self.policy.fail(message),
            Domain::PoolStats => self.pool_stats.fail(message),
        }
    }

    /// Task lookup by id.
    #[must_use]
    pub fn find_task(&self, id: &str) -> Option<&Task> {
        find_task(&self.tasks.data, id)
    }

    /// Optimistically set a task's status; `None` when the id is unknown.
    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Option<Task> {
        let updated = set_status(&mut self.tasks.data, id, status.clone())?.clone();
        self.pending_status.insert(id.to_string(), status);
        Some(updated)
    }

    /// Optimistically remove a task; `None` when the id is unknown.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        self.pending_status.remove(id);
        remove_task(&mut self.tasks.data, id)
    }

    /// Prepend a newly created task. Returns `false` when tasks never loaded,
    /// in which case the caller should refetch instead.
    pub fn prepend_task(&mut self, task: Task) -> bool {
        if !self.tasks.loaded {
            return false;
        }
        self.pending_status.remove(&task.id);
        prepend_task(&mut self.tasks.data, task);
        true
    }

    /// Ids with a status override waiting for the next snapshot.
    #[must_use]
    pub fn pending_overrides(&self) -> usize {
        self.pending_status.len()
    }
}
