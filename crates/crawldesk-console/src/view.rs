//! Pure view models derived from the store.
//!
//! Render layers only read these; nothing here touches the network or mutates
//! state.

use chrono::{DateTime, Utc};
use crawldesk_api_models::AccessListKind;
use serde::Serialize;

use crate::core::logic::{
    PriorityTone, format_clock, format_percent, format_relative, or_dash, priority_stars,
    success_bar_width,
};
use crate::core::notify::{Notification, NotificationKind};
use crate::core::store::{DomainEntry, DomainStore};
use crate::features::tasks::Task;

/// Either rows or a placeholder message for an empty panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Listing<T> {
    /// Message shown instead of rows.
    Placeholder(String),
    /// Rows to render.
    Rows(Vec<T>),
}

impl<T> Listing<T> {
    /// Rows, empty for a placeholder.
    #[must_use]
    pub fn rows(&self) -> &[T] {
        match self {
            Self::Placeholder(_) => &[],
            Self::Rows(rows) => rows,
        }
    }

    /// Placeholder text, if any.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Placeholder(message) => Some(message),
            Self::Rows(_) => None,
        }
    }
}

/// Placeholder texts for one panel.
struct Placeholders {
    loading: &'static str,
    failed: &'static str,
    empty: &'static str,
}

const TASK_PLACEHOLDERS: Placeholders = Placeholders {
    loading: "loading tasks...",
    failed: "could not load tasks, please retry later",
    empty: "no tasks yet, create one first",
};

const LOCAL_IP_PLACEHOLDERS: Placeholders = Placeholders {
    loading: "loading local IPs...",
    failed: "could not load local IPs, please retry later",
    empty: "no data",
};

const ACCESS_LIST_PLACEHOLDERS: Placeholders = Placeholders {
    loading: "loading...",
    failed: "could not load list, please retry later",
    empty: "no data",
};

fn listing<T, R>(
    entry: &DomainEntry<Vec<T>>,
    texts: &Placeholders,
    row: impl Fn(&T) -> R,
) -> Listing<R> {
    let items = entry.data();
    if !items.is_empty() {
        return Listing::Rows(items.iter().map(row).collect());
    }
    let message = if entry.loaded() {
        texts.empty
    } else if entry.load_error().is_some() {
        texts.failed
    } else {
        texts.loading
    };
    Listing::Placeholder(message.to_string())
}

/// One task table row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskRowView {
    /// Task id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Target URL.
    pub target: String,
    /// Type label.
    pub type_label: String,
    /// Wire status, for styling.
    pub status: String,
    /// Status label.
    pub status_label: String,
    /// Filled stars (1-5).
    pub stars: u8,
    /// Priority tone.
    pub priority_tone: PriorityTone,
    /// Schedule label.
    pub schedule_label: String,
    /// Relative last-run time.
    pub last_run: String,
    /// Success bar width, 0-100.
    pub success_bar: f64,
    /// Success rate label.
    pub success_label: String,
}

impl TaskRowView {
    /// Row for `task` relative to `now`.
    #[must_use]
    pub fn new(task: &Task, now: DateTime<Utc>) -> Self {
        let (stars, priority_tone) = priority_stars(task.priority);
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            target: task.target.clone(),
            type_label: task.kind.label().to_string(),
            status: task.status.as_str().to_string(),
            status_label: task.status.label().to_string(),
            stars,
            priority_tone,
            schedule_label: task.schedule.label().to_string(),
            last_run: format_relative(task.last_execution, now),
            success_bar: success_bar_width(task.success_rate),
            success_label: format!("{:.1}%", task.success_rate),
        }
    }
}

/// Task table.
#[must_use]
pub fn task_table(store: &DomainStore, now: DateTime<Utc>) -> Listing<TaskRowView> {
    listing(store.tasks(), &TASK_PLACEHOLDERS, |task| {
        TaskRowView::new(task, now)
    })
}

/// One local IP row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IpRowView {
    /// Backend id.
    pub id: String,
    /// Address.
    pub address: String,
    /// Type, `-` when blank.
    pub kind: String,
    /// Source, `-` when blank.
    pub source: String,
    /// Status, `pending` when blank.
    pub status: String,
}

/// Local IP table.
#[must_use]
pub fn local_ip_table(store: &DomainStore) -> Listing<IpRowView> {
    listing(store.local_ips(), &LOCAL_IP_PLACEHOLDERS, |record| IpRowView {
        id: record.id.clone(),
        address: record.address.clone(),
        kind: or_dash(&record.kind),
        source: or_dash(&record.source),
        status: if record.status.trim().is_empty() {
            "pending".to_string()
        } else {
            record.status.clone()
        },
    })
}

/// Whitelist or blacklist chips.
#[must_use]
pub fn access_list(store: &DomainStore, kind: AccessListKind) -> Listing<String> {
    listing(
        store.access_list(kind),
        &ACCESS_LIST_PLACEHOLDERS,
        String::clone,
    )
}

/// Policy form values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PolicyView {
    /// Whether the policy has loaded.
    pub loaded: bool,
    /// Connections to warm up per address.
    pub preheat_connections: u64,
    /// Failures tolerated before an address is benched.
    pub max_failures: u64,
    /// Rotation period in seconds.
    pub rotate_interval_seconds: u64,
    /// Delay before a benched address is retried, in seconds.
    pub auto_recover_seconds: u64,
}

/// Policy form.
#[must_use]
pub fn policy_form(store: &DomainStore) -> PolicyView {
    let entry = store.policy();
    let policy = entry.data().unwrap_or_default();
    PolicyView {
        loaded: entry.loaded(),
        preheat_connections: policy.preheat_connections,
        max_failures: policy.max_failures,
        rotate_interval_seconds: policy.rotate_interval_seconds,
        auto_recover_seconds: policy.auto_recover_seconds,
    }
}

/// Pool stats card; `-` everywhere until a snapshot arrives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolCardView {
    /// Total connections.
    pub total: String,
    /// Active connections.
    pub active: String,
    /// Idle connections.
    pub idle: String,
    /// Healthy connections.
    pub healthy: String,
    /// Success rate.
    pub success_rate: String,
    /// Connection reuse rate.
    pub reuse_rate: String,
    /// Whitelist size.
    pub whitelist: String,
    /// Blacklist size.
    pub blacklist: String,
    /// Last update wall-clock time.
    pub updated: String,
}

/// Pool stats card.
#[must_use]
pub fn pool_card(store: &DomainStore) -> PoolCardView {
    let Some(stats) = store.pool_stats().data() else {
        let dash = || "-".to_string();
        return PoolCardView {
            total: dash(),
            active: dash(),
            idle: dash(),
            healthy: dash(),
            success_rate: dash(),
            reuse_rate: dash(),
            whitelist: dash(),
            blacklist: dash(),
            updated: dash(),
        };
    };
    PoolCardView {
        total: stats.total_connections.to_string(),
        active: stats.active_connections.to_string(),
        idle: stats.idle_connections.to_string(),
        healthy: stats.healthy_connections.to_string(),
        success_rate: format_percent(stats.success_rate),
        reuse_rate: format_percent(stats.conn_reuse_rate),
        whitelist: stats.whitelist_ips.to_string(),
        blacklist: stats.blacklist_ips.to_string(),
        updated: format_clock(stats.last_update_time.as_deref()),
    }
}

/// Visible notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    /// Tone.
    pub kind: NotificationKind,
    /// Text.
    pub message: String,
}

/// Every panel at once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    /// Operator identity line.
    pub identity: Option<String>,
    /// Task table.
    pub tasks: Listing<TaskRowView>,
    /// Local IP table.
    pub local_ips: Listing<IpRowView>,
    /// Whitelist chips.
    pub whitelist: Listing<String>,
    /// Blacklist chips.
    pub blacklist: Listing<String>,
    /// Policy form.
    pub policy: PolicyView,
    /// Pool stats card.
    pub pool: PoolCardView,
    /// Visible notifications, oldest first.
    pub notifications: Vec<NotificationView>,
}

/// Build every panel from one store snapshot.
#[must_use]
pub fn dashboard(
    store: &DomainStore,
    notifications: &[Notification],
    identity: Option<&str>,
    now: DateTime<Utc>,
) -> DashboardView {
    DashboardView {
        identity: identity.map(str::to_string),
        tasks: task_table(store, now),
        local_ips: local_ip_table(store),
        whitelist: access_list(store, AccessListKind::Whitelist),
        blacklist: access_list(store, AccessListKind::Blacklist),
        policy: policy_form(store),
        pool: pool_card(store),
        notifications: notifications
            .iter()
            .map(|note| NotificationView {
                kind: note.kind,
                message: note.message.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{Domain, Snapshot};
    use crate::features::tasks::TaskStatus;
    use crate::features::tasks::state::sample_task;
    use crawldesk_api_models::{IpRecord, PoolStats};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:05:00Z")
            .expect("now")
            .with_timezone(&Utc)
    }

    #[test]
    fn task_placeholder_tracks_load_state() {
        let mut store = DomainStore::new();
        assert_eq!(
            task_table(&store, now()).placeholder(),
            Some("loading tasks...")
        );

        let ticket = store.begin_fetch(Domain::Tasks);
        store.record_failure(ticket, "offline");
        assert_eq!(
            task_table(&store, now()).placeholder(),
            Some("could not load tasks, please retry later")
        );

        let ticket = store.begin_fetch(Domain::Tasks);
        store.apply(ticket, Snapshot::Tasks(Vec::new()));
        assert_eq!(
            task_table(&store, now()).placeholder(),
            Some("no tasks yet, create one first")
        );
    }

    #[test]
    fn task_rows_are_formatted() {
        let mut store = DomainStore::new();
        let mut task = sample_task("a", TaskStatus::Running);
        task.priority = 9;
        task.success_rate = 87.26;
        let ticket = store.begin_fetch(Domain::Tasks);
        store.apply(ticket, Snapshot::Tasks(vec![task]));

        let table = task_table(&store, now());
        let row = &table.rows()[0];
        assert_eq!(row.status_label, "Running");
        assert_eq!(row.stars, 5);
        assert_eq!(row.priority_tone, PriorityTone::High);
        assert_eq!(row.last_run, "5m ago");
        assert_eq!(row.success_label, "87.3%");
        assert_eq!(row.schedule_label, "One-off");
    }

    #[test]
    fn ip_rows_fill_blank_cells() {
        let mut store = DomainStore::new();
        let ticket = store.begin_fetch(Domain::LocalIps);
        store.apply(
            ticket,
            Snapshot::LocalIps(vec![IpRecord {
                id: "1".into(),
                address: "10.0.0.1".into(),
                ..IpRecord::default()
            }]),
        );
        let table = local_ip_table(&store);
        let row = &table.rows()[0];
        assert_eq!(row.kind, "-");
        assert_eq!(row.source, "-");
        assert_eq!(row.status, "pending");
    }

    #[test]
    fn pool_card_uses_dashes_until_loaded() {
        let mut store = DomainStore::new();
        assert_eq!(pool_card(&store).success_rate, "-");

        let ticket = store.begin_fetch(Domain::PoolStats);
        store.apply(
            ticket,
            Snapshot::PoolStats(Some(PoolStats {
                total_connections: 4,
                success_rate: Some(0.982),
                conn_reuse_rate: Some(82.0),
                ..PoolStats::default()
            })),
        );
        let card = pool_card(&store);
        assert_eq!(card.total, "4");
        assert_eq!(card.success_rate, "98.2%");
        assert_eq!(card.reuse_rate, "82.0%");
        assert_eq!(card.updated, "-");
    }

    #[test]
    fn empty_access_list_reads_no_data() {
        let mut store = DomainStore::new();
        let ticket = store.begin_fetch(Domain::Blacklist);
        store.apply(ticket, Snapshot::Blacklist(Vec::new()));
        assert_eq!(
            access_list(&store, AccessListKind::Blacklist).placeholder(),
            Some("no data")
        );
        assert_eq!(policy_form(&store), PolicyView::default());
    }
}
