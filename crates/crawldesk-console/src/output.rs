//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use crawldesk_api_models::AccessListKind;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::core::notify::{Notification, NotificationKind};
use crate::view::{
    DashboardView, IpRowView, Listing, NotificationView, PolicyView, PoolCardView, TaskRowView,
};

const MAX_STARS: u8 = 5;
const SUCCESS_BAR_CELLS: usize = 10;

pub(crate) fn render_tasks(tasks: &Listing<TaskRowView>, format: OutputFormat) -> CliResult<()> {
    render(tasks, format, task_table_text)
}

pub(crate) fn render_local_ips(ips: &Listing<IpRowView>, format: OutputFormat) -> CliResult<()> {
    render(ips, format, local_ip_text)
}

pub(crate) fn render_access_list(
    kind: AccessListKind,
    entries: &Listing<String>,
    format: OutputFormat,
) -> CliResult<()> {
    render(entries, format, |entries| access_list_text(kind, entries))
}

pub(crate) fn render_policy(policy: &PolicyView, format: OutputFormat) -> CliResult<()> {
    render(policy, format, policy_text)
}

pub(crate) fn render_pool(pool: &PoolCardView, format: OutputFormat) -> CliResult<()> {
    render(pool, format, pool_text)
}

/// Print the outcome notes of a one-shot command to stderr.
///
/// Errors are reported through the exit path instead.
pub(crate) fn render_notifications(notifications: &[Notification]) {
    for note in notifications {
        if note.kind != NotificationKind::Error {
            eprintln!("{}: {}", note.kind.as_str(), note.message);
        }
    }
}

/// Full dashboard frame for `watch`.
pub(crate) fn render_dashboard(view: &DashboardView, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string(view)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => print!("{}", dashboard_text(view)),
    }
    Ok(())
}

fn render<T: Serialize>(
    value: &T,
    format: OutputFormat,
    table: impl Fn(&T) -> String,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(value)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => print!("{}", table(value)),
    }
    Ok(())
}

pub(crate) fn dashboard_text(view: &DashboardView) -> String {
    let mut out = String::new();
    let operator = view.identity.as_deref().unwrap_or("-");
    let _ = writeln!(out, "crawldesk  operator: {operator}");
    let _ = writeln!(out);
    out.push_str(&pool_text(&view.pool));
    let _ = writeln!(out);
    out.push_str(&task_table_text(&view.tasks));
    let _ = writeln!(out);
    out.push_str(&local_ip_text(&view.local_ips));
    let _ = writeln!(out);
    out.push_str(&access_list_text(AccessListKind::Whitelist, &view.whitelist));
    out.push_str(&access_list_text(AccessListKind::Blacklist, &view.blacklist));
    let _ = writeln!(out);
    out.push_str(&policy_text(&view.policy));
    if !view.notifications.is_empty() {
        let _ = writeln!(out);
        out.push_str(&notification_text(&view.notifications));
    }
    out
}

pub(crate) fn task_table_text(tasks: &Listing<TaskRowView>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<24} {:<12} {:<10} {:<5} {:<10} {:<10} {:<18} NAME",
        "ID", "TARGET", "TYPE", "STATUS", "PRIO", "SCHEDULE", "LAST RUN", "SUCCESS"
    );
    if let Some(message) = tasks.placeholder() {
        let _ = writeln!(out, "  {message}");
        return out;
    }
    for row in tasks.rows() {
        let success = format!("{} {}", success_bar(row.success_bar), row.success_label);
        let _ = writeln!(
            out,
            "{:<12} {:<24} {:<12} {:<10} {:<5} {:<10} {:<10} {:<18} {}",
            row.id,
            truncate(&row.target, 24),
            row.type_label,
            row.status_label,
            stars(row.stars),
            row.schedule_label,
            row.last_run,
            success,
            row.name
        );
    }
    out
}

pub(crate) fn local_ip_text(ips: &Listing<IpRowView>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<40} {:<8} {:<12} STATUS",
        "ID", "ADDRESS", "TYPE", "SOURCE"
    );
    if let Some(message) = ips.placeholder() {
        let _ = writeln!(out, "  {message}");
        return out;
    }
    for row in ips.rows() {
        let _ = writeln!(
            out,
            "{:<8} {:<40} {:<8} {:<12} {}",
            row.id, row.address, row.kind, row.source, row.status
        );
    }
    out
}

pub(crate) fn access_list_text(kind: AccessListKind, entries: &Listing<String>) -> String {
    let body = entries
        .placeholder()
        .map_or_else(|| entries.rows().join("  "), str::to_string);
    format!("{:<10} {body}\n", kind.as_str())
}

pub(crate) fn policy_text(policy: &PolicyView) -> String {
    if !policy.loaded {
        return "policy: -\n".to_string();
    }
    format!(
        "policy: preheat={} max_failures={} rotate={}s recover={}s\n",
        policy.preheat_connections,
        policy.max_failures,
        policy.rotate_interval_seconds,
        policy.auto_recover_seconds
    )
}

pub(crate) fn pool_text(pool: &PoolCardView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "pool: total {}  active {}  idle {}  healthy {}",
        pool.total, pool.active, pool.idle, pool.healthy
    );
    let _ = writeln!(
        out,
        "      success {}  reuse {}  whitelist {}  blacklist {}  updated {}",
        pool.success_rate, pool.reuse_rate, pool.whitelist, pool.blacklist, pool.updated
    );
    out
}

fn notification_text(notifications: &[NotificationView]) -> String {
    notifications
        .iter()
        .map(|note| format!("[{}] {}\n", note.kind.as_str(), note.message))
        .collect()
}

fn stars(filled: u8) -> String {
    let filled = filled.min(MAX_STARS);
    let mut out = "*".repeat(usize::from(filled));
    out.push_str(&".".repeat(usize::from(MAX_STARS - filled)));
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn success_bar(width: f64) -> String {
    let filled = (width.clamp(0.0, 100.0) / 10.0).round() as usize;
    let cells = filled.min(SUCCESS_BAR_CELLS);
    format!("{}{}", "#".repeat(cells), "-".repeat(SUCCESS_BAR_CELLS - cells))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logic::PriorityTone;

    fn row() -> TaskRowView {
        TaskRowView {
            id: "t-1".into(),
            name: "catalog".into(),
            target: "https://example.com/a/very/long/catalog/path".into(),
            type_label: "HTTP".into(),
            status: "running".into(),
            status_label: "Running".into(),
            stars: 4,
            priority_tone: PriorityTone::High,
            schedule_label: "Interval".into(),
            last_run: "5m ago".into(),
            success_bar: 92.5,
            success_label: "92.5%".into(),
        }
    }

    #[test]
    fn task_table_shows_placeholder_or_rows() {
        let empty = task_table_text(&Listing::Placeholder("loading tasks...".into()));
        assert!(empty.starts_with("ID"));
        assert!(empty.contains("loading tasks..."));

        let text = task_table_text(&Listing::Rows(vec![row()]));
        assert!(text.contains("****."));
        assert!(text.contains("#########- 92.5%"));
        assert!(text.contains("https://example.com/a..."));
        assert!(text.trim_end().ends_with("catalog"));
    }

    #[test]
    fn success_bar_clamps_to_cells() {
        assert_eq!(success_bar(-3.0), "----------");
        assert_eq!(success_bar(100.0), "##########");
        assert_eq!(success_bar(250.0), "##########");
        assert_eq!(success_bar(44.0), "####------");
    }

    #[test]
    fn access_lists_join_entries() {
        let text = access_list_text(
            AccessListKind::Blacklist,
            &Listing::Rows(vec!["10.0.0.1".into(), "10.0.0.2".into()]),
        );
        assert_eq!(text, "blacklist  10.0.0.1  10.0.0.2\n");
        let empty = access_list_text(AccessListKind::Whitelist, &Listing::Placeholder("no data".into()));
        assert_eq!(empty, "whitelist  no data\n");
    }

    #[test]
    fn policy_waits_for_load() {
        assert_eq!(policy_text(&PolicyView::default()), "policy: -\n");
        let loaded = PolicyView {
            loaded: true,
            preheat_connections: 2,
            max_failures: 3,
            rotate_interval_seconds: 60,
            auto_recover_seconds: 300,
        };
        assert_eq!(
            policy_text(&loaded),
            "policy: preheat=2 max_failures=3 rotate=60s recover=300s\n"
        );
    }

    #[test]
    fn dashboard_lists_notifications_last() {
        let view = DashboardView {
            identity: Some("ops".into()),
            tasks: Listing::Placeholder("loading tasks...".into()),
            local_ips: Listing::Placeholder("no data".into()),
            whitelist: Listing::Placeholder("no data".into()),
            blacklist: Listing::Placeholder("no data".into()),
            policy: PolicyView::default(),
            pool: PoolCardView {
                total: "-".into(),
                active: "-".into(),
                idle: "-".into(),
                healthy: "-".into(),
                success_rate: "-".into(),
                reuse_rate: "-".into(),
                whitelist: "-".into(),
                blacklist: "-".into(),
                updated: "-".into(),
            },
            notifications: vec![NotificationView {
                kind: NotificationKind::Success,
                message: "task \"a\" started".into(),
            }],
        };
        let text = dashboard_text(&view);
        assert!(text.starts_with("crawldesk  operator: ops\n"));
        assert!(text.trim_end().ends_with("[success] task \"a\" started"));
    }
}
