//! User intents to gateway calls and reconciliation.
//!
//! Every command runs to completion and reports a [`CommandOutcome`]; errors
//! become notifications and never escape.

use std::rc::Rc;

use crawldesk_api_models::AccessListKind;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::app::sync::SyncEngine;
use crate::core::notify::NotificationKind;
use crate::core::scheduler::PollScheduler;
use crate::core::store::Domain;
use crate::error::DashboardError;
use crate::features::ip::state::REMOVE_LOCAL_IP_PROMPT;
use crate::features::ip::{PolicyDraft, build_local_ip_request, normalize_access_ip};
use crate::features::tasks::actions::{
    TaskAction, TaskDraft, build_create_request, delete_prompt, success_message,
};
use crate::features::tasks::normalize_task;

/// Gate for destructive commands.
pub trait Confirm {
    /// Whether the operator accepted `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answer decided before the prompt is shown (for example a `--yes` flag).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preconfirmed(pub bool);

impl Confirm for Preconfirmed {
    fn confirm(&self, prompt: &str) -> bool {
        debug!(prompt, accepted = self.0, "confirmation answered in advance");
        self.0
    }
}

/// How a command ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The change was made.
    Applied,
    /// Validation or the backend refused it.
    Rejected(DashboardError),
    /// The operator declined the confirmation.
    Cancelled,
    /// The target is not in the store.
    NotFound,
}

impl CommandOutcome {
    /// Whether the change was made.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Runs dashboard commands against the sync engine.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    engine: Rc<SyncEngine>,
    scheduler: Rc<PollScheduler>,
}

impl CommandDispatcher {
    /// Dispatcher sharing the engine and scheduler of the dashboard.
    #[must_use]
    pub const fn new(engine: Rc<SyncEngine>, scheduler: Rc<PollScheduler>) -> Self {
        Self { engine, scheduler }
    }

    /// Create a task; prepend it when the table is loaded, otherwise refetch.
    pub async fn create_task(&self, draft: &TaskDraft) -> CommandOutcome {
        let request = match build_create_request(draft) {
            Ok(request) => request,
            Err(err) => return self.reject(err.into(), "invalid task"),
        };

        match self.engine.gateway().create_task(&request).await {
            Ok(data) => {
                let prepended = !data.is_null()
                    && self
                        .engine
                        .update_store(|store| store.prepend_task(normalize_task(&data)));
                if prepended {
                    self.engine.render(Domain::Tasks);
                } else {
                    self.refetch(&[Domain::Tasks]).await;
                }
                info!(name = %request.name, prepended, "task created");
                self.engine
                    .notify(NotificationKind::Success, format!("task \"{}\" created", request.name));
                CommandOutcome::Applied
            }
            Err(err) => {
                let message = match &err {
                    DashboardError::Network { .. } => {
                        "network error, please retry later".to_string()
                    }
                    _ => format!("task creation failed: {}", err.user_message("unknown error")),
                };
                warn!(name = %request.name, error = %err, "task creation failed");
                self.engine.notify(NotificationKind::Error, message);
                CommandOutcome::Rejected(err)
            }
        }
    }

    /// Optimistically mark a task running.
    pub fn start_task(&self, id: &str) -> CommandOutcome {
        self.change_status(id, TaskAction::Start)
    }

    /// Optimistically return a task to pending.
    pub fn stop_task(&self, id: &str) -> CommandOutcome {
        self.change_status(id, TaskAction::Stop)
    }

    fn change_status(&self, id: &str, action: TaskAction) -> CommandOutcome {
        let Some(status) = action.target_status() else {
            return CommandOutcome::NotFound;
        };
        let Some(task) = self
            .engine
            .update_store(|store| store.set_task_status(id, status))
        else {
            debug!(task_id = id, ?action, "status change for unknown task");
            return CommandOutcome::NotFound;
        };
        self.engine.render(Domain::Tasks);
        self.engine
            .notify(action.notification_kind(), success_message(action, &task.name));
        CommandOutcome::Applied
    }

    /// Remove a task locally after confirmation.
    pub fn delete_task(&self, id: &str, confirm: &dyn Confirm) -> CommandOutcome {
        let Some(name) = self.engine.store().find_task(id).map(|task| task.name.clone()) else {
            debug!(task_id = id, "delete for unknown task");
            return CommandOutcome::NotFound;
        };
        if !confirm.confirm(&delete_prompt(&name)) {
            return CommandOutcome::Cancelled;
        }
        if self
            .engine
            .update_store(|store| store.remove_task(id))
            .is_none()
        {
            return CommandOutcome::NotFound;
        }
        self.engine.render(Domain::Tasks);
        self.engine.notify(
            TaskAction::Delete.notification_kind(),
            success_message(TaskAction::Delete, &name),
        );
        CommandOutcome::Applied
    }

    /// Register a local IP, then refetch the table.
    pub async fn add_local_ip(&self, address: &str, source: &str) -> CommandOutcome {
        let request = match build_local_ip_request(address, source) {
            Ok(request) => request,
            Err(err) => return self.reject(err.into(), "invalid IP"),
        };
        match self.engine.gateway().add_local_ip(&request).await {
            Ok(()) => {
                self.engine
                    .notify(NotificationKind::Success, format!("IP {} added", request.address));
                self.refetch(&[Domain::LocalIps]).await;
                CommandOutcome::Applied
            }
            Err(err) => self.reject(err, "failed to add IP"),
        }
    }

    /// Remove a local IP after confirmation, then refetch the table.
    pub async fn remove_local_ip(&self, id: &str, confirm: &dyn Confirm) -> CommandOutcome {
        if !confirm.confirm(REMOVE_LOCAL_IP_PROMPT) {
            return CommandOutcome::Cancelled;
        }
        match self.engine.gateway().remove_local_ip(id).await {
            Ok(()) => {
                self.engine.notify(NotificationKind::Success, "IP removed");
                self.refetch(&[Domain::LocalIps]).await;
                CommandOutcome::Applied
            }
            Err(err) => self.reject(err, "failed to remove IP"),
        }
    }

    /// Add an address to an access list, then refetch the list and pool stats.
    pub async fn add_access_ip(&self, kind: AccessListKind, ip: &str) -> CommandOutcome {
        let ip = match normalize_access_ip(ip) {
            Ok(ip) => ip,
            Err(err) => return self.reject(err.into(), "invalid IP"),
        };
        match self.engine.gateway().add_access_ip(kind, &ip).await {
            Ok(()) => {
                self.engine.notify(
                    NotificationKind::Success,
                    format!("{ip} added to {}", kind.as_str()),
                );
                self.refetch(&[Domain::access_list(kind), Domain::PoolStats])
                    .await;
                CommandOutcome::Applied
            }
            Err(err) => self.reject(err, "operation failed"),
        }
    }

    /// Remove an address from an access list, then refetch the list and pool stats.
    pub async fn remove_access_ip(&self, kind: AccessListKind, ip: &str) -> CommandOutcome {
        let ip = match normalize_access_ip(ip) {
            Ok(ip) => ip,
            Err(err) => return self.reject(err.into(), "invalid IP"),
        };
        match self.engine.gateway().remove_access_ip(kind, &ip).await {
            Ok(()) => {
                self.engine.notify(
                    NotificationKind::Success,
                    format!("{ip} removed from {}", kind.as_str()),
                );
                self.refetch(&[Domain::access_list(kind), Domain::PoolStats])
                    .await;
                CommandOutcome::Applied
            }
            Err(err) => self.reject(err, "operation failed"),
        }
    }

    /// Save the IP policy, then refetch it.
    pub async fn save_policy(&self, draft: PolicyDraft) -> CommandOutcome {
        let policy = draft.into_policy();
        match self.engine.gateway().save_policy(&policy).await {
            Ok(()) => {
                self.engine
                    .notify(NotificationKind::Success, "IP policy saved");
                self.refetch(&[Domain::Policy]).await;
                CommandOutcome::Applied
            }
            Err(err) => self.reject(err, "failed to save IP policy"),
        }
    }

    /// Out-of-band refresh of `domains`, awaited together.
    pub async fn refetch(&self, domains: &[Domain]) {
        let handles = domains
            .iter()
            .map(|domain| self.scheduler.refresh_now(*domain));
        for result in join_all(handles).await {
            if let Err(err) = result {
                warn!(error = %err, "refresh task did not complete");
            }
        }
    }

    fn reject(&self, err: DashboardError, fallback: &str) -> CommandOutcome {
        warn!(kind = err.kind(), error = %err, "command rejected");
        self.engine
            .notify(NotificationKind::Error, err.user_message(fallback));
        CommandOutcome::Rejected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::{Notification, NotificationSink};
    use crate::core::scheduler::{PollIntervals, Refresh};
    use crate::core::store::DomainStore;
    use crate::error::ValidationError;
    use crate::features::tasks::{TaskSchedule, TaskStatus};
    use crate::testing::scripted_gateway;
    use crawldesk_api_models::paths;
    use crawldesk_test_support::fixtures::{envelope_failure, envelope_ok, raw_task};
    use crawldesk_test_support::{ScriptedBackend, ScriptedReply};
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use tokio::task::LocalSet;

    struct Harness {
        backend: Rc<ScriptedBackend>,
        engine: Rc<SyncEngine>,
        dispatcher: CommandDispatcher,
    }

    impl Harness {
        fn new() -> Self {
            let backend = Rc::new(ScriptedBackend::new());
            let engine = Rc::new(SyncEngine::new(
                scripted_gateway(&backend),
                Rc::new(RefCell::new(DomainStore::new())),
                Rc::new(RefCell::new(NotificationSink::default())),
            ));
            let scheduler = Rc::new(PollScheduler::new(
                Rc::clone(&engine) as Rc<dyn Refresh>,
                PollIntervals::default(),
            ));
            let dispatcher = CommandDispatcher::new(Rc::clone(&engine), scheduler);
            Self {
                backend,
                engine,
                dispatcher,
            }
        }

        fn ok(&self, method: &str, path: &str, data: serde_json::Value) -> &Self {
            self.backend
                .script(method, path, ScriptedReply::json(200, &envelope_ok(data)));
            self
        }

        async fn load_tasks(&self, tasks: serde_json::Value) {
            self.ok("GET", paths::TASKS, tasks);
            self.engine
                .fetch_and_reconcile(Domain::Tasks)
                .await
                .expect("tasks load");
        }

        fn notes(&self) -> Vec<Notification> {
            self.engine.notifications().borrow_mut().drain()
        }

        fn task_ids(&self) -> Vec<String> {
            self.engine
                .store()
                .tasks()
                .data()
                .iter()
                .map(|task| task.id.clone())
                .collect()
        }
    }

    fn draft(name: &str) -> TaskDraft {
        TaskDraft {
            name: name.to_string(),
            url: "https://example.com".into(),
            ..TaskDraft::default()
        }
    }

    #[tokio::test]
    async fn create_rejection_notifies_and_leaves_store() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness.load_tasks(json!([raw_task("a", "alpha", "pending")])).await;
                harness.backend.script(
                    "POST",
                    paths::TASKS_CREATE,
                    ScriptedReply::json(200, &envelope_failure("duplicate name")),
                );
                let before = harness.engine.store().clone();

                let outcome = harness.dispatcher.create_task(&draft("alpha")).await;
                assert!(matches!(outcome, CommandOutcome::Rejected(DashboardError::Api { .. })));
                assert_eq!(*harness.engine.store(), before);

                let notes = harness.notes();
                assert_eq!(notes.len(), 1);
                assert_eq!(notes[0].kind, NotificationKind::Error);
                assert!(notes[0].message.contains("duplicate name"));
            })
            .await;
    }

    #[tokio::test]
    async fn create_prepends_when_loaded() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness.load_tasks(json!([raw_task("a", "alpha", "pending")])).await;
                harness.ok(
                    "POST",
                    paths::TASKS_CREATE,
                    json!({"id": "b", "name": "beta", "status": "pending"}),
                );

                let outcome = harness.dispatcher.create_task(&draft("beta")).await;
                assert_eq!(outcome, CommandOutcome::Applied);
                assert_eq!(harness.task_ids(), vec!["b".to_string(), "a".to_string()]);
                assert_eq!(harness.backend.count("GET", paths::TASKS), 1);

                let calls = harness.backend.calls();
                let body = calls
                    .iter()
                    .find(|call| call.path == paths::TASKS_CREATE)
                    .and_then(|call| call.body.clone())
                    .expect("create body");
                assert_eq!(body["name"], "beta");
                assert_eq!(body["schedule"], "once");
            })
            .await;
    }

    #[tokio::test]
    async fn create_refetches_when_not_loaded_or_no_echo() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness
                    .ok("POST", paths::TASKS_CREATE, json!({"id": "b"}))
                    .ok("GET", paths::TASKS, json!([raw_task("b", "beta", "pending")]));

                let outcome = harness.dispatcher.create_task(&draft("beta")).await;
                assert_eq!(outcome, CommandOutcome::Applied);
                assert_eq!(harness.backend.count("GET", paths::TASKS), 1);
                assert_eq!(harness.task_ids(), vec!["b".to_string()]);

                harness.backend.script(
                    "POST",
                    paths::TASKS_CREATE,
                    ScriptedReply::json(200, &json!({"success": true})),
                );
                harness.dispatcher.create_task(&draft("gamma")).await;
                assert_eq!(harness.backend.count("GET", paths::TASKS), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn create_validation_makes_no_call() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                let cron = TaskDraft {
                    schedule: TaskSchedule::Cron,
                    ..draft("nightly")
                };
                let outcome = harness.dispatcher.create_task(&cron).await;
                assert_eq!(
                    outcome,
                    CommandOutcome::Rejected(ValidationError::MissingCronExpression.into())
                );
                assert!(harness.backend.calls().is_empty());
                assert_eq!(harness.notes().len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn network_failure_on_create_uses_generic_message() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness.backend.script(
                    "POST",
                    paths::TASKS_CREATE,
                    ScriptedReply::unreachable("connection refused"),
                );
                harness.dispatcher.create_task(&draft("x")).await;
                let notes = harness.notes();
                assert_eq!(notes[0].message, "network error, please retry later");
            })
            .await;
    }

    #[tokio::test]
    async fn start_and_stop_change_local_status() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness.load_tasks(json!([raw_task("a", "alpha", "pending")])).await;

                assert_eq!(harness.dispatcher.start_task("a"), CommandOutcome::Applied);
                assert_eq!(
                    harness.engine.store().find_task("a").map(|task| task.status.clone()),
                    Some(TaskStatus::Running)
                );
                assert_eq!(harness.dispatcher.stop_task("a"), CommandOutcome::Applied);
                assert_eq!(
                    harness.engine.store().find_task("a").map(|task| task.status.clone()),
                    Some(TaskStatus::Pending)
                );
                assert_eq!(harness.dispatcher.start_task("zz"), CommandOutcome::NotFound);

                let kinds: Vec<_> = harness.notes().iter().map(|note| note.kind).collect();
                assert_eq!(kinds, vec![NotificationKind::Success, NotificationKind::Info]);
                assert!(harness.backend.calls().iter().all(|call| call.method == "GET"));
            })
            .await;
    }

    #[tokio::test]
    async fn delete_is_gated_by_confirmation() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness
                    .load_tasks(json!([
                        raw_task("a", "alpha", "pending"),
                        raw_task("b", "beta", "running")
                    ]))
                    .await;

                let asked = Cell::new(0);
                let decline = |prompt: &str| {
                    asked.set(asked.get() + 1);
                    assert!(prompt.contains("beta"));
                    false
                };
                assert_eq!(
                    harness.dispatcher.delete_task("b", &decline),
                    CommandOutcome::Cancelled
                );
                assert_eq!(asked.get(), 1);
                assert_eq!(harness.task_ids().len(), 2);

                assert_eq!(
                    harness.dispatcher.delete_task("b", &Preconfirmed(true)),
                    CommandOutcome::Applied
                );
                assert_eq!(harness.task_ids(), vec!["a".to_string()]);
                assert_eq!(
                    harness.dispatcher.delete_task("b", &Preconfirmed(true)),
                    CommandOutcome::NotFound
                );
            })
            .await;
    }

    #[tokio::test]
    async fn whitelist_removal_refetches_list_and_pool_stats() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness
                    .ok("GET", paths::WHITELIST, json!(["1.2.3.4", "5.6.7.8"]))
                    .ok("GET", paths::WHITELIST, json!(["5.6.7.8"]))
                    .ok("DELETE", paths::WHITELIST, json!(null))
                    .ok("GET", paths::POOL_STATS, json!({"WhitelistIPs": 1}));
                harness
                    .engine
                    .fetch_and_reconcile(Domain::Whitelist)
                    .await
                    .expect("initial whitelist");

                let outcome = harness
                    .dispatcher
                    .remove_access_ip(AccessListKind::Whitelist, "1.2.3.4")
                    .await;
                assert_eq!(outcome, CommandOutcome::Applied);

                let store = harness.engine.store();
                assert_eq!(
                    store.access_list(AccessListKind::Whitelist).data(),
                    &vec!["5.6.7.8".to_string()]
                );
                assert_eq!(
                    store.pool_stats().data().as_ref().map(|stats| stats.whitelist_ips),
                    Some(1)
                );
                assert_eq!(harness.backend.count("GET", paths::POOL_STATS), 1);
                let delete = harness
                    .backend
                    .calls()
                    .into_iter()
                    .find(|call| call.method == "DELETE")
                    .expect("delete call");
                assert_eq!(delete.query, vec![("ip".to_string(), "1.2.3.4".to_string())]);
            })
            .await;
    }

    #[tokio::test]
    async fn blank_access_ip_is_rejected_locally() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                let outcome = harness
                    .dispatcher
                    .add_access_ip(AccessListKind::Blacklist, "   ")
                    .await;
                assert!(matches!(outcome, CommandOutcome::Rejected(ref err) if err.is_validation()));
                assert!(harness.backend.calls().is_empty());
            })
            .await;
    }

    #[tokio::test]
    async fn local_ip_commands_refetch_table() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness
                    .ok("POST", paths::LOCAL_IPS, json!(null))
                    .ok(
                        "GET",
                        paths::LOCAL_IPS,
                        json!([{"id": 1, "address": "10.0.0.1"}]),
                    );
                let added = harness.dispatcher.add_local_ip("10.0.0.1", "manual").await;
                assert_eq!(added, CommandOutcome::Applied);
                assert_eq!(harness.engine.store().local_ips().data().len(), 1);

                let cancelled = harness
                    .dispatcher
                    .remove_local_ip("1", &Preconfirmed(false))
                    .await;
                assert_eq!(cancelled, CommandOutcome::Cancelled);
                assert_eq!(harness.backend.count("DELETE", &paths::local_ip("1")), 0);

                harness.backend.script(
                    "DELETE",
                    &paths::local_ip("1"),
                    ScriptedReply::json(400, &envelope_failure("IP in use")),
                );
                let rejected = harness
                    .dispatcher
                    .remove_local_ip("1", &Preconfirmed(true))
                    .await;
                assert!(matches!(rejected, CommandOutcome::Rejected(_)));
                let last = harness.notes().pop().expect("notification");
                assert_eq!(last.message, "IP in use");
                assert_eq!(harness.engine.store().local_ips().data().len(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn save_policy_zeroes_blanks_and_refetches() {
        LocalSet::new()
            .run_until(async {
                let harness = Harness::new();
                harness
                    .ok("PUT", paths::IP_SETTINGS, json!(null))
                    .ok("GET", paths::IP_SETTINGS, json!({"maxFailures": 2}));
                let outcome = harness
                    .dispatcher
                    .save_policy(PolicyDraft {
                        max_failures: Some(2),
                        ..PolicyDraft::default()
                    })
                    .await;
                assert_eq!(outcome, CommandOutcome::Applied);

                let put = harness
                    .backend
                    .calls()
                    .into_iter()
                    .find(|call| call.method == "PUT")
                    .and_then(|call| call.body)
                    .expect("put body");
                assert_eq!(
                    put,
                    json!({
                        "preheatConnections": 0,
                        "maxFailures": 2,
                        "rotateIntervalSeconds": 0,
                        "autoRecoverSeconds": 0
                    })
                );
                assert!(harness.engine.store().policy().loaded());
            })
            .await;
    }
}
