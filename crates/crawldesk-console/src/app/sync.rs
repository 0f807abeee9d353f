//! Fetch, normalize, and reconcile one domain at a time.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use crawldesk_api_models::AccessListKind;
use tracing::{debug, warn};

use crate::core::notify::{NotificationKind, NotificationSink};
use crate::core::scheduler::Refresh;
use crate::core::store::{ApplyOutcome, Domain, DomainStore, FailureOutcome, Snapshot};
use crate::error::DashboardResult;
use crate::features::tasks::normalize_task;
use crate::services::gateway::ApiGateway;

/// Called after a domain's visible state changes.
///
/// The hook receives a shared borrow of the store and must not mutate it.
pub type RenderHook = Rc<dyn Fn(&DomainStore, Domain)>;

/// Shared sync core: gateway, store, and notification sink.
pub struct SyncEngine {
    gateway: ApiGateway,
    store: Rc<RefCell<DomainStore>>,
    notifications: Rc<RefCell<NotificationSink>>,
    render: RefCell<Option<RenderHook>>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Engine over an existing store and sink.
    #[must_use]
    pub fn new(
        gateway: ApiGateway,
        store: Rc<RefCell<DomainStore>>,
        notifications: Rc<RefCell<NotificationSink>>,
    ) -> Self {
        Self {
            gateway,
            store,
            notifications,
            render: RefCell::new(None),
        }
    }

    /// Install the render hook, replacing any previous one.
    pub fn set_render_hook(&self, hook: RenderHook) {
        *self.render.borrow_mut() = Some(hook);
    }

    /// Gateway used for every call.
    #[must_use]
    pub const fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// Shared borrow of the store.
    ///
    /// # Panics
    ///
    /// Panics if the store is mutably borrowed, which only happens inside
    /// synchronous store updates.
    #[must_use]
    pub fn store(&self) -> Ref<'_, DomainStore> {
        self.store.borrow()
    }

    /// Run a synchronous mutation against the store.
    pub fn update_store<R>(&self, update: impl FnOnce(&mut DomainStore) -> R) -> R {
        update(&mut self.store.borrow_mut())
    }

    /// Handle to the notification sink.
    #[must_use]
    pub fn notifications(&self) -> Rc<RefCell<NotificationSink>> {
        Rc::clone(&self.notifications)
    }

    /// Queue a notification.
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        self.notifications.borrow_mut().push(kind, message);
    }

    /// Invoke the render hook for `domain`.
    pub fn render(&self, domain: Domain) {
        let hook = self.render.borrow().clone();
        if let Some(hook) = hook {
            let store = self.store.borrow();
            hook(&store, domain);
        }
    }

    /// Fetch `domain`, then overwrite or record the failure.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after it has been recorded in the store and,
    /// where the domain calls for it, surfaced as a notification.
    pub async fn fetch_and_reconcile(&self, domain: Domain) -> DashboardResult<ApplyOutcome> {
        let ticket = self.store.borrow_mut().begin_fetch(domain);
        debug!(%domain, seq = ticket.seq(), "fetch issued");

        match self.fetch_snapshot(domain).await {
            Ok(snapshot) => {
                let outcome = self.store.borrow_mut().apply(ticket, snapshot);
                if outcome == ApplyOutcome::Applied {
                    debug!(%domain, seq = ticket.seq(), "snapshot applied");
                    self.render(domain);
                }
                Ok(outcome)
            }
            Err(err) => {
                let message = err.user_message("request failed");
                let failure = self.store.borrow_mut().record_failure(ticket, message.clone());
                match failure {
                    FailureOutcome::NeverLoaded => {
                        warn!(%domain, error = %err, "initial load failed");
                        if domain.notifies_on_first_failure() {
                            self.notify(
                                NotificationKind::Error,
                                format!("failed to load {}: {message}", domain.label()),
                            );
                        }
                        self.render(domain);
                    }
                    FailureOutcome::KeptLastGood => {
                        warn!(%domain, error = %err, "refresh failed; keeping last snapshot");
                        if domain.notifies_on_refresh_failure() {
                            self.notify(
                                NotificationKind::Error,
                                format!("failed to refresh {}: {message}", domain.label()),
                            );
                        }
                    }
                }
                Err(err)
            }
        }
    }

    async fn fetch_snapshot(&self, domain: Domain) -> DashboardResult<Snapshot> {
        let gateway = &self.gateway;
        Ok(match domain {
            Domain::Tasks => {
                let raw = gateway.fetch_tasks().await?;
                Snapshot::Tasks(raw.iter().map(normalize_task).collect())
            }
            Domain::LocalIps => Snapshot::LocalIps(gateway.fetch_local_ips().await?),
            Domain::Whitelist => Snapshot::Whitelist(
                gateway
                    .fetch_access_list(AccessListKind::Whitelist)
                    .await?,
            ),
            Domain::Blacklist => Snapshot::Blacklist(
                gateway
                    .fetch_access_list(AccessListKind::Blacklist)
                    .await?,
            ),
            Domain::Policy => Snapshot::Policy(gateway.fetch_policy().await?),
            Domain::PoolStats => Snapshot::PoolStats(gateway.fetch_pool_stats().await?),
        })
    }
}

#[async_trait(?Send)]
impl Refresh for SyncEngine {
    async fn refresh(&self, domain: Domain) {
        if let Err(err) = self.fetch_and_reconcile(domain).await {
            debug!(%domain, kind = err.kind(), "refresh finished with error");
        }
    }
}
