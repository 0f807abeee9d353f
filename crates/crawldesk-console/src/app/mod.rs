//! Application root: owns the store, sink, scheduler, and dispatcher.
//!
//! # Design
//! - One `Dashboard` per session; everything shared lives behind `Rc`.
//! - Tasks and pool stats poll on timers; the IP domains load once and then
//!   refresh only after commands.
//! - Must be driven from inside a `tokio::task::LocalSet`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::ConsoleConfig;
use crate::core::identity::IdentityTiers;
use crate::core::notify::{DEFAULT_DISPLAY_DURATION, NotificationSink};
use crate::core::scheduler::{PollIntervals, PollScheduler, Refresh};
use crate::core::store::{Domain, DomainStore};
use crate::services::gateway::ApiGateway;
use crate::services::transport::{HttpTransport, Transport, TransportError};
use crate::view::{self, DashboardView};

pub mod dispatch;
pub mod sync;

pub use dispatch::{CommandDispatcher, CommandOutcome, Confirm, Preconfirmed};
pub use sync::{RenderHook, SyncEngine};

/// Domains refreshed on a timer.
pub const POLLED_DOMAINS: [Domain; 2] = [Domain::Tasks, Domain::PoolStats];
/// Domains loaded once at start and refreshed by commands.
pub const ON_DEMAND_DOMAINS: [Domain; 4] = [
    Domain::LocalIps,
    Domain::Whitelist,
    Domain::Blacklist,
    Domain::Policy,
];

/// Timing and identity knobs for a dashboard session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Poll periods.
    pub intervals: PollIntervals,
    /// Notification display duration.
    pub notification_ttl: Duration,
    /// Operator identity sources.
    pub identity: IdentityTiers,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            intervals: PollIntervals::default(),
            notification_ttl: DEFAULT_DISPLAY_DURATION,
            identity: IdentityTiers::default(),
        }
    }
}

impl From<&ConsoleConfig> for DashboardSettings {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            intervals: config.intervals,
            notification_ttl: config.notification_ttl,
            identity: config.identity.clone(),
        }
    }
}

/// Wired dashboard session.
#[derive(Debug)]
pub struct Dashboard {
    engine: Rc<SyncEngine>,
    scheduler: Rc<PollScheduler>,
    dispatcher: CommandDispatcher,
    identity: IdentityTiers,
}

impl Dashboard {
    /// Dashboard over any transport.
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>, settings: DashboardSettings) -> Self {
        let engine = Rc::new(SyncEngine::new(
            ApiGateway::new(transport),
            Rc::new(RefCell::new(DomainStore::new())),
            Rc::new(RefCell::new(NotificationSink::new(settings.notification_ttl))),
        ));
        let scheduler = Rc::new(PollScheduler::new(
            Rc::clone(&engine) as Rc<dyn Refresh>,
            settings.intervals,
        ));
        let dispatcher = CommandDispatcher::new(Rc::clone(&engine), Rc::clone(&scheduler));
        Self {
            engine,
            scheduler,
            dispatcher,
            identity: settings.identity,
        }
    }

    /// Dashboard talking HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn connect(config: &ConsoleConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.api_url.clone(), config.timeout)?;
        info!(api_url = %config.api_url, "dashboard connecting");
        Ok(Self::new(Rc::new(transport), DashboardSettings::from(config)))
    }

    /// Install the render hook.
    pub fn set_render_hook(&self, hook: RenderHook) {
        self.engine.set_render_hook(hook);
    }

    /// Start the poll timers and kick off the one-shot loads.
    ///
    /// Calling it again while the timers run does nothing.
    pub fn start(&self) {
        let started = POLLED_DOMAINS
            .into_iter()
            .filter(|domain| self.scheduler.start(*domain))
            .count();
        if started == 0 {
            debug!("dashboard already started");
            return;
        }
        for domain in ON_DEMAND_DOMAINS {
            drop(self.scheduler.refresh_now(domain));
        }
    }

    /// Fetch `domains` now and wait for all of them.
    pub async fn load(&self, domains: &[Domain]) {
        self.dispatcher.refetch(domains).await;
    }

    /// Stop every timer; in-flight fetches finish on their own.
    pub fn shutdown(&self) {
        self.scheduler.stop_all();
    }

    /// Command entry point.
    #[must_use]
    pub const fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Poll timers.
    #[must_use]
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Sync core.
    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Effective operator identity.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.resolve()
    }

    /// Current view of every panel, with expired notifications pruned.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        let notifications = self.engine.notifications().borrow_mut().active();
        view::dashboard(
            &self.engine.store(),
            &notifications,
            self.identity(),
            Utc::now(),
        )
    }
}
