//! One recurring refresh timer per polled domain.
//!
//! # Design
//! - Timers are local tasks keyed by domain; starting an active domain is a no-op.
//! - The first tick fires immediately, then every interval.
//! - Each tick spawns its fetch as a separate task, so a slow fetch never
//!   delays the next tick and stopping a timer leaves in-flight fetches alone.
//! - Must run inside a `tokio::task::LocalSet`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::store::Domain;

/// Default task-table poll interval.
pub const DEFAULT_TASKS_INTERVAL: Duration = Duration::from_secs(10);
/// Default pool-stats poll interval.
pub const DEFAULT_POOL_STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Fetch-and-reconcile hook driven by the scheduler.
#[async_trait(?Send)]
pub trait Refresh {
    /// Refresh one domain; failures are handled by the implementor.
    async fn refresh(&self, domain: Domain);
}

/// Poll periods for the domains that refresh on a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollIntervals {
    /// Task table period.
    pub tasks: Duration,
    /// Pool stats period.
    pub pool_stats: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            tasks: DEFAULT_TASKS_INTERVAL,
            pool_stats: DEFAULT_POOL_STATS_INTERVAL,
        }
    }
}

impl PollIntervals {
    /// Period for `domain`; `None` for domains that only refresh on demand.
    #[must_use]
    pub const fn for_domain(&self, domain: Domain) -> Option<Duration> {
        match domain {
            Domain::Tasks => Some(self.tasks),
            Domain::PoolStats => Some(self.pool_stats),
            Domain::LocalIps | Domain::Whitelist | Domain::Blacklist | Domain::Policy => None,
        }
    }
}

/// Owns the poll timers.
pub struct PollScheduler {
    refresher: Rc<dyn Refresh>,
    intervals: PollIntervals,
    timers: RefCell<HashMap<Domain, JoinHandle<()>>>,
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("intervals", &self.intervals)
            .field("active", &self.active_domains())
            .finish_non_exhaustive()
    }
}

impl PollScheduler {
    /// Scheduler driving `refresher`.
    #[must_use]
    pub fn new(refresher: Rc<dyn Refresh>, intervals: PollIntervals) -> Self {
        Self {
            refresher,
            intervals,
            timers: RefCell::new(HashMap::new()),
        }
    }

    /// Configured intervals.
    #[must_use]
    pub const fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    /// Start polling `domain`. Returns `false` when a timer is already active
    /// or the domain has no poll interval.
    pub fn start(&self, domain: Domain) -> bool {
        let Some(period) = self.intervals.for_domain(domain) else {
            debug!(%domain, "domain is not polled");
            return false;
        };
        let mut timers = self.timers.borrow_mut();
        if timers.get(&domain).is_some_and(|handle| !handle.is_finished()) {
            debug!(%domain, "poll timer already active");
            return false;
        }

        let refresher = Rc::clone(&self.refresher);
        let period = period.max(Duration::from_millis(1));
        let handle = task::spawn_local(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let refresher = Rc::clone(&refresher);
                task::spawn_local(async move {
                    refresher.refresh(domain).await;
                });
            }
        });
        timers.insert(domain, handle);
        info!(%domain, period_ms = period.as_millis(), "poll timer started");
        true
    }

    /// Cancel the timer for `domain`; in-flight fetches run to completion.
    /// Returns whether a timer was active.
    pub fn stop(&self, domain: Domain) -> bool {
        let Some(handle) = self.timers.borrow_mut().remove(&domain) else {
            return false;
        };
        handle.abort();
        info!(%domain, "poll timer stopped");
        true
    }

    /// Cancel every timer.
    pub fn stop_all(&self) {
        let handles: Vec<_> = self.timers.borrow_mut().drain().collect();
        for (domain, handle) in handles {
            handle.abort();
            debug!(%domain, "poll timer stopped");
        }
    }

    /// Launch an out-of-band refresh without touching the timer phase.
    pub fn refresh_now(&self, domain: Domain) -> JoinHandle<()> {
        let refresher = Rc::clone(&self.refresher);
        debug!(%domain, "out-of-band refresh");
        task::spawn_local(async move {
            refresher.refresh(domain).await;
        })
    }

    /// Whether a timer is running for `domain`.
    #[must_use]
    pub fn is_active(&self, domain: Domain) -> bool {
        self.timers
            .borrow()
            .get(&domain)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Domains with a running timer, sorted.
    #[must_use]
    pub fn active_domains(&self) -> Vec<Domain> {
        let mut domains: Vec<_> = self
            .timers
            .borrow()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(domain, _)| *domain)
            .collect();
        domains.sort();
        domains
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.get_mut().drain() {
            handle.abort();
        }
    }
}
