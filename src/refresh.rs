//! Refresh orchestration: fetch, recompute, and the periodic poller.
//!
//! Refreshes can be triggered by the timer, by the renderer (tab visible
//! again, explicit refresh button) and after admin actions. Only one runs at
//! a time. Timer and renderer triggers that arrive while another refresh is
//! in flight are dropped; the refresh after an admin action waits its turn,
//! since the one in flight may have fetched before the change landed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::dashboard::{Dashboard, DataSource};
use crate::fetcher::SiloApiClient;

// ---

pub type SharedDashboard = Arc<Mutex<Dashboard>>;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: SharedDashboard,
    pub api: SiloApiClient,
    pub gate: RefreshGate,
}

impl AppState {
    pub fn new(dashboard: Dashboard, api: SiloApiClient) -> Self {
        AppState {
            dashboard: Arc::new(Mutex::new(dashboard)),
            api,
            gate: RefreshGate::default(),
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: AtomicBool,
    released: Notify,
}

/// In-flight flag guarding against overlapping refreshes.
#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    state: Arc<GateState>,
}

/// Holds the gate closed until dropped.
#[derive(Debug)]
pub struct RefreshGuard {
    state: Arc<GateState>,
}

impl RefreshGate {
    // ---
    /// Claim the gate, or `None` if a refresh is already running.
    pub fn try_begin(&self) -> Option<RefreshGuard> {
        self.state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                state: Arc::clone(&self.state),
            })
    }

    /// Claim the gate, waiting for a running refresh to finish first.
    pub async fn begin(&self) -> RefreshGuard {
        // ---
        loop {
            let released = self.state.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed.
            released.as_mut().enable();

            if let Some(guard) = self.try_begin() {
                return guard;
            }
            released.await;
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.state.in_flight.store(false, Ordering::Release);
        self.state.released.notify_waiters();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "source", rename_all = "lowercase")]
pub enum RefreshOutcome {
    Completed(DataSource),
    Skipped,
}

/// Fetch fresh readings and rebuild the dashboard view.
pub async fn refresh(state: &AppState) -> RefreshOutcome {
    // ---
    let Some(guard) = state.gate.try_begin() else {
        debug!("Refresh already in progress, skipping");
        return RefreshOutcome::Skipped;
    };

    RefreshOutcome::Completed(reload(state, guard).await)
}

/// Refresh after a change made through the silo API. Never skipped: if
/// another refresh is running, wait for it and then fetch again.
pub async fn refresh_after_change(state: &AppState) -> RefreshOutcome {
    // ---
    if state.gate.is_refreshing() {
        debug!("Refresh in progress, queueing reload after change");
    }
    let guard = state.gate.begin().await;
    RefreshOutcome::Completed(reload(state, guard).await)
}

async fn reload(state: &AppState, _guard: RefreshGuard) -> DataSource {
    let fetched = state.api.fetch_readings().await;
    state.dashboard.lock().await.apply_fetch(fetched, Utc::now())
}

/// Refresh every `period`; the first tick fires immediately and performs the
/// initial load.
pub fn spawn_poller(state: AppState, period: Duration) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Polling silo API every {:?}", period);

        loop {
            ticker.tick().await;
            debug!("Auto-refreshing data");
            refresh(&state).await;
        }
    })
}
