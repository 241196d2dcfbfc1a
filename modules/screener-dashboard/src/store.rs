use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use screener_client::{ScreenerApi, SignalStatus};

use crate::busy::{InFlight, LoadKind};
use crate::scope::PageScope;
use crate::state::{apply, DashboardState, SliceUpdate};

/// How a loader settled. Loaders never return errors; failures are logged
/// and the previous slice stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// The page scope was cancelled; nothing was written.
    Discarded,
}

/// Owns the dashboard's view-state and the loaders that fill it.
///
/// Construct one per app and hand out `Arc<DashboardStore>`. Readers either
/// take a [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe) to
/// be woken on every change.
pub struct DashboardStore {
    api: Arc<dyn ScreenerApi>,
    state: watch::Sender<DashboardState>,
    in_flight: InFlight,
}

impl DashboardStore {
    pub fn new(api: Arc<dyn ScreenerApi>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            api,
            state,
            in_flight: InFlight::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    pub fn active_loads(&self) -> Vec<LoadKind> {
        self.in_flight.active()
    }

    pub async fn fetch_weekend_scan(&self, scope: &PageScope) -> LoadOutcome {
        let _busy = self.track(LoadKind::WeekendScan);
        self.load(
            "weekend scan",
            scope,
            self.api.latest_weekend_scan(),
            SliceUpdate::WeekendScan,
        )
        .await
    }

    pub async fn fetch_daily_pool(&self, scope: &PageScope) -> LoadOutcome {
        let _busy = self.track(LoadKind::DailyPool);
        self.load(
            "daily pool",
            scope,
            self.api.latest_daily_pool(),
            SliceUpdate::DailyPool,
        )
        .await
    }

    /// Load signals in `status`. An empty response clears the slice.
    pub async fn fetch_signals(&self, scope: &PageScope, status: SignalStatus) -> LoadOutcome {
        let _busy = self.track(LoadKind::Signals);
        self.load(
            "signals",
            scope,
            self.api.latest_signals(&status),
            SliceUpdate::Signals,
        )
        .await
    }

    pub async fn fetch_pending_signals(&self, scope: &PageScope) -> LoadOutcome {
        self.fetch_signals(scope, SignalStatus::Pending).await
    }

    /// Background status poll. Does not count toward `busy`.
    pub async fn fetch_system_status(&self, scope: &PageScope) -> LoadOutcome {
        self.load(
            "system status",
            scope,
            self.api.system_status(),
            SliceUpdate::SystemStatus,
        )
        .await
    }

    /// Optimistically set a signal's status in the local list only.
    /// Returns false (and changes nothing) when no signal has that id.
    pub fn update_signal_status(&self, signal_id: i64, status: SignalStatus) -> bool {
        let changed = self.state.send_if_modified(|s| {
            apply(
                s,
                SliceUpdate::SignalStatus {
                    signal_id,
                    status: status.clone(),
                },
            )
        });
        if changed {
            debug!(signal_id, status = %status, "Signal status updated locally");
        } else {
            debug!(signal_id, "No signal with that id; status unchanged");
        }
        changed
    }

    async fn load<T, F, U>(
        &self,
        label: &'static str,
        scope: &PageScope,
        request: F,
        to_update: U,
    ) -> LoadOutcome
    where
        F: Future<Output = screener_client::Result<T>>,
        U: FnOnce(T) -> SliceUpdate,
    {
        let result = tokio::select! {
            biased;
            _ = scope.cancelled() => {
                debug!(load = label, "Page left before the response; request dropped");
                return LoadOutcome::Discarded;
            }
            result = request => result,
        };

        match result {
            Ok(payload) => {
                if scope.is_cancelled() {
                    warn!(load = label, "Response arrived after the page left; discarded");
                    return LoadOutcome::Discarded;
                }
                let update = to_update(payload);
                self.state.send_modify(|s| {
                    apply(s, update);
                });
                info!(load = label, "Slice updated");
                LoadOutcome::Applied
            }
            Err(e) => {
                error!(load = label, error = %e, "Failed to fetch");
                LoadOutcome::Failed
            }
        }
    }

    fn track(&self, kind: LoadKind) -> BusyGuard<'_> {
        self.in_flight.start(kind);
        self.publish_busy();
        BusyGuard { store: self, kind }
    }

    fn publish_busy(&self) {
        // Read the counters inside the watch lock so the last publish wins.
        self.state
            .send_if_modified(|s| apply(s, SliceUpdate::Busy(self.in_flight.is_busy())));
    }
}

/// Marks one load as settled when dropped, whichever way the load ended.
struct BusyGuard<'a> {
    store: &'a DashboardStore,
    kind: LoadKind,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.in_flight.finish(self.kind);
        self.store.publish_busy();
    }
}
