use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::domain::stats::StatsSnapshot;
use crate::error::AppError;
use crate::services::TicketStoreService;
use crate::workflow::fence::{FetchOutcome, Fence};
use crate::workflow::refresh::RefreshSignal;

#[derive(Debug, Clone, PartialEq)]
pub enum StatsView {
    Loading,
    Unavailable,
    Ready(StatsSnapshot),
}

#[derive(Debug, Default)]
struct StatsState {
    snapshot: Option<StatsSnapshot>,
    loading: bool,
}

/// Keeps the latest statistics snapshot; bar widths are derived on read.
#[derive(Clone)]
pub struct StatsAggregator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn TicketStoreService>,
    refresh: RefreshSignal,
    fence: Fence,
    state: Mutex<StatsState>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn TicketStoreService>, refresh: RefreshSignal) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                refresh,
                fence: Fence::default(),
                state: Mutex::new(StatsState {
                    snapshot: None,
                    loading: true,
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StatsState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> StatsView {
        let state = self.state();
        match (&state.snapshot, state.loading) {
            (_, true) => StatsView::Loading,
            (Some(snapshot), false) => StatsView::Ready(snapshot.clone()),
            (None, false) => StatsView::Unavailable,
        }
    }

    pub async fn refresh(&self) -> FetchOutcome {
        let token = self.inner.fence.issue();
        self.state().loading = true;

        let result = self.inner.store.stats().await;

        let mut state = self.state();
        if !self.inner.fence.is_current(token) {
            tracing::debug!(token, "discarding stale statistics");
            return FetchOutcome::Stale;
        }
        state.loading = false;
        match result {
            Ok(snapshot) => {
                state.snapshot = Some(snapshot);
                FetchOutcome::Applied
            }
            Err(err) => {
                let err = AppError::Fetch(err.to_string());
                tracing::error!(error = %err, "failed to fetch stats");
                FetchOutcome::Failed
            }
        }
    }

    /// Re-aggregates on every refresh signal, whatever raised it.
    pub fn watch_refresh(&self) -> JoinHandle<()> {
        let aggregator = self.clone();
        let mut receiver = self.inner.refresh.subscribe();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let _ = receiver.borrow_and_update();
                aggregator.refresh().await;
            }
        })
    }
}
