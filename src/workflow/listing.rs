use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::domain::filter::{FilterCriteria, FilterUpdate};
use crate::domain::ticket::{Status, Ticket};
use crate::error::AppError;
use crate::services::TicketStoreService;
use crate::workflow::fence::{FetchOutcome, Fence};
use crate::workflow::refresh::{RefreshOrigin, RefreshSignal};

/// Which status changes may be requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Unconstrained,
    /// Only moves toward `closed` are allowed.
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn allows(&self, from: Status, to: Status) -> bool {
        match self {
            TransitionPolicy::Unconstrained => true,
            TransitionPolicy::ForwardOnly => to.rank() > from.rank(),
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "unconstrained" | "any" => Some(TransitionPolicy::Unconstrained),
            "forward" | "forward-only" => Some(TransitionPolicy::ForwardOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading,
    Empty,
    Populated(Vec<Ticket>),
}

#[derive(Debug)]
pub enum StatusChange {
    /// Target equals the current status; nothing was sent.
    Unchanged,
    Rejected { from: Status, to: Status },
    Applied(Ticket),
    Failed(AppError),
}

#[derive(Debug)]
struct ListState {
    filters: FilterCriteria,
    tickets: Vec<Ticket>,
    loading: bool,
}

/// Owns the filter criteria and the last successfully fetched ticket page.
#[derive(Clone)]
pub struct TicketListController {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn TicketStoreService>,
    refresh: RefreshSignal,
    source: u64,
    policy: TransitionPolicy,
    fence: Fence,
    state: Mutex<ListState>,
}

impl TicketListController {
    pub fn new(
        store: Arc<dyn TicketStoreService>,
        refresh: RefreshSignal,
        policy: TransitionPolicy,
    ) -> Self {
        let source = refresh.register();
        Self {
            inner: Arc::new(Inner {
                store,
                refresh,
                source,
                policy,
                fence: Fence::default(),
                state: Mutex::new(ListState {
                    filters: FilterCriteria::default(),
                    tickets: Vec::new(),
                    loading: true,
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn filters(&self) -> FilterCriteria {
        self.state().filters.clone()
    }

    pub fn view(&self) -> ListView {
        let state = self.state();
        if state.loading {
            ListView::Loading
        } else if state.tickets.is_empty() {
            ListView::Empty
        } else {
            ListView::Populated(state.tickets.clone())
        }
    }

    /// Applies a partial filter change, refetching when it changed anything.
    /// Returns `None` when the criteria were already in place.
    pub async fn set_filter(&self, update: FilterUpdate) -> Option<FetchOutcome> {
        let changed = self.state().filters.apply(update);
        if !changed {
            return None;
        }
        Some(self.refetch().await)
    }

    pub async fn clear_filters(&self) -> Option<FetchOutcome> {
        let changed = self.state().filters.clear();
        if !changed {
            return None;
        }
        Some(self.refetch().await)
    }

    pub async fn refetch(&self) -> FetchOutcome {
        let token = self.inner.fence.issue();
        let filters = {
            let mut state = self.state();
            state.loading = true;
            state.filters.clone()
        };

        let result = self.inner.store.list_tickets(&filters).await;

        let mut state = self.state();
        if !self.inner.fence.is_current(token) {
            tracing::debug!(token, "discarding stale ticket listing");
            return FetchOutcome::Stale;
        }
        state.loading = false;
        match result {
            Ok(tickets) => {
                tracing::debug!(token, count = tickets.len(), "ticket listing refreshed");
                state.tickets = tickets;
                FetchOutcome::Applied
            }
            Err(err) => {
                let err = AppError::Fetch(err.to_string());
                tracing::error!(error = %err, "failed to fetch tickets");
                FetchOutcome::Failed
            }
        }
    }

    pub async fn change_status(&self, id: u64, status: Status) -> StatusChange {
        let current = self
            .state()
            .tickets
            .iter()
            .find(|ticket| ticket.id == id)
            .map(|ticket| ticket.status);

        if let Some(current) = current {
            if current == status {
                return StatusChange::Unchanged;
            }
            if !self.inner.policy.allows(current, status) {
                tracing::warn!(id, from = %current, to = %status, "status transition not allowed");
                return StatusChange::Rejected {
                    from: current,
                    to: status,
                };
            }
        }

        match self.inner.store.update_ticket_status(id, status).await {
            Ok(ticket) => {
                tracing::info!(id, status = %status, "ticket status updated");
                self.refetch().await;
                self.inner
                    .refresh
                    .raise(RefreshOrigin::StatusChange, self.inner.source);
                StatusChange::Applied(ticket)
            }
            Err(err) => {
                let err = AppError::StatusUpdate(err.to_string());
                tracing::error!(id, error = %err, "failed to update ticket");
                StatusChange::Failed(err)
            }
        }
    }

    /// Refetches whenever another component raises the refresh signal.
    ///
    /// The channel only keeps the latest event, so an event of our own is
    /// skipped only when nothing else was raised since the last one handled.
    pub fn watch_refresh(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut receiver = self.inner.refresh.subscribe();
        let mut handled = receiver.borrow_and_update().generation;
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let event = *receiver.borrow_and_update();
                let only_own = event.source == controller.inner.source
                    && event.generation == handled + 1;
                handled = event.generation;
                if only_own {
                    continue;
                }
                controller.refetch().await;
            }
        })
    }
}
