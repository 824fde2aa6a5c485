use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    Startup,
    Submission,
    StatusChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshEvent {
    pub generation: u64,
    pub origin: RefreshOrigin,
    /// Component that raised the event, as handed out by [`RefreshSignal::register`].
    pub source: u64,
}

/// Session-wide "something changed, reload" broadcast.
#[derive(Clone)]
pub struct RefreshSignal {
    sender: Arc<watch::Sender<RefreshEvent>>,
    next_source: Arc<AtomicU64>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(RefreshEvent {
            generation: 0,
            origin: RefreshOrigin::Startup,
            source: 0,
        });
        Self {
            sender: Arc::new(sender),
            next_source: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn register(&self) -> u64 {
        self.next_source.fetch_add(1, Ordering::SeqCst)
    }

    pub fn raise(&self, origin: RefreshOrigin, source: u64) -> u64 {
        let mut generation = 0;
        self.sender.send_modify(|event| {
            event.generation += 1;
            event.origin = origin;
            event.source = source;
            generation = event.generation;
        });
        tracing::debug!(generation, ?origin, source, "refresh signal raised");
        generation
    }

    pub fn current(&self) -> RefreshEvent {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshEvent> {
        self.sender.subscribe()
    }
}
