use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out increasing tokens so late responses can be recognised as stale.
#[derive(Debug, Default)]
pub struct Fence {
    latest: AtomicU64,
}

impl Fence {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

/// Result of a fenced fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
    Failed,
}
