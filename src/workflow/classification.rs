use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::ticket::ClassificationSuggestion;
use crate::error::AppError;
use crate::services::ClassifierService;
use crate::workflow::draft::{DraftSession, MergePolicy};
use crate::workflow::fence::Fence;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Descriptions at or below this many trimmed characters never schedule a request.
const SCHEDULE_THRESHOLD: usize = 20;
/// A fired request is skipped below this many trimmed characters.
const REQUEST_MIN_CHARS: usize = 10;

/// Whether a description is long enough to be worth classifying at all.
pub fn should_schedule(description: &str) -> bool {
    description.trim().chars().count() > SCHEDULE_THRESHOLD
}

#[derive(Debug)]
pub enum SuggestionOutcome {
    Skipped,
    Applied(ClassificationSuggestion),
    /// A newer request was sent, or the draft was reset, before this one resolved.
    Stale,
    Failed(AppError),
}

/// Watches the draft description and merges classifier suggestions into it.
#[derive(Clone)]
pub struct ClassificationCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    classifier: Arc<dyn ClassifierService>,
    draft: DraftSession,
    debounce: Duration,
    policy: MergePolicy,
    pending: Mutex<Option<PendingTimer>>,
    timers: AtomicU64,
    sequence: Fence,
    in_flight: watch::Sender<usize>,
}

struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

impl ClassificationCoordinator {
    pub fn new(
        classifier: Arc<dyn ClassifierService>,
        draft: DraftSession,
        debounce: Duration,
        policy: MergePolicy,
    ) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                classifier,
                draft,
                debounce,
                policy,
                pending: Mutex::new(None),
                timers: AtomicU64::new(0),
                sequence: Fence::default(),
                in_flight,
            }),
        }
    }

    pub fn draft(&self) -> &DraftSession {
        &self.inner.draft
    }

    pub fn is_classifying(&self) -> bool {
        *self.inner.in_flight.borrow() > 0
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingTimer>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an edit of the description and (re)arms the debounce timer.
    pub fn on_description_edited(&self, text: &str) {
        self.inner.draft.set_description(text);

        let mut pending = self.pending();
        if let Some(timer) = pending.take() {
            timer.handle.abort();
        }

        if !should_schedule(text) {
            return;
        }

        let id = self.inner.timers.fetch_add(1, Ordering::SeqCst) + 1;
        let coordinator = self.clone();
        let description = text.to_string();
        let delay = self.inner.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Once fired the request must run to completion, so leave the slot.
            coordinator.disarm(id);
            coordinator.request_suggestion(&description).await;
        });
        *pending = Some(PendingTimer { id, handle });
    }

    fn disarm(&self, id: u64) {
        let mut pending = self.pending();
        if pending.as_ref().is_some_and(|timer| timer.id == id) {
            pending.take();
        }
    }

    pub async fn request_suggestion(&self, description: &str) -> SuggestionOutcome {
        if description.trim().chars().count() < REQUEST_MIN_CHARS {
            return SuggestionOutcome::Skipped;
        }

        let sequence = self.inner.sequence.issue();
        let marks = self.inner.draft.edit_marks();
        self.inner.draft.clear_ai_suggested();
        self.inner.in_flight.send_modify(|count| *count += 1);
        tracing::debug!(sequence, "requesting classification");

        let result = self.inner.classifier.classify(description).await;
        self.inner.in_flight.send_modify(|count| *count -= 1);

        match result {
            Ok(suggestion) => {
                if !self.inner.sequence.is_current(sequence) {
                    tracing::debug!(sequence, "discarding superseded classification");
                    return SuggestionOutcome::Stale;
                }
                if !self
                    .inner
                    .draft
                    .apply_suggestion(suggestion, self.inner.policy, marks)
                {
                    tracing::debug!(sequence, "draft was reset; dropping classification");
                    return SuggestionOutcome::Stale;
                }
                tracing::info!(
                    category = %suggestion.category,
                    priority = %suggestion.priority,
                    "applied suggested classification"
                );
                SuggestionOutcome::Applied(suggestion)
            }
            Err(err) => {
                let err = AppError::Classification(err.to_string());
                tracing::warn!(error = %err, "classification failed; keeping current values");
                SuggestionOutcome::Failed(err)
            }
        }
    }

    /// Waits for the armed timer (if any) and every in-flight request.
    pub async fn settle(&self) {
        let timer = self.pending().take();
        if let Some(timer) = timer {
            let _ = timer.handle.await;
        }
        let mut in_flight = self.inner.in_flight.subscribe();
        let _ = in_flight.wait_for(|count| *count == 0).await;
    }
}
