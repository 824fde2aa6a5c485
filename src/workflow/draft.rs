use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::ticket::{Category, ClassificationSuggestion, Priority, TicketDraft};

/// How a classifier suggestion is merged into the draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Always replace category and priority.
    #[default]
    Overwrite,
    /// Keep a field the user changed by hand after the request was sent.
    PreserveManualEdits,
}

impl MergePolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "overwrite" => Some(MergePolicy::Overwrite),
            "preserve" | "preserve-manual-edits" => Some(MergePolicy::PreserveManualEdits),
            _ => None,
        }
    }
}

/// Snapshot of the edit counters taken when a suggestion request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditMarks {
    epoch: u64,
    category_edits: u64,
    priority_edits: u64,
}

#[derive(Debug, Default)]
struct DraftState {
    draft: TicketDraft,
    ai_suggested: bool,
    // Bumped on every reset; suggestions aimed at an older draft are dropped.
    epoch: u64,
    category_edits: u64,
    priority_edits: u64,
}

/// The draft being composed, shared by the classifier and the submit path.
#[derive(Clone, Default)]
pub struct DraftSession {
    state: Arc<Mutex<DraftState>>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> TicketDraft {
        self.lock().draft.clone()
    }

    pub fn ai_suggested(&self) -> bool {
        self.lock().ai_suggested
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().draft.title = title.into();
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.lock().draft.description = description.into();
    }

    pub fn set_category(&self, category: Category) {
        let mut state = self.lock();
        state.draft.category = category;
        state.category_edits += 1;
        state.ai_suggested = false;
    }

    pub fn set_priority(&self, priority: Priority) {
        let mut state = self.lock();
        state.draft.priority = priority;
        state.priority_edits += 1;
        state.ai_suggested = false;
    }

    pub fn clear_ai_suggested(&self) {
        self.lock().ai_suggested = false;
    }

    /// Restores the default draft and invalidates outstanding suggestions.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.draft = TicketDraft::default();
        state.ai_suggested = false;
        state.epoch += 1;
    }

    pub fn edit_marks(&self) -> EditMarks {
        let state = self.lock();
        EditMarks {
            epoch: state.epoch,
            category_edits: state.category_edits,
            priority_edits: state.priority_edits,
        }
    }

    /// Merges `suggestion` under `policy`. Returns false when the draft was
    /// reset after `marks` were taken.
    pub fn apply_suggestion(
        &self,
        suggestion: ClassificationSuggestion,
        policy: MergePolicy,
        marks: EditMarks,
    ) -> bool {
        let mut state = self.lock();
        if state.epoch != marks.epoch {
            return false;
        }

        let keep_category = policy == MergePolicy::PreserveManualEdits
            && state.category_edits != marks.category_edits;
        let keep_priority = policy == MergePolicy::PreserveManualEdits
            && state.priority_edits != marks.priority_edits;

        if !keep_category {
            state.draft.category = suggestion.category;
        }
        if !keep_priority {
            state.draft.priority = suggestion.priority;
        }
        state.ai_suggested = true;
        true
    }
}
