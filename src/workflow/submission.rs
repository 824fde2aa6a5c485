use std::sync::Arc;

use crate::domain::ticket::{Ticket, TicketDraft};
use crate::error::{AppError, AppResult};
use crate::services::TicketStoreService;
use crate::workflow::draft::DraftSession;
use crate::workflow::refresh::{RefreshOrigin, RefreshSignal};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Title and Description are required.";
pub const FALLBACK_ACKNOWLEDGMENT: &str =
    "Thank you for reaching out. Our admin team will review your ticket shortly.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to create ticket. Please try again.";

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub ticket: Ticket,
    pub acknowledgment: String,
}

pub fn validate(draft: &TicketDraft) -> AppResult<()> {
    if draft.title.trim().is_empty() || draft.description.trim().is_empty() {
        return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
    }
    Ok(())
}

pub struct SubmissionPipeline {
    store: Arc<dyn TicketStoreService>,
    draft: DraftSession,
    refresh: RefreshSignal,
    source: u64,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn TicketStoreService>,
        draft: DraftSession,
        refresh: RefreshSignal,
    ) -> Self {
        let source = refresh.register();
        Self {
            store,
            draft,
            refresh,
            source,
        }
    }

    /// Validates and submits the current draft.
    ///
    /// The draft is reset only when the backend accepts the ticket; any error
    /// leaves it as it was so the user can correct and resubmit.
    pub async fn submit(&self) -> AppResult<SubmissionReceipt> {
        let draft = self.draft.snapshot();
        validate(&draft)?;

        let ticket = match self.store.create_ticket(&draft).await {
            Ok(ticket) => ticket,
            Err(err) => {
                tracing::warn!(error = %err, "ticket submission failed");
                let message = err
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                return Err(AppError::Submission(message));
            }
        };

        let acknowledgment = ticket
            .ai_response
            .clone()
            .filter(|response| !response.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ACKNOWLEDGMENT.to_string());

        self.draft.reset();
        self.refresh.raise(RefreshOrigin::Submission, self.source);
        tracing::info!(ticket_id = ticket.id, "ticket submitted");

        Ok(SubmissionReceipt {
            ticket,
            acknowledgment,
        })
    }
}
