use async_trait::async_trait;

use crate::domain::filter::FilterCriteria;
use crate::domain::stats::StatsSnapshot;
use crate::domain::ticket::{Status, Ticket, TicketDraft};
use crate::error::AppResult;

#[async_trait]
pub trait TicketStoreService: Send + Sync {
    async fn create_ticket(&self, draft: &TicketDraft) -> AppResult<Ticket>;
    async fn list_tickets(&self, filters: &FilterCriteria) -> AppResult<Vec<Ticket>>;
    async fn update_ticket_status(&self, id: u64, status: Status) -> AppResult<Ticket>;
    async fn stats(&self) -> AppResult<StatsSnapshot>;
}
