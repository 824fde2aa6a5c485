//! In-memory service doubles shared by the workflow tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::filter::FilterCriteria;
use crate::domain::stats::StatsSnapshot;
use crate::domain::ticket::{
    Category, ClassificationSuggestion, Priority, Status, Ticket, TicketDraft,
};
use crate::error::{AppError, AppResult};
use crate::services::{ClassifierService, TicketStoreService};
use crate::workflow::classification::DEFAULT_DEBOUNCE;
use crate::workflow::draft::MergePolicy;
use crate::workflow::listing::TransitionPolicy;

pub fn ticket(id: u64, status: Status) -> Ticket {
    Ticket {
        id,
        title: format!("Ticket {id}"),
        description: "Something is not working as expected.".to_string(),
        category: Category::Technical,
        priority: Priority::Medium,
        status,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ai_response: None,
    }
}

pub fn suggestion(category: Category, priority: Priority) -> ClassificationSuggestion {
    ClassificationSuggestion { category, priority }
}

/// Context wired to the given doubles with default policies.
pub fn context(classifier: Arc<FakeClassifier>, store: Arc<FakeTicketStore>) -> AppContext {
    let config = AppConfig {
        api_base_url: "http://localhost:8000".to_string(),
        access_token: None,
        log_level: "warn".to_string(),
        debounce: DEFAULT_DEBOUNCE,
        merge_policy: MergePolicy::Overwrite,
        transition_policy: TransitionPolicy::Unconstrained,
    };
    AppContext::new(config, classifier, store)
}

#[derive(Default)]
pub struct FakeClassifier {
    pub calls: Mutex<Vec<String>>,
    default: Option<ClassificationSuggestion>,
    delay: Duration,
    scripted: HashMap<String, (Duration, ClassificationSuggestion)>,
}

impl FakeClassifier {
    pub fn answering(suggestion: ClassificationSuggestion) -> Self {
        Self {
            default: Some(suggestion),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answers `description` with `suggestion` after `delay`.
    pub fn script(
        mut self,
        description: &str,
        delay: Duration,
        suggestion: ClassificationSuggestion,
    ) -> Self {
        self.scripted
            .insert(description.to_string(), (delay, suggestion));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClassifierService for FakeClassifier {
    async fn classify(&self, description: &str) -> AppResult<ClassificationSuggestion> {
        self.calls.lock().unwrap().push(description.to_string());
        let (delay, answer) = match self.scripted.get(description) {
            Some((delay, suggestion)) => (*delay, Some(*suggestion)),
            None => (self.delay, self.default),
        };
        tokio::time::sleep(delay).await;
        answer.ok_or_else(|| AppError::Transport("classifier unavailable".to_string()))
    }
}

#[derive(Default)]
pub struct FakeTicketStore {
    pub tickets: Mutex<Vec<Ticket>>,
    pub created: Mutex<Vec<TicketDraft>>,
    pub list_calls: Mutex<Vec<FilterCriteria>>,
    pub update_calls: Mutex<Vec<(u64, Status)>>,
    pub stats_calls: Mutex<usize>,
    pub list_delays: Mutex<VecDeque<Duration>>,
    pub stats_delays: Mutex<VecDeque<Duration>>,
    pub stats_snapshots: Mutex<VecDeque<StatsSnapshot>>,
    pub create_error: Mutex<Option<AppError>>,
    pub ai_response: Option<String>,
    pub fail_list: Mutex<bool>,
    pub fail_update: bool,
    pub fail_stats: Mutex<bool>,
}

impl FakeTicketStore {
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets: Mutex::new(tickets),
            ..Self::default()
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn update_call_count(&self) -> usize {
        self.update_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TicketStoreService for FakeTicketStore {
    async fn create_ticket(&self, draft: &TicketDraft) -> AppResult<Ticket> {
        self.created.lock().unwrap().push(draft.clone());
        if let Some(error) = self.create_error.lock().unwrap().take() {
            return Err(error);
        }
        let mut tickets = self.tickets.lock().unwrap();
        let mut created = ticket(tickets.len() as u64 + 1, Status::Open);
        created.title = draft.title.clone();
        created.description = draft.description.clone();
        created.category = draft.category;
        created.priority = draft.priority;
        created.ai_response = self.ai_response.clone();
        tickets.push(created.clone());
        Ok(created)
    }

    async fn list_tickets(&self, filters: &FilterCriteria) -> AppResult<Vec<Ticket>> {
        self.list_calls.lock().unwrap().push(filters.clone());
        let delay = self.list_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_list.lock().unwrap() {
            return Err(AppError::Transport("connection refused".to_string()));
        }
        let tickets = self.tickets.lock().unwrap();
        Ok(tickets
            .iter()
            .filter(|ticket| filters.category.is_none_or(|c| ticket.category == c))
            .filter(|ticket| filters.priority.is_none_or(|p| ticket.priority == p))
            .filter(|ticket| filters.status.is_none_or(|s| ticket.status == s))
            .filter(|ticket| {
                filters.search.as_deref().is_none_or(|needle| {
                    ticket.title.contains(needle) || ticket.description.contains(needle)
                })
            })
            .cloned()
            .collect())
    }

    async fn update_ticket_status(&self, id: u64, status: Status) -> AppResult<Ticket> {
        self.update_calls.lock().unwrap().push((id, status));
        if self.fail_update {
            return Err(AppError::Backend {
                status: 500,
                detail: None,
            });
        }
        let mut tickets = self.tickets.lock().unwrap();
        let ticket = tickets
            .iter_mut()
            .find(|ticket| ticket.id == id)
            .ok_or(AppError::Backend {
                status: 404,
                detail: Some("Not found.".to_string()),
            })?;
        ticket.status = status;
        Ok(ticket.clone())
    }

    async fn stats(&self) -> AppResult<StatsSnapshot> {
        *self.stats_calls.lock().unwrap() += 1;
        let scripted = self.stats_snapshots.lock().unwrap().pop_front();
        let delay = self.stats_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_stats.lock().unwrap() {
            return Err(AppError::Transport("connection reset".to_string()));
        }
        if let Some(snapshot) = scripted {
            return Ok(snapshot);
        }
        let tickets = self.tickets.lock().unwrap();
        let mut snapshot = StatsSnapshot {
            total_tickets: tickets.len() as u64,
            open_tickets: tickets
                .iter()
                .filter(|ticket| ticket.status == Status::Open)
                .count() as u64,
            avg_tickets_per_day: tickets.len() as f64,
            priority_breakdown: Default::default(),
            category_breakdown: Default::default(),
        };
        for ticket in tickets.iter() {
            *snapshot.priority_breakdown.entry(ticket.priority).or_default() += 1;
            *snapshot.category_breakdown.entry(ticket.category).or_default() += 1;
        }
        Ok(snapshot)
    }
}
