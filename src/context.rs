use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{ClassifierService, TicketStoreService};
use crate::workflow::classification::ClassificationCoordinator;
use crate::workflow::draft::DraftSession;
use crate::workflow::listing::TicketListController;
use crate::workflow::refresh::RefreshSignal;
use crate::workflow::stats::StatsAggregator;
use crate::workflow::submission::SubmissionPipeline;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub classifier: Arc<dyn ClassifierService>,
    pub ticket_store: Arc<dyn TicketStoreService>,
    pub refresh: RefreshSignal,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        classifier: Arc<dyn ClassifierService>,
        ticket_store: Arc<dyn TicketStoreService>,
    ) -> Self {
        Self {
            config,
            classifier,
            ticket_store,
            refresh: RefreshSignal::new(),
        }
    }

    pub fn coordinator(&self, draft: DraftSession) -> ClassificationCoordinator {
        ClassificationCoordinator::new(
            self.classifier.clone(),
            draft,
            self.config.debounce,
            self.config.merge_policy,
        )
    }

    pub fn submission(&self, draft: DraftSession) -> SubmissionPipeline {
        SubmissionPipeline::new(self.ticket_store.clone(), draft, self.refresh.clone())
    }

    pub fn ticket_list(&self) -> TicketListController {
        TicketListController::new(
            self.ticket_store.clone(),
            self.refresh.clone(),
            self.config.transition_policy,
        )
    }

    pub fn stats(&self) -> StatsAggregator {
        StatsAggregator::new(self.ticket_store.clone(), self.refresh.clone())
    }
}
