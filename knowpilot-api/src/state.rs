//! Shared application state for Axum routers.

use std::sync::Arc;

use knowpilot_core::KnowPilotConfig;
use knowpilot_llm::GenerationProvider;
use knowpilot_storage::ContentStorage;

use crate::services::{EnrichmentService, GroupingService};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ContentStorage>,
    pub provider: Arc<dyn GenerationProvider>,
    pub enrichment: EnrichmentService,
    pub grouping: GroupingService,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the services over one storage backend and one provider.
    pub fn new(
        storage: Arc<dyn ContentStorage>,
        provider: Arc<dyn GenerationProvider>,
        config: Arc<KnowPilotConfig>,
    ) -> Self {
        Self {
            enrichment: EnrichmentService::new(storage.clone(), provider.clone(), config.clone()),
            grouping: GroupingService::new(storage.clone(), provider.clone(), config),
            storage,
            provider,
            start_time: std::time::Instant::now(),
        }
    }

    /// Use a deterministic slot picker for group questions.
    pub fn with_grouping_seed(mut self, seed: u64) -> Self {
        self.grouping = self.grouping.with_seed(seed);
        self
    }
}

crate::impl_from_ref!(EnrichmentService, enrichment);
crate::impl_from_ref!(GroupingService, grouping);
crate::impl_from_ref!(Arc<dyn ContentStorage>, storage);
crate::impl_from_ref!(Arc<dyn GenerationProvider>, provider);
crate::impl_from_ref!(std::time::Instant, start_time);
