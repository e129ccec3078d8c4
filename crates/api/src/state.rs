//! Application state shared across handlers.

use std::sync::Arc;

use catalog::{DealWebhook, LinkBuilder, Presentations, Templates, Versions};
use proposal_core::{Owner, Result};
use proposal_store::Store;
use telemetry::{HealthRegistry, Metrics};
use tracking::{Analytics, SessionTracker};

/// Shared application state.
///
/// Everything mutable lives behind the store handle; the services here
/// only hold `Arc`s to it and to the metrics registry.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tracker: SessionTracker,
    pub analytics: Analytics,
    pub presentations: Presentations,
    pub versions: Versions,
    pub templates: Templates,
    pub webhook: DealWebhook,
    pub metrics: Arc<Metrics>,
    pub health: Arc<HealthRegistry>,
}

impl AppState {
    /// Wires the services around `store` for presentations owned by `owner`.
    ///
    /// Fails if `frontend_url` is not a usable base URL.
    pub fn new(store: Arc<dyn Store>, owner: Owner, frontend_url: &str) -> Result<Self> {
        Self::with_metrics(store, owner, frontend_url, Arc::new(Metrics::new()))
    }

    pub fn with_metrics(
        store: Arc<dyn Store>,
        owner: Owner,
        frontend_url: &str,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let links = LinkBuilder::new(frontend_url)?;

        Ok(Self {
            tracker: SessionTracker::new(store.clone(), metrics.clone()),
            analytics: Analytics::new(store.clone(), metrics.clone()),
            presentations: Presentations::new(store.clone(), metrics.clone(), owner.id),
            versions: Versions::new(store.clone(), metrics.clone(), links.clone()),
            templates: Templates::new(store.clone()),
            webhook: DealWebhook::new(store.clone(), metrics.clone(), links, owner),
            store,
            metrics,
            health: Arc::new(HealthRegistry::new()),
        })
    }
}
