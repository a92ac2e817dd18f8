use metrics_exporter_prometheus::PrometheusHandle;
use outcome_tracker::catalog::{Dataset, InMemoryOutcomeStore};
use outcome_tracker::error::AppError;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Hydrate an in-memory store from a JSON dataset, or start empty without one.
pub(crate) fn load_store(dataset: Option<&Path>) -> Result<InMemoryOutcomeStore, AppError> {
    match dataset {
        Some(path) => {
            let store = Dataset::load(path)?.into_store()?;
            info!(path = %path.display(), "outcome dataset loaded");
            Ok(store)
        }
        None => {
            warn!("no dataset configured; serving an empty outcome store");
            Ok(InMemoryOutcomeStore::new())
        }
    }
}
