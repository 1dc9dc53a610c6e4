use crate::config::Config;
use crate::repository::TableStore;
use crate::services::invoices::InvoiceExtractor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn TableStore>,
    /// Absent when no vision API key is configured
    pub extractor: Option<Arc<dyn InvoiceExtractor>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn TableStore>,
        extractor: Option<Arc<dyn InvoiceExtractor>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            extractor,
        }
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }
}
