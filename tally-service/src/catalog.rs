use std::sync::Arc;

use tally_core::{ServiceType, TallyResult};
use tally_ledger::LedgerStore;

/// The service-type catalog: a persisted, id-addressed set mutated only
/// through explicit add/remove. Both mutations hand back the new canonical
/// set so callers never hold a stale copy.
pub struct CatalogService {
    store: Arc<dyn LedgerStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn add(&self, name: &str) -> TallyResult<Vec<ServiceType>> {
        self.store.add_service_type(name)?;
        self.store.service_types()
    }

    pub fn remove(&self, id: i64) -> TallyResult<Vec<ServiceType>> {
        self.store.remove_service_type(id)?;
        self.store.service_types()
    }

    pub fn list(&self) -> TallyResult<Vec<ServiceType>> {
        self.store.service_types()
    }
}
