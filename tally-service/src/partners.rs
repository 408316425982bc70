use std::sync::Arc;

use tracing::info;

use tally_core::{Partner, PartnerDraft, PartnerUpdate, TallyResult};
use tally_ledger::LedgerStore;

/// CRUD over partner records. Deleting a partner that still owns proposals
/// is refused by the store.
pub struct PartnerService {
    store: Arc<dyn LedgerStore>,
}

impl PartnerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: &PartnerDraft) -> TallyResult<Partner> {
        draft.validate()?;
        let partner = self.store.create_partner(draft)?;
        info!(partner_id = partner.id, name = %partner.name, "partner created");
        Ok(partner)
    }

    pub fn get(&self, id: i64) -> TallyResult<Partner> {
        self.store.partner(id)
    }

    pub fn list(&self) -> TallyResult<Vec<Partner>> {
        self.store.list_partners()
    }

    pub fn update(&self, id: i64, update: &PartnerUpdate) -> TallyResult<Partner> {
        update.validate()?;
        self.store.update_partner(id, update)
    }

    pub fn delete(&self, id: i64) -> TallyResult<()> {
        self.store.delete_partner(id)?;
        info!(partner_id = id, "partner deleted");
        Ok(())
    }
}
