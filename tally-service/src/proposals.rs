use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use tally_core::{
    compute_derived, DerivedFigures, PaymentDraft, PaymentEntry, PaymentKind, Proposal,
    ProposalDraft, ProposalStatus, ProposalUpdate, TallyResult,
};
use tally_ledger::LedgerStore;

use crate::locks::LockRegistry;
use crate::summary::{summarize, PortfolioSummary};

/// A proposal together with its derived figures, for list views.
#[derive(Clone, Debug, Serialize)]
pub struct ProposalView {
    pub proposal: Proposal,
    pub figures: DerivedFigures,
    pub status: ProposalStatus,
}

/// Full read model of one proposal: figures plus both ledgers.
#[derive(Clone, Debug, Serialize)]
pub struct ProposalDetail {
    pub proposal: Proposal,
    pub figures: DerivedFigures,
    pub status: ProposalStatus,
    pub client_payments: Vec<PaymentEntry>,
    pub commission_payments: Vec<PaymentEntry>,
}

/// The consistency service: sole writer of a proposal's paid totals.
///
/// Validation happens before any mutation, and every ledger mutation holds
/// the owning proposal's lock for the whole mutate-recompute-write unit so
/// concurrent adds cannot drop a total update.
pub struct ProposalService {
    store: Arc<dyn LedgerStore>,
    locks: LockRegistry,
}

impl ProposalService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: LockRegistry::default(),
        }
    }

    pub fn create(&self, draft: &ProposalDraft) -> TallyResult<Proposal> {
        draft.validate()?;
        let proposal = self.store.create_proposal(draft)?;
        info!(proposal_id = proposal.id, client = %proposal.client, "proposal created");
        Ok(proposal)
    }

    pub fn get(&self, id: i64) -> TallyResult<ProposalDetail> {
        let proposal = self.store.proposal(id)?;
        let figures = compute_derived(&proposal);
        Ok(ProposalDetail {
            client_payments: self.store.payments(id, PaymentKind::Client)?,
            commission_payments: self.store.payments(id, PaymentKind::Commission)?,
            status: figures.status(),
            proposal,
            figures,
        })
    }

    pub fn list(&self) -> TallyResult<Vec<ProposalView>> {
        let proposals = self.store.list_proposals()?;
        Ok(proposals
            .into_iter()
            .map(|proposal| {
                let figures = compute_derived(&proposal);
                ProposalView {
                    status: figures.status(),
                    proposal,
                    figures,
                }
            })
            .collect())
    }

    pub fn update(&self, id: i64, update: &ProposalUpdate) -> TallyResult<Proposal> {
        update.validate()?;
        if update.is_empty() {
            return self.store.proposal(id);
        }
        self.store.update_proposal(id, update)
    }

    pub fn delete(&self, id: i64) -> TallyResult<()> {
        let lock = self.locks.lock_for(id);
        let _guard = lock.lock();
        self.store.delete_proposal(id)?;
        self.locks.forget(id);
        info!(proposal_id = id, "proposal deleted");
        Ok(())
    }

    /// Records a payment. Fails fast on invalid input, then applies the
    /// insert and the paid-total write-back under the proposal's lock.
    pub fn add_payment(&self, draft: &PaymentDraft) -> TallyResult<PaymentEntry> {
        draft.validate()?;
        let lock = self.locks.lock_for(draft.proposal_id);
        let _guard = lock.lock();
        self.store.insert_payment(draft)
    }

    /// Removes a payment and re-derives the owning proposal's paid total
    /// from the remaining entries. Missing ids are reported, not ignored.
    pub fn delete_payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<()> {
        let entry = self.store.payment(entry_id, kind)?;
        let lock = self.locks.lock_for(entry.proposal_id);
        let _guard = lock.lock();
        self.store.delete_payment(entry_id, kind)
    }

    pub fn list_payments(&self, proposal_id: i64, kind: PaymentKind) -> TallyResult<Vec<PaymentEntry>> {
        self.store.payments(proposal_id, kind)
    }

    /// Portfolio-wide KPIs, folded on read from the persisted rows.
    pub fn summary(&self) -> TallyResult<PortfolioSummary> {
        Ok(summarize(&self.store.list_proposals()?))
    }
}
