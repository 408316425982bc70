use tally_core::{
    Partner, PartnerDraft, PartnerUpdate, PaymentDraft, PaymentEntry, PaymentKind, Proposal,
    ProposalDraft, ProposalUpdate, ServiceType, TallyResult,
};

/// Abstraction over durable Tally storage engines.
///
/// Every ledger mutation (`insert_payment`, `delete_payment`) is applied
/// atomically together with the write-back of the owning proposal's paid
/// total; a partially applied mutation must never be observable.
pub trait LedgerStore: Send + Sync {
    // Proposals. Paid totals are ledger-controlled: `update_proposal` only
    // ever touches base and descriptive fields.
    fn create_proposal(&self, draft: &ProposalDraft) -> TallyResult<Proposal>;
    fn proposal(&self, id: i64) -> TallyResult<Proposal>;
    fn list_proposals(&self) -> TallyResult<Vec<Proposal>>;
    fn update_proposal(&self, id: i64, update: &ProposalUpdate) -> TallyResult<Proposal>;
    /// Removes the proposal and cascades into both of its ledgers.
    fn delete_proposal(&self, id: i64) -> TallyResult<()>;

    // Payment ledgers.
    fn insert_payment(&self, draft: &PaymentDraft) -> TallyResult<PaymentEntry>;
    fn delete_payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<()>;
    fn payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<PaymentEntry>;
    /// Entries ordered by payment date ascending, ties broken by id.
    fn payments(&self, proposal_id: i64, kind: PaymentKind) -> TallyResult<Vec<PaymentEntry>>;

    // Partners.
    fn create_partner(&self, draft: &PartnerDraft) -> TallyResult<Partner>;
    fn partner(&self, id: i64) -> TallyResult<Partner>;
    fn list_partners(&self) -> TallyResult<Vec<Partner>>;
    fn update_partner(&self, id: i64, update: &PartnerUpdate) -> TallyResult<Partner>;
    /// Refused while any proposal still references the partner.
    fn delete_partner(&self, id: i64) -> TallyResult<()>;

    // Service-type catalog.
    fn add_service_type(&self, name: &str) -> TallyResult<ServiceType>;
    /// Refused while any proposal still references the type.
    fn remove_service_type(&self, id: i64) -> TallyResult<()>;
    fn service_types(&self) -> TallyResult<Vec<ServiceType>>;
}
