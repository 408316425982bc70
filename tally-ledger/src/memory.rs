use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use tally_core::{
    sum_entries, Partner, PartnerDraft, PartnerUpdate, PaymentDraft, PaymentEntry, PaymentKind,
    Proposal, ProposalDraft, ProposalUpdate, ServiceType, TallyError, TallyResult,
};

use crate::LedgerStore;

/// In-memory store used by tests and demos. One write lock spans every
/// mutation, so the insert-plus-write-back unit is atomic here the same way
/// a transaction makes it atomic in the SQLite backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    partners: BTreeMap<i64, Partner>,
    service_types: BTreeMap<i64, ServiceType>,
    proposals: BTreeMap<i64, Proposal>,
    payments: BTreeMap<i64, PaymentEntry>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn proposal(&self, id: i64) -> TallyResult<&Proposal> {
        self.proposals
            .get(&id)
            .ok_or(TallyError::NotFound {
                entity: "proposal",
                id,
            })
    }

    fn ledger(&self, proposal_id: i64, kind: PaymentKind) -> Vec<PaymentEntry> {
        let mut entries: Vec<_> = self
            .payments
            .values()
            .filter(|entry| entry.proposal_id == proposal_id && entry.kind == kind)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.paid_on, entry.id));
        entries
    }

    fn verify_ledger(&self, proposal_id: i64, kind: PaymentKind) -> TallyResult<()> {
        let proposal = self.proposal(proposal_id)?;
        let stored = match kind {
            PaymentKind::Client => proposal.amount_paid,
            PaymentKind::Commission => proposal.commission_paid,
        };
        let ledger_sum = sum_entries(&self.ledger(proposal_id, kind));
        if stored != ledger_sum {
            return Err(TallyError::Consistency(format!(
                "proposal {proposal_id} {kind} total is {stored} but its ledger sums to {ledger_sum}"
            )));
        }
        Ok(())
    }

    fn write_paid_total(&mut self, proposal_id: i64, kind: PaymentKind, total: Decimal) {
        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            match kind {
                PaymentKind::Client => proposal.amount_paid = total,
                PaymentKind::Commission => proposal.commission_paid = total,
            }
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn create_proposal(&self, draft: &ProposalDraft) -> TallyResult<Proposal> {
        draft.validate()?;
        let mut inner = self.inner.write();
        if !inner.partners.contains_key(&draft.partner_id) {
            return Err(TallyError::not_found("partner", draft.partner_id));
        }
        if !inner.service_types.contains_key(&draft.service_type_id) {
            return Err(TallyError::not_found("service type", draft.service_type_id));
        }
        let id = inner.next_id();
        let proposal = Proposal {
            id,
            partner_id: draft.partner_id,
            client: draft.client.clone(),
            service_type_id: draft.service_type_id,
            signed_on: draft.signed_on,
            total_value: draft.total_value,
            commission_percent: draft.commission_percent,
            amount_paid: Decimal::ZERO,
            commission_paid: Decimal::ZERO,
            created_at: Utc::now(),
        };
        inner.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    fn proposal(&self, id: i64) -> TallyResult<Proposal> {
        self.inner.read().proposal(id).cloned()
    }

    fn list_proposals(&self) -> TallyResult<Vec<Proposal>> {
        Ok(self.inner.read().proposals.values().cloned().collect())
    }

    fn update_proposal(&self, id: i64, update: &ProposalUpdate) -> TallyResult<Proposal> {
        update.validate()?;
        let mut inner = self.inner.write();
        if let Some(partner_id) = update.partner_id {
            if !inner.partners.contains_key(&partner_id) {
                return Err(TallyError::not_found("partner", partner_id));
            }
        }
        if let Some(service_type_id) = update.service_type_id {
            if !inner.service_types.contains_key(&service_type_id) {
                return Err(TallyError::not_found("service type", service_type_id));
            }
        }
        let proposal = inner.proposals.get_mut(&id).ok_or(TallyError::NotFound {
            entity: "proposal",
            id,
        })?;
        if let Some(partner_id) = update.partner_id {
            proposal.partner_id = partner_id;
        }
        if let Some(client) = &update.client {
            proposal.client = client.clone();
        }
        if let Some(service_type_id) = update.service_type_id {
            proposal.service_type_id = service_type_id;
        }
        if let Some(signed_on) = update.signed_on {
            proposal.signed_on = signed_on;
        }
        if let Some(total_value) = update.total_value {
            proposal.total_value = total_value;
        }
        if let Some(percent) = update.commission_percent {
            proposal.commission_percent = percent;
        }
        Ok(proposal.clone())
    }

    fn delete_proposal(&self, id: i64) -> TallyResult<()> {
        let mut inner = self.inner.write();
        if inner.proposals.remove(&id).is_none() {
            return Err(TallyError::not_found("proposal", id));
        }
        inner.payments.retain(|_, entry| entry.proposal_id != id);
        Ok(())
    }

    fn insert_payment(&self, draft: &PaymentDraft) -> TallyResult<PaymentEntry> {
        draft.validate()?;
        let mut inner = self.inner.write();
        inner.proposal(draft.proposal_id)?;
        inner.verify_ledger(draft.proposal_id, draft.kind)?;
        let id = inner.next_id();
        let entry = PaymentEntry {
            id,
            proposal_id: draft.proposal_id,
            kind: draft.kind,
            amount: draft.amount,
            paid_on: draft.paid_on,
            note: draft.note.clone(),
        };
        inner.payments.insert(id, entry.clone());
        let total = sum_entries(&inner.ledger(draft.proposal_id, draft.kind));
        inner.write_paid_total(draft.proposal_id, draft.kind, total);
        Ok(entry)
    }

    fn delete_payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<()> {
        let mut inner = self.inner.write();
        let proposal_id = match inner.payments.get(&entry_id) {
            Some(entry) if entry.kind == kind => entry.proposal_id,
            _ => return Err(TallyError::not_found("payment", entry_id)),
        };
        inner.verify_ledger(proposal_id, kind)?;
        inner.payments.remove(&entry_id);
        let total = sum_entries(&inner.ledger(proposal_id, kind));
        inner.write_paid_total(proposal_id, kind, total);
        Ok(())
    }

    fn payment(&self, entry_id: i64, kind: PaymentKind) -> TallyResult<PaymentEntry> {
        let inner = self.inner.read();
        match inner.payments.get(&entry_id) {
            Some(entry) if entry.kind == kind => Ok(entry.clone()),
            _ => Err(TallyError::not_found("payment", entry_id)),
        }
    }

    fn payments(&self, proposal_id: i64, kind: PaymentKind) -> TallyResult<Vec<PaymentEntry>> {
        let inner = self.inner.read();
        inner.proposal(proposal_id)?;
        Ok(inner.ledger(proposal_id, kind))
    }

    fn create_partner(&self, draft: &PartnerDraft) -> TallyResult<Partner> {
        draft.validate()?;
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let partner = Partner {
            id,
            name: draft.name.clone(),
            company: draft.company.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
        };
        inner.partners.insert(id, partner.clone());
        Ok(partner)
    }

    fn partner(&self, id: i64) -> TallyResult<Partner> {
        self.inner
            .read()
            .partners
            .get(&id)
            .cloned()
            .ok_or(TallyError::NotFound {
                entity: "partner",
                id,
            })
    }

    fn list_partners(&self) -> TallyResult<Vec<Partner>> {
        Ok(self.inner.read().partners.values().cloned().collect())
    }

    fn update_partner(&self, id: i64, update: &PartnerUpdate) -> TallyResult<Partner> {
        update.validate()?;
        let mut inner = self.inner.write();
        let partner = inner.partners.get_mut(&id).ok_or(TallyError::NotFound {
            entity: "partner",
            id,
        })?;
        if let Some(name) = &update.name {
            partner.name = name.clone();
        }
        if update.company.is_some() {
            partner.company = update.company.clone();
        }
        if update.email.is_some() {
            partner.email = update.email.clone();
        }
        if update.phone.is_some() {
            partner.phone = update.phone.clone();
        }
        Ok(partner.clone())
    }

    fn delete_partner(&self, id: i64) -> TallyResult<()> {
        let mut inner = self.inner.write();
        if !inner.partners.contains_key(&id) {
            return Err(TallyError::not_found("partner", id));
        }
        let referenced = inner
            .proposals
            .values()
            .filter(|p| p.partner_id == id)
            .count();
        if referenced > 0 {
            return Err(TallyError::invalid(format!(
                "partner {id} still has {referenced} proposal(s)"
            )));
        }
        inner.partners.remove(&id);
        Ok(())
    }

    fn add_service_type(&self, name: &str) -> TallyResult<ServiceType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::invalid("service type name must not be empty"));
        }
        let mut inner = self.inner.write();
        if inner.service_types.values().any(|t| t.name == name) {
            return Err(TallyError::invalid(format!(
                "service type '{name}' already exists"
            )));
        }
        let id = inner.next_id();
        let service_type = ServiceType {
            id,
            name: name.to_string(),
        };
        inner.service_types.insert(id, service_type.clone());
        Ok(service_type)
    }

    fn remove_service_type(&self, id: i64) -> TallyResult<()> {
        let mut inner = self.inner.write();
        if !inner.service_types.contains_key(&id) {
            return Err(TallyError::not_found("service type", id));
        }
        let referenced = inner
            .proposals
            .values()
            .filter(|p| p.service_type_id == id)
            .count();
        if referenced > 0 {
            return Err(TallyError::invalid(format!(
                "service type {id} still has {referenced} proposal(s)"
            )));
        }
        inner.service_types.remove(&id);
        Ok(())
    }

    fn service_types(&self) -> TallyResult<Vec<ServiceType>> {
        Ok(self.inner.read().service_types.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn seeded() -> (MemoryStore, Proposal) {
        let store = MemoryStore::new();
        let partner = store.create_partner(&PartnerDraft::new("Ana Souza")).unwrap();
        let service = store.add_service_type("consulting").unwrap();
        let proposal = store
            .create_proposal(&ProposalDraft {
                partner_id: partner.id,
                client: "Acme Ltda".into(),
                service_type_id: service.id,
                signed_on: date("2024-02-10"),
                total_value: dec!(24500),
                commission_percent: dec!(10),
            })
            .unwrap();
        (store, proposal)
    }

    #[test]
    fn mirrors_sqlite_add_and_delete_semantics() {
        let (store, proposal) = seeded();
        let first = store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(100),
                date("2024-03-01"),
            ))
            .unwrap();
        store
            .insert_payment(&PaymentDraft::new(
                proposal.id,
                PaymentKind::Client,
                dec!(50),
                date("2024-03-15"),
            ))
            .unwrap();
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, dec!(150));

        store.delete_payment(first.id, PaymentKind::Client).unwrap();
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, dec!(50));
        assert!(matches!(
            store.delete_payment(first.id, PaymentKind::Client),
            Err(TallyError::NotFound { .. })
        ));
    }

    #[test]
    fn rejected_payment_leaves_state_untouched() {
        let (store, proposal) = seeded();
        for amount in [Decimal::ZERO, dec!(-5)] {
            let err = store
                .insert_payment(&PaymentDraft::new(
                    proposal.id,
                    PaymentKind::Client,
                    amount,
                    date("2024-03-01"),
                ))
                .unwrap_err();
            assert!(matches!(err, TallyError::InvalidArgument(_)));
        }
        assert!(store.payments(proposal.id, PaymentKind::Client).unwrap().is_empty());
        assert_eq!(store.proposal(proposal.id).unwrap().amount_paid, Decimal::ZERO);
    }

    #[test]
    fn missing_proposal_is_not_found() {
        let (store, _) = seeded();
        let err = store
            .insert_payment(&PaymentDraft::new(
                9999,
                PaymentKind::Client,
                dec!(10),
                date("2024-03-01"),
            ))
            .unwrap_err();
        assert!(matches!(err, TallyError::NotFound { .. }));
    }
}
