//! The single authoritative implementation of the ledger aggregation and the
//! derived-figure calculator. Storage backends and presentation layers all
//! call into here; derived values are never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PaymentEntry, Proposal, ProposalStatus};

/// Exact decimal sum of a ledger's entry amounts. Zero for an empty ledger.
pub fn sum_entries(entries: &[PaymentEntry]) -> Decimal {
    entries.iter().map(|entry| entry.amount).sum()
}

/// Presentation-ready figures computed from a proposal's four numeric fields.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedFigures {
    pub open_balance: Decimal,
    pub total_commission: Decimal,
    pub open_commission: Decimal,
    pub percent_commission_paid: Decimal,
}

impl DerivedFigures {
    /// Settled once nothing remains open on either side. Negative open values
    /// (overpayment) still count as settled.
    pub fn status(&self) -> ProposalStatus {
        if self.open_balance <= Decimal::ZERO && self.open_commission <= Decimal::ZERO {
            ProposalStatus::Settled
        } else {
            ProposalStatus::Open
        }
    }
}

/// Pure, total mapping from base fields and paid totals to derived figures.
///
/// Overpayment is surfaced, not clamped: a negative open balance or a
/// percent above 100 tells the caller more was received than contracted.
pub fn compute_derived(proposal: &Proposal) -> DerivedFigures {
    let total_commission =
        proposal.total_value * proposal.commission_percent / Decimal::ONE_HUNDRED;
    let percent_commission_paid = if total_commission > Decimal::ZERO {
        proposal.commission_paid / total_commission * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    DerivedFigures {
        open_balance: proposal.total_value - proposal.amount_paid,
        total_commission,
        open_commission: total_commission - proposal.commission_paid,
        percent_commission_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PaymentKind;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn proposal(
        total_value: Decimal,
        commission_percent: Decimal,
        amount_paid: Decimal,
        commission_paid: Decimal,
    ) -> Proposal {
        Proposal {
            id: 1,
            partner_id: 1,
            client: "Acme Ltda".into(),
            service_type_id: 1,
            signed_on: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            total_value,
            commission_percent,
            amount_paid,
            commission_paid,
            created_at: Utc::now(),
        }
    }

    fn entry(id: i64, amount: Decimal) -> PaymentEntry {
        PaymentEntry {
            id,
            proposal_id: 1,
            kind: PaymentKind::Client,
            amount,
            paid_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            note: None,
        }
    }

    #[test]
    fn sums_exactly_without_float_drift() {
        // 1000 x 0.10 would drift in binary floats; Decimal must not.
        let entries: Vec<_> = (0..1000).map(|i| entry(i, dec!(0.10))).collect();
        assert_eq!(sum_entries(&entries), dec!(100.00));
        assert_eq!(sum_entries(&[]), Decimal::ZERO);
    }

    #[test]
    fn standard_case() {
        let figures = compute_derived(&proposal(dec!(24500), dec!(10), dec!(12250), dec!(1225)));
        assert_eq!(figures.open_balance, dec!(12250));
        assert_eq!(figures.total_commission, dec!(2450));
        assert_eq!(figures.open_commission, dec!(1225));
        assert_eq!(figures.percent_commission_paid, dec!(50));
        assert_eq!(figures.status(), ProposalStatus::Open);
    }

    #[test]
    fn zero_commission_guards_the_division() {
        let figures = compute_derived(&proposal(dec!(1000), dec!(0), dec!(500), dec!(0)));
        assert_eq!(figures.open_balance, dec!(500));
        assert_eq!(figures.total_commission, Decimal::ZERO);
        assert_eq!(figures.open_commission, Decimal::ZERO);
        assert_eq!(figures.percent_commission_paid, Decimal::ZERO);
    }

    #[test]
    fn zero_total_surfaces_overpayment() {
        let figures = compute_derived(&proposal(dec!(0), dec!(5), dec!(120), dec!(0)));
        assert_eq!(figures.open_balance, dec!(-120));
    }

    #[test]
    fn commission_overpayment_exceeds_hundred_percent() {
        let figures = compute_derived(&proposal(dec!(1000), dec!(10), dec!(0), dec!(150)));
        assert_eq!(figures.open_commission, dec!(-50));
        assert_eq!(figures.percent_commission_paid, dec!(150));
    }

    #[test]
    fn computation_is_pure() {
        let p = proposal(dec!(24500), dec!(10), dec!(12250), dec!(1225));
        assert_eq!(compute_derived(&p), compute_derived(&p));
    }
}
