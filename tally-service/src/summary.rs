use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::{compute_derived, Proposal};

/// Dashboard KPIs over the whole proposal book. Computed on read through
/// the one authoritative calculator, never cached.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub proposals: usize,
    pub total_contracted: Decimal,
    pub total_received: Decimal,
    pub total_outstanding: Decimal,
    pub total_commission: Decimal,
    pub commission_paid: Decimal,
    pub commission_outstanding: Decimal,
    pub partners: BTreeMap<i64, PartnerSummary>,
}

/// Per-partner slice of the portfolio figures.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PartnerSummary {
    pub proposals: usize,
    pub total_commission: Decimal,
    pub commission_paid: Decimal,
    pub commission_outstanding: Decimal,
}

pub fn summarize(proposals: &[Proposal]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    for proposal in proposals {
        let figures = compute_derived(proposal);
        summary.proposals += 1;
        summary.total_contracted += proposal.total_value;
        summary.total_received += proposal.amount_paid;
        summary.total_outstanding += figures.open_balance;
        summary.total_commission += figures.total_commission;
        summary.commission_paid += proposal.commission_paid;
        summary.commission_outstanding += figures.open_commission;

        let partner = summary.partners.entry(proposal.partner_id).or_default();
        partner.proposals += 1;
        partner.total_commission += figures.total_commission;
        partner.commission_paid += proposal.commission_paid;
        partner.commission_outstanding += figures.open_commission;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn proposal(id: i64, partner_id: i64, total: Decimal, paid: Decimal) -> Proposal {
        Proposal {
            id,
            partner_id,
            client: format!("client-{id}"),
            service_type_id: 1,
            signed_on: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            total_value: total,
            commission_percent: dec!(10),
            amount_paid: paid,
            commission_paid: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn folds_portfolio_and_partner_figures() {
        let book = vec![
            proposal(1, 1, dec!(1000), dec!(400)),
            proposal(2, 1, dec!(2000), dec!(2000)),
            proposal(3, 2, dec!(500), dec!(0)),
        ];
        let summary = summarize(&book);
        assert_eq!(summary.proposals, 3);
        assert_eq!(summary.total_contracted, dec!(3500));
        assert_eq!(summary.total_received, dec!(2400));
        assert_eq!(summary.total_outstanding, dec!(1100));
        assert_eq!(summary.total_commission, dec!(350));
        assert_eq!(summary.commission_outstanding, dec!(350));

        assert_eq!(summary.partners.len(), 2);
        assert_eq!(summary.partners[&1].proposals, 2);
        assert_eq!(summary.partners[&1].total_commission, dec!(300));
        assert_eq!(summary.partners[&2].total_commission, dec!(50));
    }

    #[test]
    fn empty_book_sums_to_zero() {
        assert_eq!(summarize(&[]), PortfolioSummary::default());
    }
}
