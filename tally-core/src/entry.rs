use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{TallyError, TallyResult};

/// One recorded money movement against a proposal.
///
/// Entries are immutable once created; fixing an amount is modeled as
/// delete-then-add by callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub id: i64,
    pub proposal_id: i64,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
}

/// Selects which of a proposal's two ledgers an entry belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Client,
    Commission,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Client => "client",
            PaymentKind::Commission => "commission",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(PaymentKind::Client),
            "commission" => Ok(PaymentKind::Commission),
            other => Err(format!("unknown payment kind: {other}")),
        }
    }
}

/// Input for a new ledger entry, validated before any mutation happens.
#[derive(Clone, Debug)]
pub struct PaymentDraft {
    pub proposal_id: i64,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub note: Option<String>,
}

impl PaymentDraft {
    pub fn new(proposal_id: i64, kind: PaymentKind, amount: Decimal, paid_on: NaiveDate) -> Self {
        Self {
            proposal_id,
            kind,
            amount,
            paid_on,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Rejects non-positive amounts. Zero and negative payments are errors,
    /// never coerced.
    pub fn validate(&self) -> TallyResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(TallyError::invalid(format!(
                "payment amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        let zero = PaymentDraft::new(1, PaymentKind::Client, Decimal::ZERO, date("2024-03-01"));
        assert!(matches!(
            zero.validate(),
            Err(TallyError::InvalidArgument(_))
        ));

        let negative = PaymentDraft::new(1, PaymentKind::Client, dec!(-5), date("2024-03-01"));
        assert!(matches!(
            negative.validate(),
            Err(TallyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn accepts_positive_amounts() {
        let draft = PaymentDraft::new(1, PaymentKind::Commission, dec!(0.01), date("2024-03-01"))
            .with_note("first installment");
        assert!(draft.validate().is_ok());
        assert_eq!(draft.note.as_deref(), Some("first installment"));
    }

    #[test]
    fn kind_roundtrips_through_str() {
        for kind in [PaymentKind::Client, PaymentKind::Commission] {
            assert_eq!(kind.as_str().parse::<PaymentKind>().unwrap(), kind);
        }
        assert!("refund".parse::<PaymentKind>().is_err());
    }
}
