use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{TallyError, TallyResult};

/// A sales contract under commission tracking.
///
/// `amount_paid` and `commission_paid` mirror the two payment ledgers and are
/// written exclusively by the consistency service; general updates never
/// touch them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub partner_id: i64,
    pub client: String,
    pub service_type_id: i64,
    pub signed_on: NaiveDate,
    pub total_value: Decimal,
    pub commission_percent: Decimal,
    pub amount_paid: Decimal,
    pub commission_paid: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for a new proposal. Paid totals always start at zero.
#[derive(Clone, Debug)]
pub struct ProposalDraft {
    pub partner_id: i64,
    pub client: String,
    pub service_type_id: i64,
    pub signed_on: NaiveDate,
    pub total_value: Decimal,
    pub commission_percent: Decimal,
}

impl ProposalDraft {
    pub fn validate(&self) -> TallyResult<()> {
        if self.client.trim().is_empty() {
            return Err(TallyError::invalid("client name must not be empty"));
        }
        validate_base_fields(self.total_value, self.commission_percent)
    }
}

/// Partial update of a proposal's base and descriptive fields.
#[derive(Clone, Debug, Default)]
pub struct ProposalUpdate {
    pub partner_id: Option<i64>,
    pub client: Option<String>,
    pub service_type_id: Option<i64>,
    pub signed_on: Option<NaiveDate>,
    pub total_value: Option<Decimal>,
    pub commission_percent: Option<Decimal>,
}

impl ProposalUpdate {
    pub fn validate(&self) -> TallyResult<()> {
        if let Some(client) = &self.client {
            if client.trim().is_empty() {
                return Err(TallyError::invalid("client name must not be empty"));
            }
        }
        if let Some(total) = self.total_value {
            if total < Decimal::ZERO {
                return Err(TallyError::invalid(format!(
                    "total value must not be negative, got {total}"
                )));
            }
        }
        if let Some(percent) = self.commission_percent {
            validate_percent(percent)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.partner_id.is_none()
            && self.client.is_none()
            && self.service_type_id.is_none()
            && self.signed_on.is_none()
            && self.total_value.is_none()
            && self.commission_percent.is_none()
    }
}

/// Settlement status derived from the figures, never stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Settled,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Open => "open",
            ProposalStatus::Settled => "settled",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_base_fields(total_value: Decimal, commission_percent: Decimal) -> TallyResult<()> {
    if total_value < Decimal::ZERO {
        return Err(TallyError::invalid(format!(
            "total value must not be negative, got {total_value}"
        )));
    }
    validate_percent(commission_percent)
}

fn validate_percent(percent: Decimal) -> TallyResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(TallyError::invalid(format!(
            "commission percent must be between 0 and 100, got {percent}"
        )));
    }
    Ok(())
}
