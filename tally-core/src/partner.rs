use serde::{Deserialize, Serialize};

use crate::{TallyError, TallyResult};

/// A partner/reseller commissions are owed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Input for a new partner.
#[derive(Clone, Debug, Default)]
pub struct PartnerDraft {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PartnerDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> TallyResult<()> {
        if self.name.trim().is_empty() {
            return Err(TallyError::invalid("partner name must not be empty"));
        }
        Ok(())
    }
}

/// Partial update of a partner's contact fields.
#[derive(Clone, Debug, Default)]
pub struct PartnerUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PartnerUpdate {
    pub fn validate(&self) -> TallyResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(TallyError::invalid("partner name must not be empty"));
            }
        }
        Ok(())
    }
}
