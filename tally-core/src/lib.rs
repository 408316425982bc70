//! Core domain types and derived-figure computation for Tally.

mod catalog;
mod compute;
mod entry;
mod error;
mod partner;
mod proposal;

pub use catalog::ServiceType;
pub use compute::{compute_derived, sum_entries, DerivedFigures};
pub use entry::{PaymentDraft, PaymentEntry, PaymentKind};
pub use error::{TallyError, TallyResult};
pub use partner::{Partner, PartnerDraft, PartnerUpdate};
pub use proposal::{Proposal, ProposalDraft, ProposalStatus, ProposalUpdate};
