//! Services coordinating validation, locking and storage for Tally.

mod catalog;
mod locks;
mod partners;
mod proposals;
mod summary;

pub use catalog::CatalogService;
pub use partners::PartnerService;
pub use proposals::{ProposalDetail, ProposalService, ProposalView};
pub use summary::{summarize, PartnerSummary, PortfolioSummary};
