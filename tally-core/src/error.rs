use thiserror::Error;

/// Result alias for Tally operations.
pub type TallyResult<T> = Result<T, TallyError>;

/// Error type surfaced by the ledger, store and service layers.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("ledger out of sync: {0}")]
    Consistency(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl TallyError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
