use thiserror::Error;

use crate::types::Amount;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Entity store error: {0}")]
    Store(String),

    #[error("Negative balance for {account}: staked {staked}, debit {debit}")]
    NegativeBalance {
        account: String,
        staked: Amount,
        debit: Amount,
    },

    #[error("Arithmetic overflow in {field}")]
    Overflow { field: &'static str },

    #[error("Conflicting event {id}: an audit record with this id holds different content")]
    ConflictingEvent { id: String },

    #[error("Event {next} arrived after {previous}; feed is not in canonical order")]
    OutOfOrder { previous: String, next: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Wrap a failure from the entity store, keeping the whole context chain.
    pub fn store(err: anyhow::Error) -> Self {
        LedgerError::Store(format!("{err:#}"))
    }
}
