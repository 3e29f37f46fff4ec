//! Caller-visible error taxonomy for the pricing engine.
//!
//! Distinguishes the business-outcome errors that carry no side effect
//! (validation, unknown/inactive item, insufficient funds) from the
//! operational ones (storage failure, engine fault) per spec §7.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("item is inactive: {0}")]
    ItemInactive(String),

    #[error("quantity {0} out of range [1, 10000]")]
    InvalidQuantity(i64),

    #[error("insufficient funds: balance {balance} < total {total}")]
    InsufficientFunds { balance: String, total: String },

    #[error("storage error: {0}")]
    StorageError(#[from] rusqlite::Error),

    #[error("storage operation timed out after {0}ms")]
    StorageTimeout(u64),

    #[error("engine fault: {0}")]
    EngineFault(String),
}

impl EngineError {
    /// True if this error is classified as transient and worth retrying
    /// (spec §7: storage commits retry up to 3 times on transient failure).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::StorageError(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
        ) || matches!(self, EngineError::StorageTimeout(_))
    }

    /// Process exit code mapping for the CLI (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::StorageError(_) | EngineError::StorageTimeout(_) => 2,
            EngineError::EngineFault(_) => 3,
            _ => 1,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
