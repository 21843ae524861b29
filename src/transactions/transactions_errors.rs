use thiserror::Error;

/// Custom error type for normalized-transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Unknown action type: {0}")]
    UnknownAction(String),
}

impl From<TransactionError> for String {
    fn from(error: TransactionError) -> Self {
        error.to_string()
    }
}
