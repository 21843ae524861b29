use chrono::NaiveDate;
use thiserror::Error;

/// Custom error type for rate-resolution operations
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No reference rate for {currency} near {date} after {attempts} backward steps")]
    Unavailable {
        currency: String,
        date: NaiveDate,
        attempts: u32,
    },
    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),
    #[error("Provider fetch failed: {0}")]
    FetchError(String),
    #[error("Cache write failed: {0}")]
    SaveError(String),
}

impl From<crate::errors::DatabaseError> for RateError {
    fn from(err: crate::errors::DatabaseError) -> Self {
        RateError::DatabaseError(err.to_string())
    }
}

impl From<diesel::result::Error> for RateError {
    fn from(err: diesel::result::Error) -> Self {
        RateError::DatabaseError(err.to_string())
    }
}

impl From<RateError> for String {
    fn from(error: RateError) -> Self {
        error.to_string()
    }
}
