pub(crate) mod idempotency;
pub(crate) mod transactions_constants;
pub(crate) mod transactions_errors;
pub(crate) mod transactions_model;

pub use idempotency::content_id;
pub use transactions_constants::*;
pub use transactions_errors::TransactionError;
pub use transactions_model::{normalize_batch, ActionType, NormalizedTransaction, TransactionDraft};
