pub mod db;

pub mod dedup;
pub mod dividends;
pub mod fifo;
pub mod rates;
pub mod report;
pub mod transactions;

pub mod constants;
pub mod errors;
pub mod schema;
pub mod utils;

pub use errors::{Error, Result};
pub use report::{TaxReport, TaxReportService};
pub use transactions::{NormalizedTransaction, TransactionDraft};
