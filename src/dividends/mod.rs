pub mod dividends_model;
pub mod dividends_service;

pub use dividends_model::{DividendComputation, DividendResult};
pub use dividends_service::DividendCalculator;
