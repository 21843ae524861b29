pub mod country;
pub mod report_model;
pub mod report_service;

pub use country::{country_display_name, country_from_isin, country_from_symbol, resolve_country};
pub use report_model::{CapitalGainsSummary, CountryBreakdown, DividendSummary, TaxReport};
pub use report_service::TaxReportService;
