/// Reporting currency: all tax amounts are expressed in PLN
pub const REPORTING_CURRENCY: &str = "PLN";

/// Statutory flat rate for capital gains and dividends (19%)
pub const FLAT_TAX_RATE: &str = "0.19";

/// Decimal precision for monetary amounts (grosze)
pub const MONETARY_DECIMAL_PRECISION: u32 = 2;

/// Maximum backward business-day steps when resolving a reference rate
pub const MAX_RATE_LOOKBACK_ATTEMPTS: u32 = 10;

/// Provider limit on a single date-range request (NBP caps at 93 days)
pub const RATE_FETCH_WINDOW_DAYS: i64 = 90;

/// Day tolerance when pairing a dividend with its withholding-tax record
pub const WHT_MATCH_MAX_DAY_DISTANCE: i64 = 5;

/// Share of a prior-year loss deductible in a single tax year (50%)
pub const LOSS_CARRYFORWARD_CAP: &str = "0.5";
