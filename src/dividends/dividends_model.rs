use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax outcome for a single dividend event.
///
/// Invariant: `tax_to_pay_pln = max(0, local_tax_pln - wht_pln)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendResult {
    pub symbol: String,
    pub isin: Option<String>,
    /// 2-letter ISO code derived from the ISIN prefix
    pub country: Option<String>,
    pub pay_date: NaiveDate,
    pub currency: String,

    /// Gross dividend before any tax, original currency
    pub gross_amount: Decimal,
    pub gross_amount_pln: Decimal,
    pub fx_rate: Decimal,

    /// Withholding tax deducted at source abroad
    pub wht_amount: Decimal,
    pub wht_amount_pln: Decimal,
    pub wht_fx_rate: Decimal,

    /// Statutory flat tax on the converted gross
    pub local_tax_pln: Decimal,
    /// Residual due after the foreign-tax credit
    pub tax_to_pay_pln: Decimal,
}

/// Result of a dividend calculation run.
#[derive(Debug, Default)]
pub struct DividendComputation {
    pub results: Vec<DividendResult>,
    pub warnings: Vec<String>,
}
