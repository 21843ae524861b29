use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dividends::DividendResult;
use crate::fifo::{FifoMatch, OpenPosition, ShortPosition};

/// Capital-gains section of the annual report (PIT-38, section C).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainsSummary {
    pub revenue_pln: Decimal,
    pub costs_pln: Decimal,
    /// After any prior-year loss deduction
    pub profit_pln: Decimal,
    /// Whole-PLN statutory rounding, floored at zero
    pub tax_due: Decimal,
    pub matches: Vec<FifoMatch>,
}

/// Dividend section of the annual report (PIT-38, section G).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendSummary {
    pub total_gross_pln: Decimal,
    pub total_wht_pln: Decimal,
    pub total_local_tax_pln: Decimal,
    pub total_to_pay_pln: Decimal,
    pub items: Vec<DividendResult>,
}

/// Per-country income line for the PIT/ZG attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryBreakdown {
    pub country_code: String,
    pub country_name: String,
    pub capital_gains_pln: Decimal,
    pub dividend_income_pln: Decimal,
    pub tax_paid_abroad_pln: Decimal,
}

/// The complete annual report. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxReport {
    pub tax_year: i32,
    pub capital_gains: CapitalGainsSummary,
    pub dividends: DividendSummary,
    pub country_breakdown: Vec<CountryBreakdown>,
    pub open_positions: Vec<OpenPosition>,
    pub open_short_positions: Vec<ShortPosition>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = TaxReport {
            tax_year: 2023,
            capital_gains: CapitalGainsSummary {
                revenue_pln: dec!(6000.00),
                costs_pln: dec!(4000.00),
                profit_pln: dec!(2000.00),
                tax_due: dec!(380),
                matches: Vec::new(),
            },
            dividends: DividendSummary {
                total_gross_pln: dec!(0),
                total_wht_pln: dec!(0),
                total_local_tax_pln: dec!(0),
                total_to_pay_pln: dec!(0),
                items: Vec::new(),
            },
            country_breakdown: Vec::new(),
            open_positions: Vec::new(),
            open_short_positions: Vec::new(),
            warnings: Vec::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["taxYear"], 2023);
        assert!(json["capitalGains"]["revenuePln"].is_number());
        assert!(json["openShortPositions"].is_array());
        assert!(json.get("tax_year").is_none());
    }
}
