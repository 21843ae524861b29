//! Dividend tax calculation.
//!
//! Pairs each gross dividend with its withholding-tax record, converts both
//! legs at their own settlement-day rates, and computes the residual local
//! tax after the foreign-tax credit.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::constants::{FLAT_TAX_RATE, WHT_MATCH_MAX_DAY_DISTANCE};
use crate::report::country_from_isin;
use crate::transactions::{ActionType, NormalizedTransaction};
use crate::utils::round_money;

use super::dividends_model::{DividendComputation, DividendResult};

pub struct DividendCalculator;

impl DividendCalculator {
    /// Process DIVIDEND and TAX_WHT transactions (already rate-enriched).
    /// Other action types are ignored.
    pub fn calculate(&self, transactions: &[NormalizedTransaction]) -> DividendComputation {
        let tax_rate = Decimal::from_str(FLAT_TAX_RATE).expect("valid tax rate constant");

        let dividends: Vec<&NormalizedTransaction> = transactions
            .iter()
            .filter(|t| t.action == ActionType::Dividend)
            .collect();
        let wht_entries: Vec<&NormalizedTransaction> = transactions
            .iter()
            .filter(|t| t.action == ActionType::WithholdingTax)
            .collect();

        let mut computation = DividendComputation::default();

        for div in dividends {
            let wht = find_matching_wht(div, &wht_entries);
            if wht.is_none() {
                log::warn!(
                    "No withholding-tax record for dividend {} on {}",
                    div.symbol,
                    div.trade_date.date()
                );
                computation.warnings.push(format!(
                    "No withholding tax found for the {} dividend of {}; assuming 0 was withheld at source.",
                    div.symbol,
                    div.trade_date.date(),
                ));
            }

            let div_rate = div.fx_rate.unwrap_or(Decimal::ONE);
            let gross_amount = div.quantity * div.price;
            let gross_pln = round_money(gross_amount * div_rate);

            let (wht_amount, wht_pln, wht_rate) = match wht {
                Some(w) => {
                    let rate = w.fx_rate.unwrap_or(Decimal::ONE);
                    let amount = (w.quantity * w.price).abs();
                    (amount, round_money(amount * rate), rate)
                }
                None => (Decimal::ZERO, Decimal::ZERO, Decimal::ONE),
            };

            let local_tax = round_money(gross_pln * tax_rate);
            let to_pay = (local_tax - wht_pln).max(Decimal::ZERO);

            computation.results.push(DividendResult {
                symbol: div.symbol.clone(),
                isin: div.isin.clone(),
                country: div
                    .country
                    .clone()
                    .or_else(|| country_from_isin(div.isin.as_deref())),
                pay_date: div.trade_date.date(),
                currency: div.currency.clone(),
                gross_amount,
                gross_amount_pln: gross_pln,
                fx_rate: div_rate,
                wht_amount,
                wht_amount_pln: wht_pln,
                wht_fx_rate: wht_rate,
                local_tax_pln: local_tax,
                tax_to_pay_pln: to_pay,
            });
        }

        computation
    }
}

/// Find the withholding-tax record for a dividend: same symbol, same
/// calendar day preferred, else the closest within the day tolerance.
fn find_matching_wht<'a>(
    dividend: &NormalizedTransaction,
    wht_entries: &[&'a NormalizedTransaction],
) -> Option<&'a NormalizedTransaction> {
    let div_date = dividend.trade_date.date();

    let mut candidates: Vec<&NormalizedTransaction> = wht_entries
        .iter()
        .copied()
        .filter(|w| w.symbol == dividend.symbol)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    if let Some(exact) = candidates
        .iter()
        .copied()
        .find(|w| w.trade_date.date() == div_date)
    {
        return Some(exact);
    }

    candidates.sort_by_key(|w| (w.trade_date.date() - div_date).num_days().abs());
    let best = candidates[0];
    let distance = (best.trade_date.date() - div_date).num_days().abs();
    (distance <= WHT_MATCH_MAX_DAY_DISTANCE).then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn event(
        symbol: &str,
        action: ActionType,
        quantity: Decimal,
        price: Decimal,
        day: (i32, u32, u32),
        rate: Decimal,
        isin: Option<&str>,
    ) -> NormalizedTransaction {
        let trade_date = NaiveDate::from_ymd_opt(day.0, day.1, day.2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        NormalizedTransaction {
            id: format!("{}-{:?}-{}", symbol, action, trade_date),
            broker: "IBKR".to_string(),
            symbol: symbol.to_string(),
            isin: isin.map(String::from),
            country: None,
            description: None,
            trade_date,
            settlement_date: trade_date.date(),
            action,
            quantity,
            price,
            currency: "USD".to_string(),
            commission: Decimal::ZERO,
            commission_currency: None,
            fx_rate: Some(rate),
            fx_rate_date: Some(trade_date.date()),
            amount_pln: None,
            commission_pln: None,
        }
    }

    #[test]
    fn test_dividend_with_exact_day_wht() {
        // Gross 100 USD @ 4.00 = 400 PLN; WHT 15 USD @ 4.00 = 60 PLN
        // Local tax 19% of 400 = 76; residual 76 - 60 = 16
        let txs = vec![
            event("AAPL", ActionType::Dividend, dec!(100), dec!(1), (2023, 5, 15), dec!(4.00), Some("US0378331005")),
            event("AAPL", ActionType::WithholdingTax, dec!(15), dec!(1), (2023, 5, 15), dec!(4.00), None),
        ];
        let computation = DividendCalculator.calculate(&txs);

        assert_eq!(computation.results.len(), 1);
        let d = &computation.results[0];
        assert_eq!(d.gross_amount_pln, dec!(400.00));
        assert_eq!(d.wht_amount_pln, dec!(60.00));
        assert_eq!(d.local_tax_pln, dec!(76.00));
        assert_eq!(d.tax_to_pay_pln, dec!(16.00));
        assert_eq!(d.country.as_deref(), Some("US"));
        assert!(computation.warnings.is_empty());
    }

    #[test]
    fn test_wht_matched_within_tolerance() {
        let txs = vec![
            event("MSFT", ActionType::Dividend, dec!(50), dec!(1), (2023, 5, 15), dec!(4.00), None),
            event("MSFT", ActionType::WithholdingTax, dec!(7.5), dec!(1), (2023, 5, 18), dec!(4.00), None),
        ];
        let computation = DividendCalculator.calculate(&txs);
        assert_eq!(computation.results[0].wht_amount, dec!(7.5));
        assert!(computation.warnings.is_empty());
    }

    #[test]
    fn test_wht_beyond_tolerance_is_unmatched() {
        let txs = vec![
            event("MSFT", ActionType::Dividend, dec!(50), dec!(1), (2023, 5, 15), dec!(4.00), None),
            event("MSFT", ActionType::WithholdingTax, dec!(7.5), dec!(1), (2023, 5, 25), dec!(4.00), None),
        ];
        let computation = DividendCalculator.calculate(&txs);
        assert_eq!(computation.results[0].wht_amount, Decimal::ZERO);
        assert_eq!(computation.warnings.len(), 1);
    }

    #[test]
    fn test_wht_for_other_symbol_never_matches() {
        let txs = vec![
            event("MSFT", ActionType::Dividend, dec!(50), dec!(1), (2023, 5, 15), dec!(4.00), None),
            event("AAPL", ActionType::WithholdingTax, dec!(7.5), dec!(1), (2023, 5, 15), dec!(4.00), None),
        ];
        let computation = DividendCalculator.calculate(&txs);
        assert_eq!(computation.results[0].wht_amount, Decimal::ZERO);
    }

    #[test]
    fn test_high_treaty_wht_never_refunds() {
        // 30% withheld abroad exceeds the 19% local tax: due is floored at 0
        let txs = vec![
            event("XOM", ActionType::Dividend, dec!(100), dec!(1), (2023, 5, 15), dec!(4.00), None),
            event("XOM", ActionType::WithholdingTax, dec!(30), dec!(1), (2023, 5, 15), dec!(4.00), None),
        ];
        let computation = DividendCalculator.calculate(&txs);
        assert_eq!(computation.results[0].tax_to_pay_pln, Decimal::ZERO);
    }

    #[test]
    fn test_each_leg_uses_its_own_rate() {
        let txs = vec![
            event("SAP", ActionType::Dividend, dec!(100), dec!(1), (2023, 5, 15), dec!(4.50), None),
            event("SAP", ActionType::WithholdingTax, dec!(10), dec!(1), (2023, 5, 17), dec!(4.60), None),
        ];
        let computation = DividendCalculator.calculate(&txs);
        let d = &computation.results[0];
        assert_eq!(d.gross_amount_pln, dec!(450.00));
        assert_eq!(d.wht_amount_pln, dec!(46.00));
    }
}
