//! Annual report orchestration.
//!
//! Runs the full pipeline for one tax year: dedup, rate enrichment, FIFO
//! matching over the whole history, year filtering on the closing event,
//! dividend pairing, and the final aggregation.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::constants::{FLAT_TAX_RATE, LOSS_CARRYFORWARD_CAP};
use crate::dedup::dedup;
use crate::dividends::{DividendCalculator, DividendResult};
use crate::errors::Result;
use crate::fifo::{FifoEngine, FifoMatch, FifoResult, OpenPosition, ShortPosition};
use crate::rates::RateService;
use crate::transactions::{ActionType, NormalizedTransaction};
use crate::utils::{round_money, round_to_whole_pln};

use super::country::{country_display_name, country_from_symbol};
use super::report_model::{
    CapitalGainsSummary, CountryBreakdown, DividendSummary, TaxReport,
};

pub struct TaxReportService {
    rates: Arc<RateService>,
    fifo: FifoEngine,
    dividends: DividendCalculator,
}

impl TaxReportService {
    pub fn new(rates: Arc<RateService>) -> Self {
        Self {
            rates,
            fifo: FifoEngine,
            dividends: DividendCalculator,
        }
    }

    /// Generate the complete report for one tax year.
    ///
    /// `transactions` may span multiple years: every buy in history feeds the
    /// cost basis, while only closing events inside `tax_year` are taxed.
    /// A rate that cannot be resolved aborts generation; a wrong rate would
    /// misstate the liability.
    pub async fn generate(
        &self,
        transactions: Vec<NormalizedTransaction>,
        tax_year: i32,
        prior_year_loss: Option<Decimal>,
    ) -> Result<TaxReport> {
        let mut warnings: Vec<String> = Vec::new();

        let deduped = dedup(transactions);
        warnings.extend(deduped.warnings);
        let mut transactions = deduped.transactions;

        let rate_warnings = self.rates.enrich(&mut transactions).await?;

        let trades: Vec<NormalizedTransaction> = transactions
            .iter()
            .filter(|t| matches!(t.action, ActionType::Buy | ActionType::Sell))
            .cloned()
            .collect();
        let year_dividend_events: Vec<NormalizedTransaction> = transactions
            .iter()
            .filter(|t| {
                matches!(t.action, ActionType::Dividend | ActionType::WithholdingTax)
                    && t.trade_date.year() == tax_year
            })
            .cloned()
            .collect();

        let fifo_result = self.fifo.process(&trades);
        warnings.extend(fifo_result.warnings.iter().cloned());

        // Tax event is the closing leg: the covering buy for shorts,
        // the sell for everything else.
        let year_matches: Vec<FifoMatch> = fifo_result
            .matches
            .iter()
            .filter(|m| {
                if m.is_short {
                    m.buy_date.year() == tax_year
                } else {
                    m.sell_date.year() == tax_year
                }
            })
            .cloned()
            .collect();

        let dividend_computation = self.dividends.calculate(&year_dividend_events);
        warnings.extend(dividend_computation.warnings);

        let mut notes: Vec<String> = rate_warnings;

        let capital_gains =
            build_capital_gains(year_matches, prior_year_loss, &mut notes);
        let dividends = build_dividend_summary(dividend_computation.results);

        let country_breakdown =
            match build_country_breakdown(&capital_gains.matches, &dividends.items) {
                Some(rows) => rows,
                None => {
                    log::error!("Country breakdown aggregation overflowed");
                    notes.push(
                        "Could not build the per-country breakdown; the main report is unaffected."
                            .to_string(),
                    );
                    Vec::new()
                }
            };

        let (open_positions, open_short_positions) = build_open_positions(&fifo_result);

        warnings.extend(notes);

        Ok(TaxReport {
            tax_year,
            capital_gains,
            dividends,
            country_breakdown,
            open_positions,
            open_short_positions,
            warnings,
        })
    }
}

fn build_capital_gains(
    matches: Vec<FifoMatch>,
    prior_year_loss: Option<Decimal>,
    notes: &mut Vec<String>,
) -> CapitalGainsSummary {
    let tax_rate = Decimal::from_str(FLAT_TAX_RATE).expect("valid tax rate constant");
    let carry_cap = Decimal::from_str(LOSS_CARRYFORWARD_CAP).expect("valid carry cap constant");

    let revenue: Decimal = matches.iter().map(|m| m.sell_revenue_pln).sum();
    let costs: Decimal = matches.iter().map(|m| m.buy_cost_pln).sum();
    let mut profit = revenue - costs;

    if let Some(loss) = prior_year_loss {
        if loss > Decimal::ZERO && profit > Decimal::ZERO {
            let deduction = round_money(loss * carry_cap).min(profit);
            profit -= deduction;
            notes.push(format!(
                "Deducted prior-year loss: {} PLN (at most 50% of {} PLN per year).",
                deduction, loss
            ));
        }
    }

    let tax_due = round_to_whole_pln(profit * tax_rate).max(Decimal::ZERO);

    CapitalGainsSummary {
        revenue_pln: round_money(revenue),
        costs_pln: round_money(costs),
        profit_pln: round_money(profit),
        tax_due,
        matches,
    }
}

fn build_dividend_summary(items: Vec<DividendResult>) -> DividendSummary {
    DividendSummary {
        total_gross_pln: items.iter().map(|d| d.gross_amount_pln).sum(),
        total_wht_pln: items.iter().map(|d| d.wht_amount_pln).sum(),
        total_local_tax_pln: items.iter().map(|d| d.local_tax_pln).sum(),
        total_to_pay_pln: items.iter().map(|d| d.tax_to_pay_pln).sum(),
        items,
    }
}

#[derive(Default)]
struct CountryAccumulator {
    capital_gains_pln: Decimal,
    dividend_income_pln: Decimal,
    tax_paid_abroad_pln: Decimal,
}

/// Per-country income lines for the PIT/ZG attachment. Capital gains are
/// attributed by the exchange suffix of the symbol, dividends by their
/// resolved country ("XX" when unknown). Returns `None` on arithmetic
/// overflow so the caller can degrade to a warning.
fn build_country_breakdown(
    matches: &[FifoMatch],
    dividends: &[DividendResult],
) -> Option<Vec<CountryBreakdown>> {
    let mut by_country: BTreeMap<String, CountryAccumulator> = BTreeMap::new();

    for m in matches {
        if m.profit_pln == Decimal::ZERO {
            continue;
        }
        let entry = by_country
            .entry(country_from_symbol(&m.symbol))
            .or_default();
        entry.capital_gains_pln = entry.capital_gains_pln.checked_add(m.profit_pln)?;
    }

    for d in dividends {
        let code = d.country.clone().unwrap_or_else(|| "XX".to_string());
        let entry = by_country.entry(code).or_default();
        entry.dividend_income_pln = entry.dividend_income_pln.checked_add(d.gross_amount_pln)?;
        entry.tax_paid_abroad_pln = entry.tax_paid_abroad_pln.checked_add(d.wht_amount_pln)?;
    }

    Some(
        by_country
            .into_iter()
            .map(|(code, acc)| CountryBreakdown {
                country_name: country_display_name(&code),
                country_code: code,
                capital_gains_pln: round_money(acc.capital_gains_pln),
                dividend_income_pln: round_money(acc.dividend_income_pln),
                tax_paid_abroad_pln: round_money(acc.tax_paid_abroad_pln),
            })
            .collect(),
    )
}

/// Open lots valued at their historical rates; never revalued to today.
fn build_open_positions(
    fifo_result: &FifoResult,
) -> (Vec<OpenPosition>, Vec<ShortPosition>) {
    let mut open = Vec::new();
    for (symbol, lots) in &fifo_result.open_lots {
        for lot in lots {
            let tx = &lot.transaction;
            let rate = tx.fx_rate.unwrap_or(Decimal::ONE);
            open.push(OpenPosition {
                symbol: symbol.clone(),
                quantity: lot.remaining_quantity,
                buy_date: tx.trade_date.date(),
                buy_price: tx.price,
                currency: tx.currency.clone(),
                cost_pln: round_money(tx.price * lot.remaining_quantity * rate),
                fx_rate: rate,
            });
        }
    }

    let mut open_short = Vec::new();
    for (symbol, lots) in &fifo_result.open_short_lots {
        for lot in lots {
            let tx = &lot.transaction;
            let rate = tx.fx_rate.unwrap_or(Decimal::ONE);
            open_short.push(ShortPosition {
                symbol: symbol.clone(),
                quantity: lot.remaining_quantity,
                sell_date: tx.trade_date.date(),
                sell_price: tx.price,
                currency: tx.currency.clone(),
                revenue_pln: round_money(tx.price * lot.remaining_quantity * rate),
                fx_rate: rate,
            });
        }
    }

    (open, open_short)
}
