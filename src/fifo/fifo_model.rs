use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transactions::NormalizedTransaction;

/// A buy lot with quantity still available for matching against future
/// sells. Owned exclusively by its per-symbol queue.
#[derive(Debug, Clone)]
pub struct Lot {
    pub transaction: NormalizedTransaction,
    pub remaining_quantity: Decimal,
}

/// A short-sale lot waiting to be covered by a future buy.
#[derive(Debug, Clone)]
pub struct ShortLot {
    pub transaction: NormalizedTransaction,
    pub remaining_quantity: Decimal,
}

/// One FIFO pairing of a quantity between a buy and a sell.
///
/// Invariant: `profit_pln = sell_revenue_pln - buy_cost_pln`; orphan matches
/// carry `buy_cost_pln = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FifoMatch {
    pub symbol: String,
    pub quantity: Decimal,

    pub buy_date: NaiveDateTime,
    pub buy_settlement_date: NaiveDate,
    pub buy_price: Decimal,
    pub buy_currency: String,
    pub buy_commission: Decimal,
    pub buy_fx_rate: Decimal,
    /// (price * qty + commission share) * buy-side rate
    pub buy_cost_pln: Decimal,

    pub sell_date: NaiveDateTime,
    pub sell_settlement_date: NaiveDate,
    pub sell_price: Decimal,
    pub sell_currency: String,
    pub sell_commission: Decimal,
    pub sell_fx_rate: Decimal,
    /// (price * qty - commission share) * sell-side rate
    pub sell_revenue_pln: Decimal,

    pub profit_pln: Decimal,
    /// Sell had no matching buy anywhere in history (cost basis 0)
    #[serde(default)]
    pub is_orphan: bool,
    /// Short sale: the sell predates the covering buy
    #[serde(default)]
    pub is_short: bool,
}

/// An unsold buy-lot remainder left after matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub currency: String,
    /// Valued at the historical purchase rate, never revalued
    pub cost_pln: Decimal,
    pub fx_rate: Decimal,
}

/// An uncovered short remainder left after matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub sell_date: NaiveDate,
    pub sell_price: Decimal,
    pub currency: String,
    pub revenue_pln: Decimal,
    pub fx_rate: Decimal,
}

/// Complete result of a FIFO engine run.
#[derive(Debug, Default)]
pub struct FifoResult {
    pub matches: Vec<FifoMatch>,
    pub warnings: Vec<String>,
    /// Remaining open buy lots, keyed by symbol (sorted)
    pub open_lots: Vec<(String, Vec<Lot>)>,
    /// Remaining uncovered short lots, keyed by symbol (sorted)
    pub open_short_lots: Vec<(String, Vec<ShortLot>)>,
}
