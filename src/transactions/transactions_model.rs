use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rates::calendar;

use super::idempotency;
use super::transactions_errors::TransactionError;

/// Enum representing the normalized transaction actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Buy,
    Sell,
    Dividend,
    WithholdingTax,
    Fee,
    CorporateAction,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        use super::transactions_constants::*;
        match self {
            ActionType::Buy => ACTION_TYPE_BUY,
            ActionType::Sell => ACTION_TYPE_SELL,
            ActionType::Dividend => ACTION_TYPE_DIVIDEND,
            ActionType::WithholdingTax => ACTION_TYPE_WHT,
            ActionType::Fee => ACTION_TYPE_FEE,
            ActionType::CorporateAction => ACTION_TYPE_CORPORATE_ACTION,
        }
    }
}

impl FromStr for ActionType {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use super::transactions_constants::*;
        match s {
            ACTION_TYPE_BUY => Ok(ActionType::Buy),
            ACTION_TYPE_SELL => Ok(ActionType::Sell),
            ACTION_TYPE_DIVIDEND => Ok(ActionType::Dividend),
            ACTION_TYPE_WHT => Ok(ActionType::WithholdingTax),
            ACTION_TYPE_FEE => Ok(ActionType::Fee),
            ACTION_TYPE_CORPORATE_ACTION => Ok(ActionType::CorporateAction),
            other => Err(TransactionError::UnknownAction(other.to_string())),
        }
    }
}

/// Every broker export row is normalized into this schema before any
/// calculation. Created by ingestion, enriched once with a resolved
/// reference rate, then read-only through the rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    /// Deterministic content hash of the economic fields
    pub id: String,
    pub broker: String,
    /// Ticker symbol, e.g. AAPL or VWCE.DE
    pub symbol: String,
    pub isin: Option<String>,
    /// ISO 2-letter country code, when known from broker data
    pub country: Option<String>,
    pub description: Option<String>,
    pub trade_date: NaiveDateTime,
    /// Settlement date (T+1 or T+2 depending on venue)
    pub settlement_date: NaiveDate,
    pub action: ActionType,
    /// Number of units, always positive
    pub quantity: Decimal,
    /// Price per unit in the original currency
    pub price: Decimal,
    pub currency: String,
    pub commission: Decimal,
    /// Currency of the commission, when it differs from `currency`
    pub commission_currency: Option<String>,

    // Populated once by rate enrichment
    /// Reference mid-rate for the business day preceding settlement
    pub fx_rate: Option<Decimal>,
    /// Actual calendar date the rate was published for
    pub fx_rate_date: Option<NaiveDate>,
    pub amount_pln: Option<Decimal>,
    pub commission_pln: Option<Decimal>,
}

/// Raw input record produced by the out-of-scope broker parsers (§6).
/// Decimal fields arrive as strings; the id may be absent, in which case
/// a content hash is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub id: Option<String>,
    pub broker: String,
    pub symbol: String,
    pub isin: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub trade_date: String,
    /// Absent when the broker export carries no settlement column; the
    /// venue-offset calendar fills it in.
    #[serde(default)]
    pub settlement_date: Option<String>,
    pub action: String,
    pub quantity: String,
    pub price: String,
    #[serde(default)]
    pub commission: Option<String>,
    pub commission_currency: Option<String>,
    pub currency: String,
}

impl TransactionDraft {
    /// Validates the draft and converts it into a normalized transaction.
    ///
    /// Zero or negative quantities and prices are rejected here so that the
    /// matching engine can assume well-formed input.
    pub fn into_normalized(self) -> Result<NormalizedTransaction, TransactionError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TransactionError::InvalidData(
                "Symbol cannot be empty".to_string(),
            ));
        }

        let action = ActionType::from_str(self.action.trim())?;

        let trade_date = parse_trade_date(&self.trade_date)?;
        let settlement_date = match self.settlement_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    TransactionError::InvalidData(format!(
                        "Invalid settlement date '{}' for {}",
                        raw, symbol
                    ))
                })?
            }
            _ => {
                let venue = crate::report::resolve_country(
                    self.country.as_deref(),
                    self.isin.as_deref(),
                    &symbol,
                );
                calendar::settlement_date(trade_date.date(), &venue)
            }
        };

        let quantity = parse_decimal("quantity", &self.quantity, &symbol)?;
        let price = parse_decimal("price", &self.price, &symbol)?;
        if quantity <= Decimal::ZERO {
            return Err(TransactionError::InvalidData(format!(
                "Quantity must be positive for {} ({})",
                symbol, quantity
            )));
        }
        if price <= Decimal::ZERO {
            return Err(TransactionError::InvalidData(format!(
                "Price must be positive for {} ({})",
                symbol, price
            )));
        }

        let commission = match self.commission.as_deref() {
            None | Some("") => Decimal::ZERO,
            Some(raw) => parse_decimal("commission", raw, &symbol)?.abs(),
        };

        let currency = self.currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TransactionError::InvalidData(format!(
                "Invalid currency code '{}' for {}",
                self.currency, symbol
            )));
        }

        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => idempotency::content_id(
                &self.broker,
                &symbol,
                action,
                &trade_date,
                quantity,
                price,
                &currency,
            ),
        };

        Ok(NormalizedTransaction {
            id,
            broker: self.broker,
            symbol,
            isin: self.isin,
            country: self.country,
            description: self.description,
            trade_date,
            settlement_date,
            action,
            quantity,
            price,
            currency,
            commission,
            commission_currency: self
                .commission_currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            fx_rate: None,
            fx_rate_date: None,
            amount_pln: None,
            commission_pln: None,
        })
    }
}

fn parse_trade_date(raw: &str) -> Result<NaiveDateTime, TransactionError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        // Date-only rows get a midday timestamp so they sort between
        // same-day opening and closing executions.
        return Ok(d.and_hms_opt(12, 0, 0).expect("valid time"));
    }
    Err(TransactionError::InvalidData(format!(
        "Invalid trade date '{}'. Expected ISO 8601 or YYYY-MM-DD",
        raw
    )))
}

fn parse_decimal(field: &str, raw: &str, symbol: &str) -> Result<Decimal, TransactionError> {
    Decimal::from_str(raw.trim()).map_err(|_| {
        TransactionError::InvalidData(format!("Invalid {} '{}' for {}", field, raw, symbol))
    })
}

/// Converts a batch of drafts, rejecting individual malformed records with a
/// warning instead of aborting the whole batch.
pub fn normalize_batch(
    drafts: Vec<TransactionDraft>,
) -> (Vec<NormalizedTransaction>, Vec<String>) {
    let mut transactions = Vec::with_capacity(drafts.len());
    let mut warnings = Vec::new();

    for draft in drafts {
        let symbol = draft.symbol.clone();
        match draft.into_normalized() {
            Ok(tx) => transactions.push(tx),
            Err(e) => {
                log::warn!("Rejected transaction record for '{}': {}", symbol, e);
                warnings.push(format!("Skipped record ({}): {}", symbol, e));
            }
        }
    }

    (transactions, warnings)
}
