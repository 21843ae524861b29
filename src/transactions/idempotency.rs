//! Content-hash id computation for normalized transactions.
//!
//! Broker exports carry no stable row ids, so ids are derived from the
//! record's own economic fields: two exports of the identical execution
//! produce the identical id, which the deduplicator relies on.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::transactions_model::ActionType;

/// Computes a deterministic id for a transaction record.
///
/// The id is the first 16 hex chars of a SHA-256 over the fields that
/// identify the economic event: broker, symbol, action, trade timestamp,
/// quantity, unit price and currency.
pub fn content_id(
    broker: &str,
    symbol: &str,
    action: ActionType,
    trade_date: &NaiveDateTime,
    quantity: Decimal,
    price: Decimal,
    currency: &str,
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(broker.as_bytes());
    hasher.update(b"|");
    hasher.update(symbol.as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(trade_date.format("%Y-%m-%dT%H:%M:%S").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(quantity).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_decimal(price).as_bytes());
    hasher.update(b"|");
    hasher.update(currency.as_bytes());

    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Normalize decimal to a consistent string format (no trailing zeros)
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}
