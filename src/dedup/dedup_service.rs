//! Duplicate removal for overlapping broker exports.
//!
//! Users upload statements whose date ranges overlap, and some brokers emit
//! the same execution twice: once as per-fill rows and once as a synthetic
//! aggregate row. Three passes remove successively fuzzier duplicate
//! classes; each pass is conservative and leaves ambiguous groups intact.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::transactions::{ActionType, NormalizedTransaction};

/// Outcome of the dedup pipeline. Order-preserving; the transaction list is
/// never longer than the input.
#[derive(Debug, Default)]
pub struct DedupResult {
    pub transactions: Vec<NormalizedTransaction>,
    pub warnings: Vec<String>,
}

/// Runs the three dedup passes in order:
/// 1. exact id (two exports of the identical execution hash identically),
/// 2. same-price aggregate rows,
/// 3. blended-price aggregate rows.
pub fn dedup(transactions: Vec<NormalizedTransaction>) -> DedupResult {
    let input_len = transactions.len();
    let mut warnings = Vec::new();

    let transactions = drop_duplicate_ids(transactions);
    let transactions = drop_aggregate_rows(transactions, true, &mut warnings);
    let transactions = drop_aggregate_rows(transactions, false, &mut warnings);

    let removed = input_len - transactions.len();
    if removed > 0 {
        log::info!("Dedup removed {} of {} transaction(s)", removed, input_len);
    }

    DedupResult {
        transactions,
        warnings,
    }
}

/// Pass 1: drop every record whose id has already been seen.
fn drop_duplicate_ids(transactions: Vec<NormalizedTransaction>) -> Vec<NormalizedTransaction> {
    let mut seen: HashSet<String> = HashSet::with_capacity(transactions.len());
    transactions
        .into_iter()
        .filter(|tx| seen.insert(tx.id.clone()))
        .collect()
}

#[derive(PartialEq, Eq, Hash)]
struct AggregateKey {
    symbol: String,
    trade_date: NaiveDateTime,
    action: ActionType,
    price: Option<Decimal>,
}

/// Passes 2 and 3: remove broker-generated aggregate rows.
///
/// Rows are grouped by (symbol, timestamp, action) and, for the strict pass,
/// the unit price. In a group of more than one row, sorted by quantity
/// descending, the largest row is an aggregate of the rest exactly when the
/// remaining quantities sum to it; then only the largest is removed. Any
/// other residual leaves the whole group intact.
fn drop_aggregate_rows(
    transactions: Vec<NormalizedTransaction>,
    match_price: bool,
    warnings: &mut Vec<String>,
) -> Vec<NormalizedTransaction> {
    let mut groups: HashMap<AggregateKey, Vec<usize>> = HashMap::new();

    for (idx, tx) in transactions.iter().enumerate() {
        if !matches!(tx.action, ActionType::Buy | ActionType::Sell) {
            continue;
        }
        let key = AggregateKey {
            symbol: tx.symbol.clone(),
            trade_date: tx.trade_date,
            action: tx.action,
            price: match_price.then_some(tx.price),
        };
        groups.entry(key).or_default().push(idx);
    }

    // Groups in input order so repeated runs warn in the same order
    let mut grouped: Vec<(AggregateKey, Vec<usize>)> = groups.into_iter().collect();
    grouped.sort_by_key(|(_, indices)| indices[0]);

    let mut removed: HashSet<usize> = HashSet::new();
    for (key, mut indices) in grouped {
        if indices.len() < 2 {
            continue;
        }

        indices.sort_by(|&a, &b| transactions[b].quantity.cmp(&transactions[a].quantity));
        let largest = indices[0];
        let rest_sum: Decimal = indices[1..]
            .iter()
            .map(|&i| transactions[i].quantity)
            .sum();

        // Strict equality only; a near-miss means the rows are real fills
        if rest_sum == transactions[largest].quantity {
            removed.insert(largest);
            if !match_price {
                // A blended-price aggregate was inferred without a price
                // match, which can in principle misfire on unrelated
                // same-timestamp trades that happen to sum up. Surface it.
                let tx = &transactions[largest];
                warnings.push(format!(
                    "Removed a blended-price aggregate row: {} {} x{} at {}. Verify this row was a broker summary, not a real fill.",
                    tx.action.as_str(),
                    key.symbol,
                    tx.quantity,
                    tx.trade_date.format("%Y-%m-%d %H:%M:%S"),
                ));
            }
        }
    }

    transactions
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, tx)| tx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn tx(
        id: &str,
        symbol: &str,
        action: ActionType,
        quantity: Decimal,
        price: Decimal,
        hour: u32,
    ) -> NormalizedTransaction {
        NormalizedTransaction {
            id: id.to_string(),
            broker: "IBKR".to_string(),
            symbol: symbol.to_string(),
            isin: None,
            country: None,
            description: None,
            trade_date: NaiveDate::from_ymd_opt(2023, 6, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            settlement_date: NaiveDate::from_ymd_opt(2023, 6, 5).unwrap(),
            action,
            quantity,
            price,
            currency: "USD".to_string(),
            commission: Decimal::ZERO,
            commission_currency: None,
            fx_rate: None,
            fx_rate_date: None,
            amount_pln: None,
            commission_pln: None,
        }
    }

    #[test]
    fn test_exact_id_pass_keeps_first_occurrence() {
        let result = dedup(vec![
            tx("a", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("a", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("b", "AAPL", ActionType::Sell, dec!(5), dec!(110), 11),
        ]);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[0].id, "a");
        assert_eq!(result.transactions[1].id, "b");
    }

    #[test]
    fn test_same_price_aggregate_row_removed() {
        // 16 + 7 + 100 = 123: the 123 row is the broker aggregate
        let result = dedup(vec![
            tx("a", "VWCE.DE", ActionType::Buy, dec!(16), dec!(98), 10),
            tx("b", "VWCE.DE", ActionType::Buy, dec!(7), dec!(98), 10),
            tx("c", "VWCE.DE", ActionType::Buy, dec!(123), dec!(98), 10),
            tx("d", "VWCE.DE", ActionType::Buy, dec!(100), dec!(98), 10),
        ]);
        let quantities: Vec<Decimal> = result.transactions.iter().map(|t| t.quantity).collect();
        assert_eq!(quantities, vec![dec!(16), dec!(7), dec!(100)]);
    }

    #[test]
    fn test_blended_price_aggregate_removed_with_warning() {
        // Granular fills at real prices; the 30-unit row shows a blended price
        let result = dedup(vec![
            tx("a", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("b", "AAPL", ActionType::Buy, dec!(20), dec!(101), 10),
            tx("c", "AAPL", ActionType::Buy, dec!(30), Decimal::from_str("100.6667").unwrap(), 10),
        ]);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("blended-price"));
    }

    #[test]
    fn test_blended_warnings_follow_input_order() {
        let result = dedup(vec![
            tx("a1", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("a2", "AAPL", ActionType::Buy, dec!(20), dec!(101), 10),
            tx("a3", "AAPL", ActionType::Buy, dec!(30), Decimal::from_str("100.6667").unwrap(), 10),
            tx("b1", "ZZZZ", ActionType::Buy, dec!(5), dec!(50), 11),
            tx("b2", "ZZZZ", ActionType::Buy, dec!(3), dec!(51), 11),
            tx("b3", "ZZZZ", ActionType::Buy, dec!(8), Decimal::from_str("50.375").unwrap(), 11),
        ]);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("AAPL"));
        assert!(result.warnings[1].contains("ZZZZ"));
    }

    #[test]
    fn test_non_matching_sum_leaves_group_intact() {
        let result = dedup(vec![
            tx("a", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("b", "AAPL", ActionType::Buy, dec!(20), dec!(100), 10),
            tx("c", "AAPL", ActionType::Buy, dec!(35), dec!(100), 10),
        ]);
        assert_eq!(result.transactions.len(), 3);
    }

    #[test]
    fn test_different_timestamps_never_grouped() {
        let result = dedup(vec![
            tx("a", "AAPL", ActionType::Buy, dec!(10), dec!(100), 10),
            tx("b", "AAPL", ActionType::Buy, dec!(10), dec!(100), 11),
        ]);
        assert_eq!(result.transactions.len(), 2);
    }

    #[test]
    fn test_dividends_pass_through_untouched() {
        let result = dedup(vec![
            tx("a", "AAPL", ActionType::Dividend, dec!(10), dec!(1), 10),
            tx("b", "AAPL", ActionType::Dividend, dec!(10), dec!(1), 10),
        ]);
        assert_eq!(result.transactions.len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let input = vec![
            tx("a", "VWCE.DE", ActionType::Buy, dec!(16), dec!(98), 10),
            tx("b", "VWCE.DE", ActionType::Buy, dec!(7), dec!(98), 10),
            tx("c", "VWCE.DE", ActionType::Buy, dec!(23), dec!(98), 10),
            tx("d", "MSFT", ActionType::Sell, dec!(5), dec!(300), 12),
            tx("d", "MSFT", ActionType::Sell, dec!(5), dec!(300), 12),
        ];
        let once = dedup(input);
        let ids_once: Vec<String> = once.transactions.iter().map(|t| t.id.clone()).collect();
        let twice = dedup(once.transactions);
        let ids_twice: Vec<String> = twice.transactions.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids_once, ids_twice);
    }
}
