//! FIFO matching engine for capital gains.
//!
//! Keeps two queues per symbol: buy lots awaiting sells and short lots
//! awaiting covering buys. Sells consume the oldest buy lots first; buys
//! cover the oldest shorts first. The engine itself never fails, since
//! malformed records are rejected upstream; it only emits warnings for
//! coverage gaps.

use std::collections::{BTreeMap, VecDeque};

use rust_decimal::Decimal;

use crate::transactions::{ActionType, NormalizedTransaction};
use crate::utils::round_money;

use super::fifo_model::{FifoMatch, FifoResult, Lot, ShortLot};

pub struct FifoEngine;

impl FifoEngine {
    /// Process all BUY/SELL transactions across all history and produce FIFO
    /// matches, coverage warnings and the remaining open lots.
    ///
    /// Transactions must already be rate-enriched; any other action type is
    /// ignored here.
    pub fn process(&self, transactions: &[NormalizedTransaction]) -> FifoResult {
        let mut result = FifoResult::default();

        let mut trades: Vec<&NormalizedTransaction> = transactions
            .iter()
            .filter(|t| matches!(t.action, ActionType::Buy | ActionType::Sell))
            .collect();
        trades.sort_by_key(|t| t.trade_date);

        // BTreeMap keeps end-of-run iteration deterministic by symbol
        let mut buy_queues: BTreeMap<String, VecDeque<Lot>> = BTreeMap::new();
        let mut short_queues: BTreeMap<String, VecDeque<ShortLot>> = BTreeMap::new();

        for tx in trades {
            match tx.action {
                ActionType::Buy => {
                    let mut buy_remaining = tx.quantity;

                    // Cover pending shorts first, oldest short first
                    if let Some(short_queue) = short_queues.get_mut(&tx.symbol) {
                        while buy_remaining > Decimal::ZERO {
                            let Some(short_lot) = short_queue.front_mut() else {
                                break;
                            };
                            let matched = buy_remaining.min(short_lot.remaining_quantity);

                            let mut m = create_match(
                                matched,
                                tx,
                                &short_lot.transaction,
                                tx.quantity,
                                short_lot.transaction.quantity,
                            );
                            m.is_short = true;
                            result.matches.push(m);

                            short_lot.remaining_quantity -= matched;
                            buy_remaining -= matched;

                            if short_lot.remaining_quantity <= Decimal::ZERO {
                                short_queue.pop_front();
                            }
                        }
                    }

                    if buy_remaining > Decimal::ZERO {
                        buy_queues
                            .entry(tx.symbol.clone())
                            .or_default()
                            .push_back(Lot {
                                transaction: tx.clone(),
                                remaining_quantity: buy_remaining,
                            });
                    }
                }
                ActionType::Sell => {
                    let mut sell_remaining = tx.quantity;

                    if let Some(queue) = buy_queues.get_mut(&tx.symbol) {
                        while sell_remaining > Decimal::ZERO {
                            let Some(lot) = queue.front_mut() else {
                                break;
                            };
                            let matched = sell_remaining.min(lot.remaining_quantity);

                            result.matches.push(create_match(
                                matched,
                                &lot.transaction,
                                tx,
                                lot.transaction.quantity,
                                tx.quantity,
                            ));

                            lot.remaining_quantity -= matched;
                            sell_remaining -= matched;

                            if lot.remaining_quantity <= Decimal::ZERO {
                                queue.pop_front();
                            }
                        }
                    }

                    // Unmatched sell quantity opens a short position
                    if sell_remaining > Decimal::ZERO {
                        short_queues
                            .entry(tx.symbol.clone())
                            .or_default()
                            .push_back(ShortLot {
                                transaction: tx.clone(),
                                remaining_quantity: sell_remaining,
                            });
                    }
                }
                _ => unreachable!("filtered to Buy/Sell above"),
            }
        }

        // Shorts never covered by any buy are orphans: the revenue is still
        // taxable even without proof of an offsetting purchase.
        for (symbol, queue) in &short_queues {
            for lot in queue {
                if lot.remaining_quantity > Decimal::ZERO {
                    result.matches.push(create_orphan_match(
                        lot.remaining_quantity,
                        &lot.transaction,
                        lot.transaction.quantity,
                    ));
                    result.warnings.push(format!(
                        "MISSING BUY: no purchase found for {} (sale of {} on {}). Included with cost basis 0 PLN. Upload statements from earlier years or add the missing buy manually.",
                        symbol,
                        lot.remaining_quantity,
                        lot.transaction.trade_date.date(),
                    ));
                }
            }
        }

        result.open_short_lots = short_queues
            .into_iter()
            .filter_map(|(symbol, queue)| {
                let remaining: Vec<ShortLot> = queue
                    .into_iter()
                    .filter(|lot| lot.remaining_quantity > Decimal::ZERO)
                    .collect();
                (!remaining.is_empty()).then_some((symbol, remaining))
            })
            .collect();

        result.open_lots = buy_queues
            .into_iter()
            .filter_map(|(symbol, queue)| {
                let remaining: Vec<Lot> = queue
                    .into_iter()
                    .filter(|lot| lot.remaining_quantity > Decimal::ZERO)
                    .collect();
                (!remaining.is_empty()).then_some((symbol, remaining))
            })
            .collect();

        result
    }
}

/// Build a match for `quantity` between a buy and a sell.
///
/// Commission is allocated proportionally to the matched share of each
/// side's total quantity, rounded half-up per side before conversion.
fn create_match(
    quantity: Decimal,
    buy_tx: &NormalizedTransaction,
    sell_tx: &NormalizedTransaction,
    buy_total_quantity: Decimal,
    sell_total_quantity: Decimal,
) -> FifoMatch {
    let buy_rate = buy_tx.fx_rate.unwrap_or(Decimal::ONE);
    let sell_rate = sell_tx.fx_rate.unwrap_or(Decimal::ONE);

    let buy_commission_share =
        round_money(buy_tx.commission * quantity / buy_total_quantity);
    let sell_commission_share =
        round_money(sell_tx.commission * quantity / sell_total_quantity);

    let buy_cost_pln =
        round_money((buy_tx.price * quantity + buy_commission_share) * buy_rate);
    let sell_revenue_pln =
        round_money((sell_tx.price * quantity - sell_commission_share) * sell_rate);

    FifoMatch {
        symbol: sell_tx.symbol.clone(),
        quantity,
        buy_date: buy_tx.trade_date,
        buy_settlement_date: buy_tx.settlement_date,
        buy_price: buy_tx.price,
        buy_currency: buy_tx.currency.clone(),
        buy_commission: buy_commission_share,
        buy_fx_rate: buy_rate,
        buy_cost_pln,
        sell_date: sell_tx.trade_date,
        sell_settlement_date: sell_tx.settlement_date,
        sell_price: sell_tx.price,
        sell_currency: sell_tx.currency.clone(),
        sell_commission: sell_commission_share,
        sell_fx_rate: sell_rate,
        sell_revenue_pln,
        profit_pln: sell_revenue_pln - buy_cost_pln,
        is_orphan: false,
        is_short: false,
    }
}

/// Build a match for an orphan sell: revenue computed normally, cost 0.
fn create_orphan_match(
    quantity: Decimal,
    sell_tx: &NormalizedTransaction,
    sell_total_quantity: Decimal,
) -> FifoMatch {
    let sell_rate = sell_tx.fx_rate.unwrap_or(Decimal::ONE);
    let sell_commission_share =
        round_money(sell_tx.commission * quantity / sell_total_quantity);
    let sell_revenue_pln =
        round_money((sell_tx.price * quantity - sell_commission_share) * sell_rate);

    FifoMatch {
        symbol: sell_tx.symbol.clone(),
        quantity,
        // No buy exists; the sell side stands in for date fields
        buy_date: sell_tx.trade_date,
        buy_settlement_date: sell_tx.settlement_date,
        buy_price: Decimal::ZERO,
        buy_currency: sell_tx.currency.clone(),
        buy_commission: Decimal::ZERO,
        buy_fx_rate: Decimal::ZERO,
        buy_cost_pln: Decimal::ZERO,
        sell_date: sell_tx.trade_date,
        sell_settlement_date: sell_tx.settlement_date,
        sell_price: sell_tx.price,
        sell_currency: sell_tx.currency.clone(),
        sell_commission: sell_commission_share,
        sell_fx_rate: sell_rate,
        sell_revenue_pln,
        profit_pln: sell_revenue_pln,
        is_orphan: true,
        is_short: false,
    }
}
