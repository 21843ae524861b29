use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::constants::MONETARY_DECIMAL_PRECISION;

/// Round a monetary amount to the reporting currency's minor unit
/// (grosze), half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        MONETARY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Round to a whole złoty as the Ordynacja Podatkowa requires:
/// `floor(x + 0.5)`, so .50 always rounds up, never to even.
pub fn round_to_whole_pln(value: Decimal) -> Decimal {
    (value + dec!(0.5)).floor()
}
