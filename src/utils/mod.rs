pub mod rounding;

pub use rounding::{round_money, round_to_whole_pln};
