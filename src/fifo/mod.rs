pub(crate) mod fifo_engine;
pub(crate) mod fifo_model;

pub use fifo_engine::FifoEngine;
pub use fifo_model::{FifoMatch, FifoResult, Lot, OpenPosition, ShortLot, ShortPosition};
