pub(crate) mod dedup_service;

pub use dedup_service::{dedup, DedupResult};
