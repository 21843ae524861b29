use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::rates_errors::RateError;
use super::rates_model::{RateCacheEntry, RateTable};

/// Trait defining the contract for the persistent rate cache.
pub trait RateRepositoryTrait: Send + Sync {
    /// Exact-date lookup; `Ok(None)` when the date was never cached
    fn get_rate(&self, currency: &str, date: NaiveDate) -> Result<Option<Decimal>, RateError>;

    /// Idempotent upsert keyed by (currency, date); refreshing an existing
    /// key must not duplicate it
    fn upsert_rate(&self, entry: &RateCacheEntry) -> Result<(), RateError>;

    /// Transactional bulk upsert for prefetched tables
    fn upsert_rates(&self, entries: &[RateCacheEntry]) -> Result<(), RateError>;
}

/// Trait defining the contract for the remote reference-rate source.
#[async_trait]
pub trait RateProviderTrait: Send + Sync {
    /// Mid-rate for one currency on one calendar date.
    /// A non-trading day yields `Ok(None)`, never an error.
    async fn fetch_rate(&self, currency: &str, date: NaiveDate)
        -> Result<Option<Decimal>, RateError>;

    /// All published tables in a date range (provider-capped at ~93 days).
    /// An empty range yields `Ok(vec![])`.
    async fn fetch_tables(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateTable>, RateError>;
}
