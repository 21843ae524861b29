use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use taxfolio_core::db::{self, DbPool};
use taxfolio_core::rates::{RateError, RateProviderTrait, RateTable};

/// Fresh on-disk SQLite database with migrations applied. The TempDir must
/// stay alive for the duration of the test.
pub fn test_db_pool() -> (TempDir, Arc<DbPool>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir
        .path()
        .join("taxfolio.db")
        .to_string_lossy()
        .into_owned();

    db::init(&db_path).expect("initialize database");
    let pool = db::create_pool(&db_path).expect("create pool");
    db::run_migrations(&pool).expect("run migrations");

    (dir, pool)
}

/// Provider stub quoting a single flat rate for every currency and date.
/// Bulk table fetches return nothing so every resolution goes through the
/// single-date path and lands in the cache.
pub struct FlatRateProvider {
    pub rate: Decimal,
}

#[async_trait]
impl RateProviderTrait for FlatRateProvider {
    async fn fetch_rate(
        &self,
        _currency: &str,
        _date: NaiveDate,
    ) -> Result<Option<Decimal>, RateError> {
        Ok(Some(self.rate))
    }

    async fn fetch_tables(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<RateTable>, RateError> {
        Ok(Vec::new())
    }
}
