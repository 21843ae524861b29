use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::db::{get_connection, DbPool};
use crate::schema::fx_rates;

use super::rates_errors::RateError;
use super::rates_model::{RateCacheEntry, RateCacheEntryDB};
use super::rates_traits::RateRepositoryTrait;

pub struct RateRepository {
    pool: Arc<DbPool>,
}

impl RateRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl RateRepositoryTrait for RateRepository {
    fn get_rate(&self, currency: &str, date: NaiveDate) -> Result<Option<Decimal>, RateError> {
        let mut conn = get_connection(&self.pool)?;

        let row = fx_rates::table
            .filter(fx_rates::currency.eq(currency.to_uppercase()))
            .filter(fx_rates::rate_date.eq(date))
            .select(fx_rates::mid_rate)
            .first::<String>(&mut conn)
            .optional()?;

        match row {
            Some(raw) => Decimal::from_str(&raw)
                .map(Some)
                .map_err(|e| {
                    RateError::DatabaseError(format!(
                        "Corrupt mid_rate '{}' for {} on {}: {}",
                        raw, currency, date, e
                    ))
                }),
            None => Ok(None),
        }
    }

    fn upsert_rate(&self, entry: &RateCacheEntry) -> Result<(), RateError> {
        let mut conn = get_connection(&self.pool)?;
        upsert_one(&mut conn, entry)
    }

    fn upsert_rates(&self, entries: &[RateCacheEntry]) -> Result<(), RateError> {
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, RateError, _>(|conn| {
            for entry in entries {
                upsert_one(conn, entry)?;
            }
            Ok(())
        })
    }
}

fn upsert_one(conn: &mut SqliteConnection, entry: &RateCacheEntry) -> Result<(), RateError> {
    let row = RateCacheEntryDB::from_entry(entry);

    diesel::insert_into(fx_rates::table)
        .values(&row)
        .on_conflict((fx_rates::currency, fx_rates::rate_date))
        .do_update()
        .set(fx_rates::mid_rate.eq(&row.mid_rate))
        .execute(conn)
        .map_err(|e| {
            log::error!(
                "Failed to upsert rate {} {} = {}: {}",
                row.currency,
                row.rate_date,
                row.mid_rate,
                e
            );
            RateError::SaveError(e.to_string())
        })?;

    Ok(())
}
