use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rates_errors::RateError;

/// Domain model for one cached reference rate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCacheEntry {
    pub currency: String,
    pub rate_date: NaiveDate,
    pub mid_rate: Decimal,
}

/// Database model for the rate cache.
///
/// The mid-rate is persisted as text so the decimal survives round trips
/// without binary-float drift.
#[derive(Queryable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::fx_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateCacheEntryDB {
    pub currency: String,
    pub rate_date: NaiveDate,
    pub mid_rate: String,
    pub created_at: NaiveDateTime,
}

impl RateCacheEntryDB {
    pub fn from_entry(entry: &RateCacheEntry) -> Self {
        RateCacheEntryDB {
            currency: entry.currency.to_uppercase(),
            rate_date: entry.rate_date,
            mid_rate: entry.mid_rate.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn into_entry(self) -> Result<RateCacheEntry, RateError> {
        let mid_rate = Decimal::from_str(&self.mid_rate).map_err(|e| {
            RateError::DatabaseError(format!(
                "Corrupt mid_rate '{}' for {} on {}: {}",
                self.mid_rate, self.currency, self.rate_date, e
            ))
        })?;
        Ok(RateCacheEntry {
            currency: self.currency,
            rate_date: self.rate_date,
            mid_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_db_row_round_trip() {
        let entry = RateCacheEntry {
            currency: "usd".to_string(),
            rate_date: NaiveDate::from_ymd_opt(2023, 5, 31).unwrap(),
            mid_rate: dec!(4.1234),
        };
        let row = RateCacheEntryDB::from_entry(&entry);
        assert_eq!(row.currency, "USD");
        assert_eq!(row.mid_rate, "4.1234");
        let back = row.into_entry().unwrap();
        assert_eq!(back.mid_rate, dec!(4.1234));
    }
}

/// One day of provider table data: every quoted currency and its mid-rate
#[derive(Debug, Clone)]
pub struct RateTable {
    pub effective_date: NaiveDate,
    pub rates: Vec<(String, Decimal)>,
}
