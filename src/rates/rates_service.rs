use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::constants::{MAX_RATE_LOOKBACK_ATTEMPTS, RATE_FETCH_WINDOW_DAYS, REPORTING_CURRENCY};
use crate::transactions::NormalizedTransaction;
use crate::utils::round_money;

use super::calendar::previous_business_day;
use super::rates_errors::RateError;
use super::rates_model::RateCacheEntry;
use super::rates_traits::{RateProviderTrait, RateRepositoryTrait};

/// Resolves reference rates for settlement dates.
///
/// The rate for a transaction is the mid-rate published on the business day
/// strictly before its settlement date. Lookups hit the persistent cache
/// first, then the remote provider, stepping backwards over non-publishing
/// days up to a bounded number of attempts.
pub struct RateService {
    repository: Arc<dyn RateRepositoryTrait>,
    provider: Arc<dyn RateProviderTrait>,
}

impl RateService {
    pub fn new(
        repository: Arc<dyn RateRepositoryTrait>,
        provider: Arc<dyn RateProviderTrait>,
    ) -> Self {
        Self {
            repository,
            provider,
        }
    }

    /// Mid-rate for `currency` on the business day preceding
    /// `settlement_date`. Returns the rate and the calendar date it was
    /// actually published for.
    ///
    /// The reporting currency converts at 1.0 with no lookup. Exhausting the
    /// backward search is a hard `RateError::Unavailable`; no default rate is
    /// ever substituted.
    pub async fn get_rate(
        &self,
        currency: &str,
        settlement_date: NaiveDate,
    ) -> Result<(Decimal, NaiveDate), RateError> {
        let currency = currency.to_uppercase();
        if currency == REPORTING_CURRENCY {
            return Ok((Decimal::ONE, settlement_date));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RateError::InvalidCurrencyCode(currency));
        }

        let mut candidate = previous_business_day(settlement_date);

        for _ in 0..MAX_RATE_LOOKBACK_ATTEMPTS {
            if let Some(rate) = self.repository.get_rate(&currency, candidate)? {
                return Ok((rate, candidate));
            }

            match self.provider.fetch_rate(&currency, candidate).await {
                Ok(Some(rate)) => {
                    self.repository.upsert_rate(&RateCacheEntry {
                        currency: currency.clone(),
                        rate_date: candidate,
                        mid_rate: rate,
                    })?;
                    return Ok((rate, candidate));
                }
                Ok(None) => {}
                Err(e) => {
                    // Transient provider trouble: log and keep stepping back,
                    // an earlier date may already be cached or fetchable.
                    log::warn!("Rate fetch failed for {} on {}: {}", currency, candidate, e);
                }
            }

            candidate = previous_business_day(candidate);
        }

        Err(RateError::Unavailable {
            currency,
            date: settlement_date,
            attempts: MAX_RATE_LOOKBACK_ATTEMPTS,
        })
    }

    /// Pre-fetch and cache the whole calendar year of provider tables in
    /// windows of at most `RATE_FETCH_WINDOW_DAYS` days.
    ///
    /// Future windows are skipped; a failed window is logged and skipped,
    /// costing only extra per-date lookups later. Returns the number of
    /// tables cached.
    pub async fn prefetch_year(&self, year: i32) -> Result<usize, RateError> {
        let today = Utc::now().date_naive();
        let year_start = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid year start");
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");

        if year_start > today {
            log::debug!("Skipping rate prefetch for future year {}", year);
            return Ok(0);
        }
        let year_end = year_end.min(today);

        let mut cached_tables = 0;
        let mut window_start = year_start;
        while window_start <= year_end {
            let window_end = (window_start + Duration::days(RATE_FETCH_WINDOW_DAYS - 1)).min(year_end);

            match self.provider.fetch_tables(window_start, window_end).await {
                Ok(tables) => {
                    for table in &tables {
                        let entries: Vec<RateCacheEntry> = table
                            .rates
                            .iter()
                            .map(|(code, mid)| RateCacheEntry {
                                currency: code.clone(),
                                rate_date: table.effective_date,
                                mid_rate: *mid,
                            })
                            .collect();
                        self.repository.upsert_rates(&entries)?;
                    }
                    cached_tables += tables.len();
                }
                Err(e) => {
                    log::warn!(
                        "Failed to prefetch rate tables {}..{}: {}",
                        window_start,
                        window_end,
                        e
                    );
                }
            }

            window_start = window_end + Duration::days(1);
        }

        log::info!("Cached {} rate tables for year {}", cached_tables, year);
        Ok(cached_tables)
    }

    /// Enrich every transaction with its resolved rate, rate date and
    /// PLN amounts. Commission in a third currency converts at its own rate.
    ///
    /// Returns informational warnings (prefetch hiccups). A transaction whose
    /// rate cannot be resolved fails the whole enrichment.
    pub async fn enrich(
        &self,
        transactions: &mut [NormalizedTransaction],
    ) -> Result<Vec<String>, RateError> {
        let mut warnings = Vec::new();

        let years: BTreeSet<i32> = transactions
            .iter()
            .map(|t| t.settlement_date.year())
            .collect();
        for year in years {
            if let Err(e) = self.prefetch_year(year).await {
                log::warn!("Rate prefetch for {} failed: {}", year, e);
                warnings.push(format!("Could not prefetch reference rates for {}: {}", year, e));
            }
        }

        for tx in transactions.iter_mut() {
            if tx.currency == REPORTING_CURRENCY {
                tx.fx_rate = Some(Decimal::ONE);
                tx.fx_rate_date = Some(tx.settlement_date);
                tx.amount_pln = Some(round_money(tx.price * tx.quantity));
                tx.commission_pln = Some(round_money(tx.commission));
                continue;
            }

            let (rate, rate_date) = self.get_rate(&tx.currency, tx.settlement_date).await?;
            tx.fx_rate = Some(rate);
            tx.fx_rate_date = Some(rate_date);
            tx.amount_pln = Some(round_money(tx.price * tx.quantity * rate));

            let commission_currency = tx
                .commission_currency
                .clone()
                .unwrap_or_else(|| tx.currency.clone());
            let commission_pln = if commission_currency == tx.currency {
                round_money(tx.commission * rate)
            } else if commission_currency == REPORTING_CURRENCY {
                round_money(tx.commission)
            } else {
                let (commission_rate, _) = self
                    .get_rate(&commission_currency, tx.settlement_date)
                    .await?;
                round_money(tx.commission * commission_rate)
            };
            tx.commission_pln = Some(commission_pln);
        }

        Ok(warnings)
    }
}
