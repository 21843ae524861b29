//! NBP Table A client.
//!
//! The API publishes mid-rates only for Polish business days; a 404 on a
//! weekend or holiday carries no information and maps to `Ok(None)`.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::rates_errors::RateError;
use super::rates_model::RateTable;
use super::rates_traits::RateProviderTrait;

const NBP_API_BASE: &str = "https://api.nbp.pl/api/exchangerates";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize, Debug)]
struct SingleRateResponse {
    rates: Vec<SingleRateEntry>,
}

#[derive(Deserialize, Debug)]
struct SingleRateEntry {
    mid: Decimal,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TableResponse {
    effective_date: NaiveDate,
    rates: Vec<TableRateEntry>,
}

#[derive(Deserialize, Debug)]
struct TableRateEntry {
    code: String,
    mid: Decimal,
}

pub struct NbpProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NbpProvider {
    pub fn new() -> Result<Self, RateError> {
        Self::with_base_url(NBP_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RateError::FetchError(e.to_string()))?;

        Ok(NbpProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, RateError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RateError::FetchError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(|e| RateError::FetchError(e.to_string()))?;

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| RateError::FetchError(e.to_string()))
    }
}

#[async_trait]
impl RateProviderTrait for NbpProvider {
    async fn fetch_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, RateError> {
        let url = format!(
            "{}/rates/A/{}/{}/",
            self.base_url,
            currency.to_uppercase(),
            date.format("%Y-%m-%d")
        );

        log::debug!("Fetching NBP rate: {}", url);
        let response: Option<SingleRateResponse> = self.get_json(&url).await?;

        Ok(response.and_then(|r| r.rates.first().map(|e| e.mid)))
    }

    async fn fetch_tables(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateTable>, RateError> {
        let url = format!(
            "{}/tables/A/{}/{}/",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        log::debug!("Fetching NBP tables: {}", url);
        let response: Option<Vec<TableResponse>> = self.get_json(&url).await?;

        Ok(response
            .unwrap_or_default()
            .into_iter()
            .map(|table| RateTable {
                effective_date: table.effective_date,
                rates: table
                    .rates
                    .into_iter()
                    .map(|entry| (entry.code.to_uppercase(), entry.mid))
                    .collect(),
            })
            .collect())
    }
}
