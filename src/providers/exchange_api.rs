use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::ForexProviderConfig;
use crate::core::error::{Error, Result};
use crate::core::forex::{ForexQuote, Granularity, RatePoint, RateProvider, RateSeries};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the upstream exchange-rate API. One instance per
/// process; no retries, the caller decides what a failure means.
pub struct ExchangeApiProvider {
    exchange_url: String,
    timeseries_url: String,
    timeseries_intraday_url: String,
    client: reqwest::Client,
}

impl ExchangeApiProvider {
    pub fn new(config: &ForexProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxd/1.0")
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(ExchangeApiProvider {
            exchange_url: config.exchange_url.clone(),
            timeseries_url: config.timeseries_url.clone(),
            timeseries_intraday_url: config.timeseries_intraday_url.clone(),
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("Requesting forex data from {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::FetchFailed(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let text = response.text().await?;
        let data = serde_json::from_str(&text)?;
        Ok(data)
    }
}

#[derive(Deserialize, Debug)]
struct ExchangeRateResponse {
    #[serde(alias = "exchangeRate")]
    exchange_rate: f64,
    #[serde(alias = "bidPrice")]
    bid_price: f64,
    #[serde(alias = "askPrice")]
    ask_price: f64,
}

#[derive(Deserialize, Debug)]
struct TimeSeriesResponse {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(alias = "timeSeries", default)]
    series: Vec<TimeSeriesPoint>,
}

#[derive(Deserialize, Debug)]
struct TimeSeriesPoint {
    #[serde(alias = "date")]
    timestamp: String,
    #[serde(alias = "close", alias = "exchangeRate")]
    rate: f64,
}

#[async_trait]
impl RateProvider for ExchangeApiProvider {
    #[instrument(name = "ForexQuoteFetch", skip(self), fields(from = %from, to = %to))]
    async fn fetch_quote(&self, from: &str, to: &str) -> Result<ForexQuote> {
        let url = format!(
            "{}?from_currency={}&to_currency={}",
            self.exchange_url, from, to
        );
        let data: ExchangeRateResponse = self.get_json(&url).await?;

        Ok(ForexQuote {
            exchange_rate: data.exchange_rate,
            bid: data.bid_price,
            ask: data.ask_price,
        })
    }

    async fn fetch_series(
        &self,
        from: &str,
        to: &str,
        granularity: Granularity,
    ) -> Result<RateSeries> {
        // Intraday granularities hit a separate endpoint with an
        // `interval` parameter; calendar ones use `time_series`.
        let url = if granularity.is_intraday() {
            format!(
                "{}?from_currency={}&to_currency={}&interval={}",
                self.timeseries_intraday_url,
                from,
                to,
                granularity.value()
            )
        } else {
            format!(
                "{}?from_currency={}&to_currency={}&time_series={}",
                self.timeseries_url,
                from,
                to,
                granularity.value()
            )
        };

        let data: TimeSeriesResponse = self.get_json(&url).await?;
        Ok(RateSeries {
            symbol: data
                .symbol
                .unwrap_or_else(|| format!("{from}/{to}")),
            points: data
                .series
                .into_iter()
                .map(|p| RatePoint {
                    timestamp: p.timestamp,
                    rate: p.rate,
                })
                .collect(),
        })
    }
}
