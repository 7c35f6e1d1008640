use async_trait::async_trait;
use chrono::{Local, TimeZone};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::OptionsProviderConfig;
use crate::core::error::{Error, Result};
use crate::core::options::{ChainProvider, OptionContract, OptionType};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the Yahoo option-chain endpoint. Flattens the nested
/// chain payload into one contract per call/put entry.
pub struct YahooOptionsProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooOptionsProvider {
    pub fn new(config: &OptionsProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxd/1.0")
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(YahooOptionsProvider {
            base_url: config.base_url.clone(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct ChainResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChain,
}

#[derive(Deserialize, Debug)]
struct OptionChain {
    result: Vec<ChainResult>,
}

#[derive(Deserialize, Debug)]
struct ChainResult {
    #[serde(rename = "underlyingSymbol")]
    underlying_symbol: String,
    #[serde(default)]
    options: Vec<OptionDateGroup>,
}

#[derive(Deserialize, Debug)]
struct OptionDateGroup {
    #[serde(default)]
    calls: Vec<ContractEntry>,
    #[serde(default)]
    puts: Vec<ContractEntry>,
}

#[derive(Deserialize, Debug)]
struct ContractEntry {
    strike: f64,
    /// Epoch milliseconds.
    expiration: i64,
}

/// Converts an epoch-millisecond expiration into the calendar date it
/// falls on in the local time zone.
fn expiration_date(epoch_ms: i64) -> Result<chrono::NaiveDate> {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::DecodeFailed(format!("expiration out of range: {epoch_ms}")))
}

fn flatten_chain(response: ChainResponse) -> Result<Vec<OptionContract>> {
    let mut contracts = Vec::new();

    for group in response.option_chain.result {
        let symbol = group.underlying_symbol;
        for dated in group.options {
            for call in dated.calls {
                contracts.push(OptionContract::new(
                    &symbol,
                    call.strike,
                    OptionType::Call,
                    expiration_date(call.expiration)?,
                ));
            }
            for put in dated.puts {
                contracts.push(OptionContract::new(
                    &symbol,
                    put.strike,
                    OptionType::Put,
                    expiration_date(put.expiration)?,
                ));
            }
        }
    }

    Ok(contracts)
}

#[async_trait]
impl ChainProvider for YahooOptionsProvider {
    #[instrument(name = "OptionChainFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_chain(&self, symbol: &str) -> Result<Vec<OptionContract>> {
        let url = format!("{}/{}", self.base_url, symbol);
        debug!("Requesting option chain from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::FetchFailed(format!(
                "HTTP {} for chain {}",
                response.status(),
                symbol
            )));
        }

        let text = response.text().await?;
        let chain: ChainResponse = serde_json::from_str(&text)?;
        flatten_chain(chain)
    }
}
