//! Forex domain types and provider abstractions

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::error::Result;

/// A currency referenced by forex pairs. Identified by its code;
/// never owned by a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
}

impl Currency {
    pub fn new(code: &str) -> Self {
        Currency {
            code: code.to_string(),
        }
    }
}

/// A stored currency pair with its latest quote. Identified by
/// (from_code, to_code); `symbol` is the display form `"USD/EUR"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forex {
    pub symbol: String,
    pub from_code: String,
    pub to_code: String,
    pub exchange_rate: f64,
    pub bid: f64,
    pub ask: f64,
    pub last_refresh: DateTime<Utc>,
}

impl Forex {
    pub fn new(from: &Currency, to: &Currency, quote: &ForexQuote, now: DateTime<Utc>) -> Self {
        let mut forex = Forex {
            symbol: format!("{}/{}", from.code, to.code),
            from_code: from.code.clone(),
            to_code: to.code.clone(),
            exchange_rate: 0.0,
            bid: 0.0,
            ask: 0.0,
            last_refresh: now,
        };
        forex.apply_quote(quote);
        forex
    }

    /// Merges a fetched quote into this record. Only the quote-derived
    /// fields change; identity fields (symbol, currency codes) and
    /// `last_refresh` are left to the caller.
    pub fn apply_quote(&mut self, quote: &ForexQuote) {
        self.exchange_rate = quote.exchange_rate;
        self.bid = quote.bid;
        self.ask = quote.ask;
    }
}

/// A point-in-time exchange rate payload for a currency pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexQuote {
    pub exchange_rate: f64,
    pub bid: f64,
    pub ask: f64,
}

/// One bar of a time-series response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub timestamp: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSeries {
    pub symbol: String,
    pub points: Vec<RatePoint>,
}

/// Requested time-series granularity. Intraday values hit a separate
/// endpoint than the calendar ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    FiveMin,
    Hour,
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Wire value of the query parameter.
    pub fn value(&self) -> &'static str {
        match self {
            Granularity::FiveMin => "5min",
            Granularity::Hour => "60min",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self, Granularity::FiveMin | Granularity::Hour)
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "5min" => Ok(Granularity::FiveMin),
            "60min" | "hour" => Ok(Granularity::Hour),
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            _ => Err(anyhow::anyhow!("Invalid granularity: {}", s)),
        }
    }
}

/// Decides whether a record needs a refresh on the read path.
#[derive(Debug, Clone, Copy)]
pub struct StalenessPolicy {
    threshold: Duration,
}

impl StalenessPolicy {
    pub fn new(threshold: Duration) -> Self {
        StalenessPolicy { threshold }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    /// True iff the record is older than the threshold. A record aged
    /// exactly at the threshold is still fresh.
    pub fn is_stale(&self, last_refresh: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_refresh > self.threshold
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::from_minutes(15)
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_quote(&self, from: &str, to: &str) -> Result<ForexQuote>;
    async fn fetch_series(
        &self,
        from: &str,
        to: &str,
        granularity: Granularity,
    ) -> Result<RateSeries>;
}
