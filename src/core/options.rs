//! Option chain domain types and provider abstractions

use async_trait::async_trait;
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::error::Result;

/// An underlying equity. Read-only input to option aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionType {
    Call,
    Put,
}

impl Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CALL" => Ok(OptionType::Call),
            "PUT" => Ok(OptionType::Put),
            _ => Err(anyhow::anyhow!("Invalid option type: {}", s)),
        }
    }
}

/// One flattened option contract from an ingested chain. The ask, bid
/// and price fields are projections filled at aggregation time from
/// the underlying stock, not intrinsic contract data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: String,
    pub strike: f64,
    pub option_type: OptionType,
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub ask: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub price: f64,
}

impl OptionContract {
    pub fn new(
        symbol: &str,
        strike: f64,
        option_type: OptionType,
        expiration_date: NaiveDate,
    ) -> Self {
        OptionContract {
            symbol: symbol.to_string(),
            strike,
            option_type,
            expiration_date,
            ask: 0.0,
            bid: 0.0,
            price: 0.0,
        }
    }

    /// Store key. Strike bits keep distinct f64 strikes distinct.
    pub fn id(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.symbol,
            self.option_type,
            self.strike.to_bits(),
            self.expiration_date
        )
    }
}

/// Exact-match grouping key for aggregation: no tolerance on strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionGroupKey {
    pub strike: OrderedFloat<f64>,
    pub option_type: OptionType,
}

impl OptionGroupKey {
    pub fn of(contract: &OptionContract) -> Self {
        OptionGroupKey {
            strike: OrderedFloat(contract.strike),
            option_type: contract.option_type,
        }
    }
}

/// Criteria for selecting raw contracts before aggregation.
#[derive(Debug, Clone, Default)]
pub struct OptionFilter {
    pub symbol: String,
    pub option_type: Option<OptionType>,
    pub expiration_date: Option<NaiveDate>,
}

impl OptionFilter {
    pub fn for_symbol(symbol: &str) -> Self {
        OptionFilter {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    pub fn matches(&self, contract: &OptionContract) -> bool {
        contract.symbol == self.symbol
            && self.option_type.is_none_or(|t| t == contract.option_type)
            && self
                .expiration_date
                .is_none_or(|d| d == contract.expiration_date)
    }
}

/// One aggregated row per (strike, type) group. Computed per query,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct OptionSummary {
    pub symbol: String,
    pub strike: f64,
    pub option_type: OptionType,
    pub expiration_date: NaiveDate,
    pub open_interest: usize,
    pub ask: f64,
    pub bid: f64,
    pub price: f64,
}

#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Fetches the full chain for an underlying and flattens it into
    /// one contract per call/put entry.
    async fn fetch_chain(&self, symbol: &str) -> Result<Vec<OptionContract>>;
}
