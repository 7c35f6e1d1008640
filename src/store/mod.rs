pub mod disk;
pub mod memory;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::forex::{Currency, Forex};
use crate::core::options::{OptionContract, OptionFilter, Stock};

/// Repository over seeded currencies. Codes are unique.
#[async_trait]
pub trait CurrencyRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Currency>>;
    async fn save_all(&self, currencies: &[Currency]) -> Result<()>;
}

/// Repository over forex pair records, keyed by symbol.
#[async_trait]
pub trait ForexRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Forex>>;
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Forex>>;
    async fn save(&self, forex: &Forex) -> Result<()>;
    async fn save_all(&self, forexes: &[Forex]) -> Result<()>;
}

/// Repository over underlying stocks, keyed by symbol.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Stock>>;
    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Stock>>;
    async fn save_all(&self, stocks: &[Stock]) -> Result<()>;
}

/// Repository over flattened option contracts.
#[async_trait]
pub trait OptionRepository: Send + Sync {
    async fn find(&self, filter: &OptionFilter) -> Result<Vec<OptionContract>>;
    async fn save_all(&self, contracts: &[OptionContract]) -> Result<()>;
    /// Replaces every stored contract for `symbol` with the given
    /// snapshot. Used by chain ingestion so re-ingestion does not
    /// accumulate duplicates.
    async fn replace_for_symbol(&self, symbol: &str, contracts: &[OptionContract]) -> Result<()>;
}

pub use disk::{
    DiskCurrencyRepository, DiskForexRepository, DiskOptionRepository, DiskStockRepository,
    open_keyspace,
};
pub use memory::{
    MemoryCurrencyRepository, MemoryForexRepository, MemoryOptionRepository,
    MemoryStockRepository,
};
