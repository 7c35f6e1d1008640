use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;

use crate::core::error::Result;
use crate::core::forex::{Currency, Forex};
use crate::core::options::{OptionContract, OptionFilter, Stock};
use crate::store::{CurrencyRepository, ForexRepository, OptionRepository, StockRepository};

/// Opens the keyspace backing all disk repositories. One partition per
/// entity, values stored as serde_json.
pub fn open_keyspace(path: &Path) -> Result<Keyspace> {
    std::fs::create_dir_all(path)
        .map_err(|e| crate::core::Error::PersistenceFailed(e.to_string()))?;
    Ok(fjall::Config::new(path).open()?)
}

fn partition(keyspace: &Keyspace, name: &str) -> Result<PartitionHandle> {
    Ok(keyspace.open_partition(name, PartitionCreateOptions::default())?)
}

pub struct DiskCurrencyRepository {
    partition: PartitionHandle,
}

impl DiskCurrencyRepository {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(Self {
            partition: partition(keyspace, "currencies")?,
        })
    }
}

#[async_trait]
impl CurrencyRepository for DiskCurrencyRepository {
    async fn find_all(&self) -> Result<Vec<Currency>> {
        let mut currencies = Vec::new();
        for entry in self.partition.iter() {
            let (_key, value) = entry?;
            currencies.push(serde_json::from_slice(&value)?);
        }
        Ok(currencies)
    }

    async fn save_all(&self, currencies: &[Currency]) -> Result<()> {
        for currency in currencies {
            self.partition
                .insert(currency.code.as_bytes(), serde_json::to_vec(currency)?)?;
        }
        Ok(())
    }
}

pub struct DiskForexRepository {
    partition: PartitionHandle,
}

impl DiskForexRepository {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(Self {
            partition: partition(keyspace, "forex")?,
        })
    }
}

#[async_trait]
impl ForexRepository for DiskForexRepository {
    async fn find_all(&self) -> Result<Vec<Forex>> {
        // Partition iteration is key-ordered, so results come back
        // sorted by symbol.
        let mut forexes = Vec::new();
        for entry in self.partition.iter() {
            let (_key, value) = entry?;
            forexes.push(serde_json::from_slice(&value)?);
        }
        Ok(forexes)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Forex>> {
        match self.partition.get(symbol.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, forex: &Forex) -> Result<()> {
        self.partition
            .insert(forex.symbol.as_bytes(), serde_json::to_vec(forex)?)?;
        Ok(())
    }

    async fn save_all(&self, forexes: &[Forex]) -> Result<()> {
        for forex in forexes {
            self.save(forex).await?;
        }
        Ok(())
    }
}

pub struct DiskStockRepository {
    partition: PartitionHandle,
}

impl DiskStockRepository {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(Self {
            partition: partition(keyspace, "stocks")?,
        })
    }
}

#[async_trait]
impl StockRepository for DiskStockRepository {
    async fn find_all(&self) -> Result<Vec<Stock>> {
        let mut stocks = Vec::new();
        for entry in self.partition.iter() {
            let (_key, value) = entry?;
            stocks.push(serde_json::from_slice(&value)?);
        }
        Ok(stocks)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Stock>> {
        match self.partition.get(symbol.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn save_all(&self, stocks: &[Stock]) -> Result<()> {
        for stock in stocks {
            self.partition
                .insert(stock.symbol.as_bytes(), serde_json::to_vec(stock)?)?;
        }
        Ok(())
    }
}

pub struct DiskOptionRepository {
    partition: PartitionHandle,
}

impl DiskOptionRepository {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(Self {
            partition: partition(keyspace, "options")?,
        })
    }

    /// Contract ids start with `{symbol}|`, so one symbol's contracts
    /// form a contiguous key range.
    fn symbol_prefix(symbol: &str) -> String {
        format!("{symbol}|")
    }
}

#[async_trait]
impl OptionRepository for DiskOptionRepository {
    async fn find(&self, filter: &OptionFilter) -> Result<Vec<OptionContract>> {
        let mut contracts = Vec::new();
        for entry in self.partition.prefix(Self::symbol_prefix(&filter.symbol)) {
            let (_key, value) = entry?;
            let contract: OptionContract = serde_json::from_slice(&value)?;
            if filter.matches(&contract) {
                contracts.push(contract);
            }
        }
        Ok(contracts)
    }

    async fn save_all(&self, contracts: &[OptionContract]) -> Result<()> {
        for contract in contracts {
            self.partition
                .insert(contract.id().as_bytes(), serde_json::to_vec(contract)?)?;
        }
        Ok(())
    }

    async fn replace_for_symbol(&self, symbol: &str, contracts: &[OptionContract]) -> Result<()> {
        let mut stale_keys = Vec::new();
        for entry in self.partition.prefix(Self::symbol_prefix(symbol)) {
            let (key, _value) = entry?;
            stale_keys.push(key);
        }
        for key in stale_keys {
            self.partition.remove(key)?;
        }
        self.save_all(contracts).await
    }
}
