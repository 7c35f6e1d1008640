use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::error::Result;
use crate::core::forex::{Currency, Forex};
use crate::core::options::{OptionContract, OptionFilter, Stock};
use crate::store::{CurrencyRepository, ForexRepository, OptionRepository, StockRepository};

/// In-memory repositories over a HashMap. Primary fixture for tests;
/// also the fallback when no data directory is available.

#[derive(Clone, Default)]
pub struct MemoryCurrencyRepository {
    inner: Arc<Mutex<HashMap<String, Currency>>>,
}

impl MemoryCurrencyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CurrencyRepository for MemoryCurrencyRepository {
    async fn find_all(&self) -> Result<Vec<Currency>> {
        let map = self.inner.lock().await;
        let mut currencies: Vec<_> = map.values().cloned().collect();
        currencies.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(currencies)
    }

    async fn save_all(&self, currencies: &[Currency]) -> Result<()> {
        let mut map = self.inner.lock().await;
        for currency in currencies {
            map.insert(currency.code.clone(), currency.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryForexRepository {
    inner: Arc<Mutex<HashMap<String, Forex>>>,
}

impl MemoryForexRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ForexRepository for MemoryForexRepository {
    async fn find_all(&self) -> Result<Vec<Forex>> {
        let map = self.inner.lock().await;
        let mut forexes: Vec<_> = map.values().cloned().collect();
        forexes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(forexes)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Forex>> {
        let map = self.inner.lock().await;
        Ok(map.get(symbol).cloned())
    }

    async fn save(&self, forex: &Forex) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.insert(forex.symbol.clone(), forex.clone());
        Ok(())
    }

    async fn save_all(&self, forexes: &[Forex]) -> Result<()> {
        let mut map = self.inner.lock().await;
        for forex in forexes {
            map.insert(forex.symbol.clone(), forex.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStockRepository {
    inner: Arc<Mutex<HashMap<String, Stock>>>,
}

impl MemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for MemoryStockRepository {
    async fn find_all(&self) -> Result<Vec<Stock>> {
        let map = self.inner.lock().await;
        let mut stocks: Vec<_> = map.values().cloned().collect();
        stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(stocks)
    }

    async fn find_by_symbol(&self, symbol: &str) -> Result<Option<Stock>> {
        let map = self.inner.lock().await;
        Ok(map.get(symbol).cloned())
    }

    async fn save_all(&self, stocks: &[Stock]) -> Result<()> {
        let mut map = self.inner.lock().await;
        for stock in stocks {
            map.insert(stock.symbol.clone(), stock.clone());
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryOptionRepository {
    inner: Arc<Mutex<HashMap<String, OptionContract>>>,
}

impl MemoryOptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionRepository for MemoryOptionRepository {
    async fn find(&self, filter: &OptionFilter) -> Result<Vec<OptionContract>> {
        let map = self.inner.lock().await;
        let mut contracts: Vec<_> = map
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        contracts.sort_by(|a, b| a.id().cmp(&b.id()));
        Ok(contracts)
    }

    async fn save_all(&self, contracts: &[OptionContract]) -> Result<()> {
        let mut map = self.inner.lock().await;
        for contract in contracts {
            map.insert(contract.id(), contract.clone());
        }
        Ok(())
    }

    async fn replace_for_symbol(&self, symbol: &str, contracts: &[OptionContract]) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.retain(|_, c| c.symbol != symbol);
        for contract in contracts {
            map.insert(contract.id(), contract.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forex::ForexQuote;
    use crate::core::options::OptionType;
    use chrono::{NaiveDate, Utc};

    fn pair(from: &str, to: &str) -> Forex {
        Forex::new(
            &Currency::new(from),
            &Currency::new(to),
            &ForexQuote {
                exchange_rate: 1.0,
                bid: 0.99,
                ask: 1.01,
            },
            Utc::now(),
        )
    }

    fn contract(symbol: &str, strike: f64, option_type: OptionType) -> OptionContract {
        OptionContract::new(
            symbol,
            strike,
            option_type,
            NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_forex_save_all_and_find() {
        let repo = MemoryForexRepository::new();
        repo.save_all(&[pair("USD", "EUR"), pair("EUR", "JPY")])
            .await
            .unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Sorted by symbol for stable pagination.
        assert_eq!(all[0].symbol, "EUR/JPY");

        let found = repo.find_by_symbol("USD/EUR").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_by_symbol("USD/XXX").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_forex_save_overwrites_by_symbol() {
        let repo = MemoryForexRepository::new();
        let mut forex = pair("USD", "EUR");
        repo.save(&forex).await.unwrap();

        forex.exchange_rate = 2.0;
        repo.save(&forex).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].exchange_rate, 2.0);
    }

    #[tokio::test]
    async fn test_option_filter_and_replace() {
        let repo = MemoryOptionRepository::new();
        repo.save_all(&[
            contract("AAPL", 100.0, OptionType::Call),
            contract("AAPL", 100.0, OptionType::Put),
            contract("MSFT", 300.0, OptionType::Call),
        ])
        .await
        .unwrap();

        let aapl = repo.find(&OptionFilter::for_symbol("AAPL")).await.unwrap();
        assert_eq!(aapl.len(), 2);

        repo.replace_for_symbol("AAPL", &[contract("AAPL", 110.0, OptionType::Call)])
            .await
            .unwrap();

        let aapl = repo.find(&OptionFilter::for_symbol("AAPL")).await.unwrap();
        assert_eq!(aapl.len(), 1);
        assert_eq!(aapl[0].strike, 110.0);

        // Other symbols untouched by the replace.
        let msft = repo.find(&OptionFilter::for_symbol("MSFT")).await.unwrap();
        assert_eq!(msft.len(), 1);
    }
}
