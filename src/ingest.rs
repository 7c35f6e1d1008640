//! Bulk ingestion of option chains per underlying stock.

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::options::{ChainProvider, OptionContract};
use crate::store::{OptionRepository, StockRepository};

#[derive(Debug, Default, PartialEq)]
pub struct IngestSummary {
    pub stocks_processed: usize,
    pub stocks_failed: usize,
    pub contracts: usize,
}

/// Pulls the full chain for every stored stock and persists the
/// flattened contracts. No staleness check; every pass is a full
/// replacement of each ingested symbol's snapshot.
pub struct OptionChainIngester {
    stocks: Arc<dyn StockRepository>,
    options: Arc<dyn OptionRepository>,
    provider: Arc<dyn ChainProvider>,
}

impl OptionChainIngester {
    pub fn new(
        stocks: Arc<dyn StockRepository>,
        options: Arc<dyn OptionRepository>,
        provider: Arc<dyn ChainProvider>,
    ) -> Self {
        OptionChainIngester {
            stocks,
            options,
            provider,
        }
    }

    /// Ingests chains for all stored stocks. A fetch or decode failure
    /// for one stock is logged and skipped; the rest of the pass
    /// continues. All accumulated snapshots are flushed in one phase
    /// at the end of the pass, each replacing the symbol's previous
    /// contracts.
    pub async fn ingest_all(&self) -> Result<IngestSummary> {
        let stocks = self.stocks.find_all().await?;
        let mut summary = IngestSummary::default();
        let mut snapshots: Vec<(String, Vec<OptionContract>)> = Vec::new();

        for stock in stocks {
            match self.provider.fetch_chain(&stock.symbol).await {
                Ok(contracts) => {
                    summary.stocks_processed += 1;
                    summary.contracts += contracts.len();
                    snapshots.push((stock.symbol, contracts));
                }
                Err(error) => {
                    warn!(symbol = %stock.symbol, %error, "Chain ingestion skipped stock");
                    summary.stocks_failed += 1;
                }
            }
        }

        for (symbol, contracts) in &snapshots {
            self.options.replace_for_symbol(symbol, contracts).await?;
        }

        info!(
            stocks = summary.stocks_processed,
            failed = summary.stocks_failed,
            contracts = summary.contracts,
            "Option chain ingestion pass complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::core::options::{OptionFilter, OptionType, Stock};
    use crate::store::{MemoryOptionRepository, MemoryStockRepository};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::{HashMap, HashSet};

    struct MockChainProvider {
        chains: HashMap<String, Vec<OptionContract>>,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl ChainProvider for MockChainProvider {
        async fn fetch_chain(&self, symbol: &str) -> Result<Vec<OptionContract>> {
            if self.failing.contains(symbol) {
                return Err(Error::FetchFailed(format!("chain unavailable for {symbol}")));
            }
            Ok(self.chains.get(symbol).cloned().unwrap_or_default())
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn contract(symbol: &str, strike: f64, option_type: OptionType) -> OptionContract {
        OptionContract::new(symbol, strike, option_type, date("2026-09-18"))
    }

    async fn stocks_with(symbols: &[&str]) -> Arc<MemoryStockRepository> {
        let repo = Arc::new(MemoryStockRepository::new());
        let stocks: Vec<_> = symbols
            .iter()
            .map(|s| Stock {
                symbol: s.to_string(),
                price: 100.0,
            })
            .collect();
        repo.save_all(&stocks).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_ingest_persists_flattened_contracts() {
        let stocks = stocks_with(&["AAPL"]).await;
        let options = Arc::new(MemoryOptionRepository::new());
        let provider = Arc::new(MockChainProvider {
            chains: HashMap::from([(
                "AAPL".to_string(),
                vec![
                    contract("AAPL", 100.0, OptionType::Call),
                    contract("AAPL", 95.0, OptionType::Put),
                ],
            )]),
            failing: HashSet::new(),
        });

        let ingester = OptionChainIngester::new(stocks, options.clone(), provider);
        let summary = ingester.ingest_all().await.unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                stocks_processed: 1,
                stocks_failed: 0,
                contracts: 2
            }
        );
        let stored = options
            .find(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_stock_is_isolated() {
        let stocks = stocks_with(&["AAPL", "GOOG", "MSFT"]).await;
        let options = Arc::new(MemoryOptionRepository::new());
        let provider = Arc::new(MockChainProvider {
            chains: HashMap::from([
                (
                    "AAPL".to_string(),
                    vec![contract("AAPL", 100.0, OptionType::Call)],
                ),
                (
                    "MSFT".to_string(),
                    vec![contract("MSFT", 300.0, OptionType::Call)],
                ),
            ]),
            failing: HashSet::from(["GOOG".to_string()]),
        });

        let ingester = OptionChainIngester::new(stocks, options.clone(), provider);
        let summary = ingester.ingest_all().await.unwrap();

        assert_eq!(summary.stocks_processed, 2);
        assert_eq!(summary.stocks_failed, 1);
        assert_eq!(
            options
                .find(&OptionFilter::for_symbol("AAPL"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            options
                .find(&OptionFilter::for_symbol("MSFT"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_reingestion_replaces_previous_snapshot() {
        let stocks = stocks_with(&["AAPL"]).await;
        let options = Arc::new(MemoryOptionRepository::new());
        options
            .save_all(&[
                contract("AAPL", 90.0, OptionType::Call),
                contract("AAPL", 90.0, OptionType::Put),
            ])
            .await
            .unwrap();

        let provider = Arc::new(MockChainProvider {
            chains: HashMap::from([(
                "AAPL".to_string(),
                vec![contract("AAPL", 110.0, OptionType::Call)],
            )]),
            failing: HashSet::new(),
        });

        let ingester = OptionChainIngester::new(stocks, options.clone(), provider);
        ingester.ingest_all().await.unwrap();

        let stored = options
            .find(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].strike, 110.0);
    }

    #[tokio::test]
    async fn test_failed_stock_keeps_previous_snapshot() {
        let stocks = stocks_with(&["AAPL"]).await;
        let options = Arc::new(MemoryOptionRepository::new());
        options
            .save_all(&[contract("AAPL", 90.0, OptionType::Call)])
            .await
            .unwrap();

        let provider = Arc::new(MockChainProvider {
            chains: HashMap::new(),
            failing: HashSet::from(["AAPL".to_string()]),
        });

        let ingester = OptionChainIngester::new(stocks, options.clone(), provider);
        let summary = ingester.ingest_all().await.unwrap();

        assert_eq!(summary.stocks_failed, 1);
        // No replace happened for the failed symbol.
        let stored = options
            .find(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].strike, 90.0);
    }
}
