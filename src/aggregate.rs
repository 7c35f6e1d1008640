//! Read-time aggregation of option contracts into per-(strike, type)
//! summaries.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::Representative;
use crate::core::error::{Error, Result};
use crate::core::options::{OptionContract, OptionFilter, OptionGroupKey, OptionSummary};
use crate::store::{OptionRepository, StockRepository};

/// Groups filtered contracts by (strike, type) and projects one
/// summary row per group. Nothing is persisted; the projection uses
/// in-memory copies only.
pub struct OptionAggregator {
    options: Arc<dyn OptionRepository>,
    stocks: Arc<dyn StockRepository>,
    representative: Representative,
}

impl OptionAggregator {
    pub fn new(
        options: Arc<dyn OptionRepository>,
        stocks: Arc<dyn StockRepository>,
        representative: Representative,
    ) -> Self {
        OptionAggregator {
            options,
            stocks,
            representative,
        }
    }

    /// Summaries for the contracts matching `filter`. Open interest is
    /// the count of contracts in each group; ask, bid and price come
    /// from the underlying stock's current price. Returned order is
    /// unspecified.
    pub async fn summarize(&self, filter: &OptionFilter) -> Result<Vec<OptionSummary>> {
        let contracts = self.options.find(filter).await?;
        let stock = self
            .stocks
            .find_by_symbol(&filter.symbol)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stock {}", filter.symbol)))?;

        let mut groups: HashMap<OptionGroupKey, Vec<OptionContract>> = HashMap::new();
        for mut contract in contracts {
            contract.ask = stock.price;
            contract.bid = stock.price;
            contract.price = stock.price;
            groups
                .entry(OptionGroupKey::of(&contract))
                .or_default()
                .push(contract);
        }

        let mut summaries = Vec::with_capacity(groups.len());
        for (key, group) in groups {
            let representative = match self.representative {
                Representative::FirstSeen => group.first(),
                Representative::EarliestExpiration => {
                    group.iter().min_by_key(|c| c.expiration_date)
                }
            };
            let Some(representative) = representative else {
                continue;
            };

            summaries.push(OptionSummary {
                symbol: representative.symbol.clone(),
                strike: key.strike.into_inner(),
                option_type: key.option_type,
                expiration_date: representative.expiration_date,
                open_interest: group.len(),
                ask: representative.ask,
                bid: representative.bid,
                price: representative.price,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{OptionType, Stock};
    use crate::store::{MemoryOptionRepository, MemoryStockRepository};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn contract(strike: f64, option_type: OptionType, expiration: &str) -> OptionContract {
        OptionContract::new("AAPL", strike, option_type, date(expiration))
    }

    async fn aggregator_with(
        contracts: &[OptionContract],
        stock_price: Option<f64>,
        representative: Representative,
    ) -> OptionAggregator {
        let options = Arc::new(MemoryOptionRepository::new());
        options.save_all(contracts).await.unwrap();

        let stocks = Arc::new(MemoryStockRepository::new());
        if let Some(price) = stock_price {
            stocks
                .save_all(&[Stock {
                    symbol: "AAPL".to_string(),
                    price,
                }])
                .await
                .unwrap();
        }

        OptionAggregator::new(options, stocks, representative)
    }

    #[tokio::test]
    async fn test_summaries_group_by_strike_and_type() {
        let aggregator = aggregator_with(
            &[
                contract(50.0, OptionType::Call, "2026-09-18"),
                contract(50.0, OptionType::Call, "2026-10-16"),
                contract(50.0, OptionType::Call, "2026-11-20"),
                contract(50.0, OptionType::Put, "2026-09-18"),
            ],
            Some(49.5),
            Representative::EarliestExpiration,
        )
        .await;

        let mut summaries = aggregator
            .summarize(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        summaries.sort_by_key(|s| s.open_interest);

        assert_eq!(summaries.len(), 2);

        let put = &summaries[0];
        assert_eq!(put.option_type, OptionType::Put);
        assert_eq!(put.open_interest, 1);

        let call = &summaries[1];
        assert_eq!(call.option_type, OptionType::Call);
        assert_eq!(call.open_interest, 3);

        for summary in &summaries {
            assert_eq!(summary.strike, 50.0);
            assert_eq!(summary.ask, 49.5);
            assert_eq!(summary.bid, 49.5);
            assert_eq!(summary.price, 49.5);
        }
    }

    #[tokio::test]
    async fn test_missing_stock_is_not_found() {
        let aggregator = aggregator_with(
            &[contract(50.0, OptionType::Call, "2026-09-18")],
            None,
            Representative::EarliestExpiration,
        )
        .await;

        let result = aggregator
            .summarize(&OptionFilter::for_symbol("AAPL"))
            .await;
        match result {
            Err(Error::NotFound(msg)) => assert!(msg.contains("AAPL")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_earliest_expiration_representative() {
        let aggregator = aggregator_with(
            &[
                contract(50.0, OptionType::Call, "2026-11-20"),
                contract(50.0, OptionType::Call, "2026-09-18"),
            ],
            Some(50.0),
            Representative::EarliestExpiration,
        )
        .await;

        let summaries = aggregator
            .summarize(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].expiration_date, date("2026-09-18"));
    }

    #[tokio::test]
    async fn test_projection_does_not_persist() {
        let options = Arc::new(MemoryOptionRepository::new());
        options
            .save_all(&[contract(50.0, OptionType::Call, "2026-09-18")])
            .await
            .unwrap();
        let stocks = Arc::new(MemoryStockRepository::new());
        stocks
            .save_all(&[Stock {
                symbol: "AAPL".to_string(),
                price: 49.5,
            }])
            .await
            .unwrap();

        let aggregator = OptionAggregator::new(
            options.clone(),
            stocks,
            Representative::EarliestExpiration,
        );
        aggregator
            .summarize(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();

        // Stored contracts keep their zeroed projection fields.
        let stored = options
            .find(&OptionFilter::for_symbol("AAPL"))
            .await
            .unwrap();
        assert_eq!(stored[0].ask, 0.0);
        assert_eq!(stored[0].price, 0.0);
    }

    #[tokio::test]
    async fn test_type_filter_narrows_groups() {
        let aggregator = aggregator_with(
            &[
                contract(50.0, OptionType::Call, "2026-09-18"),
                contract(50.0, OptionType::Put, "2026-09-18"),
            ],
            Some(50.0),
            Representative::FirstSeen,
        )
        .await;

        let mut filter = OptionFilter::for_symbol("AAPL");
        filter.option_type = Some(OptionType::Put);
        let summaries = aggregator.summarize(&filter).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].option_type, OptionType::Put);
    }
}
