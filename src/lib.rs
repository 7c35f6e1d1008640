pub mod aggregate;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod providers;
pub mod publish;
pub mod refresh;
pub mod scheduler;
pub mod store;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::aggregate::OptionAggregator;
use crate::core::config::AppConfig;
use crate::core::forex::{Granularity, RateProvider, StalenessPolicy};
use crate::core::options::{ChainProvider, OptionFilter};
use crate::ingest::OptionChainIngester;
use crate::providers::{ExchangeApiProvider, YahooOptionsProvider};
use crate::publish::{Publisher, TracingPublisher};
use crate::refresh::{ForexFilter, ForexRefresher};
use crate::scheduler::RefreshScheduler;
use crate::store::{
    CurrencyRepository, DiskCurrencyRepository, DiskForexRepository, DiskOptionRepository,
    DiskStockRepository, ForexRepository, OptionRepository, StockRepository,
};

#[derive(Debug)]
pub enum AppCommand {
    Serve,
    Refresh,
    Forex {
        page: usize,
        size: usize,
        symbol: Option<String>,
        currency: Option<String>,
    },
    History {
        from: String,
        to: String,
        granularity: String,
    },
    Options {
        symbol: String,
        option_type: Option<String>,
        expiration: Option<String>,
    },
    LoadForex {
        path: String,
    },
    LoadStocks {
        path: String,
    },
    LoadOptions,
}

/// Wired services over the disk store and the configured providers.
pub struct App {
    pub config: AppConfig,
    pub currencies: Arc<dyn CurrencyRepository>,
    pub forexes: Arc<dyn ForexRepository>,
    pub stocks: Arc<dyn StockRepository>,
    pub options: Arc<dyn OptionRepository>,
    pub refresher: Arc<ForexRefresher>,
    pub ingester: OptionChainIngester,
    pub aggregator: OptionAggregator,
}

impl App {
    pub fn build(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?.join("store");
        let keyspace = store::open_keyspace(&data_path)?;

        let currencies: Arc<dyn CurrencyRepository> =
            Arc::new(DiskCurrencyRepository::new(&keyspace)?);
        let forexes: Arc<dyn ForexRepository> = Arc::new(DiskForexRepository::new(&keyspace)?);
        let stocks: Arc<dyn StockRepository> = Arc::new(DiskStockRepository::new(&keyspace)?);
        let options: Arc<dyn OptionRepository> = Arc::new(DiskOptionRepository::new(&keyspace)?);

        let rate_provider: Arc<dyn RateProvider> =
            Arc::new(ExchangeApiProvider::new(&config.providers.forex)?);
        let chain_provider: Arc<dyn ChainProvider> =
            Arc::new(YahooOptionsProvider::new(&config.providers.options)?);
        let publisher: Arc<dyn Publisher> = Arc::new(TracingPublisher::new(&config.publish));

        let refresher = Arc::new(ForexRefresher::new(
            Arc::clone(&forexes),
            Arc::clone(&currencies),
            rate_provider,
            publisher,
            StalenessPolicy::from_minutes(config.refresh.staleness_minutes),
        ));
        let ingester =
            OptionChainIngester::new(Arc::clone(&stocks), Arc::clone(&options), chain_provider);
        let aggregator = OptionAggregator::new(
            Arc::clone(&options),
            Arc::clone(&stocks),
            config.representative,
        );

        Ok(App {
            config,
            currencies,
            forexes,
            stocks,
            options,
            refresher,
            ingester,
            aggregator,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Exchange data service starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::build(config)?;

    match command {
        AppCommand::Serve => {
            let scheduler = RefreshScheduler::new(
                Arc::clone(&app.refresher),
                Duration::from_secs(app.config.refresh.interval_seconds),
            );
            let running = scheduler.start();
            tokio::signal::ctrl_c().await?;
            running.stop().await;
            Ok(())
        }
        AppCommand::Refresh => {
            let summary = app.refresher.refresh_all(Utc::now()).await?;
            println!(
                "Refreshed {} pairs ({} failed)",
                summary.refreshed, summary.failed
            );
            Ok(())
        }
        AppCommand::Forex {
            page,
            size,
            symbol,
            currency,
        } => {
            let filter = ForexFilter {
                symbol_contains: symbol,
                currency_code: currency,
            };
            cli::forex::run(&app.refresher, page, size, &filter).await
        }
        AppCommand::History {
            from,
            to,
            granularity,
        } => {
            let granularity: Granularity = granularity.parse()?;
            cli::history::run(&app.refresher, &from, &to, granularity).await
        }
        AppCommand::Options {
            symbol,
            option_type,
            expiration,
        } => {
            let mut filter = OptionFilter::for_symbol(&symbol);
            if let Some(option_type) = option_type {
                filter.option_type = Some(option_type.parse()?);
            }
            if let Some(expiration) = expiration {
                filter.expiration_date = Some(expiration.parse::<NaiveDate>()?);
            }
            cli::options::run(&app.aggregator, &filter).await
        }
        AppCommand::LoadForex { path } => {
            cli::load::load_forex(
                &app.refresher,
                app.currencies.as_ref(),
                &app.config.currencies,
                &path,
            )
            .await
        }
        AppCommand::LoadStocks { path } => cli::load::load_stocks(app.stocks.as_ref(), &path).await,
        AppCommand::LoadOptions => cli::load::load_options(&app.ingester).await,
    }
}
