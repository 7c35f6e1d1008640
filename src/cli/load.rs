use super::ui;
use crate::core::forex::Currency;
use crate::core::options::Stock;
use crate::ingest::OptionChainIngester;
use crate::refresh::ForexRefresher;
use crate::store::{CurrencyRepository, StockRepository};
use anyhow::{Context, Result};
use chrono::Utc;

/// Seeds the configured currencies, then bootstraps pairs from a CSV
/// with a `from,to` header row. Every row creates a new record, so
/// this should run once per pair.
pub async fn load_forex(
    refresher: &ForexRefresher,
    currencies: &dyn CurrencyRepository,
    codes: &[String],
    path: &str,
) -> Result<()> {
    let seed: Vec<Currency> = codes.iter().map(|c| Currency::new(c)).collect();
    currencies.save_all(&seed).await?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open forex pair file: {path}"))?;

    let pb = ui::new_spinner("Loading forex pairs...");
    let created = refresher.load_initial_pairs(file, Utc::now()).await?;
    pb.finish_and_clear();

    println!("Loaded {} forex pairs", created.len());
    Ok(())
}

/// Loads underlying stocks from a CSV with a `symbol,price` header.
pub async fn load_stocks(stocks: &dyn StockRepository, path: &str) -> Result<()> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open stock file: {path}"))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut parsed = Vec::new();
    for row in reader.deserialize() {
        let stock: Stock = row.context("Failed to parse stock row")?;
        parsed.push(stock);
    }

    stocks.save_all(&parsed).await?;
    println!("Loaded {} stocks", parsed.len());
    Ok(())
}

/// Runs one chain-ingestion pass over every stored stock.
pub async fn load_options(ingester: &OptionChainIngester) -> Result<()> {
    let pb = ui::new_spinner("Ingesting option chains...");
    let summary = ingester.ingest_all().await?;
    pb.finish_and_clear();

    println!(
        "Ingested {} contracts from {} stocks ({} failed)",
        summary.contracts, summary.stocks_processed, summary.stocks_failed
    );
    Ok(())
}
