//! Staleness-driven refresh and reconciliation of forex records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::error::{Error, Result};
use crate::core::forex::{
    Currency, Forex, Granularity, RateProvider, RateSeries, StalenessPolicy,
};
use crate::publish::Publisher;
use crate::store::{CurrencyRepository, ForexRepository};

/// A refresh failure scoped to one record. Siblings in the same batch
/// are unaffected.
#[derive(Debug)]
pub struct RefreshFailure {
    pub symbol: String,
    pub error: Error,
}

/// Result of an on-demand refresh pass over a set of records.
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    /// All input records, refreshed ones carrying their new values.
    pub records: Vec<Forex>,
    pub failures: Vec<RefreshFailure>,
}

/// Result of one scheduled full-refresh pass.
#[derive(Debug, Default, PartialEq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Filter over stored forex pairs for the paged read path.
#[derive(Debug, Clone, Default)]
pub struct ForexFilter {
    /// Case-insensitive substring match on the pair symbol.
    pub symbol_contains: Option<String>,
    /// Exact match on either side of the pair.
    pub currency_code: Option<String>,
}

impl ForexFilter {
    pub fn matches(&self, forex: &Forex) -> bool {
        let symbol_ok = self.symbol_contains.as_ref().is_none_or(|needle| {
            forex
                .symbol
                .to_uppercase()
                .contains(&needle.to_uppercase())
        });
        let code_ok = self
            .currency_code
            .as_ref()
            .is_none_or(|code| forex.from_code == *code || forex.to_code == *code);
        symbol_ok && code_ok
    }
}

/// One page of forex records, refreshed before being returned.
#[derive(Debug)]
pub struct ForexPage {
    pub items: Vec<Forex>,
    pub page: usize,
    pub size: usize,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
struct PairRow {
    from: String,
    to: String,
}

/// Orchestrates fetch-on-read refresh, the scheduled full refresh, and
/// the CSV bootstrap of currency pairs.
pub struct ForexRefresher {
    repository: Arc<dyn ForexRepository>,
    currencies: Arc<dyn CurrencyRepository>,
    provider: Arc<dyn RateProvider>,
    publisher: Arc<dyn Publisher>,
    staleness: StalenessPolicy,
}

impl ForexRefresher {
    pub fn new(
        repository: Arc<dyn ForexRepository>,
        currencies: Arc<dyn CurrencyRepository>,
        provider: Arc<dyn RateProvider>,
        publisher: Arc<dyn Publisher>,
        staleness: StalenessPolicy,
    ) -> Self {
        ForexRefresher {
            repository,
            currencies,
            provider,
            publisher,
            staleness,
        }
    }

    /// Refreshes the stale records among `records`. Each record is
    /// handled independently: a failed fetch is reported and skipped,
    /// never aborting its siblings, and leaves the record (including
    /// `last_refresh`) untouched. Updated records are bulk-saved at
    /// the end; fresh ones are not rewritten.
    pub async fn refresh_if_stale(
        &self,
        records: Vec<Forex>,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome> {
        let mut outcome = RefreshOutcome::default();
        let mut updated = Vec::new();

        for mut forex in records {
            if !self.staleness.is_stale(forex.last_refresh, now) {
                outcome.records.push(forex);
                continue;
            }

            match self
                .provider
                .fetch_quote(&forex.from_code, &forex.to_code)
                .await
            {
                Ok(quote) => {
                    forex.apply_quote(&quote);
                    forex.last_refresh = now;
                    updated.push(forex.clone());
                }
                Err(error) => {
                    warn!(symbol = %forex.symbol, %error, "On-demand refresh failed");
                    outcome.failures.push(RefreshFailure {
                        symbol: forex.symbol.clone(),
                        error,
                    });
                }
            }
            outcome.records.push(forex);
        }

        if !updated.is_empty() {
            debug!(count = updated.len(), "Persisting refreshed records");
            self.repository.save_all(&updated).await?;
        }

        Ok(outcome)
    }

    /// One full refresh pass over every stored pair, regardless of
    /// staleness. Each record's fetch + save + publish sequence is
    /// isolated: a failing pair is skipped (no save, no publish) and
    /// the rest of the cycle continues. Publishing is best-effort.
    pub async fn refresh_all(&self, now: DateTime<Utc>) -> Result<RefreshSummary> {
        let forexes = self.repository.find_all().await?;
        let mut summary = RefreshSummary::default();

        for mut forex in forexes {
            let quote = match self
                .provider
                .fetch_quote(&forex.from_code, &forex.to_code)
                .await
            {
                Ok(quote) => quote,
                Err(error) => {
                    warn!(symbol = %forex.symbol, %error, "Scheduled refresh skipped pair");
                    summary.failed += 1;
                    continue;
                }
            };

            forex.apply_quote(&quote);
            forex.last_refresh = now;

            if let Err(error) = self.repository.save(&forex).await {
                warn!(symbol = %forex.symbol, %error, "Failed to persist refreshed pair");
                summary.failed += 1;
                continue;
            }

            if let Err(error) = self.publisher.publish_forex(&forex).await {
                warn!(symbol = %forex.symbol, %error, "Failed to publish forex update");
            }
            summary.refreshed += 1;
        }

        info!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            "Scheduled refresh pass complete"
        );
        Ok(summary)
    }

    /// Seeds pairs from a CSV with a `from,to` header row. Every row
    /// creates a new record; the load is one logical transaction, so
    /// an unknown currency code or a failed fetch aborts the whole
    /// load with nothing inserted.
    pub async fn load_initial_pairs<R: std::io::Read>(
        &self,
        reader: R,
        now: DateTime<Utc>,
    ) -> Result<Vec<Forex>> {
        let currency_map: HashMap<String, Currency> = self
            .currencies
            .find_all()
            .await?
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut pairs = Vec::new();
        for row in csv_reader.deserialize() {
            let row: PairRow = row?;

            let from = currency_map
                .get(&row.from)
                .ok_or_else(|| Error::NotFound(format!("currency code {}", row.from)))?;
            let to = currency_map
                .get(&row.to)
                .ok_or_else(|| Error::NotFound(format!("currency code {}", row.to)))?;

            let quote = self.provider.fetch_quote(&from.code, &to.code).await?;
            pairs.push(Forex::new(from, to, &quote, now));
        }

        self.repository.save_all(&pairs).await?;
        info!(count = pairs.len(), "Loaded initial forex pairs");
        Ok(pairs)
    }

    /// Paged listing of stored pairs. The returned page's contents are
    /// refreshed on demand first, so a read can trigger writes. Pages
    /// are zero-based and ordered by symbol.
    pub async fn get_forexes(
        &self,
        page: usize,
        size: usize,
        filter: &ForexFilter,
        now: DateTime<Utc>,
    ) -> Result<ForexPage> {
        let mut forexes: Vec<_> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();
        forexes.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let total = forexes.len();
        let page_items: Vec<_> = forexes
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();

        let outcome = self.refresh_if_stale(page_items, now).await?;
        for failure in &outcome.failures {
            warn!(symbol = %failure.symbol, error = %failure.error, "Page refresh failure");
        }

        Ok(ForexPage {
            items: outcome.records,
            page,
            size,
            total,
        })
    }

    /// Historical rates for one pair at the requested granularity.
    pub async fn get_time_series(
        &self,
        from: &str,
        to: &str,
        granularity: Granularity,
    ) -> Result<RateSeries> {
        self.provider.fetch_series(from, to, granularity).await
    }
}
