use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ForexProviderConfig {
    pub exchange_url: String,
    pub timeseries_url: String,
    pub timeseries_intraday_url: String,
}

impl Default for ForexProviderConfig {
    fn default() -> Self {
        ForexProviderConfig {
            exchange_url: "http://localhost:5000/forex/exchange".to_string(),
            timeseries_url: "http://localhost:5000/forex/timeseries".to_string(),
            timeseries_intraday_url: "http://localhost:5000/forex/timeseries/intraday".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OptionsProviderConfig {
    pub base_url: String,
}

impl Default for OptionsProviderConfig {
    fn default() -> Self {
        OptionsProviderConfig {
            base_url: "https://query1.finance.yahoo.com/v7/finance/options".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub forex: ForexProviderConfig,
    #[serde(default)]
    pub options: OptionsProviderConfig,
}

/// Destination for forex change events. The exchange and routing key
/// are fixed per deployment; every update in a scheduled pass goes to
/// the same pair.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PublishConfig {
    pub exchange: String,
    pub routing_key: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            exchange: "exchange.service".to_string(),
            routing_key: "forex.rates".to_string(),
        }
    }
}

/// Which member of a (strike, type) group supplies the displayed
/// expiration and symbol on a summary row.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Representative {
    FirstSeen,
    #[default]
    EarliestExpiration,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    /// Records older than this are refreshed on the read path.
    pub staleness_minutes: i64,
    /// Cadence of the scheduled full refresh.
    pub interval_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            staleness_minutes: 15,
            interval_seconds: 60,
        }
    }
}

fn default_currencies() -> Vec<String> {
    ["USD", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "RSD"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Currency codes seeded into the store before pairs are loaded.
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub representative: Representative,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            publish: PublishConfig::default(),
            refresh: RefreshConfig::default(),
            currencies: default_currencies(),
            representative: Representative::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "fxd")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "fxd")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  forex:
    exchange_url: "http://flask.internal/forex/exchange"
    timeseries_url: "http://flask.internal/forex/timeseries"
    timeseries_intraday_url: "http://flask.internal/forex/timeseries/intraday"
  options:
    base_url: "http://yahoo.internal/v7/finance/options"
publish:
  exchange: "bank.exchange"
  routing_key: "forex.key"
refresh:
  staleness_minutes: 30
  interval_seconds: 120
currencies: ["USD", "EUR"]
representative: first-seen
data_path: "/tmp/fxd-data"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.providers.forex.exchange_url,
            "http://flask.internal/forex/exchange"
        );
        assert_eq!(
            config.providers.options.base_url,
            "http://yahoo.internal/v7/finance/options"
        );
        assert_eq!(config.publish.exchange, "bank.exchange");
        assert_eq!(config.publish.routing_key, "forex.key");
        assert_eq!(config.refresh.staleness_minutes, 30);
        assert_eq!(config.refresh.interval_seconds, 120);
        assert_eq!(config.currencies, vec!["USD", "EUR"]);
        assert_eq!(config.representative, Representative::FirstSeen);
        assert_eq!(config.data_path.as_deref(), Some("/tmp/fxd-data"));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("data_path: null").expect("Failed to parse");
        assert_eq!(config.refresh.staleness_minutes, 15);
        assert_eq!(config.refresh.interval_seconds, 60);
        assert_eq!(config.publish.routing_key, "forex.rates");
        assert_eq!(config.representative, Representative::EarliestExpiration);
        assert!(config.currencies.contains(&"USD".to_string()));
        assert!(config.data_path.is_none());
    }
}
