use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxd::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxd::AppCommand {
    fn from(cmd: Commands) -> fxd::AppCommand {
        match cmd {
            Commands::Serve => fxd::AppCommand::Serve,
            Commands::Refresh => fxd::AppCommand::Refresh,
            Commands::Forex {
                page,
                size,
                symbol,
                currency,
            } => fxd::AppCommand::Forex {
                page,
                size,
                symbol,
                currency,
            },
            Commands::History {
                from,
                to,
                granularity,
            } => fxd::AppCommand::History {
                from,
                to,
                granularity,
            },
            Commands::Options {
                symbol,
                option_type,
                expiration,
            } => fxd::AppCommand::Options {
                symbol,
                option_type,
                expiration,
            },
            Commands::LoadForex { path } => fxd::AppCommand::LoadForex { path },
            Commands::LoadStocks { path } => fxd::AppCommand::LoadStocks { path },
            Commands::LoadOptions => fxd::AppCommand::LoadOptions,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the scheduled refresh until interrupted
    Serve,
    /// Run a single full refresh pass
    Refresh,
    /// List stored forex pairs, refreshing stale ones
    Forex {
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        size: usize,
        /// Substring match on the pair symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Exact match on either currency code
        #[arg(long)]
        currency: Option<String>,
    },
    /// Fetch historical rates for a currency pair
    History {
        from: String,
        to: String,
        /// One of 5min, 60min, daily, weekly, monthly
        #[arg(long, default_value = "daily")]
        granularity: String,
    },
    /// Show aggregated option summaries for an underlying
    Options {
        symbol: String,
        /// CALL or PUT
        #[arg(long)]
        option_type: Option<String>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expiration: Option<String>,
    },
    /// Bootstrap forex pairs from a from,to CSV file
    LoadForex { path: String },
    /// Load underlying stocks from a symbol,price CSV file
    LoadStocks { path: String },
    /// Ingest option chains for all stored stocks
    LoadOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fxd::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = fxd::core::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  forex:
    exchange_url: "http://localhost:5000/forex/exchange"
    timeseries_url: "http://localhost:5000/forex/timeseries"
    timeseries_intraday_url: "http://localhost:5000/forex/timeseries/intraday"
  options:
    base_url: "https://query1.finance.yahoo.com/v7/finance/options"

publish:
  exchange: "exchange.service"
  routing_key: "forex.rates"

refresh:
  staleness_minutes: 15
  interval_seconds: 60

currencies: ["USD", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "RSD"]

# first-seen or earliest-expiration
representative: earliest-expiration
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
