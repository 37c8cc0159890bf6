//! iap-scout - Compare in-app purchase prices across national storefronts
//!
//! Prices every region in USD using browser-grade TLS fingerprints.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iap_scout::commands::{ParseCommand, ReportCommand};
use iap_scout::config::{Config, OutputFormat};
use iap_scout::format::Formatter;
use iap_scout::report::OfferSelection;
use iap_scout::storefront::StoreSource;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "iap-scout",
    version,
    about = "Compare in-app purchase prices across national app storefronts",
    long_about = "Fetches an app's listing from many regional storefronts and reports its in-app purchase price range in USD, cheapest region first."
)]
struct Cli {
    /// Storefront to query (google-play, app-store)
    #[arg(short, long, global = true, env = "IAP_SCOUT_SOURCE")]
    source: Option<StoreSource>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "IAP_SCOUT_PROXY")]
    proxy: Option<String>,

    /// Regions fetched concurrently
    #[arg(long, global = true, env = "IAP_SCOUT_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "IAP_SCOUT_TIMEOUT")]
    timeout: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a price report for an app
    #[command(alias = "r")]
    Report {
        /// App identifier or storefront link
        app: String,

        /// Regions to scan (comma-separated, default: built-in list)
        #[arg(long, value_delimiter = ',')]
        regions: Option<Vec<String>>,

        /// Merge every offer of a region instead of using the first one
        #[arg(long)]
        all_offers: bool,

        /// Add a max price column in this currency (e.g. RUB)
        #[arg(long)]
        reference_currency: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the regions that would be scanned
    Regions,

    /// Parse one price text with the configured rules
    #[command(alias = "p")]
    Parse {
        /// Price text as shown by the storefront
        text: String,

        /// Storefront currency code
        #[arg(long)]
        currency: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Report { app, regions, all_offers, reference_currency, output } => {
            if let Some(regions) = regions {
                config.regions = regions;
            }
            if all_offers {
                config.offer_selection = OfferSelection::Span;
            }
            if let Some(currency) = reference_currency {
                config.reference_currency = Some(currency);
            }

            let cmd = ReportCommand::new(config);
            let rendered = cmd.execute(&app).await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Regions => {
            let regions = config.region_targets()?;
            println!("{}", Formatter::new(config.format).format_regions(&regions));
        }

        Commands::Parse { text, currency } => {
            let cmd = ParseCommand::new(&config);
            println!("{}", cmd.execute(&text, &currency)?);
        }
    }

    Ok(())
}
