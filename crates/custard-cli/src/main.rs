use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use custard_scraper::{Aggregator, ChromeConfig, ChromeRenderer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "custard-cli")]
#[command(about = "Today's flavor of the day from Milwaukee-area custard stands")]
struct Cli {
    /// Scrape for this shop-local date (YYYY-MM-DD) instead of today.
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every site and print the combined list as JSON.
    Scrape,
    /// Scrape a single site and print its records as JSON.
    Site {
        /// Site id, as listed by `sites`.
        id: String,
    },
    /// List the site ids in output order.
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = custard_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let renderer = Arc::new(ChromeRenderer::new(ChromeConfig::from_app_config(&config)));
    let aggregator = Aggregator::from_config(&config, renderer)?;
    let today = cli.date.unwrap_or_else(custard_core::shop_today);

    match cli.command {
        Commands::Scrape => {
            let records = aggregator.scrape_all_on(today).await;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Site { id } => {
            let records = aggregator.scrape_site(&id, today).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Sites => {
            for id in aggregator.site_ids() {
                println!("{id}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
