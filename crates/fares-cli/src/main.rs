mod crawl;
mod inspect;

use clap::{Parser, Subcommand};
use fares_core::{AppConfig, Company, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fares")]
#[command(about = "Airline fare crawler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl backends and publish every accepted offer
    Crawl {
        /// Backend to crawl (repeatable); all configured backends when omitted
        #[arg(long = "company", value_name = "NAME")]
        companies: Vec<Company>,
        /// Override the scrape horizon in days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print the validated route catalogs
    Routes,
    /// Print the windows and requests a crawl would issue, without sending them
    Schedule {
        #[arg(long, value_name = "NAME")]
        company: Company,
        /// Override the scrape horizon in days
        #[arg(long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = fares_core::load_app_config_from_env()?;
    init_tracing(&config)?;

    match cli.command {
        Some(Commands::Crawl { companies, days }) => {
            crawl::run_crawl(&config, &companies, days).await?;
        }
        Some(Commands::Routes) => inspect::print_routes(&config),
        Some(Commands::Schedule { company, days }) => {
            inspect::print_schedule(&config, company, days)?;
        }
        None => println!("fares: use --help to list commands"),
    }

    Ok(())
}

/// Logs go to stderr; stdout may be carrying offers.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
