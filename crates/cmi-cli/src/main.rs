use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmi_batch::{BatchConfig, BatchRunner, SourceRegistry};
use cmi_store::{
    ContractorStore, HttpFetcher, MemoryContractorStore, PgContractorStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cmi")]
#[command(about = "Contractor Marketplace Ingest command-line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one import batch for a configured source.
    Import {
        #[arg(long)]
        source: String,
        /// Use the in-memory store instead of Postgres; nothing persists.
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply embedded schema migrations to DATABASE_URL.
    Migrate,
    /// Print the persisted contractor count.
    Count,
    /// Fetch a page and print ranked card-selector candidates.
    Discover { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BatchConfig::from_env();

    match cli.command {
        Commands::Import { source, dry_run } => {
            let registry = SourceRegistry::load(&config.sources_file)?;
            let http = HttpFetcher::new(config.http_config())?;
            let store: Arc<dyn ContractorStore> = if dry_run {
                Arc::new(MemoryContractorStore::new())
            } else {
                Arc::new(PgContractorStore::connect(&config.database_url).await?)
            };
            let runner = BatchRunner::new(registry, http, store);
            let summary = runner.run_source(&source).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Migrate => {
            let store = PgContractorStore::connect(&config.database_url).await?;
            store.run_migrations().await?;
            println!("migrations applied");
        }
        Commands::Count => {
            let store = PgContractorStore::connect(&config.database_url).await?;
            println!("{}", store.contractor_count().await?);
        }
        Commands::Discover { url } => {
            let http = HttpFetcher::new(config.http_config())?;
            let html = http.fetch_text("discover", &url).await?;
            let candidates = cmi_adapters::suggest_card_selectors(&html);
            if candidates.is_empty() {
                println!("no repeating classed elements found");
            }
            for candidate in candidates {
                println!(
                    "{:>4}x  {:<40}  {}",
                    candidate.matches, candidate.selector, candidate.sample_text
                );
            }
        }
    }

    Ok(())
}
