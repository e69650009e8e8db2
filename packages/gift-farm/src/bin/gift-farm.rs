//! Gift Farm command-line client.

use clap::{Parser, Subcommand};
use gift_farm::metrics::METRICS;
use gift_farm::tonapi::TonApiInventory;
use gift_farm::{Config, FarmEngine, FileStore, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gift-farm", version, about = "Farm rewards with your TON NFTs")]
struct Cli {
    /// Wallet address (any encoding). Without it state is kept under `local`.
    #[arg(long, global = true, env = "GIFT_FARM_OWNER")]
    owner: Option<String>,

    /// Config file name (toml/json/yaml), looked up without extension too.
    #[arg(long, global = true, default_value = "gift-farm")]
    config: String,

    /// Print Prometheus counters for this run to stderr.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List farmable NFTs, totals and subscription state.
    Status,
    /// Start farming one NFT.
    Start { nft: String },
    /// Collect one NFT's finished cycle.
    Collect { nft: String },
    /// Start every idle NFT (subscription required).
    StartAll,
    /// Collect every finished NFT (subscription required).
    CollectAll,
    /// Show the subscription, or cancel it.
    Subscription {
        #[arg(long)]
        cancel: bool,
    },
}

fn load_config(name: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = config::Config::builder()
        .add_source(config::File::with_name(name).required(false))
        .add_source(
            config::Environment::with_prefix("GIFT_FARM")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    info!(store = %config.store_path, endpoint = %config.inventory.endpoint, "Configuration loaded");

    let store = Arc::new(FileStore::open(&config.store_path)?);
    let inventory = Arc::new(TonApiInventory::new(&config.inventory)?);
    let engine = FarmEngine::new(
        config,
        store,
        Arc::new(SystemClock),
        inventory,
        cli.owner.as_deref(),
    )?;

    match cli.command {
        Command::Status => {
            let subscription = engine.subscription_info()?;
            if engine.owner().is_some() {
                let nfts = engine.list_farmable().await?;
                let summary = gift_farm::FarmSummary::from_listing(&nfts);
                let status = serde_json::json!({
                    "owner": engine.owner(),
                    "summary": summary,
                    "subscription": subscription,
                    "nfts": nfts,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&subscription)?);
                eprintln!("No --owner given; pass a wallet address to list NFTs.");
            }
        }
        Command::Start { nft } => {
            if engine.start_farming(&nft)? {
                println!("Farming started for {nft}");
            } else {
                println!("{nft} is already farming");
            }
        }
        Command::Collect { nft } => {
            let amount = engine.collect_reward(&nft)?;
            println!("Collected {amount:.2} from {nft}");
        }
        Command::StartAll => {
            let report = engine.start_all_farming().await?;
            for failure in &report.failures {
                eprintln!("{}: {}", failure.address, failure.error);
            }
            println!("{}", serde_json::to_string_pretty(&report.totals())?);
        }
        Command::CollectAll => {
            let report = engine.collect_all_rewards().await?;
            for failure in &report.failures {
                eprintln!("{}: {}", failure.address, failure.error);
            }
            println!("{}", serde_json::to_string_pretty(&report.totals())?);
        }
        Command::Subscription { cancel } => {
            if cancel {
                engine.cancel_subscription()?;
                println!("Subscription cancelled");
            } else {
                println!("{}", serde_json::to_string_pretty(&engine.subscription_info()?)?);
            }
        }
    }

    if cli.metrics {
        eprint!("{}", METRICS.render());
    }
    Ok(())
}
