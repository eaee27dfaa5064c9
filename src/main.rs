//! Hive Conductor - Entry Point
//!
//! Composition root: loads configuration, builds the provider stack, founds a
//! demo village and drives the tick scheduler until Ctrl-C or a tick limit.

use clap::Parser;
use hive_conductor::core::config::{ConductorConfig, ProviderKind};
use hive_conductor::core::error::Result;
use hive_conductor::demo::DemoVillage;
use hive_conductor::provider::build_provider;
use hive_conductor::scheduler::TickScheduler;
use hive_conductor::throttle::SystemProbe;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Batched, cached and fault-tolerant agent decisions on a fixed tick
#[derive(Parser, Debug)]
#[command(name = "hive-conductor")]
#[command(about = "Drive agent decisions through an inference provider on a fixed tick")]
struct Args {
    /// TOML configuration file (all fields optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Villagers in the demo village
    #[arg(long, default_value_t = 50)]
    agents: usize,

    /// Stop after this many ticks instead of waiting for Ctrl-C
    #[arg(long)]
    ticks: Option<u64>,

    /// Random seed for the village
    #[arg(long)]
    seed: Option<u64>,

    /// Primary provider: local, remote, ollama or hosted
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Turn off provider-backed decisions; the village decides for itself
    #[arg(long)]
    no_ai: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hive_conductor=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConductorConfig::from_file(path)?,
        None => ConductorConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(kind) = args.provider {
        config.provider.primary = kind;
    }
    if args.no_ai {
        config.ai_enabled = false;
    }
    config.validate()?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let provider = build_provider(&config)?;
    let village = DemoVillage::new(args.agents, seed).with_autonomy(!config.ai_enabled);
    let mut scheduler =
        TickScheduler::new(config, provider, village, Box::new(SystemProbe::new()));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    scheduler.run(shutdown, args.ticks).await;

    let village = scheduler.domain();
    tracing::info!(
        "Village closed: {} decisions applied, food stores {:.0}, {} of {} villagers active",
        village.decisions_applied(),
        village.food_stores(),
        village.active_population(),
        village.population()
    );
    Ok(())
}
