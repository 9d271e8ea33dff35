use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tickwatch_core::*;
use tickwatch_data::{open_alert_store, InMemoryAlertStore, SimulatedTickSource};
use tickwatch_engine::{Dispatcher, Engine};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tickwatch")]
#[command(about = "Streaming technical indicators and price alerts over live ticks")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite URL for the alert store (overrides the config file)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server and the simulated tick loop
    Serve {
        /// Bind address (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run the engine headless for a fixed number of cycles
    Simulate {
        /// Number of tick batches to process
        #[arg(long, default_value = "50")]
        cycles: u64,

        /// Seed for a reproducible price walk
        #[arg(long)]
        seed: Option<u64>,

        /// Alert to register before the run, as SYMBOL:PRICE (repeatable)
        #[arg(long = "alert", value_parser = parse_alert_arg)]
        alerts: Vec<(String, f64)>,
    },

    /// List the configured instruments
    Instruments,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::default(),
    };
    if cli.database_url.is_some() {
        config.database_url = cli.database_url;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config).await?;
        }
        Commands::Simulate {
            cycles,
            seed,
            alerts,
        } => {
            simulate(config, cycles, seed, alerts).await?;
        }
        Commands::Instruments => {
            println!("Configured instruments:");
            for inst in &config.instruments {
                println!("  {:<8} {:<12} base {:.2}", inst.symbol, inst.name, inst.base_price);
            }
        }
    }

    Ok(())
}

fn parse_alert_arg(raw: &str) -> Result<(String, f64), String> {
    let (symbol, price) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected SYMBOL:PRICE, got {raw:?}"))?;
    let price: f64 = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid price in {raw:?}: {e}"))?;
    Ok((symbol.trim().to_string(), price))
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = open_alert_store(config.database_url.as_deref())
        .await
        .context("Failed to open alert store")?;
    let dispatcher = Arc::new(Dispatcher::new(
        Engine::new(config.indicators.clone()),
        store,
        config.event_capacity,
    )
    .with_instruments(&config.instruments));
    dispatcher.restore_alerts().await?;

    let mut source = SimulatedTickSource::new(config.instruments.clone(), config.volatility);
    let period = Duration::from_millis(config.tick_interval_ms);
    let tick_loop = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            dispatcher
                .run(&mut source, period, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
        })
    };

    let state = Arc::new(tickwatch_api::AppState::new(
        dispatcher,
        config.instruments.clone(),
    ));
    tickwatch_api::start_server(state, &config.bind, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    let cycles = tick_loop.await?;
    tracing::info!(cycles, "Shut down");
    Ok(())
}

async fn simulate(
    config: AppConfig,
    cycles: u64,
    seed: Option<u64>,
    alerts: Vec<(String, f64)>,
) -> Result<()> {
    let dispatcher = Dispatcher::new(
        Engine::new(config.indicators.clone()),
        Arc::new(InMemoryAlertStore::new()),
        config.event_capacity,
    )
    .with_instruments(&config.instruments);
    for (symbol, price) in &alerts {
        let alert = dispatcher
            .create_alert(symbol, *price, AlertDirection::Below)
            .await?;
        println!("Registered alert {} on {} at {:.2}", alert.id, alert.symbol, alert.target_price);
    }

    let instruments = config.instruments.clone();
    let mut source = match seed {
        Some(seed) => SimulatedTickSource::with_seed(instruments, config.volatility, seed),
        None => SimulatedTickSource::new(instruments, config.volatility),
    };

    tracing::info!(cycles, "Starting simulation");
    for cycle in 1..=cycles {
        let batch = match source.next_batch().await {
            Ok(batch) => batch,
            Err(SourceError::Exhausted) => break,
            Err(e) => {
                tracing::warn!(cycle, error = %e, "Tick source failed, skipping cycle");
                continue;
            }
        };
        let report = dispatcher.dispatch(batch).await;
        for group in &report.triggered {
            let ids: Vec<String> = group.alerts.iter().map(|a| a.id.to_string()).collect();
            println!(
                "[cycle {cycle}] {} hit {:.2}, fired alert(s) {}",
                group.symbol,
                group.price,
                ids.join(", ")
            );
        }
    }

    let sep = "=".repeat(60);
    println!("\n{sep}");
    println!("  FINAL SNAPSHOTS");
    println!("{sep}");
    for inst in &config.instruments {
        let snapshot = dispatcher.snapshot(&inst.symbol).await;
        println!("  {}:", inst.symbol);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    let pending = dispatcher.list_alerts(None).await;
    println!("  Pending alerts:  {}", pending.len());
    println!("{sep}\n");

    Ok(())
}
