//! CDN ranker command line.
//!
//! ```text
//! cdn-ranker run --config cdn-ranker.toml   start the service, follow config toggles
//! cdn-ranker inspect runtime/cdn_snapshot.json --top 20
//! cdn-ranker check-config cdn-ranker.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};

use cdn_ranker::config::{load_config, watcher::ConfigWatcher};
use cdn_ranker::lifecycle::{signals, CdnService};
use cdn_ranker::observability::{logging, metrics};
use cdn_ranker::persistence::read_snapshot;

#[derive(Parser)]
#[command(name = "cdn-ranker")]
#[command(about = "Health-ranked CDN endpoint selection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ranking service until SIGINT/SIGTERM
    Run {
        #[arg(short, long, default_value = "cdn-ranker.toml")]
        config: PathBuf,
    },
    /// Print the ranking stored in a snapshot file
    Inspect {
        snapshot: PathBuf,

        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Load and validate a configuration file
    CheckConfig {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config).await?,
        Commands::Inspect { snapshot, top } => inspect(snapshot, top)?,
        Commands::CheckConfig { path } => {
            let config = load_config(&path)?;
            println!(
                "{}: ok (enabled={}, top_k={}, snapshot every {}s)",
                path.display(),
                config.cdn.enabled,
                config.cdn.top_k,
                config.cdn.snapshot_interval_secs
            );
        }
    }

    Ok(())
}

async fn run(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_config(&config_path);
    let level = loaded
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init_logging(&level)?;

    let config = loaded.inspect_err(|e| {
        tracing::error!(path = ?config_path, error = %e, "Failed to load configuration");
    })?;

    tracing::info!(
        enabled = config.cdn.enabled,
        top_k = config.cdn.top_k,
        snapshot_interval_secs = config.cdn.snapshot_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let service = Arc::new(CdnService::new(config));
    service.start().await?;

    let (watcher, mut config_updates) =
        ConfigWatcher::new(&config_path, service.config().as_ref().clone());
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, toggles require restart");
            None
        }
    };

    let terminate = signals::wait_for_termination();
    tokio::pin!(terminate);

    loop {
        tokio::select! {
            _ = &mut terminate => break,
            Some(new_config) = config_updates.recv() => {
                if let Err(e) = service.apply_config(new_config).await {
                    tracing::error!(error = %e, "Failed to apply configuration");
                }
            }
        }
    }

    service.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn inspect(path: PathBuf, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let Some(snapshot) = read_snapshot(&path) else {
        return Err(format!("{}: no usable snapshot", path.display()).into());
    };

    let entries: Vec<_> = snapshot.entries.iter().take(top).collect();
    let report = serde_json::json!({
        "version": snapshot.version,
        "last_check_at": snapshot.last_check_at,
        "total": snapshot.entries.len(),
        "top": entries,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
