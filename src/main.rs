//! Service health daemon.
//!
//! Builds a check tree from a TOML file, keeps its background checks
//! refreshing, and prints the root result as JSON.
//!
//! ```text
//! config.toml → validate → build_tree → start background checks
//!                                          │
//!            report interval ──▶ root.check(ctx) ──▶ stdout (JSON line)
//!                                          │
//!            SIGINT/SIGTERM  ──▶ shutdown ─┘ (refresh loops stop)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use service_health::config::{load_config, HealthConfig};
use service_health::health::build_tree;
use service_health::lifecycle::{signals, Shutdown};
use service_health::observability::{logging, metrics};
use service_health::{Check, Context, HealthResult};

#[derive(Parser)]
#[command(name = "service-health")]
#[command(about = "Evaluate a tree of service health checks", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluate the tree once, print it and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HealthConfig::default(),
    };

    logging::init(&config.observability.log_level, config.observability.log_format);
    tracing::info!("service-health v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tree = build_tree(&config.tree);
    tracing::info!(
        root = %tree.root.name(),
        background_checks = tree.background.len(),
        "Check tree built"
    );

    let shutdown = Shutdown::new();
    let ctx = shutdown.context();
    tree.start(&ctx).await;

    let timeout = Duration::from_secs(config.report.timeout_secs);

    if cli.once {
        let passing = report(tree.root.as_ref(), &ctx, timeout).await?;
        tree.stop();
        if !passing {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.report.interval_secs));
    let signal = signals::wait_for_signal();
    tokio::pin!(signal);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                report(tree.root.as_ref(), &ctx, timeout).await?;
            }
            _ = &mut signal => {
                shutdown.trigger();
                break;
            }
        }
    }

    tree.stop();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Evaluate the root once and print it. Returns whether it passed.
async fn report(
    root: &dyn Check,
    ctx: &Context,
    timeout: Duration,
) -> Result<bool, serde_json::Error> {
    let eval_ctx = ctx.with_timeout(timeout);
    let (result, passing): (HealthResult, bool) = match root.check(&eval_ctx).await {
        Ok(result) => (result, true),
        Err(failure) => {
            tracing::warn!(check = %root.name(), error = %failure.error, "Health check failed");
            (failure.result, false)
        }
    };
    println!("{}", serde_json::to_string(&result)?);
    Ok(passing)
}
