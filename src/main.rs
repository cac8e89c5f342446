//! DeepBook Expiry Sweeper - Entry Point
//!
//! Initializes configuration, logging, the Sui gateway and signer,
//! then runs the cleanup sweep once or on an interval.
//!
//! Wiring sequence:
//! 1. Parse CLI, load config.toml + session overlay + env, validate
//! 2. Init tracing (JSON structured logging)
//! 3. Parse SUI_PRIVATE_KEY (fatal on a malformed key)
//! 4. Create SuiRpcClient (HTTP + rate limit + retry) and SuiObjectGateway
//! 5. Create JSONL submission journal
//! 6. Build the validated pool registry and the CleanupSweep
//! 7. Once: run one pass and exit
//! 8. Loop: spawn metrics + health servers, sweep every interval until SIGINT.
//!    SIGINT is honoured between passes, never inside one.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use deepbook_expiry_sweeper::adapters::metrics::{HealthServer, HealthState, SweepMetrics};
use deepbook_expiry_sweeper::adapters::persistence::JsonlJournal;
use deepbook_expiry_sweeper::adapters::signer::Ed25519Signer;
use deepbook_expiry_sweeper::adapters::sui::{SuiObjectGateway, SuiRpcClient};
use deepbook_expiry_sweeper::config::{self, AppConfig, RunMode};
use deepbook_expiry_sweeper::ports::object_gateway::ObjectGateway;
use deepbook_expiry_sweeper::ports::signer::TransactionSigner;
use deepbook_expiry_sweeper::usecases::sweep::{CleanupSweep, SweepReport};

type Sweep = CleanupSweep<SuiObjectGateway, Ed25519Signer, JsonlJournal>;

/// Scan DeepBook pools for expired orders and submit cleanup transactions.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to config.toml.
    #[arg(long, env = "SWEEPER_CONFIG", default_value = "config.toml")]
    config: String,

    /// Build batches but never submit.
    #[arg(long)]
    dry_run: bool,

    /// Run a single pass regardless of `sweep.mode`.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let mut config = config::loader::load_config(&cli.config)
        .context("Failed to load configuration")?;
    config.bot.dry_run |= cli.dry_run;
    if cli.once {
        config.sweep.mode = RunMode::Once;
    }

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        network = %config.rpc.network,
        dry_run = config.bot.dry_run,
        mode = ?config.sweep.mode,
        pools = config.pools.len(),
        "Starting DeepBook expiry sweeper"
    );

    // ── 3. Signer (fatal on malformed credentials) ──────────
    let signer = load_signer(&config)?;

    // ── 4. Sui gateway ──────────────────────────────────────
    let client = SuiRpcClient::new(config::loader::rpc_client_config(&config))
        .context("Failed to create Sui RPC client")?;
    let gateway = Arc::new(SuiObjectGateway::new(client));

    // ── 5. Submission journal ───────────────────────────────
    let journal = Arc::new(
        JsonlJournal::new(&config.persistence.data_dir)
            .await
            .context("Failed to open submission journal")?,
    );

    // ── 6. Registry + sweep ─────────────────────────────────
    let registry = config::loader::build_registry(&config)?;
    let sweep = Sweep::new(
        Arc::clone(&gateway),
        signer,
        journal,
        registry,
        config::loader::sweep_plan(&config),
    );

    if sweep.is_dry_run() {
        warn!("Dry-run mode - batches are built and logged but NOT submitted");
    }

    match config.sweep.mode {
        RunMode::Once => {
            let report = sweep.run_once(now_ms()).await;
            log_report(&report);
        }
        RunMode::Loop => run_loop(&config, &sweep, gateway).await?,
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse the configured key. A missing key is only allowed in dry-run mode.
fn load_signer(config: &AppConfig) -> Result<Option<Arc<Ed25519Signer>>> {
    let Some(raw) = config.private_key.as_deref() else {
        anyhow::ensure!(
            config.bot.dry_run,
            "SUI_PRIVATE_KEY is required unless running with dry_run"
        );
        return Ok(None);
    };

    let signer = Ed25519Signer::from_encoded(raw).context("Invalid SUI_PRIVATE_KEY")?;

    if let Some(expected) = &config.user_address {
        anyhow::ensure!(
            signer.address() == expected.as_str(),
            "Signer address {} does not match configured userAddress {expected}",
            signer.address()
        );
    }

    info!(address = %signer.address(), "Signer loaded");
    Ok(Some(Arc::new(signer)))
}

/// Sweep every `interval_seconds` until SIGINT, finishing the pass in flight.
async fn run_loop(config: &AppConfig, sweep: &Sweep, gateway: Arc<SuiObjectGateway>) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());

    let mut server_handles = Vec::new();
    let metrics = if config.metrics.enabled {
        let metrics = Arc::new(SweepMetrics::new().context("Failed to register metrics")?);

        let metrics_server = Arc::clone(&metrics);
        let bind = config.metrics.bind_address.clone();
        let rx = shutdown_tx.subscribe();
        server_handles.push(tokio::spawn(async move {
            if let Err(e) = metrics_server.serve(bind, rx).await {
                error!(error = %e, "Metrics server failed");
            }
        }));

        let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
        let rx = shutdown_tx.subscribe();
        server_handles.push(tokio::spawn(async move {
            if let Err(e) = health_server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }));

        Some(metrics)
    } else {
        None
    };

    let interval = Duration::from_secs(config.sweep.interval_seconds);
    info!(interval_s = interval.as_secs(), "Loop mode started");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("SIGINT received, stopping after the current pass");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGINT");
                stop_tx.closed().await;
            }
        }
    });

    health.set_gateway_healthy(gateway.is_healthy().await);
    sweep
        .run_until_shutdown(interval, stop_rx, now_ms, |report| {
            let metrics = metrics.clone();
            let health = Arc::clone(&health);
            let gateway = Arc::clone(&gateway);
            async move {
                log_report(&report);
                if let Some(m) = &metrics {
                    m.record_report(&report);
                }
                health.mark_swept();
                health.set_gateway_healthy(gateway.is_healthy().await);
            }
        })
        .await;

    let _ = shutdown_tx.send(());
    for handle in server_handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    Ok(())
}

fn log_report(report: &SweepReport) {
    for pool in &report.pools {
        info!(
            pool = %pool.pool_name,
            status = ?pool.status,
            scanned = pool.orders_scanned,
            expired = pool.expired_found,
            planned_batches = pool.planned_batches,
            submitted = pool.batches_submitted(),
            failed = pool.batches_failed(),
            "Pool result"
        );
        for batch in pool.batches.iter().filter(|b| !b.success) {
            error!(
                pool = %pool.pool_name,
                batch = batch.batch_index,
                digest = batch.digest.as_deref().unwrap_or("-"),
                reason = batch.error.as_deref().unwrap_or("-"),
                "Batch needs manual follow-up"
            );
        }
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
