//! Prometheus Metrics Registry - Sweep Observability
//!
//! Registers and exposes Prometheus metrics for loop mode. Covers
//! scan volume, expired orders, batch outcomes, rebates and scan
//! completeness per pool.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::rebate::mist_to_sui;
use crate::usecases::sweep::{PoolStatus, SweepReport};

/// Centralized Prometheus metrics for the sweeper.
///
/// All metrics follow the naming convention `deepbook_sweeper_*` and
/// carry a `pool` label where they are per pool.
pub struct SweepMetrics {
    registry: Registry,
    /// Completed sweep runs.
    pub runs: IntCounter,
    /// Sweep wall time (seconds).
    pub run_duration_seconds: Histogram,
    /// Orders decoded in the last run.
    pub orders_scanned: IntGaugeVec,
    /// Expired orders found in the last run.
    pub expired_orders: IntGaugeVec,
    /// Batches by result (`submitted`, `failed`).
    pub batches: IntCounterVec,
    /// Estimated rebate of the last run (SUI).
    pub estimated_rebate_sui: GaugeVec,
    /// Cumulative net rebate of executed batches (SUI).
    pub net_rebate_sui: GaugeVec,
    /// Read-side losses by kind (`page`, `group`, `decode`, `topology`).
    pub scan_failures: IntCounterVec,
}

impl SweepMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let runs = IntCounter::new("deepbook_sweeper_runs_total", "Completed sweep runs")?;

        let run_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("deepbook_sweeper_run_duration_seconds", "Sweep wall time in seconds")
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        )?;

        let orders_scanned = IntGaugeVec::new(
            Opts::new("deepbook_sweeper_orders_scanned", "Orders decoded in the last run"),
            &["pool"],
        )?;

        let expired_orders = IntGaugeVec::new(
            Opts::new("deepbook_sweeper_expired_orders", "Expired orders found in the last run"),
            &["pool"],
        )?;

        let batches = IntCounterVec::new(
            Opts::new("deepbook_sweeper_batches_total", "Cleanup batches by result"),
            &["pool", "result"],
        )?;

        let estimated_rebate_sui = GaugeVec::new(
            Opts::new("deepbook_sweeper_estimated_rebate_sui", "Estimated rebate of the last run in SUI"),
            &["pool"],
        )?;

        let net_rebate_sui = GaugeVec::new(
            Opts::new("deepbook_sweeper_net_rebate_sui", "Cumulative net rebate of executed batches in SUI"),
            &["pool"],
        )?;

        let scan_failures = IntCounterVec::new(
            Opts::new("deepbook_sweeper_scan_failures_total", "Read-side losses by kind"),
            &["pool", "kind"],
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(run_duration_seconds.clone()))?;
        registry.register(Box::new(orders_scanned.clone()))?;
        registry.register(Box::new(expired_orders.clone()))?;
        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(estimated_rebate_sui.clone()))?;
        registry.register(Box::new(net_rebate_sui.clone()))?;
        registry.register(Box::new(scan_failures.clone()))?;

        Ok(Self {
            registry,
            runs,
            run_duration_seconds,
            orders_scanned,
            expired_orders,
            batches,
            estimated_rebate_sui,
            net_rebate_sui,
            scan_failures,
        })
    }

    /// Fold one sweep report into the metrics.
    pub fn record_report(&self, report: &SweepReport) {
        self.runs.inc();
        let elapsed = (report.finished_at - report.started_at).num_milliseconds();
        self.run_duration_seconds.observe(elapsed.max(0) as f64 / 1000.0);

        for pool in &report.pools {
            let name = pool.pool_name.as_str();
            self.orders_scanned
                .with_label_values(&[name])
                .set(i64::try_from(pool.orders_scanned).unwrap_or(i64::MAX));
            self.expired_orders
                .with_label_values(&[name])
                .set(i64::try_from(pool.expired_found).unwrap_or(i64::MAX));

            self.batches
                .with_label_values(&[name, "submitted"])
                .inc_by(pool.batches_submitted() as u64);
            self.batches
                .with_label_values(&[name, "failed"])
                .inc_by(pool.batches_failed() as u64);

            let estimated = pool.rebate.as_ref().map_or(0, |r| r.total_mist);
            self.estimated_rebate_sui
                .with_label_values(&[name])
                .set(decimal_to_f64(mist_to_sui(estimated)));

            let net = pool.net_rebate_mist();
            let net_sui = decimal_to_f64(mist_to_sui(net.unsigned_abs()));
            self.net_rebate_sui
                .with_label_values(&[name])
                .add(if net < 0 { -net_sui } else { net_sui });

            let stats = &pool.stats;
            for (kind, count) in [
                ("page", stats.failed_pages),
                ("group", stats.failed_groups),
                ("decode", stats.decode_failures),
                ("topology", usize::from(pool.status == PoolStatus::TopologyFailed)),
            ] {
                if count > 0 {
                    self.scan_failures.with_label_values(&[name, kind]).inc_by(count as u64);
                }
            }
        }
    }

    fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

fn decimal_to_f64(d: rust_decimal::Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    d.to_f64().unwrap_or(0.0)
}
