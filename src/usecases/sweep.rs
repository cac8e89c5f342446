//! Cleanup Sweep Use Case - One pass over every registered pool
//!
//! Sweep flow per pool:
//! 1. Resolve the pool's bid/ask collections
//! 2. Scan both sides and keep expired orders
//! 3. Estimate the rebate and apply the profitability gate
//! 4. Build size-bounded batches
//! 5. Submit batches one at a time and journal every outcome
//!
//! Read-side failures end the pool's pass, never the run. Submission
//! failures are reported per batch and do not stop later batches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::batch::{BatchDescriptor, CleanupBatchBuilder, EntryPoints};
use crate::domain::gate::ProfitabilityGate;
use crate::domain::order::OrderId;
use crate::domain::pool::{PoolConfig, PoolRegistry};
use crate::domain::rebate::{RebateEstimator, RebateSummary};
use crate::ports::journal::{SubmissionJournal, SubmissionRecord};
use crate::ports::object_gateway::{ExecutionStatus, GatewayError, ObjectGateway, SubmissionOutcome};
use crate::ports::signer::TransactionSigner;

use super::scanner::{OrderBookScanner, ScanSettings, ScanStats};
use super::topology::PoolTopologyResolver;

/// Why a batch did not clean up its orders.
#[derive(Debug, Error)]
pub enum SubmissionError {
  #[error(transparent)]
  Gateway(#[from] GatewayError),
  #[error("transaction {digest} failed: {reason}")]
  ExecutionFailed {
    digest: String,
    reason: String,
    net_rebate_mist: i128,
  },
}

/// Where one pool's pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
  /// Scanned; nothing expired.
  Scanned,
  /// Pool has no versioned payload yet.
  NoPayload,
  /// Pool structure could not be resolved.
  TopologyFailed,
  /// Expired orders found but the rebate does not cover the fixed cost.
  NotProfitable,
  /// Batches could not be built.
  BuildFailed,
  /// Batches built and logged, nothing submitted.
  DryRun,
  /// Batches submitted (individually successful or not).
  Submitted,
}

/// Result of one submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
  pub batch_index: usize,
  pub order_count: usize,
  pub digest: Option<String>,
  pub success: bool,
  pub error: Option<String>,
  /// Rebate minus gas (MIST), when the node reported execution.
  pub net_rebate_mist: Option<i128>,
}

/// Result of one pool's pass.
#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
  pub pool_name: String,
  pub pool_id: String,
  pub status: PoolStatus,
  pub orders_scanned: usize,
  pub expired_found: usize,
  pub rebate: Option<RebateSummary>,
  #[serde(skip)]
  pub stats: ScanStats,
  pub planned_batches: usize,
  pub batches: Vec<BatchOutcome>,
  pub error: Option<String>,
}

impl PoolReport {
  fn new(pool: &PoolConfig, status: PoolStatus) -> Self {
    Self {
      pool_name: pool.name.clone(),
      pool_id: pool.pool_id.clone(),
      status,
      orders_scanned: 0,
      expired_found: 0,
      rebate: None,
      stats: ScanStats::default(),
      planned_batches: 0,
      batches: Vec::new(),
      error: None,
    }
  }

  pub fn batches_submitted(&self) -> usize {
    self.batches.iter().filter(|b| b.success).count()
  }

  pub fn batches_failed(&self) -> usize {
    self.batches.iter().filter(|b| !b.success).count()
  }

  pub fn net_rebate_mist(&self) -> i128 {
    self.batches.iter().filter_map(|b| b.net_rebate_mist).sum()
  }
}

/// Aggregated report of one sweep run.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
  pub run_id: Uuid,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub reference_time_ms: u64,
  pub dry_run: bool,
  pub pools: Vec<PoolReport>,
}

impl SweepReport {
  pub fn orders_scanned(&self) -> usize {
    self.pools.iter().map(|p| p.orders_scanned).sum()
  }

  pub fn expired_found(&self) -> usize {
    self.pools.iter().map(|p| p.expired_found).sum()
  }

  pub fn batches_submitted(&self) -> usize {
    self.pools.iter().map(PoolReport::batches_submitted).sum()
  }

  pub fn batches_failed(&self) -> usize {
    self.pools.iter().map(PoolReport::batches_failed).sum()
  }

  pub fn estimated_rebate_mist(&self) -> u128 {
    self
      .pools
      .iter()
      .filter_map(|p| p.rebate.as_ref())
      .map(|r| r.total_mist)
      .sum()
  }

  pub fn net_rebate_mist(&self) -> i128 {
    self.pools.iter().map(PoolReport::net_rebate_mist).sum()
  }
}

/// Everything the sweep needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SweepPlan {
  pub scan: ScanSettings,
  pub estimator: RebateEstimator,
  pub gate: ProfitabilityGate,
  pub builder: CleanupBatchBuilder,
  pub entry: EntryPoints,
  /// Build and log batches without submitting.
  pub dry_run: bool,
  /// Fan pools out concurrently instead of one after another.
  pub concurrent_pools: bool,
}

/// Scan-and-submit pass over a pool registry.
pub struct CleanupSweep<G: ObjectGateway, S: TransactionSigner, J: SubmissionJournal> {
  gateway: Arc<G>,
  signer: Option<Arc<S>>,
  journal: Arc<J>,
  registry: PoolRegistry,
  resolver: PoolTopologyResolver<G>,
  scanner: OrderBookScanner<G>,
  plan: SweepPlan,
}

impl<G: ObjectGateway, S: TransactionSigner, J: SubmissionJournal> CleanupSweep<G, S, J> {
  /// Create a sweep. Without a signer the sweep always runs dry.
  pub fn new(
    gateway: Arc<G>,
    signer: Option<Arc<S>>,
    journal: Arc<J>,
    registry: PoolRegistry,
    plan: SweepPlan,
  ) -> Self {
    Self {
      resolver: PoolTopologyResolver::new(Arc::clone(&gateway)),
      scanner: OrderBookScanner::new(Arc::clone(&gateway), plan.scan),
      gateway,
      signer,
      journal,
      registry,
      plan,
    }
  }

  /// Whether this sweep will skip submission.
  pub fn is_dry_run(&self) -> bool {
    self.plan.dry_run || self.signer.is_none()
  }

  pub fn registry(&self) -> &PoolRegistry {
    &self.registry
  }

  /// Sweep every `interval` until `shutdown` turns true or its sender is gone.
  ///
  /// Shutdown is only observed between passes. A pass that has started runs
  /// to completion, so every submission it makes is journaled and handed to
  /// `on_pass`. Returns the number of completed passes.
  pub async fn run_until_shutdown<C, F, Fut>(
    &self,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    clock: C,
    mut on_pass: F,
  ) -> usize
  where
    C: Fn() -> u64,
    F: FnMut(SweepReport) -> Fut,
    Fut: Future<Output = ()>,
  {
    let mut passes = 0usize;

    while !*shutdown.borrow_and_update() {
      let report = self.run_once(clock()).await;
      passes += 1;
      on_pass(report).await;

      tokio::select! {
        () = tokio::time::sleep(interval) => {}
        changed = shutdown.changed() => {
          if changed.is_err() {
            break;
          }
        }
      }
    }

    info!(passes, "Sweep loop stopped");
    passes
  }

  /// Run one pass over every pool against `reference_time_ms`.
  #[instrument(skip(self), fields(pools = self.registry.len()))]
  pub async fn run_once(&self, reference_time_ms: u64) -> SweepReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let dry_run = self.is_dry_run();

    info!(%run_id, reference_time_ms, dry_run, "Starting cleanup sweep");

    let pools = if self.plan.concurrent_pools {
      join_all(
        self
          .registry
          .pools()
          .iter()
          .map(|pool| self.sweep_pool(run_id, pool, reference_time_ms, dry_run)),
      )
      .await
    } else {
      let mut reports = Vec::with_capacity(self.registry.len());
      for pool in self.registry.pools() {
        reports.push(self.sweep_pool(run_id, pool, reference_time_ms, dry_run).await);
      }
      reports
    };

    let report = SweepReport {
      run_id,
      started_at,
      finished_at: Utc::now(),
      reference_time_ms,
      dry_run,
      pools,
    };

    info!(
      %run_id,
      orders_scanned = report.orders_scanned(),
      expired = report.expired_found(),
      submitted = report.batches_submitted(),
      failed = report.batches_failed(),
      net_rebate_mist = %report.net_rebate_mist(),
      "Cleanup sweep complete"
    );

    report
  }

  #[instrument(skip(self, pool, reference_time_ms, dry_run), fields(pool = %pool.name))]
  async fn sweep_pool(
    &self,
    run_id: Uuid,
    pool: &PoolConfig,
    reference_time_ms: u64,
    dry_run: bool,
  ) -> PoolReport {
    let collections = match self.resolver.resolve(&pool.pool_id).await {
      Ok(Some(c)) => c,
      Ok(None) => return PoolReport::new(pool, PoolStatus::NoPayload),
      Err(e) => {
        warn!(pool_id = %pool.pool_id, error = %e, "Pool topology unresolved, skipping pool");
        let mut report = PoolReport::new(pool, PoolStatus::TopologyFailed);
        report.error = Some(e.to_string());
        return report;
      }
    };

    let scan = self.scanner.scan_book(&collections, reference_time_ms).await;
    let expired = scan.expired();

    let mut report = PoolReport::new(pool, PoolStatus::Scanned);
    report.orders_scanned = scan.orders.len();
    report.expired_found = expired.len();
    report.stats = scan.stats;

    if expired.is_empty() {
      info!(orders = report.orders_scanned, "No expired orders");
      return report;
    }

    let rebate = self.plan.estimator.estimate(expired.iter().copied());
    info!(
      expired = rebate.total_orders,
      rebate_sui = %rebate.total_sui(),
      estimated = rebate.is_estimated,
      "Expired orders found"
    );
    report.rebate = Some(rebate);

    if !self.plan.gate.is_worth_submitting(expired.len()) {
      info!(
        expected_mist = %self.plan.gate.expected_mist(expired.len()),
        fixed_cost_sui = %self.plan.gate.fixed_cost_sui(),
        "Rebate below fixed cost, skipping pool"
      );
      report.status = PoolStatus::NotProfitable;
      return report;
    }

    let order_ids: Vec<OrderId> = expired.iter().map(|o| o.order_id).collect();
    let batches = match self.plan.builder.build(pool, &order_ids) {
      Ok(b) => b,
      Err(e) => {
        error!(error = %e, "Batch construction failed");
        report.status = PoolStatus::BuildFailed;
        report.error = Some(e.to_string());
        return report;
      }
    };
    report.planned_batches = batches.len();

    let signer = match (&self.signer, dry_run) {
      (Some(signer), false) => signer,
      _ => {
        for batch in &batches {
          let descriptor = self.plan.builder.render(batch, &self.plan.entry);
          info!(
            batch = descriptor.batch_index,
            orders = descriptor.order_ids.len(),
            calls = descriptor.calls.len(),
            gas_budget = descriptor.gas_budget,
            "Dry run: batch not submitted"
          );
        }
        report.status = PoolStatus::DryRun;
        return report;
      }
    };

    report.status = PoolStatus::Submitted;
    for batch in &batches {
      let descriptor = self.plan.builder.render(batch, &self.plan.entry);
      let outcome = self.submit_batch(signer.as_ref(), &descriptor).await;
      self.journal_outcome(run_id, pool, &descriptor, &outcome).await;
      report.batches.push(outcome);
    }

    report
  }

  /// Submit one descriptor. Never retried.
  async fn submit_batch(&self, signer: &S, descriptor: &BatchDescriptor) -> BatchOutcome {
    let result = self
      .gateway
      .submit(signer, descriptor)
      .await
      .map_err(SubmissionError::from)
      .and_then(|outcome| {
        if let ExecutionStatus::Failure { reason } = &outcome.status {
          return Err(SubmissionError::ExecutionFailed {
            digest: outcome.digest.clone(),
            reason: reason.clone(),
            net_rebate_mist: outcome.cost.net_rebate_mist(),
          });
        }
        Ok(outcome)
      });

    let order_count = descriptor.order_ids.len();
    match result {
      Ok(SubmissionOutcome { digest, cost, .. }) => {
        info!(
          batch = descriptor.batch_index,
          orders = order_count,
          %digest,
          net_rebate_mist = %cost.net_rebate_mist(),
          "Batch executed"
        );
        BatchOutcome {
          batch_index: descriptor.batch_index,
          order_count,
          digest: Some(digest),
          success: true,
          error: None,
          net_rebate_mist: Some(cost.net_rebate_mist()),
        }
      }
      Err(e) => {
        error!(batch = descriptor.batch_index, orders = order_count, error = %e, "Batch submission failed");
        let (digest, net) = match &e {
          SubmissionError::ExecutionFailed { digest, net_rebate_mist, .. } => {
            (Some(digest.clone()), Some(*net_rebate_mist))
          }
          SubmissionError::Gateway(_) => (None, None),
        };
        BatchOutcome {
          batch_index: descriptor.batch_index,
          order_count,
          digest,
          success: false,
          error: Some(e.to_string()),
          net_rebate_mist: net,
        }
      }
    }
  }

  async fn journal_outcome(
    &self,
    run_id: Uuid,
    pool: &PoolConfig,
    descriptor: &BatchDescriptor,
    outcome: &BatchOutcome,
  ) {
    let record = SubmissionRecord {
      run_id: run_id.to_string(),
      timestamp_ms: u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0),
      pool_name: pool.name.clone(),
      pool_id: pool.pool_id.clone(),
      batch_index: outcome.batch_index,
      order_ids: descriptor.order_ids.iter().map(ToString::to_string).collect(),
      digest: outcome.digest.clone(),
      success: outcome.success,
      error: outcome.error.clone(),
      net_rebate_mist: outcome.net_rebate_mist.and_then(|n| i64::try_from(n).ok()),
    };

    if let Err(e) = self.journal.append(&record).await {
      warn!(batch = outcome.batch_index, error = %e, "Failed to journal submission outcome");
    }
  }
}
