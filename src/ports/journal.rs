//! Submission Journal Port - Audit Trail for Cleanup Submissions
//!
//! Every submission attempt, successful or not, is appended so that
//! failed batches can be followed up manually.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
  /// Sweep run identifier.
  pub run_id: String,
  /// Timestamp (Unix ms).
  pub timestamp_ms: u64,
  /// Pool display name.
  pub pool_name: String,
  /// Pool object id.
  pub pool_id: String,
  /// Batch position within the pool's run.
  pub batch_index: usize,
  /// Order ids in the batch (decimal strings, lossless).
  pub order_ids: Vec<String>,
  /// Transaction digest, if one was produced.
  pub digest: Option<String>,
  /// Whether the transaction executed successfully.
  pub success: bool,
  /// Failure reason, if any.
  pub error: Option<String>,
  /// Rebate minus gas (MIST), if execution was reported.
  pub net_rebate_mist: Option<i64>,
}

/// Trait for submission journal providers.
#[async_trait]
pub trait SubmissionJournal: Send + Sync + 'static {
  /// Append one record.
  async fn append(&self, record: &SubmissionRecord) -> anyhow::Result<()>;

  /// Load all records (for follow-up tooling and tests).
  async fn load(&self) -> anyhow::Result<Vec<SubmissionRecord>>;
}
