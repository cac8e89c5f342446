//! Object Gateway Port - Remote Versioned Object Store Interface
//!
//! Defines the trait for reading objects from the Sui ledger and
//! submitting signed cleanup transactions. Only request/response
//! semantics matter here; the JSON-RPC wire format lives in adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::batch::BatchDescriptor;
use crate::domain::order::ObjectId;

use super::signer::TransactionSigner;

/// One object as returned by a point or batched lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectData {
  /// Object identifier.
  pub object_id: ObjectId,
  /// Object version (sequence number).
  pub version: u64,
  /// Fully qualified Move type, if reported.
  pub type_tag: Option<String>,
  /// Raw `content` value (`{ dataType, type, fields }`).
  pub content: Value,
  /// Storage rebate refunded if this object is deleted (MIST).
  pub storage_rebate: Option<u64>,
}

/// Reference to one child of a parent object.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRef {
  /// Child object identifier.
  pub object_id: ObjectId,
  /// Move type of the child key (e.g. `u64`).
  pub name_type: String,
  /// Key value as rendered by the node.
  pub name_value: Value,
  /// Move type of the child object.
  pub object_type: Option<String>,
}

/// One page of a cursor-paginated child enumeration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
  /// Children in stable insertion order.
  pub items: Vec<ChildRef>,
  /// Opaque continuation cursor.
  pub next_cursor: Option<String>,
  /// Whether more pages remain.
  pub has_more: bool,
}

/// Execution status reported for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
  /// Transaction executed successfully.
  Success,
  /// Transaction executed but aborted.
  Failure {
    /// Abort reason reported by the node.
    reason: String,
  },
}

/// Gas cost breakdown (MIST).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostBreakdown {
  pub computation: u64,
  pub storage: u64,
  pub storage_rebate: u64,
}

impl CostBreakdown {
  /// Rebate minus gas spent; positive means the sweep earned SUI.
  pub fn net_rebate_mist(&self) -> i128 {
    i128::from(self.storage_rebate) - i128::from(self.computation) - i128::from(self.storage)
  }
}

/// Balance change for one owner and coin type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDelta {
  pub owner: String,
  pub coin_type: String,
  pub amount: i128,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
  /// Transaction digest.
  pub digest: String,
  /// Execution status.
  pub status: ExecutionStatus,
  /// Gas cost breakdown.
  pub cost: CostBreakdown,
  /// Balance changes caused by the transaction.
  pub balance_deltas: Vec<BalanceDelta>,
}

/// Gateway failure modes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
  #[error("object {0} not found")]
  NotFound(ObjectId),
  #[error("object {object_id} has unexpected shape: {detail}")]
  WrongKind { object_id: ObjectId, detail: String },
  #[error("transport error: {0}")]
  Transport(String),
  #[error("rpc error {code}: {message}")]
  Rpc { code: i64, message: String },
  #[error("malformed response: {0}")]
  Malformed(String),
  #[error("signing failed: {0}")]
  Signing(String),
}

/// Trait for remote object store access.
///
/// Implementors must be safe for concurrent read use by several scan
/// tasks at once.
#[async_trait]
pub trait ObjectGateway: Send + Sync + 'static {
  /// Fetch a single object with its content.
  ///
  /// # Errors
  /// `NotFound` when the object does not exist, `WrongKind` when it is
  /// not a Move object.
  async fn get_object(&self, id: &str) -> Result<ObjectData, GatewayError>;

  /// Fetch one page of a parent's children. `cursor = None` starts from the beginning.
  async fn get_children(
    &self,
    parent_id: &str,
    cursor: Option<&str>,
    limit: usize,
  ) -> Result<Page, GatewayError>;

  /// Fetch many objects in one round trip, positionally aligned with `ids`.
  ///
  /// Missing objects are `None` rather than an error.
  async fn multi_get_objects(&self, ids: &[ObjectId]) -> Result<Vec<Option<ObjectData>>, GatewayError>;

  /// Build, sign and execute one batch descriptor.
  async fn submit(
    &self,
    signer: &dyn TransactionSigner,
    descriptor: &BatchDescriptor,
  ) -> Result<SubmissionOutcome, GatewayError>;

  /// Check if the gateway is reachable.
  async fn is_healthy(&self) -> bool;
}
