//! Cleanup batch construction.
//!
//! Splits expired order ids into contiguous, size-bounded batches and
//! renders each batch into a transaction descriptor. Two Move calling
//! conventions are supported:
//!
//! - [`CallStyle::Vector`]: one call per batch taking `vector<u128>`
//!   (`clean_up_expired_orders`-style entry points).
//! - [`CallStyle::Scalar`]: one call per order (`cancel_order`-style entry
//!   points). The batch size is then also capped by the per-transaction
//!   command ceiling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::order::{ObjectId, OrderId};
use super::pool::PoolConfig;

/// Sui's ceiling on commands in one programmable transaction block.
pub const PTB_MAX_COMMANDS: usize = 1024;

/// Shared Clock object.
pub const CLOCK_OBJECT_ID: &str = "0x6";

/// Which Move calling convention the cleanup entry point uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStyle {
    Vector,
    Scalar,
}

/// Batch sizing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch limit must be positive (requested={requested}, ceiling={ceiling})")]
    ZeroLimit { requested: usize, ceiling: usize },
}

/// Target Move functions for both calling conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    pub package: ObjectId,
    pub module: String,
    pub vector_function: String,
    pub scalar_function: String,
    /// Append the Clock object as the last argument.
    pub include_clock: bool,
}

/// One ordered, size-bounded group of order ids for a single pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupBatch {
    /// Position of this batch within the pool's run.
    pub index: usize,
    pub pool_id: ObjectId,
    pub base_type: String,
    pub quote_type: String,
    pub order_ids: Vec<OrderId>,
    /// Gas budget for the transaction (MIST).
    pub gas_budget: u64,
}

/// A positional Move call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Object(ObjectId),
    U128(OrderId),
    U128Vec(Vec<OrderId>),
}

/// One Move call: `package::module::function<type_arguments>(arguments)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<CallArg>,
}

/// A submittable transaction: ordered calls plus an explicit gas budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDescriptor {
    pub batch_index: usize,
    pub pool_id: ObjectId,
    pub order_ids: Vec<OrderId>,
    pub calls: Vec<MoveCall>,
    pub gas_budget: u64,
}

/// Partition `order_ids` into contiguous groups of `min(requested_max, platform_ceiling)`.
///
/// Concatenating the groups reproduces the input exactly; only the last
/// group may be shorter.
pub fn partition(
    order_ids: &[OrderId],
    requested_max: usize,
    platform_ceiling: usize,
) -> Result<Vec<Vec<OrderId>>, BatchError> {
    let effective = requested_max.min(platform_ceiling);
    if effective == 0 {
        return Err(BatchError::ZeroLimit {
            requested: requested_max,
            ceiling: platform_ceiling,
        });
    }
    Ok(order_ids.chunks(effective).map(<[OrderId]>::to_vec).collect())
}

/// Builds and renders cleanup batches.
#[derive(Debug, Clone)]
pub struct CleanupBatchBuilder {
    requested_max: usize,
    platform_ceiling: usize,
    max_operations: usize,
    style: CallStyle,
    gas_budget: u64,
}

impl CleanupBatchBuilder {
    pub fn new(
        requested_max: usize,
        platform_ceiling: usize,
        max_operations: usize,
        style: CallStyle,
        gas_budget: u64,
    ) -> Self {
        Self {
            requested_max,
            platform_ceiling,
            max_operations,
            style,
            gas_budget,
        }
    }

    pub fn style(&self) -> CallStyle {
        self.style
    }

    /// Ceiling actually applied to each batch.
    pub fn effective_ceiling(&self) -> usize {
        match self.style {
            CallStyle::Vector => self.platform_ceiling,
            CallStyle::Scalar => self.platform_ceiling.min(self.max_operations),
        }
    }

    /// Group `order_ids` for `pool` into batches.
    pub fn build(
        &self,
        pool: &PoolConfig,
        order_ids: &[OrderId],
    ) -> Result<Vec<CleanupBatch>, BatchError> {
        let groups = partition(order_ids, self.requested_max, self.effective_ceiling())?;

        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(index, order_ids)| CleanupBatch {
                index,
                pool_id: pool.pool_id.clone(),
                base_type: pool.base_type.clone(),
                quote_type: pool.quote_type.clone(),
                order_ids,
                gas_budget: self.gas_budget,
            })
            .collect())
    }

    /// Render a batch into a transaction descriptor using the configured style.
    pub fn render(&self, batch: &CleanupBatch, entry: &EntryPoints) -> BatchDescriptor {
        let call = |function: &str, ids: CallArg| {
            let mut arguments = vec![CallArg::Object(batch.pool_id.clone()), ids];
            if entry.include_clock {
                arguments.push(CallArg::Object(CLOCK_OBJECT_ID.to_string()));
            }
            MoveCall {
                package: entry.package.clone(),
                module: entry.module.clone(),
                function: function.to_string(),
                type_arguments: vec![batch.base_type.clone(), batch.quote_type.clone()],
                arguments,
            }
        };

        let calls = match self.style {
            CallStyle::Vector => vec![call(
                &entry.vector_function,
                CallArg::U128Vec(batch.order_ids.clone()),
            )],
            CallStyle::Scalar => batch
                .order_ids
                .iter()
                .map(|id| call(&entry.scalar_function, CallArg::U128(*id)))
                .collect(),
        };

        BatchDescriptor {
            batch_index: batch.index,
            pool_id: batch.pool_id.clone(),
            order_ids: batch.order_ids.clone(),
            calls,
            gas_budget: batch.gas_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolConfig {
        PoolConfig {
            name: "SUI_USDC".to_string(),
            pool_id: "0xpool".to_string(),
            base_type: "0x2::sui::SUI".to_string(),
            quote_type: "0xdba3::usdc::USDC".to_string(),
        }
    }

    fn entry(include_clock: bool) -> EntryPoints {
        EntryPoints {
            package: "0xdee9".to_string(),
            module: "pool".to_string(),
            vector_function: "clean_up_expired_orders".to_string(),
            scalar_function: "cancel_order".to_string(),
            include_clock,
        }
    }

    #[test]
    fn test_130_ids_split_50_50_30() {
        let ids: Vec<u128> = (0..130).collect();
        let builder = CleanupBatchBuilder::new(50, 1024, PTB_MAX_COMMANDS, CallStyle::Vector, 50_000_000);
        let batches = builder.build(&pool(), &ids).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.order_ids.len()).collect();
        assert_eq!(sizes, vec![50, 50, 30]);
        assert_eq!(batches[2].index, 2);
        assert_eq!(batches[2].order_ids[0], 100);
    }

    #[test]
    fn test_ceiling_caps_requested_max() {
        let groups = partition(&(0..10).collect::<Vec<_>>(), 100, 4).unwrap();
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4, 2]);
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(partition(&[1, 2], 0, 10).is_err());
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(partition(&[], 10, 10).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_style_respects_operation_ceiling() {
        let ids: Vec<u128> = (0..10).collect();
        let builder = CleanupBatchBuilder::new(50, 1024, 3, CallStyle::Scalar, 1);
        let batches = builder.build(&pool(), &ids).unwrap();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.order_ids.len() <= 3));
    }

    #[test]
    fn test_vector_render_single_call() {
        let builder = CleanupBatchBuilder::new(50, 1024, PTB_MAX_COMMANDS, CallStyle::Vector, 7);
        let batch = builder.build(&pool(), &[5, 6]).unwrap().remove(0);
        let desc = builder.render(&batch, &entry(true));
        assert_eq!(desc.calls.len(), 1);
        assert_eq!(desc.gas_budget, 7);
        let call = &desc.calls[0];
        assert_eq!(call.function, "clean_up_expired_orders");
        assert_eq!(call.type_arguments, vec!["0x2::sui::SUI", "0xdba3::usdc::USDC"]);
        assert_eq!(
            call.arguments,
            vec![
                CallArg::Object("0xpool".to_string()),
                CallArg::U128Vec(vec![5, 6]),
                CallArg::Object(CLOCK_OBJECT_ID.to_string()),
            ]
        );
    }

    #[test]
    fn test_scalar_render_one_call_per_order() {
        let builder = CleanupBatchBuilder::new(50, 1024, PTB_MAX_COMMANDS, CallStyle::Scalar, 7);
        let batch = builder.build(&pool(), &[5, 6, 7]).unwrap().remove(0);
        let desc = builder.render(&batch, &entry(false));
        assert_eq!(desc.calls.len(), 3);
        assert_eq!(desc.calls[2].arguments[1], CallArg::U128(7));
        assert_eq!(desc.calls[0].arguments.len(), 2);
        assert_eq!(desc.calls[0].function, "cancel_order");
    }
}
