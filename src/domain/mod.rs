//! Domain layer - Core business logic and models.
//!
//! Pure order-book reconstruction logic: order snapshots, the tagged
//! storage decoder, rebate aggregation, the profitability gate and batch
//! construction. No I/O here (hexagonal architecture inner ring).

pub mod batch;
pub mod decode;
pub mod gate;
pub mod order;
pub mod pool;
pub mod rebate;

// Re-export core types for convenience
pub use batch::{BatchDescriptor, CallArg, CallStyle, CleanupBatch, CleanupBatchBuilder, EntryPoints, MoveCall};
pub use gate::ProfitabilityGate;
pub use order::{Order, OrderId, Side, NEVER_EXPIRES};
pub use pool::{BookCollections, PoolConfig, PoolRegistry, PoolSpec};
pub use rebate::{RebateEstimator, RebateSummary};
