//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the sweeper's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `PoolTopologyResolver`: Pool root to bid/ask collections
//! - `OrderBookScanner`: Paginated drain, grouped fetch, decode
//! - `CleanupSweep`: Scan, gate, batch, submit, journal

pub mod scanner;
pub mod sweep;
pub mod topology;

pub use scanner::{BookScan, OrderBookScanner, ScanSettings, ScanStats};
pub use sweep::{CleanupSweep, PoolReport, PoolStatus, SweepPlan, SweepReport};
pub use topology::{PoolTopologyResolver, TopologyError};
