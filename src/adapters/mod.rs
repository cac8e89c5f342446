//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP JSON-RPC, key material, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `sui`: Sui full-node JSON-RPC gateway
//! - `signer`: Ed25519 key parsing and transaction signing
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSONL submission journal

pub mod metrics;
pub mod persistence;
pub mod signer;
pub mod sui;
