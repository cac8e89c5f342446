//! Sui Full-Node Adapter
//!
//! Implements `ObjectGateway` over the Sui JSON-RPC API.
//!
//! Sub-modules:
//! - `client`: HTTP transport with rate limiting, concurrency bound and retries
//! - `gateway`: Port implementation (object reads, batch submission)
//! - `types`: JSON-RPC response type definitions

pub mod client;
pub mod gateway;
pub mod types;

pub use client::{SuiRpcClient, SuiRpcConfig};
pub use gateway::SuiObjectGateway;
