//! Configuration Module - TOML-based Sweeper Configuration
//!
//! Loads and validates configuration from `config.toml`, then applies
//! the optional JSON session overlay and environment overrides.
//! Pool ids, coin types and contract entry points are externalized
//! here - nothing is hardcoded in the domain layer.

pub mod loader;
pub mod overlay;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::batch::{CallStyle, PTB_MAX_COMMANDS};
use crate::domain::gate::DEFAULT_FIXED_COST_MIST;
use crate::domain::rebate::DEFAULT_PER_ORDER_ESTIMATE_MIST;

/// Top-level sweeper configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the first sweep begins.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Process identity and mode.
  pub bot: BotConfig,
  /// Sui full-node connection.
  pub rpc: RpcConfig,
  /// Scan and batch parameters.
  #[serde(default)]
  pub sweep: SweepConfig,
  /// Rebate estimate and fixed cost.
  #[serde(default)]
  pub rebate: RebateConfig,
  /// Cleanup entry points.
  pub contract: ContractConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Persistence configuration.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Coin symbol to fully qualified Move type.
  #[serde(default)]
  pub coins: BTreeMap<String, String>,
  /// Pools to sweep.
  #[serde(default)]
  pub pools: Vec<PoolEntry>,
  /// Signing key, never read from TOML (env or session overlay only).
  #[serde(skip)]
  pub private_key: Option<String>,
  /// Expected signer address, checked at startup when set.
  #[serde(skip)]
  pub user_address: Option<String>,
  /// Restrict the pass to one pool (name or id).
  #[serde(skip)]
  pub pool_filter: Option<String>,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Build and log batches without submitting.
  #[serde(default)]
  pub dry_run: bool,
  /// Optional JSON session overlay path.
  pub session_file: Option<String>,
}

/// Sui full-node RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
  /// JSON-RPC endpoint.
  pub url: String,
  /// Network label (mainnet, testnet, devnet, localnet).
  #[serde(default = "default_network")]
  pub network: String,
  /// Per-request timeout; absent means no timeout.
  pub timeout_ms: Option<u64>,
  /// Maximum in-flight requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Request rate ceiling; 0 disables throttling.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Retries on transient read failures.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base backoff delay (milliseconds).
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
}

/// Run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
  /// One pass, then exit.
  #[default]
  Once,
  /// Repeat every `interval_seconds` until interrupted.
  Loop,
}

/// Scan and batch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
  #[serde(default)]
  pub mode: RunMode,
  /// Pause between passes in loop mode (seconds).
  #[serde(default = "default_interval_seconds")]
  pub interval_seconds: u64,
  /// Children per page when draining a collection.
  #[serde(default = "default_fifty")]
  pub page_size: usize,
  /// Ids per multi-get group (node limit is 50).
  #[serde(default = "default_fifty")]
  pub multi_get_size: usize,
  /// Preferred orders per batch.
  #[serde(default = "default_fifty")]
  pub requested_max: usize,
  /// Hard ceiling on orders per batch.
  #[serde(default = "default_platform_ceiling")]
  pub platform_ceiling: usize,
  /// Ceiling on commands per transaction (scalar style).
  #[serde(default = "default_platform_ceiling")]
  pub max_operations: usize,
  /// Move calling convention of the cleanup entry point.
  #[serde(default = "default_call_style")]
  pub call_style: CallStyle,
  /// Gas budget per transaction (MIST).
  #[serde(default = "default_gas_budget")]
  pub gas_budget: u64,
  /// Sweep pools concurrently.
  #[serde(default)]
  pub concurrent_pools: bool,
}

impl Default for SweepConfig {
  fn default() -> Self {
    Self {
      mode: RunMode::default(),
      interval_seconds: default_interval_seconds(),
      page_size: default_fifty(),
      multi_get_size: default_fifty(),
      requested_max: default_fifty(),
      platform_ceiling: default_platform_ceiling(),
      max_operations: default_platform_ceiling(),
      call_style: default_call_style(),
      gas_budget: default_gas_budget(),
      concurrent_pools: false,
    }
  }
}

/// Rebate configuration (MIST).
#[derive(Debug, Clone, Deserialize)]
pub struct RebateConfig {
  #[serde(default = "default_per_order_estimate")]
  pub per_order_estimate_mist: u64,
  #[serde(default = "default_fixed_cost")]
  pub fixed_cost_mist: u64,
}

impl Default for RebateConfig {
  fn default() -> Self {
    Self {
      per_order_estimate_mist: default_per_order_estimate(),
      fixed_cost_mist: default_fixed_cost(),
    }
  }
}

/// Cleanup entry point configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
  /// Package id holding the cleanup module.
  pub package: String,
  #[serde(default = "default_module")]
  pub module: String,
  /// Entry point taking `vector<u128>`.
  #[serde(default = "default_vector_function")]
  pub vector_function: String,
  /// Entry point taking one `u128`.
  #[serde(default = "default_scalar_function")]
  pub scalar_function: String,
  /// Append the Clock object to every call.
  #[serde(default = "default_true")]
  pub include_clock: bool,
}

/// Metrics and monitoring configuration (loop mode only).
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the submission journal.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// One `[[pools]]` entry; coins are symbols from `[coins]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
  pub name: String,
  pub pool_id: String,
  pub base: String,
  pub quote: String,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_network() -> String {
  "mainnet".to_string()
}

fn default_true() -> bool {
  true
}

fn default_max_concurrent() -> usize {
  8
}

fn default_requests_per_second() -> u32 {
  20
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay_ms() -> u64 {
  250
}

fn default_interval_seconds() -> u64 {
  300
}

fn default_fifty() -> usize {
  50
}

fn default_platform_ceiling() -> usize {
  PTB_MAX_COMMANDS
}

fn default_call_style() -> CallStyle {
  CallStyle::Vector
}

fn default_gas_budget() -> u64 {
  50_000_000
}

fn default_per_order_estimate() -> u64 {
  DEFAULT_PER_ORDER_ESTIMATE_MIST
}

fn default_fixed_cost() -> u64 {
  DEFAULT_FIXED_COST_MIST
}

fn default_module() -> String {
  "pool".to_string()
}

fn default_vector_function() -> String {
  "clean_up_expired_orders".to_string()
}

fn default_scalar_function() -> String {
  "cancel_order".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

fn default_data_dir() -> String {
  "data".to_string()
}
