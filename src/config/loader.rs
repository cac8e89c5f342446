//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, layering the session overlay and
//! environment overrides, validating all parameters, and turning the
//! result into the runtime objects the sweep needs.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::sui::SuiRpcConfig;
use crate::domain::batch::{CleanupBatchBuilder, EntryPoints};
use crate::domain::gate::ProfitabilityGate;
use crate::domain::pool::{is_object_id, PoolRegistry, PoolSpec};
use crate::domain::rebate::RebateEstimator;
use crate::usecases::scanner::ScanSettings;
use crate::usecases::sweep::SweepPlan;

use super::overlay::SessionOverlay;
use super::AppConfig;

/// Environment variable overriding `rpc.url`.
pub const ENV_RPC_URL: &str = "SUI_RPC_URL";

/// Environment variable carrying the signing key.
pub const ENV_PRIVATE_KEY: &str = "SUI_PRIVATE_KEY";

/// Node-side limit on ids per multi-get.
const MAX_MULTI_GET: usize = 50;

/// Load, layer and validate configuration.
///
/// Order: `config.toml`, then the session overlay named by
/// `bot.session_file`, then environment variables.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML or session JSON parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;

  if let Some(session) = config.bot.session_file.clone() {
    SessionOverlay::load(Path::new(&session))?.apply(&mut config)?;
  }

  apply_env_overrides(&mut config, |key| std::env::var(key).ok());
  validate_config(&config)?;

  info!(
    pools = config.pools.len(),
    network = %config.rpc.network,
    call_style = ?config.sweep.call_style,
    dry_run = config.bot.dry_run,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML without layering or validation.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).with_context(|| "Failed to parse config.toml")
}

/// Apply `SUI_RPC_URL` / `SUI_PRIVATE_KEY` from `lookup`.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
  if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.trim().is_empty()) {
    config.rpc.url = url;
  }
  if let Some(key) = lookup(ENV_PRIVATE_KEY).filter(|v| !v.trim().is_empty()) {
    config.private_key = Some(key);
  }
}

/// Validate all configuration parameters.
pub fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(!config.rpc.url.is_empty(), "RPC URL must not be empty");
  anyhow::ensure!(config.rpc.max_concurrent > 0, "rpc.max_concurrent must be positive");

  let sweep = &config.sweep;
  anyhow::ensure!(sweep.page_size > 0, "sweep.page_size must be positive");
  anyhow::ensure!(
    sweep.multi_get_size > 0 && sweep.multi_get_size <= MAX_MULTI_GET,
    "sweep.multi_get_size must be in (0, {MAX_MULTI_GET}], got {}",
    sweep.multi_get_size
  );
  anyhow::ensure!(sweep.requested_max > 0, "sweep.requested_max must be positive");
  anyhow::ensure!(sweep.platform_ceiling > 0, "sweep.platform_ceiling must be positive");
  anyhow::ensure!(sweep.max_operations > 0, "sweep.max_operations must be positive");
  anyhow::ensure!(sweep.gas_budget > 0, "sweep.gas_budget must be positive");
  anyhow::ensure!(
    sweep.interval_seconds > 0,
    "sweep.interval_seconds must be positive"
  );

  anyhow::ensure!(
    is_object_id(&config.contract.package),
    "contract.package is not an object id: {:?}",
    config.contract.package
  );
  anyhow::ensure!(!config.contract.module.is_empty(), "contract.module must not be empty");

  if let Some(address) = &config.user_address {
    anyhow::ensure!(is_object_id(address), "userAddress is not an address: {address:?}");
  }

  build_registry(config).map(|_| ())
}

/// Build the pool registry, narrowed to `pool_filter` when set.
pub fn build_registry(config: &AppConfig) -> Result<PoolRegistry> {
  let specs: Vec<PoolSpec> = config
    .pools
    .iter()
    .map(|p| PoolSpec {
      name: p.name.clone(),
      pool_id: p.pool_id.clone(),
      base: p.base.clone(),
      quote: p.quote.clone(),
    })
    .collect();

  let registry = PoolRegistry::build(&config.coins, &specs).context("Invalid pool registry")?;

  match &config.pool_filter {
    Some(key) => registry
      .restrict_to(key)
      .with_context(|| format!("poolId {key} is not in the pool registry")),
    None => Ok(registry),
  }
}

/// RPC client settings.
pub fn rpc_client_config(config: &AppConfig) -> SuiRpcConfig {
  SuiRpcConfig {
    url: config.rpc.url.clone(),
    timeout: config.rpc.timeout_ms.map(Duration::from_millis),
    max_concurrent: config.rpc.max_concurrent,
    requests_per_second: config.rpc.requests_per_second,
    max_retries: config.rpc.max_retries,
    retry_base_delay: Duration::from_millis(config.rpc.retry_base_delay_ms),
  }
}

/// Sweep parameters.
pub fn sweep_plan(config: &AppConfig) -> SweepPlan {
  let sweep = &config.sweep;
  SweepPlan {
    scan: ScanSettings {
      page_size: sweep.page_size,
      multi_get_size: sweep.multi_get_size,
    },
    estimator: RebateEstimator::new(config.rebate.per_order_estimate_mist),
    gate: ProfitabilityGate::new(config.rebate.per_order_estimate_mist, config.rebate.fixed_cost_mist),
    builder: CleanupBatchBuilder::new(
      sweep.requested_max,
      sweep.platform_ceiling,
      sweep.max_operations,
      sweep.call_style,
      sweep.gas_budget,
    ),
    entry: EntryPoints {
      package: config.contract.package.clone(),
      module: config.contract.module.clone(),
      vector_function: config.contract.vector_function.clone(),
      scalar_function: config.contract.scalar_function.clone(),
      include_clock: config.contract.include_clock,
    },
    dry_run: config.bot.dry_run,
    concurrent_pools: sweep.concurrent_pools,
  }
}
