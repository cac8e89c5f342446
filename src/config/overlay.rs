//! Session Overlay - Persisted JSON operator settings
//!
//! A small JSON document written by operator tooling:
//!
//! ```json
//! { "network": "testnet", "rpcUrl": "...", "privateKey": "suiprivkey1...",
//!   "userAddress": "0x...", "poolId": "0x..." }
//! ```
//!
//! Applied after `config.toml` and before environment overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::AppConfig;

/// Parsed session overlay; every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverlay {
  pub network: Option<String>,
  pub rpc_url: Option<String>,
  pub private_key: Option<String>,
  pub user_address: Option<String>,
  pub pool_id: Option<String>,
}

/// Public full-node endpoint for a network label.
pub fn fullnode_url(network: &str) -> Option<&'static str> {
  match network {
    "mainnet" => Some("https://fullnode.mainnet.sui.io:443"),
    "testnet" => Some("https://fullnode.testnet.sui.io:443"),
    "devnet" => Some("https://fullnode.devnet.sui.io:443"),
    "localnet" => Some("http://127.0.0.1:9000"),
    _ => None,
  }
}

impl SessionOverlay {
  /// Read an overlay file. A missing file yields an empty overlay.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("Failed to parse session file: {}", path.display()))
  }

  /// Apply non-empty fields to `config`.
  ///
  /// `network` selects the public endpoint only when `rpcUrl` is absent.
  pub fn apply(self, config: &mut AppConfig) -> Result<()> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    if let Some(network) = non_empty(self.network) {
      if self.rpc_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
        let url = fullnode_url(&network)
          .with_context(|| format!("Unknown network {network:?} in session file"))?;
        config.rpc.url = url.to_string();
      }
      config.rpc.network = network;
    }
    if let Some(url) = non_empty(self.rpc_url) {
      config.rpc.url = url;
    }
    if let Some(key) = non_empty(self.private_key) {
      config.private_key = Some(key);
    }
    if let Some(address) = non_empty(self.user_address) {
      config.user_address = Some(address.to_ascii_lowercase());
    }
    if let Some(pool) = non_empty(self.pool_id) {
      config.pool_filter = Some(pool);
    }
    Ok(())
  }
}
