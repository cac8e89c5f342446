//! Pool registry - validated, immutable pool descriptors.
//!
//! The registry is built once at startup from the coin table
//! (symbol → Move type tag) and the pool list. Validation is strict:
//! any bad entry rejects the whole registry.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use super::order::ObjectId;

/// Static descriptor of one DeepBook pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolConfig {
    /// Display name, e.g. `SUI_USDC`.
    pub name: String,
    /// Root pool object id.
    pub pool_id: ObjectId,
    /// Fully qualified base coin type.
    pub base_type: String,
    /// Fully qualified quote coin type.
    pub quote_type: String,
}

/// Raw, unvalidated pool entry as it appears in configuration.
#[derive(Debug, Clone)]
pub struct PoolSpec {
    pub name: String,
    pub pool_id: String,
    pub base: String,
    pub quote: String,
}

/// The two paginated collections backing a pool's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCollections {
    /// Collection holding bid-side slices.
    pub bids_id: ObjectId,
    /// Collection holding ask-side slices.
    pub asks_id: ObjectId,
}

/// Reasons a registry is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry has no pools")]
    Empty,
    #[error("coin {symbol} has malformed type tag {type_tag:?}")]
    BadTypeTag { symbol: String, type_tag: String },
    #[error("pool {pool} references unknown coin symbol {symbol}")]
    UnknownCoin { pool: String, symbol: String },
    #[error("pool {pool} has malformed object id {pool_id:?}")]
    BadObjectId { pool: String, pool_id: String },
    #[error("duplicate pool name {0}")]
    DuplicateName(String),
    #[error("duplicate pool id {0}")]
    DuplicateId(String),
    #[error("pool {0} has identical base and quote coins")]
    SameCoin(String),
}

/// Validated, immutable set of pools to sweep.
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    pools: Vec<PoolConfig>,
}

impl PoolRegistry {
    /// Build the registry, failing fast on the first invalid entry.
    pub fn build(
        coins: &BTreeMap<String, String>,
        specs: &[PoolSpec],
    ) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        for (symbol, type_tag) in coins {
            if !is_type_tag(type_tag) {
                return Err(RegistryError::BadTypeTag {
                    symbol: symbol.clone(),
                    type_tag: type_tag.clone(),
                });
            }
        }

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        let mut pools = Vec::with_capacity(specs.len());

        for spec in specs {
            let base_type = lookup_coin(coins, &spec.name, &spec.base)?;
            let quote_type = lookup_coin(coins, &spec.name, &spec.quote)?;

            if base_type == quote_type {
                return Err(RegistryError::SameCoin(spec.name.clone()));
            }
            if !is_object_id(&spec.pool_id) {
                return Err(RegistryError::BadObjectId {
                    pool: spec.name.clone(),
                    pool_id: spec.pool_id.clone(),
                });
            }

            let pool_id = spec.pool_id.to_ascii_lowercase();
            if !names.insert(spec.name.clone()) {
                return Err(RegistryError::DuplicateName(spec.name.clone()));
            }
            if !ids.insert(pool_id.clone()) {
                return Err(RegistryError::DuplicateId(pool_id));
            }

            pools.push(PoolConfig {
                name: spec.name.clone(),
                pool_id,
                base_type,
                quote_type,
            });
        }

        Ok(Self { pools })
    }

    /// All pools in configuration order.
    pub fn pools(&self) -> &[PoolConfig] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Find a pool by display name or object id.
    pub fn find(&self, key: &str) -> Option<&PoolConfig> {
        let lowered = key.to_ascii_lowercase();
        self.pools
            .iter()
            .find(|p| p.name == key || p.pool_id == lowered)
    }

    /// Narrow the registry to a single pool (name or id).
    pub fn restrict_to(&self, key: &str) -> Option<Self> {
        self.find(key).map(|p| Self {
            pools: vec![p.clone()],
        })
    }
}

fn lookup_coin(
    coins: &BTreeMap<String, String>,
    pool: &str,
    symbol: &str,
) -> Result<String, RegistryError> {
    coins
        .get(symbol)
        .cloned()
        .ok_or_else(|| RegistryError::UnknownCoin {
            pool: pool.to_string(),
            symbol: symbol.to_string(),
        })
}

/// `0x` followed by 1..=64 hex digits.
pub fn is_object_id(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| !hex.is_empty() && hex.len() <= 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// `address::module::Name`, optionally followed by type parameters.
pub fn is_type_tag(s: &str) -> bool {
    let head = s.split('<').next().unwrap_or_default();
    let parts: Vec<&str> = head.split("::").collect();
    parts.len() == 3
        && is_object_id(parts[0])
        && parts[1..]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}
