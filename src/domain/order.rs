//! Core order-book domain types.
//!
//! Defines the logical order reconstructed from on-chain storage, the
//! book side enum, and the expiry predicate. Orders are read-only
//! snapshots: they are rebuilt on every scan pass and never cached.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// DeepBook order identifier (128-bit, never represented as a float).
pub type OrderId = u128;

/// Sui object identifier in `0x`-prefixed hex form.
pub type ObjectId = String;

/// Expiry sentinel meaning "never expires".
pub const NEVER_EXPIRES: u64 = u64::MAX;

/// Mask for the 63-bit price packed into bits 64..127 of an order id.
const PRICE_MASK: u128 = (1u128 << 63) - 1;

// ────────────────────────────────────────────
// Enums shared across domain and ports
// ────────────────────────────────────────────

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Lowercase label used for log fields and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────
// Order snapshot
// ────────────────────────────────────────────

/// A logical outstanding order decoded from a remote object.
///
/// Expiry is derived against a reference time, see [`Order::is_expired_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// On-chain order id.
    pub order_id: OrderId,
    /// Owning account (address or balance manager id).
    pub owner: String,
    /// Which half of the book the order rests on.
    pub side: Side,
    /// Limit price in quote units per base lot.
    pub price: u64,
    /// Remaining quantity in base units.
    pub quantity: u64,
    /// Expiry in epoch milliseconds; `0` and [`NEVER_EXPIRES`] never expire.
    pub expire_timestamp: u64,
    /// Backing object id. Not part of the order's identity.
    pub source_object_id: ObjectId,
    /// Storage rebate attributable to this order alone, when known (MIST).
    pub incentive_mist: Option<u64>,
}

impl Order {
    /// Whether the order has expired at `reference_time_ms`.
    pub fn is_expired_at(&self, reference_time_ms: u64) -> bool {
        is_expired(self.expire_timestamp, reference_time_ms)
    }

    /// Whether the order carries any expiry at all.
    pub fn has_expiry(&self) -> bool {
        self.expire_timestamp != 0 && self.expire_timestamp != NEVER_EXPIRES
    }
}

/// Expiry predicate: expired iff `0 < expire_timestamp < reference_time_ms`.
///
/// A zero timestamp means "never expires". The sentinel `u64::MAX` is never
/// below a real clock reading and so never classifies as expired.
pub fn is_expired(expire_timestamp: u64, reference_time_ms: u64) -> bool {
    expire_timestamp > 0 && expire_timestamp < reference_time_ms
}

/// Price packed into a DeepBook order id: bits 64..127, ignoring the side bit.
pub fn price_from_order_id(order_id: OrderId) -> u64 {
    // Masked to 63 bits, always fits.
    ((order_id >> 64) & PRICE_MASK) as u64
}
