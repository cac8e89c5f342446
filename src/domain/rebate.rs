//! Storage rebate estimation.
//!
//! Removing an order object from Sui storage refunds its storage deposit.
//! When the exact rebate of the backing object is unknown (orders packed
//! into a shared slice), a fixed per-order estimate stands in.

use rust_decimal::Decimal;
use serde::Serialize;

use super::order::Order;

/// MIST per SUI (10^9).
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Default per-order rebate estimate (MIST).
pub const DEFAULT_PER_ORDER_ESTIMATE_MIST: u64 = 2_970_000;

/// Aggregated rebate for a set of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebateSummary {
    /// Number of orders aggregated.
    pub total_orders: usize,
    /// Exact sum of `per_order` (MIST).
    pub total_mist: u128,
    /// Per-order value used, in input order.
    pub per_order: Vec<u64>,
    /// True iff at least one order fell back to the fixed estimate.
    pub is_estimated: bool,
}

impl RebateSummary {
    /// Total rendered in SUI.
    pub fn total_sui(&self) -> Decimal {
        mist_to_sui(self.total_mist)
    }
}

/// Sums per-order incentives, substituting a fixed estimate when unknown.
#[derive(Debug, Clone, Copy)]
pub struct RebateEstimator {
    per_order_estimate_mist: u64,
}

impl Default for RebateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_PER_ORDER_ESTIMATE_MIST)
    }
}

impl RebateEstimator {
    pub fn new(per_order_estimate_mist: u64) -> Self {
        Self {
            per_order_estimate_mist,
        }
    }

    /// The fixed fallback value.
    pub fn per_order_estimate_mist(&self) -> u64 {
        self.per_order_estimate_mist
    }

    /// Aggregate the rebate for `orders`.
    pub fn estimate<'a, I>(&self, orders: I) -> RebateSummary
    where
        I: IntoIterator<Item = &'a Order>,
    {
        self.estimate_values(orders.into_iter().map(|o| o.incentive_mist))
    }

    /// Aggregate raw incentive values (`None` = unknown).
    pub fn estimate_values<I>(&self, values: I) -> RebateSummary
    where
        I: IntoIterator<Item = Option<u64>>,
    {
        let mut per_order = Vec::new();
        let mut total_mist: u128 = 0;
        let mut is_estimated = false;

        for value in values {
            let v = value.unwrap_or_else(|| {
                is_estimated = true;
                self.per_order_estimate_mist
            });
            total_mist += u128::from(v);
            per_order.push(v);
        }

        RebateSummary {
            total_orders: per_order.len(),
            total_mist,
            per_order,
            is_estimated,
        }
    }
}

/// Convert MIST to SUI without floating point.
///
/// Saturates at `u64::MAX` SUI, well inside the 96-bit mantissa.
pub fn mist_to_sui(mist: u128) -> Decimal {
    let cap = u128::from(u64::MAX) * u128::from(MIST_PER_SUI);
    // Bounded by `cap`, always fits in i128.
    Decimal::from_i128_with_scale(mist.min(cap) as i128, 9)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_mixed_actual_and_estimated() {
        let estimator = RebateEstimator::new(2_970_000);
        let summary = estimator.estimate_values([Some(3_000_000), Some(3_000_000), None]);
        assert_eq!(summary.total_mist, 8_970_000);
        assert_eq!(summary.per_order, vec![3_000_000, 3_000_000, 2_970_000]);
        assert!(summary.is_estimated);
        assert_eq!(summary.total_orders, 3);
    }

    #[test]
    fn test_all_actual_is_exact() {
        let summary = RebateEstimator::default().estimate_values([Some(1), Some(2)]);
        assert!(!summary.is_estimated);
        assert_eq!(summary.total_mist, 3);
    }

    #[test]
    fn test_empty_input() {
        let summary = RebateEstimator::default().estimate_values(std::iter::empty());
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_mist, 0);
        assert!(!summary.is_estimated);
    }

    #[test]
    fn test_sum_past_u64_does_not_overflow() {
        let summary = RebateEstimator::default().estimate_values([Some(u64::MAX), Some(u64::MAX)]);
        assert_eq!(summary.total_mist, u128::from(u64::MAX) * 2);
    }

    #[test]
    fn test_total_sui_rendering() {
        let summary = RebateEstimator::default().estimate_values([None, None]);
        assert_eq!(summary.total_sui(), dec!(0.00594));
    }
}
