//! Profitability gate - skip pools whose expected rebate cannot cover gas.

use rust_decimal::Decimal;

use super::rebate::mist_to_sui;

/// Default fixed cost estimate for one cleanup pass (0.005 SUI).
pub const DEFAULT_FIXED_COST_MIST: u64 = 5_000_000;

/// Compares `order_count × per_order_estimate` against a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct ProfitabilityGate {
    per_order_estimate_mist: u64,
    fixed_cost_mist: u64,
}

impl ProfitabilityGate {
    pub fn new(per_order_estimate_mist: u64, fixed_cost_mist: u64) -> Self {
        Self {
            per_order_estimate_mist,
            fixed_cost_mist,
        }
    }

    /// `order_count * per_order_estimate >= fixed_cost`, in exact MIST.
    pub fn is_worth_submitting(&self, order_count: usize) -> bool {
        self.expected_mist(order_count) >= u128::from(self.fixed_cost_mist)
    }

    /// Expected rebate for `order_count` orders (MIST).
    pub fn expected_mist(&self, order_count: usize) -> u128 {
        order_count as u128 * u128::from(self.per_order_estimate_mist)
    }

    /// Fixed cost in SUI, for logging.
    pub fn fixed_cost_sui(&self) -> Decimal {
        mist_to_sui(u128::from(self.fixed_cost_mist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_orders_cover_default_cost() {
        // 2 × 0.00297 = 0.00594 SUI ≥ 0.005 SUI
        let gate = ProfitabilityGate::new(2_970_000, DEFAULT_FIXED_COST_MIST);
        assert!(gate.is_worth_submitting(2));
    }

    #[test]
    fn test_one_order_does_not_cover_default_cost() {
        let gate = ProfitabilityGate::new(2_970_000, DEFAULT_FIXED_COST_MIST);
        assert!(!gate.is_worth_submitting(1));
    }

    #[test]
    fn test_zero_orders_never_worth_it_with_positive_cost() {
        let gate = ProfitabilityGate::new(2_970_000, 1);
        assert!(!gate.is_worth_submitting(0));
    }

    #[test]
    fn test_exact_threshold_passes() {
        let gate = ProfitabilityGate::new(2_500_000, 5_000_000);
        assert!(gate.is_worth_submitting(2));
    }
}
