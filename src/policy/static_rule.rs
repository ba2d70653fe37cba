use crate::config::StaticPolicyConfig;
use crate::consts::EPS;
use serde::{Deserialize, Serialize};

/// Two-parameter baseline: a constant hedge and a ceiling on the reserve fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticPolicy {
    pub hedge: f64,
    pub fund_ceiling: f64,
    pub cash_flow_target: f64,
}

impl StaticPolicy {
    /// Builds the rule from the optimizer's two decision variables. Values below the
    /// configured minimums are treated as zero.
    pub fn new(hedge: f64, fund_ceiling: f64, config: &StaticPolicyConfig) -> Self {
        StaticPolicy {
            hedge: if hedge < config.min_contract_size { 0.0 } else { hedge },
            fund_ceiling: if fund_ceiling < config.min_fund_ceiling {
                0.0
            } else {
                fund_ceiling
            },
            cash_flow_target: config.cash_flow_target,
        }
    }

    /// Cash flow left after the fund has covered a shortfall or absorbed a surplus.
    ///
    /// `fund` is the interest-grown balance. Below target, the fund is drawn down as far as
    /// it can go toward the target. At or above target, anything that would push the fund
    /// past the ceiling stays in the cash flow, and the rest is deposited without dropping
    /// the cash flow below target.
    pub fn cash_flow_after_withdrawal(&self, fund: f64, cash_in: f64) -> f64 {
        let target = self.cash_flow_target;
        if cash_in < target {
            if fund < EPS {
                cash_in
            } else {
                (cash_in + fund).min(target)
            }
        } else if fund > self.fund_ceiling - EPS {
            cash_in + (fund - self.fund_ceiling)
        } else {
            (cash_in - (self.fund_ceiling - fund)).max(target)
        }
    }

    /// Withdrawal implied by `cash_flow_after_withdrawal`; negative values are deposits.
    pub fn withdrawal(&self, fund: f64, cash_in: f64) -> f64 {
        self.cash_flow_after_withdrawal(fund, cash_in) - cash_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(hedge: f64, fund_ceiling: f64) -> StaticPolicy {
        StaticPolicy::new(hedge, fund_ceiling, &StaticPolicyConfig::default())
    }

    #[test]
    fn test_small_parameters_act_as_zero() {
        let policy = rule(0.01, 0.04);
        assert_eq!(policy.hedge, 0.0);
        assert_eq!(policy.fund_ceiling, 0.0);

        let policy = rule(0.5, 12.0);
        assert_eq!(policy.hedge, 0.5);
        assert_eq!(policy.fund_ceiling, 12.0);
    }

    #[test]
    fn test_shortfall_is_covered_by_fund() {
        let policy = rule(0.0, 10.0);
        // enough fund: cash flow brought back to target
        assert_eq!(policy.cash_flow_after_withdrawal(8.0, -5.0), 0.0);
        assert_eq!(policy.withdrawal(8.0, -5.0), 5.0);
        // not enough: fund is emptied
        assert_eq!(policy.cash_flow_after_withdrawal(3.0, -5.0), -2.0);
        // empty fund: nothing to draw
        assert_eq!(policy.cash_flow_after_withdrawal(0.0, -5.0), -5.0);
    }

    #[test]
    fn test_surplus_fills_fund_up_to_ceiling() {
        let policy = rule(0.0, 10.0);
        // room for everything
        assert_eq!(policy.cash_flow_after_withdrawal(2.0, 5.0), 0.0);
        assert_eq!(policy.withdrawal(2.0, 5.0), -5.0);
        // room for part of it
        assert_eq!(policy.cash_flow_after_withdrawal(7.0, 5.0), 2.0);
        // fund already above the ceiling releases the excess
        assert_eq!(policy.cash_flow_after_withdrawal(12.0, 5.0), 7.0);
        assert_eq!(policy.withdrawal(12.0, 5.0), 2.0);
    }
}
