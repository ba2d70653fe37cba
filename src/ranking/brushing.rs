use crate::ranking::{Objective, ParetoSolution, SolutionSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Acceptability limits used to brush a solution set before ranking it.
///
/// Revenue, debt and fund limits are fractions of the mean net revenue; complexity is a raw
/// value, usually in [0, 1]. An unset limit, or a limit on an objective a solution carries no
/// value for, admits everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrushingConstraints {
    #[serde(default, alias = "annRev")]
    pub min_net_revenue: Option<f64>,
    #[serde(default, alias = "maxDebt")]
    pub max_debt: Option<f64>,
    #[serde(default, alias = "maxComplex")]
    pub max_complexity: Option<f64>,
    #[serde(default, alias = "maxFund")]
    pub max_fund: Option<f64>,
}

impl BrushingConstraints {
    pub fn admits(&self, solution: &ParetoSolution, mean_net_revenue: f64) -> bool {
        let scaled = |fraction: Option<f64>| fraction.map(|f| f * mean_net_revenue);

        at_least(solution, Objective::NetRevenue, scaled(self.min_net_revenue))
            && at_most(solution, Objective::MaxDebt, scaled(self.max_debt))
            && at_most(solution, Objective::Complexity, self.max_complexity)
            && at_most(solution, Objective::ReserveFund, scaled(self.max_fund))
    }
}

fn at_least(solution: &ParetoSolution, objective: Objective, limit: Option<f64>) -> bool {
    match (solution.value(objective), limit) {
        (Some(value), Some(limit)) => value >= limit,
        _ => true,
    }
}

fn at_most(solution: &ParetoSolution, objective: Objective, limit: Option<f64>) -> bool {
    match (solution.value(objective), limit) {
        (Some(value), Some(limit)) => value <= limit,
        _ => true,
    }
}

impl SolutionSet {
    /// Members meeting `constraints`, as a new unranked set. Rank it again to get closeness
    /// relative to the brushed members only.
    pub fn brushed(&self, constraints: &BrushingConstraints, mean_net_revenue: f64) -> SolutionSet {
        let brushed = self.retain_into(|solution| constraints.admits(solution, mean_net_revenue));
        debug!(
            before = self.len(),
            after = brushed.len(),
            "brushing constraints applied"
        );
        brushed
    }
}
