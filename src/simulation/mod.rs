use crate::config::ModelConfig;
use crate::consts::EPS;
use crate::policy::{DecodeError, Policy, PolicyState};
use crate::simulation::aggregator::AggregatorError;
use itertools::izip;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aggregator;
pub mod evaluation;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("A trajectory needs at least 2 points, got {len}")]
    TrajectoryTooShort { len: usize },
    #[error("Scenario series differ in length (revenue {revenue}, payout {payout}, power {power})")]
    MismatchedSeries {
        revenue: usize,
        payout: usize,
        power: usize,
    },
    #[error("Invalid decision vector: {0}")]
    Decode(#[from] DecodeError),
    #[error("Could not aggregate objectives: {0}")]
    Aggregation(#[from] AggregatorError),
    #[error("Could not build the evaluation thread pool: `{0}`")]
    ThreadPool(String),
}

/// One stochastic trajectory: yearly revenue, snow contract payout and power price index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub revenue: Vec<f64>,
    pub payout: Vec<f64>,
    pub power_index: Vec<f64>,
}

impl Scenario {
    pub fn new(
        revenue: Vec<f64>,
        payout: Vec<f64>,
        power_index: Vec<f64>,
    ) -> Result<Self, SimulationError> {
        let scenario = Scenario {
            revenue,
            payout,
            power_index,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let (revenue, payout, power) = (
            self.revenue.len(),
            self.payout.len(),
            self.power_index.len(),
        );
        if revenue != payout || revenue != power {
            return Err(SimulationError::MismatchedSeries {
                revenue,
                payout,
                power,
            });
        }
        if revenue < 2 {
            return Err(SimulationError::TrajectoryTooShort { len: revenue });
        }
        Ok(())
    }

    /// Number of simulated years: one fewer than the number of points.
    pub fn years(&self) -> usize {
        self.revenue.len().saturating_sub(1)
    }
}

/// Everything that happened in one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyTrace {
    pub year: usize,
    /// Fund and debt at the start of the year, before interest.
    pub fund: f64,
    pub debt: f64,
    /// Fund and debt after a year of interest, as seen by the withdrawal decision.
    pub fund_grown: f64,
    pub debt_grown: f64,
    /// Power index seen by the hedge decision, then by the withdrawal decision.
    pub power_index: f64,
    pub power_index_next: f64,
    pub net_revenue: f64,
    pub cash_in: f64,
    pub hedge: f64,
    pub withdrawal: f64,
    /// Cash flow after the withdrawal; zero when the year ended in new debt.
    pub final_cash_flow: f64,
    pub fund_end: f64,
    pub debt_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub years: Vec<YearlyTrace>,
}

impl SimulationTrace {
    /// Fund at the start of every year plus the balance after the last year.
    pub fn fund_path(&self) -> Vec<f64> {
        let mut path: Vec<f64> = self.years.iter().map(|y| y.fund).collect();
        path.extend(self.years.last().map(|y| y.fund_end));
        path
    }

    /// Debt at the start of every year plus the debt carried out of the last year.
    pub fn debt_path(&self) -> Vec<f64> {
        let mut path: Vec<f64> = self.years.iter().map(|y| y.debt).collect();
        path.extend(self.years.last().map(|y| y.debt_end));
        path
    }

    pub fn final_cash_flows(&self) -> Vec<f64> {
        self.years.iter().map(|y| y.final_cash_flow).collect()
    }
}

/// Reserve fund and outstanding debt carried from one year into the next.
#[derive(Debug, Clone, Copy, Default)]
struct SimulationState {
    fund: f64,
    debt: f64,
}

impl SimulationState {
    fn advance(
        &mut self,
        year: usize,
        policy: &Policy,
        config: &ModelConfig,
        revenue_next: f64,
        payout_next: f64,
        power: (f64, f64),
    ) -> YearlyTrace {
        let interest_fund = config.finance.interest_fund();
        let interest_debt = config.finance.interest_debt();
        let (power_index, power_index_next) = power;

        let hedge = policy.hedge(
            &PolicyState {
                fund: self.fund,
                debt: self.debt,
                power_index,
                cash_in: 0.0,
            },
            config,
        );

        let net_revenue = revenue_next - config.finance.fixed_cost();
        let cash_in = net_revenue + hedge * payout_next - self.debt * interest_debt;

        let fund_grown = self.fund * interest_fund;
        let debt_grown = self.debt * interest_debt;
        let withdrawal = policy.withdrawal(
            &PolicyState {
                fund: fund_grown,
                debt: debt_grown,
                power_index: power_index_next,
                cash_in,
            },
            config,
        );

        let mut final_cash_flow = cash_in + withdrawal;
        let fund_end = fund_grown - withdrawal;
        // a shortfall is carried as debt and the reported cash flow is held at zero
        let debt_end = if final_cash_flow < -EPS {
            let shortfall = -final_cash_flow;
            final_cash_flow = 0.0;
            shortfall
        } else {
            0.0
        };

        let trace = YearlyTrace {
            year,
            fund: self.fund,
            debt: self.debt,
            fund_grown,
            debt_grown,
            power_index,
            power_index_next,
            net_revenue,
            cash_in,
            hedge,
            withdrawal,
            final_cash_flow,
            fund_end,
            debt_end,
        };
        self.fund = fund_end;
        self.debt = debt_end;
        trace
    }
}

/// Runs `policy` over every year of `scenario`, starting with no fund and no debt.
///
/// # Errors
/// `TrajectoryTooShort` for fewer than two points, `MismatchedSeries` when the three
/// series differ in length.
pub fn simulate(
    policy: &Policy,
    scenario: &Scenario,
    config: &ModelConfig,
) -> Result<SimulationTrace, SimulationError> {
    scenario.validate()?;

    let mut state = SimulationState::default();
    let years = izip!(
        scenario.revenue.iter().skip(1),
        scenario.payout.iter().skip(1),
        scenario.power_index.windows(2)
    )
    .enumerate()
    .map(|(year, (&revenue_next, &payout_next, power))| {
        state.advance(
            year,
            policy,
            config,
            revenue_next,
            payout_next,
            (power[0], power[1]),
        )
    })
    .collect();

    Ok(SimulationTrace { years })
}

/// Decodes an RBF vector and simulates it in one go.
pub fn simulate_vector(
    vector: &[f64],
    scenario: &Scenario,
    config: &ModelConfig,
) -> Result<SimulationTrace, SimulationError> {
    let policy = Policy::dynamic_from_vector(vector, config)?;
    simulate(&policy, scenario, config)
}
