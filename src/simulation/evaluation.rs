use crate::config::ModelConfig;
use crate::policy::{Policy, PolicyKind};
use crate::simulation::aggregator::{Aggregator, ArithmeticMean, Maximum, Minimum, Quantile};
use crate::simulation::{simulate, Scenario, SimulationError, SimulationTrace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Per-trace statistics the objectives are built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub mean_final_cash_flow: f64,
    pub max_debt: f64,
    pub max_fund: f64,
    pub min_fund: f64,
}

impl TraceSummary {
    pub fn from_trace(trace: &SimulationTrace) -> Result<Self, SimulationError> {
        let fund = trace.fund_path();
        Ok(TraceSummary {
            mean_final_cash_flow: ArithmeticMean.value(&trace.final_cash_flows())?,
            max_debt: Maximum.value(&trace.debt_path())?,
            max_fund: Maximum.value(&fund)?,
            min_fund: Minimum.value(&fund)?,
        })
    }
}

/// Objectives of one policy across a batch of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    /// Mean over scenarios of the mean yearly final cash flow.
    pub expected_net_revenue: f64,
    /// Configured quantile over scenarios of the largest debt reached.
    pub max_debt: f64,
    /// Mean over scenarios of the largest fund balance held.
    pub max_fund: f64,
    pub summaries: Vec<TraceSummary>,
}

/// Simulates `policy` on every scenario and aggregates the per-trace summaries.
///
/// Scenarios are independent, so they are simulated in parallel on the current rayon pool.
pub fn evaluate_policy(
    policy: &Policy,
    scenarios: &[Scenario],
    config: &ModelConfig,
) -> Result<PolicyEvaluation, SimulationError> {
    let summaries = scenarios
        .par_iter()
        .map(|scenario| {
            let trace = simulate(policy, scenario, config)?;
            TraceSummary::from_trace(&trace)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let column = |pick: fn(&TraceSummary) -> f64| summaries.iter().map(pick).collect::<Vec<f64>>();
    let expected_net_revenue = ArithmeticMean.value(&column(|s| s.mean_final_cash_flow))?;
    let max_debt = Quantile(config.objectives.debt_quantile).value(&column(|s| s.max_debt))?;
    let max_fund = ArithmeticMean.value(&column(|s| s.max_fund))?;

    debug!(
        scenarios = summaries.len(),
        expected_net_revenue, max_debt, max_fund, "policy evaluated"
    );
    Ok(PolicyEvaluation {
        expected_net_revenue,
        max_debt,
        max_fund,
        summaries,
    })
}

/// Evaluates a population of optimizer vectors against a shared batch of scenarios.
///
/// Every (vector, scenario) pair is an independent unit of work; the pool is sized by
/// `config.max_concurrency`. A vector that fails to decode or simulate yields an `Err`
/// in its own slot without affecting the rest of the population.
///
/// # Errors
/// Only fails as a whole when the thread pool cannot be built.
pub fn evaluate_population(
    kind: PolicyKind,
    population: &[Vec<f64>],
    scenarios: &[Scenario],
    config: &ModelConfig,
) -> Result<Vec<Result<PolicyEvaluation, SimulationError>>, SimulationError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency)
        .build()
        .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;

    info!(
        population = population.len(),
        scenarios = scenarios.len(),
        threads = config.max_concurrency,
        "evaluating population"
    );

    let results: Vec<Result<PolicyEvaluation, SimulationError>> = pool.install(|| {
        population
            .par_iter()
            .map(|vector| {
                let policy = Policy::from_vector(kind, vector, config)?;
                evaluate_policy(&policy, scenarios, config)
            })
            .collect()
    });

    let failures = results.iter().filter(|r| r.is_err()).count();
    if failures > 0 {
        warn!(
            failures,
            population = population.len(),
            "some decision vectors could not be evaluated"
        );
    }
    Ok(results)
}
