use anyhow::{Context, Result};
use hydro_hedge::config::ModelConfig;
use hydro_hedge::policy::{Policy, PolicyKind};
use hydro_hedge::ranking::{BrushingConstraints, Objective, ParetoSolution, SolutionSet};
use hydro_hedge::sampling::{SamplerConfig, ScenarioSampler};
use hydro_hedge::simulation::evaluation::evaluate_population;
use rand::distributions::Uniform;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "HYDRO_HEDGE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    model: ModelConfig,
    sampler: SamplerConfig,
    scenarios: usize,
    /// Random RBF decision vectors evaluated next to the static baselines.
    rbf_candidates: usize,
    /// Static rules as `[fund_ceiling, hedge]`.
    static_candidates: Vec<Vec<f64>>,
    brushing: Option<BrushingConstraints>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            model: ModelConfig::default(),
            sampler: SamplerConfig::default(),
            scenarios: 200,
            rbf_candidates: 16,
            static_candidates: vec![
                vec![0.0, 0.0],
                vec![10.0, 0.5],
                vec![30.0, 1.0],
                vec![60.0, 2.0],
            ],
            brushing: None,
        }
    }
}

fn load_config() -> Result<RunConfig> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?
        }
        Err(_) => {
            info!("{CONFIG_ENV} not set, using defaults");
            RunConfig::default()
        }
    };
    config.model.validate()?;
    Ok(config)
}

fn evaluate_kind(
    kind: PolicyKind,
    population: &[Vec<f64>],
    first_id: usize,
    scenarios: &[hydro_hedge::Scenario],
    model: &ModelConfig,
) -> Result<Vec<ParetoSolution>> {
    let results = evaluate_population(kind, population, scenarios, model)?;
    Ok(population
        .iter()
        .zip(results)
        .enumerate()
        .filter_map(|(i, (vector, result))| match result {
            Ok(evaluation) => Some(ParetoSolution::from_evaluation(
                first_id + i,
                vector.clone(),
                &evaluation,
            )),
            Err(e) => {
                warn!(id = first_id + i, ?kind, error = %e, "dropping candidate");
                None
            }
        })
        .collect())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hydro_hedge=info,hydro_hedge_bin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    let model = &config.model;

    let scenarios = ScenarioSampler::new(&config.sampler)?.sample_many(config.scenarios)?;
    info!(scenarios = scenarios.len(), "scenarios ready");

    let mut rng = StdRng::seed_from_u64(config.sampler.seed.wrapping_add(1));
    let unit = Uniform::new_inclusive(0.0, 1.0);
    let length = Policy::decision_count(PolicyKind::Dynamic, model);
    let rbf_population: Vec<Vec<f64>> = (0..config.rbf_candidates)
        .map(|_| (&mut rng).sample_iter(unit).take(length).collect())
        .collect();

    let mut solutions = evaluate_kind(
        PolicyKind::Static,
        &config.static_candidates,
        0,
        &scenarios,
        model,
    )?;
    solutions.extend(evaluate_kind(
        PolicyKind::Dynamic,
        &rbf_population,
        config.static_candidates.len(),
        &scenarios,
        model,
    )?);

    let objectives = vec![
        Objective::NetRevenue,
        Objective::MaxDebt,
        Objective::ReserveFund,
    ];
    let mut set = SolutionSet::new(objectives.clone(), solutions)?.non_dominated(&objectives)?;
    if let Some(constraints) = &config.brushing {
        set = set.brushed(constraints, model.finance.mean_net_revenue());
    }
    info!(front = set.len(), "non-dominated policies");

    if let Err(e) = set.rank() {
        warn!(error = %e, "front could not be ranked");
    }
    match set.best_compromise() {
        Some(best) => info!(
            id = best.id,
            closeness = ?best.relative_closeness(),
            net_revenue = ?best.value(Objective::NetRevenue),
            max_debt = ?best.value(Objective::MaxDebt),
            max_fund = ?best.value(Objective::ReserveFund),
            "best compromise"
        ),
        None => warn!("no policy could be ranked"),
    }
    println!("{}", serde_json::to_string_pretty(set.solutions())?);
    Ok(())
}
