//! Synthetic stochastic scenarios for evaluating policies when no recorded trajectories are
//! at hand.
//!
//! Each year draws (revenue, payout, power index) jointly from one multivariate normal, so
//! wet years can pair higher revenue with lower payouts. Payout and power index cannot be
//! negative and are floored at zero; revenue is left as drawn.

use crate::simulation::{Scenario, SimulationError};
use nalgebra::DVector;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::MultivariateNormal;
use thiserror::Error;
use tracing::debug;

const REVENUE: usize = 0;
const PAYOUT: usize = 1;
const POWER_INDEX: usize = 2;

#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("Invalid scenario distribution: `{0}`")]
    InvalidDistribution(String),
    #[error("Sampled scenario is unusable: {0}")]
    Scenario(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Means of (revenue, payout, power index).
    pub mean: [f64; 3],
    /// Row-major covariance of (revenue, payout, power index).
    pub covariance: [[f64; 3]; 3],
    /// Points per trajectory; a scenario simulates one fewer year.
    pub points: usize,
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        // sd 20 / 8 / 0.3 with correlations -0.5 (revenue, payout), 0.6 (revenue, power)
        // and -0.7 (payout, power)
        SamplerConfig {
            mean: [130.0, 5.0, 1.0],
            covariance: [
                [400.0, -80.0, 3.6],
                [-80.0, 64.0, -1.68],
                [3.6, -1.68, 0.09],
            ],
            points: 21,
            seed: 42,
        }
    }
}

pub struct ScenarioSampler {
    distribution: MultivariateNormal,
    points: usize,
    rng: StdRng,
}

impl ScenarioSampler {
    pub fn new(config: &SamplerConfig) -> Result<Self, SamplingError> {
        if config.points < 2 {
            return Err(SamplingError::Scenario(
                SimulationError::TrajectoryTooShort { len: config.points },
            ));
        }
        let covariance = config.covariance.iter().flatten().copied().collect();
        let distribution = MultivariateNormal::new(config.mean.to_vec(), covariance)
            .map_err(|e| SamplingError::InvalidDistribution(e.to_string()))?;

        Ok(ScenarioSampler {
            distribution,
            points: config.points,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn sample(&mut self) -> Result<Scenario, SamplingError> {
        let draws: Vec<DVector<f64>> = (0..self.points)
            .map(|_| self.distribution.sample(&mut self.rng))
            .collect();

        let revenue = draws.iter().map(|d| d[REVENUE]).collect();
        let payout = draws.iter().map(|d| d[PAYOUT].max(0.0)).collect();
        let power_index = draws.iter().map(|d| d[POWER_INDEX].max(0.0)).collect();
        Ok(Scenario::new(revenue, payout, power_index)?)
    }

    pub fn sample_many(&mut self, count: usize) -> Result<Vec<Scenario>, SamplingError> {
        let scenarios = (0..count)
            .map(|_| self.sample())
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count, points = self.points, "scenarios sampled");
        Ok(scenarios)
    }
}
