use crate::consts::{MAX_RBF_INPUTS, NUMBER_OF_DECISIONS};
use crate::policy::decoder::RbfLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration value: `{0}`")]
    InvalidValue(String),
}

fn default_max_concurrency() -> usize {
    num_cpus::get()
}

fn default_num_rbf() -> usize {
    2
}

fn default_input_masks() -> [[bool; MAX_RBF_INPUTS]; NUMBER_OF_DECISIONS] {
    [[true; MAX_RBF_INPUTS]; NUMBER_OF_DECISIONS]
}

/// Shape of the RBF network an optimizer vector is decoded into.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RbfConfig {
    #[serde(default = "default_num_rbf")]
    pub num_rbf: usize,
    #[serde(default)]
    pub layout: RbfLayout,
    /// Per decision (hedge, withdrawal): which of fund, debt, power, cash-in feed the kernel.
    /// A masked input is read as zero before normalization.
    #[serde(default = "default_input_masks")]
    pub input_masks: [[bool; MAX_RBF_INPUTS]; NUMBER_OF_DECISIONS],
}

impl Default for RbfConfig {
    fn default() -> Self {
        RbfConfig {
            num_rbf: default_num_rbf(),
            layout: RbfLayout::default(),
            input_masks: default_input_masks(),
        }
    }
}

/// Scales that bring each physical quantity into a commensurate range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Normalization {
    /// Largest snow contract the hedge policy may buy ($M/inch).
    pub contract_size: f64,
    pub revenue: f64,
    pub fund: f64,
    pub power_price: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization {
            contract_size: 4.0,
            revenue: 250.0,
            fund: 150.0,
            power_price: 350.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FinanceConfig {
    /// Mean yearly revenue without any financial risk management.
    pub mean_revenue: f64,
    /// Fixed operating cost as a fraction of mean revenue.
    pub fixed_cost_fraction: f64,
    /// Discount rate spread, in percent.
    pub delta: f64,
    pub delta_fund: f64,
    pub delta_debt: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        FinanceConfig {
            mean_revenue: 127.80086602479503,
            fixed_cost_fraction: 0.914,
            delta: 0.4,
            delta_fund: -1.73,
            delta_debt: 1.0,
        }
    }
}

impl FinanceConfig {
    pub fn fixed_cost(&self) -> f64 {
        self.mean_revenue * self.fixed_cost_fraction
    }

    pub fn mean_net_revenue(&self) -> f64 {
        self.mean_revenue * (1.0 - self.fixed_cost_fraction)
    }

    pub fn interest_fund(&self) -> f64 {
        (self.delta_fund + self.delta) / 100.0 + 1.0
    }

    pub fn interest_debt(&self) -> f64 {
        (self.delta_debt + self.delta) / 100.0 + 1.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StaticPolicyConfig {
    /// Hedges smaller than this are not bought at all.
    pub min_contract_size: f64,
    /// Fund ceilings smaller than this act as a zero ceiling.
    pub min_fund_ceiling: f64,
    pub cash_flow_target: f64,
}

impl Default for StaticPolicyConfig {
    fn default() -> Self {
        StaticPolicyConfig {
            min_contract_size: 0.05,
            min_fund_ceiling: 0.05,
            cash_flow_target: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ObjectiveConfig {
    /// Quantile of per-scenario maximum debt reported as the debt objective.
    pub debt_quantile: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        ObjectiveConfig { debt_quantile: 0.95 }
    }
}

/// Everything a run needs, read once and shared read-only by every evaluation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(default)]
    pub rbf: RbfConfig,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub finance: FinanceConfig,
    #[serde(default)]
    pub static_policy: StaticPolicyConfig,
    #[serde(default)]
    pub objectives: ObjectiveConfig,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            rbf: RbfConfig::default(),
            normalization: Normalization::default(),
            finance: FinanceConfig::default(),
            static_policy: StaticPolicyConfig::default(),
            objectives: ObjectiveConfig::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl ModelConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ModelConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects values that would make the normalization or the interest factors meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rbf.num_rbf == 0 {
            return Err(ConfigError::InvalidValue(
                "num_rbf must be at least one".into(),
            ));
        }
        let scales = [
            ("normalization.contract_size", self.normalization.contract_size),
            ("normalization.revenue", self.normalization.revenue),
            ("normalization.fund", self.normalization.fund),
            ("normalization.power_price", self.normalization.power_price),
        ];
        for (name, value) in scales {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.objectives.debt_quantile) {
            return Err(ConfigError::InvalidValue(format!(
                "objectives.debt_quantile must lie in [0, 1], got {}",
                self.objectives.debt_quantile
            )));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "max_concurrency cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FLOAT_COMPARISON_EPSILON;

    #[test]
    fn test_interest_factors_from_spreads() {
        let finance = FinanceConfig::default();
        assert!((finance.interest_fund() - 0.9867).abs() < FLOAT_COMPARISON_EPSILON);
        assert!((finance.interest_debt() - 1.014).abs() < FLOAT_COMPARISON_EPSILON);
        assert!(
            (finance.fixed_cost() + finance.mean_net_revenue() - finance.mean_revenue).abs()
                < FLOAT_COMPARISON_EPSILON
        );
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config =
            ModelConfig::from_json_str(r#"{ "rbf": { "num_rbf": 3, "layout": "Unshared" } }"#)
                .unwrap();
        assert_eq!(config.rbf.num_rbf, 3);
        assert_eq!(config.rbf.layout, RbfLayout::Unshared);
        assert_eq!(config.normalization, Normalization::default());
        assert_eq!(config.finance, FinanceConfig::default());
        assert!(config.max_concurrency >= 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ModelConfig::from_json_str(r#"{ "rbf": { "num_rbf": 0 } }"#).is_err());
        assert!(
            ModelConfig::from_json_str(r#"{ "normalization": { "fund": 0.0 } }"#).is_err()
        );
        assert!(
            ModelConfig::from_json_str(r#"{ "objectives": { "debt_quantile": 1.5 } }"#).is_err()
        );
        assert!(ModelConfig::from_json_str("not json").is_err());
    }
}
