use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};

pub mod decoder;
pub mod rbf;
pub mod static_rule;

pub use decoder::{DecisionVector, DecodeError, PolicyParameters, RbfLayout};
pub use rbf::PolicyState;
pub use static_rule::StaticPolicy;

use rbf::{hedge_action, withdrawal_action};

/// Which rule an optimizer vector encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    Dynamic,
    Static,
}

/// A yearly decision rule the simulator can drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Policy {
    /// RBF network decoded from an optimizer vector.
    Dynamic(PolicyParameters),
    /// Fixed hedge and fund ceiling.
    Static(StaticPolicy),
}

impl Policy {
    pub fn from_vector(
        kind: PolicyKind,
        vector: &[f64],
        config: &ModelConfig,
    ) -> Result<Self, DecodeError> {
        match kind {
            PolicyKind::Dynamic => Self::dynamic_from_vector(vector, config),
            PolicyKind::Static => Self::static_from_vector(vector, config),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Dynamic(_) => PolicyKind::Dynamic,
            Policy::Static(_) => PolicyKind::Static,
        }
    }

    /// Decodes an RBF policy with the configuration's network shape.
    pub fn dynamic_from_vector(vector: &[f64], config: &ModelConfig) -> Result<Self, DecodeError> {
        Ok(Policy::Dynamic(PolicyParameters::decode(vector, &config.rbf)?))
    }

    /// The baseline rule; `vector` holds `[fund_ceiling, hedge]` in optimizer order.
    pub fn static_from_vector(vector: &[f64], config: &ModelConfig) -> Result<Self, DecodeError> {
        match vector {
            [fund_ceiling, hedge] => Ok(Policy::Static(StaticPolicy::new(
                *hedge,
                *fund_ceiling,
                &config.static_policy,
            ))),
            _ => Err(DecodeError::MalformedDecisionVector {
                expected: 2,
                actual: vector.len(),
            }),
        }
    }

    /// Contract size for the year, from the state before interest.
    pub fn hedge(&self, state: &PolicyState, config: &ModelConfig) -> f64 {
        match self {
            Policy::Dynamic(params) => hedge_action(params, state, &config.normalization),
            Policy::Static(rule) => rule.hedge,
        }
    }

    /// Withdrawal for the year, from the interest-grown state and the year's cash in.
    pub fn withdrawal(&self, state: &PolicyState, config: &ModelConfig) -> f64 {
        match self {
            Policy::Dynamic(params) => withdrawal_action(params, state, &config.normalization),
            Policy::Static(rule) => rule.withdrawal(state.fund, state.cash_in),
        }
    }

    /// Optimizer variables this policy kind consumes under `config`.
    pub fn decision_count(kind: PolicyKind, config: &ModelConfig) -> usize {
        match kind {
            PolicyKind::Dynamic => decoder::expected_length(&config.rbf),
            PolicyKind::Static => 2,
        }
    }
}
