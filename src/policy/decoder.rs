use crate::config::RbfConfig;
use crate::consts::{
    EPS, HEDGE_DECISION, MAX_RBF_INPUTS, NUMBER_OF_DECISIONS, WITHDRAWAL_DECISION,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Flat chromosome produced by the outer optimizer.
pub type DecisionVector = Vec<f64>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Decision vector has {actual} values but the configuration expects {expected}")]
    MalformedDecisionVector { expected: usize, actual: usize },
    #[error("The RBF network needs at least one basis function")]
    InvalidRbfCount,
}

/// How the RBF kernels are shared between the hedge and the withdrawal decisions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RbfLayout {
    /// Each decision owns its kernels.
    Unshared,
    /// One set of kernels, combined with per-decision weights.
    #[default]
    Shared,
    /// Kernels drive the hedge only; the withdrawal keeps just its bias term.
    SharedHedgeOnly,
}

/// Length of each positional block of a decision vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLengths {
    pub thresholds: usize,
    pub centers: usize,
    pub widths: usize,
    pub weights: usize,
    pub biases: usize,
}

impl BlockLengths {
    pub fn total(&self) -> usize {
        self.thresholds + self.centers + self.widths + self.weights + self.biases
    }
}

impl RbfLayout {
    /// Number of state inputs each kernel reads.
    pub fn inputs(&self) -> usize {
        match self {
            RbfLayout::Unshared | RbfLayout::Shared => MAX_RBF_INPUTS,
            RbfLayout::SharedHedgeOnly => 3,
        }
    }

    fn kernel_sets(&self) -> usize {
        match self {
            RbfLayout::Unshared => NUMBER_OF_DECISIONS,
            RbfLayout::Shared | RbfLayout::SharedHedgeOnly => 1,
        }
    }

    fn weight_groups(&self) -> usize {
        match self {
            RbfLayout::Unshared | RbfLayout::Shared => NUMBER_OF_DECISIONS,
            RbfLayout::SharedHedgeOnly => 1,
        }
    }

    /// Number of basis functions that contribute to `decision`.
    pub fn rbf_count(&self, decision: usize, num_rbf: usize) -> usize {
        match (self, decision) {
            (RbfLayout::SharedHedgeOnly, WITHDRAWAL_DECISION) => 0,
            _ => num_rbf,
        }
    }

    /// Position of a center (or width) inside its block.
    pub fn kernel_index(&self, decision: usize, rbf: usize, input: usize, num_rbf: usize) -> usize {
        let inputs = self.inputs();
        match self {
            RbfLayout::Unshared => decision * inputs * num_rbf + inputs * rbf + input,
            RbfLayout::Shared | RbfLayout::SharedHedgeOnly => inputs * rbf + input,
        }
    }

    /// Position of a combination weight inside the weight block.
    pub fn weight_index(&self, decision: usize, rbf: usize, num_rbf: usize) -> usize {
        match self {
            RbfLayout::Unshared | RbfLayout::Shared => decision * num_rbf + rbf,
            RbfLayout::SharedHedgeOnly => rbf,
        }
    }

    pub fn block_lengths(&self, num_rbf: usize) -> BlockLengths {
        let kernel_values = self.kernel_sets() * num_rbf * self.inputs();
        BlockLengths {
            thresholds: NUMBER_OF_DECISIONS,
            centers: kernel_values,
            widths: kernel_values,
            weights: self.weight_groups() * num_rbf,
            biases: NUMBER_OF_DECISIONS,
        }
    }
}

/// Number of values a decision vector must carry for `config`.
pub fn expected_length(config: &RbfConfig) -> usize {
    config.layout.block_lengths(config.num_rbf).total()
}

/// Structured, immutable form of a decision vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedParameters")]
pub struct PolicyParameters {
    layout: RbfLayout,
    num_rbf: usize,
    input_masks: [[bool; MAX_RBF_INPUTS]; NUMBER_OF_DECISIONS],
    thresholds: [f64; NUMBER_OF_DECISIONS],
    centers: Vec<f64>,
    widths: Vec<f64>,
    weights: Vec<f64>,
    biases: [f64; NUMBER_OF_DECISIONS],
}

/// Wire form of `PolicyParameters`; deserialized values go back through `decode`.
#[derive(Deserialize)]
struct UncheckedParameters {
    layout: RbfLayout,
    num_rbf: usize,
    input_masks: [[bool; MAX_RBF_INPUTS]; NUMBER_OF_DECISIONS],
    thresholds: [f64; NUMBER_OF_DECISIONS],
    centers: Vec<f64>,
    widths: Vec<f64>,
    weights: Vec<f64>,
    biases: [f64; NUMBER_OF_DECISIONS],
}

impl TryFrom<UncheckedParameters> for PolicyParameters {
    type Error = DecodeError;

    fn try_from(raw: UncheckedParameters) -> Result<Self, Self::Error> {
        if raw.num_rbf == 0 {
            return Err(DecodeError::InvalidRbfCount);
        }
        let lengths = raw.layout.block_lengths(raw.num_rbf);
        for (expected, actual) in [
            (lengths.centers, raw.centers.len()),
            (lengths.widths, raw.widths.len()),
            (lengths.weights, raw.weights.len()),
        ] {
            if expected != actual {
                return Err(DecodeError::MalformedDecisionVector { expected, actual });
            }
        }

        let config = RbfConfig {
            num_rbf: raw.num_rbf,
            layout: raw.layout,
            input_masks: raw.input_masks,
        };
        let vector: Vec<f64> = raw
            .thresholds
            .iter()
            .chain(&raw.centers)
            .chain(&raw.widths)
            .chain(&raw.weights)
            .chain(&raw.biases)
            .copied()
            .collect();
        PolicyParameters::decode(&vector, &config)
    }
}

impl PolicyParameters {
    /// Decodes a decision vector positionally: thresholds, centers, widths, weights, biases.
    ///
    /// Widths are floored at `EPS` so kernels never divide by zero, and every weight group
    /// is rescaled to sum to one. A group whose raw sum is not positive is zeroed, which
    /// leaves that decision with its bias only.
    ///
    /// # Errors
    /// `DecodeError::MalformedDecisionVector` when the length does not match `config`.
    pub fn decode(vector: &[f64], config: &RbfConfig) -> Result<Self, DecodeError> {
        if config.num_rbf == 0 {
            return Err(DecodeError::InvalidRbfCount);
        }
        let expected = expected_length(config);
        if vector.len() != expected {
            return Err(DecodeError::MalformedDecisionVector {
                expected,
                actual: vector.len(),
            });
        }

        let lengths = config.layout.block_lengths(config.num_rbf);
        let (thresholds, rest) = vector.split_at(lengths.thresholds);
        let (centers, rest) = rest.split_at(lengths.centers);
        let (widths, rest) = rest.split_at(lengths.widths);
        let (weights, biases) = rest.split_at(lengths.weights);

        let mut weights = weights.to_vec();
        for (group, chunk) in weights.chunks_mut(config.num_rbf).enumerate() {
            let raw_sum = chunk.iter().sum::<f64>();
            if raw_sum > 0.0 {
                chunk.iter_mut().for_each(|w| *w /= raw_sum);
            } else {
                debug!(group, raw_sum, "weight group has no positive mass, kernels are inert");
                chunk.iter_mut().for_each(|w| *w = 0.0);
            }
        }

        Ok(PolicyParameters {
            layout: config.layout,
            num_rbf: config.num_rbf,
            input_masks: config.input_masks,
            thresholds: [thresholds[HEDGE_DECISION], thresholds[WITHDRAWAL_DECISION]],
            centers: centers.to_vec(),
            widths: widths.iter().map(|&b| b.max(EPS)).collect(),
            weights,
            biases: [biases[HEDGE_DECISION], biases[WITHDRAWAL_DECISION]],
        })
    }

    /// Decodes an optimizer result row that carries `num_objectives` trailing objective
    /// values. The objectives are returned unchanged.
    pub fn decode_with_objectives(
        row: &[f64],
        config: &RbfConfig,
        num_objectives: usize,
    ) -> Result<(Self, Vec<f64>), DecodeError> {
        let expected = expected_length(config) + num_objectives;
        if row.len() != expected {
            return Err(DecodeError::MalformedDecisionVector {
                expected,
                actual: row.len(),
            });
        }
        let (vector, objectives) = row.split_at(row.len() - num_objectives);
        Ok((Self::decode(vector, config)?, objectives.to_vec()))
    }

    pub fn layout(&self) -> RbfLayout {
        self.layout
    }

    pub fn num_rbf(&self) -> usize {
        self.num_rbf
    }

    pub fn thresholds(&self) -> &[f64; NUMBER_OF_DECISIONS] {
        &self.thresholds
    }

    pub fn biases(&self) -> &[f64; NUMBER_OF_DECISIONS] {
        &self.biases
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn input_mask(&self, decision: usize) -> &[bool; MAX_RBF_INPUTS] {
        &self.input_masks[decision]
    }

    /// Combination weights used by `decision`; empty when the layout gives it no kernels.
    pub fn weight_group(&self, decision: usize) -> &[f64] {
        let count = self.layout.rbf_count(decision, self.num_rbf);
        if count == 0 {
            return &[];
        }
        let start = self.layout.weight_index(decision, 0, self.num_rbf);
        &self.weights[start..start + count]
    }

    pub fn center(&self, decision: usize, rbf: usize, input: usize) -> f64 {
        self.centers[self.layout.kernel_index(decision, rbf, input, self.num_rbf)]
    }

    pub fn width(&self, decision: usize, rbf: usize, input: usize) -> f64 {
        self.widths[self.layout.kernel_index(decision, rbf, input, self.num_rbf)]
    }
}
