/// Numeric tolerance used by the policy clamps, the width floor and the debt trigger.
pub const EPS: f64 = 1e-13;

/// Tolerance for comparing floats in tests and weight normalization checks.
pub const FLOAT_COMPARISON_EPSILON: f64 = 1e-9;

/// Each year the operator chooses a hedge contract and a fund withdrawal.
pub const NUMBER_OF_DECISIONS: usize = 2;
pub const HEDGE_DECISION: usize = 0;
pub const WITHDRAWAL_DECISION: usize = 1;

/// fund balance, debt, power price index, cash in
pub const MAX_RBF_INPUTS: usize = 4;

/// Objectives a ranked solution set may carry.
pub const MIN_RANKING_OBJECTIVES: usize = 2;
pub const MAX_RANKING_OBJECTIVES: usize = 4;
