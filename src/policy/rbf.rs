use crate::config::Normalization;
use crate::consts::{EPS, HEDGE_DECISION, MAX_RBF_INPUTS, WITHDRAWAL_DECISION};
use crate::policy::decoder::PolicyParameters;

/// The hedge kernel reads fund, debt and power price; cash-in is a withdrawal-only input.
const HEDGE_INPUTS: usize = 3;

/// Financial state a policy decision is conditioned on, in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolicyState {
    pub fund: f64,
    pub debt: f64,
    pub power_index: f64,
    pub cash_in: f64,
}

/// Scales each state variable into the range the RBF centers live in.
/// Masked inputs are zeroed before scaling.
fn normalized_inputs(
    state: &PolicyState,
    mask: &[bool; MAX_RBF_INPUTS],
    normalization: &Normalization,
) -> [f64; MAX_RBF_INPUTS] {
    let gate = |active: bool, value: f64| if active { value } else { 0.0 };
    [
        gate(mask[0], state.fund) / normalization.fund,
        gate(mask[1], state.debt) / normalization.fund,
        gate(mask[2], state.power_index) / normalization.power_price,
        (gate(mask[3], state.cash_in) + normalization.revenue) / (2.0 * normalization.revenue),
    ]
}

/// Weighted sum of Gaussian kernels for `decision`, over the first `inputs` state variables.
fn kernel_sum(params: &PolicyParameters, decision: usize, inputs: &[f64]) -> f64 {
    params
        .weight_group(decision)
        .iter()
        .enumerate()
        .map(|(rbf, weight)| {
            let exponent = inputs
                .iter()
                .enumerate()
                .map(|(input, x)| {
                    let distance = x - params.center(decision, rbf, input);
                    let width = params.width(decision, rbf, input);
                    -(distance * distance) / (width * width)
                })
                .sum::<f64>();
            weight * exponent.exp()
        })
        .sum()
}

/// Snow contract size to buy this year, in `[0, normalization.contract_size]`.
///
/// Contracts smaller than the hedge threshold are not bought at all.
pub fn hedge_action(
    params: &PolicyParameters,
    state: &PolicyState,
    normalization: &Normalization,
) -> f64 {
    let inputs = normalized_inputs(state, params.input_mask(HEDGE_DECISION), normalization);
    let raw = kernel_sum(params, HEDGE_DECISION, &inputs[..HEDGE_INPUTS]);

    let max_contract = normalization.contract_size;
    let value = ((raw + params.biases()[HEDGE_DECISION]) * max_contract)
        .min(max_contract)
        .max(0.0);
    if value < params.thresholds()[HEDGE_DECISION] * max_contract {
        0.0
    } else {
        value
    }
}

/// Withdrawal from (positive) or deposit into (negative) the reserve fund.
///
/// `state.fund` and `state.debt` are expected to already carry this year's interest.
/// The network output is the cash flow the operator wants after the withdrawal, in
/// `[-revenue, revenue]`; the withdrawal is what it takes to get there from `state.cash_in`,
/// then bounded by `clamp_withdrawal`.
pub fn withdrawal_action(
    params: &PolicyParameters,
    state: &PolicyState,
    normalization: &Normalization,
) -> f64 {
    let inputs = normalized_inputs(state, params.input_mask(WITHDRAWAL_DECISION), normalization);
    let used_inputs = params.layout().inputs();
    let raw = kernel_sum(params, WITHDRAWAL_DECISION, &inputs[..used_inputs]);

    let revenue_scale = normalization.revenue;
    let cash_out = ((raw + params.biases()[WITHDRAWAL_DECISION]) * 2.0 * revenue_scale
        - revenue_scale)
        .min(revenue_scale)
        .max(-revenue_scale);

    let fund_cap = params.thresholds()[WITHDRAWAL_DECISION] * normalization.fund;
    clamp_withdrawal(cash_out - state.cash_in, state.fund, state.cash_in, fund_cap)
}

/// Bounds a desired withdrawal, in this order:
/// 1. a withdrawal cannot exceed the fund balance,
/// 2. a deposit cannot exceed the (non-negative part of the) cash in,
/// 3. whatever would leave the fund above `fund_cap` is paid out as well.
///
/// Step 3 runs last, so a negative `fund_cap` can push the withdrawal past the fund balance.
pub fn clamp_withdrawal(desired: f64, fund: f64, cash_in: f64, fund_cap: f64) -> f64 {
    let mut withdrawal = desired;
    if withdrawal > EPS {
        withdrawal = withdrawal.min(fund);
    } else if withdrawal < -EPS {
        withdrawal = withdrawal.max(-cash_in.max(0.0));
    }
    if fund - withdrawal > fund_cap {
        withdrawal = fund - fund_cap;
    }
    withdrawal
}
