//! Hedging and reserve-fund policies for a hydropower producer.
//!
//! A policy decides each year how large a snow-index contract to buy and how much cash to
//! move between the revenue stream and a reserve fund. Policies are either a static rule
//! or a radial basis function network decoded from an optimizer's decision vector; they are
//! simulated over stochastic scenarios, aggregated into objectives and ranked with TOPSIS.

pub mod config;
pub mod consts;
pub mod policy;
pub mod ranking;
pub mod sampling;
pub mod simulation;

pub use config::ModelConfig;
pub use policy::{Policy, PolicyKind, PolicyState};
pub use ranking::{Objective, ParetoSolution, SolutionSet};
pub use simulation::{simulate, Scenario, SimulationTrace};
