use crate::consts::{MAX_RANKING_OBJECTIVES, MIN_RANKING_OBJECTIVES};
use crate::simulation::evaluation::PolicyEvaluation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod brushing;
pub mod pareto;
pub mod topsis;

pub use brushing::BrushingConstraints;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    #[error("Objective {objective:?} has the same value for every solution; drop it before ranking")]
    DegenerateObjectiveRange { objective: Objective },
    #[error("A solution set is ranked on 2 to 4 objectives, got {0}")]
    InvalidObjectiveCount(usize),
    #[error("Objective {0:?} is listed more than once")]
    DuplicateObjective(Objective),
    #[error("Solution {id} has no value for objective {objective:?}")]
    MissingObjective { id: usize, objective: Objective },
    #[error("Cannot rank an empty solution set")]
    EmptySolutionSet,
    #[error("Optimizer row has {actual} values but {expected} were expected")]
    MalformedOptimizerRow { expected: usize, actual: usize },
    #[error("Solution {id} has a non-finite value `{value}` for objective {objective:?}")]
    NonFiniteObjective {
        id: usize,
        objective: Objective,
        value: f64,
    },
}

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum OptimizationDirection {
    Maximize,
    Minimize,
}

/// The objectives a hedging policy is judged on.
#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Objective {
    /// Expected yearly cash flow after hedging and fund operations.
    #[serde(alias = "annRev")]
    NetRevenue,
    #[serde(alias = "maxDebt")]
    MaxDebt,
    /// How much the policy departs from doing nothing.
    #[serde(alias = "maxComplex")]
    Complexity,
    /// Size of the reserve fund the policy relies on.
    #[serde(alias = "maxFund")]
    ReserveFund,
}

impl Objective {
    pub const ALL: [Objective; 4] = [
        Objective::NetRevenue,
        Objective::MaxDebt,
        Objective::Complexity,
        Objective::ReserveFund,
    ];

    /// Net revenue is the only objective that is maximized. Flipping any entry here
    /// silently inverts every ranking.
    pub fn direction(&self) -> OptimizationDirection {
        match self {
            Objective::NetRevenue => OptimizationDirection::Maximize,
            Objective::MaxDebt | Objective::Complexity | Objective::ReserveFund => {
                OptimizationDirection::Minimize
            }
        }
    }
}

/// TOPSIS outcome for one solution within its set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopsisScore {
    /// Normalized values in the set's objective order; 0 is best for every objective.
    pub normalized: Vec<f64>,
    pub distance_to_positive_ideal: f64,
    pub distance_to_negative_ideal: f64,
    /// In [0, 1]; 1 is the ideal point.
    pub relative_closeness: f64,
}

/// One evaluated policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoSolution {
    pub id: usize,
    pub decisions: Vec<f64>,
    pub objectives: BTreeMap<Objective, f64>,
    #[serde(default)]
    pub constraints: Vec<f64>,
    #[serde(default)]
    pub topsis: Option<TopsisScore>,
}

impl ParetoSolution {
    pub fn new(
        id: usize,
        decisions: Vec<f64>,
        objectives: impl IntoIterator<Item = (Objective, f64)>,
    ) -> Self {
        ParetoSolution {
            id,
            decisions,
            objectives: objectives.into_iter().collect(),
            constraints: vec![],
            topsis: None,
        }
    }

    /// Builds a solution from an optimizer result row laid out as
    /// `[decisions.., objectives.., constraints..]`.
    ///
    /// The optimizer minimizes everything, so net revenue is stored negated and is flipped
    /// back here.
    pub fn from_optimizer_row(
        id: usize,
        row: &[f64],
        num_decisions: usize,
        objectives: &[Objective],
        num_constraints: usize,
    ) -> Result<Self, RankingError> {
        let expected = num_decisions + objectives.len() + num_constraints;
        if row.len() != expected {
            return Err(RankingError::MalformedOptimizerRow {
                expected,
                actual: row.len(),
            });
        }
        let (decisions, rest) = row.split_at(num_decisions);
        let (values, constraints) = rest.split_at(objectives.len());
        let objectives = objectives.iter().zip(values).map(|(&objective, &value)| {
            let value = match objective {
                Objective::NetRevenue => -value,
                _ => value,
            };
            (objective, value)
        });

        let mut solution = ParetoSolution::new(id, decisions.to_vec(), objectives);
        solution.constraints = constraints.to_vec();
        Ok(solution)
    }

    /// A solution carrying the simulated objectives of `evaluation`. Complexity is not
    /// derived from a simulation and must be attached separately when needed.
    pub fn from_evaluation(id: usize, decisions: Vec<f64>, evaluation: &PolicyEvaluation) -> Self {
        ParetoSolution::new(
            id,
            decisions,
            [
                (Objective::NetRevenue, evaluation.expected_net_revenue),
                (Objective::MaxDebt, evaluation.max_debt),
                (Objective::ReserveFund, evaluation.max_fund),
            ],
        )
    }

    pub fn value(&self, objective: Objective) -> Option<f64> {
        self.objectives.get(&objective).copied()
    }

    pub fn relative_closeness(&self) -> Option<f64> {
        self.topsis.as_ref().map(|score| score.relative_closeness)
    }

    /// Objective values turned into "larger is better" scores, in `objectives` order.
    fn scores(&self, objectives: &[Objective]) -> Vec<f64> {
        objectives
            .iter()
            .map(|&objective| {
                let value = self.value(objective).unwrap_or(f64::NAN);
                match objective.direction() {
                    OptimizationDirection::Maximize => value,
                    OptimizationDirection::Minimize => -value,
                }
            })
            .collect()
    }

    /// True when `other` is at least as good on every objective in `objectives`
    /// and strictly better on at least one.
    pub fn is_dominated_by(&self, other: &ParetoSolution, objectives: &[Objective]) -> bool {
        let self_scores = self.scores(objectives);
        let other_scores = other.scores(objectives);

        let other_is_at_least_as_good_in_all = self_scores
            .iter()
            .zip(other_scores.iter())
            .all(|(&mine, &theirs)| theirs >= mine);
        let other_is_strictly_better_in_one = self_scores
            .iter()
            .zip(other_scores.iter())
            .any(|(&mine, &theirs)| theirs > mine);

        other_is_at_least_as_good_in_all && other_is_strictly_better_in_one
    }
}

/// Solutions sharing one objective subset. Ranking always happens within a single set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSolutionSet")]
pub struct SolutionSet {
    objectives: Vec<Objective>,
    solutions: Vec<ParetoSolution>,
}

/// Wire form of a `SolutionSet`, validated on the way in.
#[derive(Deserialize)]
struct UncheckedSolutionSet {
    objectives: Vec<Objective>,
    solutions: Vec<ParetoSolution>,
}

impl TryFrom<UncheckedSolutionSet> for SolutionSet {
    type Error = RankingError;

    fn try_from(raw: UncheckedSolutionSet) -> Result<Self, Self::Error> {
        SolutionSet::new(raw.objectives, raw.solutions)
    }
}

pub(crate) fn check_objectives(objectives: &[Objective]) -> Result<(), RankingError> {
    if !(MIN_RANKING_OBJECTIVES..=MAX_RANKING_OBJECTIVES).contains(&objectives.len()) {
        return Err(RankingError::InvalidObjectiveCount(objectives.len()));
    }
    for (i, objective) in objectives.iter().enumerate() {
        if objectives[..i].contains(objective) {
            return Err(RankingError::DuplicateObjective(*objective));
        }
    }
    Ok(())
}

impl SolutionSet {
    /// # Errors
    /// Fails when the objective list is not 2 to 4 distinct objectives, or when a solution
    /// lacks a value for one of them.
    pub fn new(
        objectives: Vec<Objective>,
        solutions: Vec<ParetoSolution>,
    ) -> Result<Self, RankingError> {
        check_objectives(&objectives)?;
        for solution in &solutions {
            if let Some(&objective) = objectives
                .iter()
                .find(|&&objective| solution.value(objective).is_none())
            {
                return Err(RankingError::MissingObjective {
                    id: solution.id,
                    objective,
                });
            }
        }
        Ok(SolutionSet {
            objectives,
            solutions,
        })
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn solutions(&self) -> &[ParetoSolution] {
        &self.solutions
    }

    pub fn into_solutions(self) -> Vec<ParetoSolution> {
        self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Runs TOPSIS over the whole set, replacing any previous scores.
    pub fn rank(&mut self) -> Result<(), RankingError> {
        topsis::rank(&self.objectives, &mut self.solutions)
    }

    /// Solution with the highest relative closeness; the earliest one wins ties.
    /// `None` until the set has been ranked.
    pub fn best_compromise(&self) -> Option<&ParetoSolution> {
        self.solutions.iter().fold(None, |best, candidate| {
            let best_score = best.and_then(ParetoSolution::relative_closeness);
            match (best_score, candidate.relative_closeness()) {
                (_, None) => best,
                (None, Some(_)) => Some(candidate),
                (Some(best_score), Some(score)) if score > best_score => Some(candidate),
                _ => best,
            }
        })
    }

    /// New set over the same objectives with only the members `keep` accepts. Scores are
    /// dropped, since closeness is relative to the set it was computed in.
    pub fn retain_into(&self, keep: impl Fn(&ParetoSolution) -> bool) -> SolutionSet {
        SolutionSet {
            objectives: self.objectives.clone(),
            solutions: self
                .solutions
                .iter()
                .filter(|solution| keep(solution))
                .map(|solution| ParetoSolution {
                    topsis: None,
                    ..solution.clone()
                })
                .collect(),
        }
    }
}
