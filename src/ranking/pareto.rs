use crate::ranking::{Objective, ParetoSolution, RankingError, SolutionSet};
use rayon::prelude::*;

/// Indices of the solutions no other solution dominates on `objectives`.
pub fn find_non_dominated_indices(
    solutions: &[ParetoSolution],
    objectives: &[Objective],
) -> Vec<usize> {
    if solutions.is_empty() {
        return vec![];
    }

    solutions
        .par_iter()
        .enumerate()
        .filter(|(i, solution_a)| {
            // outer loop is already parallel
            let is_dominated = solutions
                .iter()
                .enumerate()
                .any(|(j, solution_b)| *i != j && solution_a.is_dominated_by(solution_b, objectives));
            !is_dominated
        })
        .map(|(i, _)| i)
        .collect()
}

impl SolutionSet {
    /// The non-dominated members of this set, judged on `objectives`, which may differ
    /// from the set's own ranking objectives. The result keeps the set's objectives and
    /// carries no scores.
    ///
    /// # Errors
    /// `MissingObjective` when a member lacks a value for one of `objectives`.
    pub fn non_dominated(&self, objectives: &[Objective]) -> Result<SolutionSet, RankingError> {
        for solution in &self.solutions {
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

        let front = find_non_dominated_indices(&self.solutions, objectives);
        Ok(SolutionSet {
            objectives: self.objectives.clone(),
            solutions: front
                .into_iter()
                .map(|i| ParetoSolution {
                    topsis: None,
                    ..self.solutions[i].clone()
                })
                .collect(),
        })
    }
}
