//! TOPSIS: ranks solutions by their relative distance to the best and worst points of
//! their own set.
//!
//! Every objective is min-max normalized over the set and net revenue is inverted, so 0 is
//! best everywhere. The positive ideal is then the all-zero point and the negative ideal the
//! all-one point.

use crate::ranking::{
    check_objectives, Objective, OptimizationDirection, ParetoSolution, RankingError,
    TopsisScore,
};
use rayon::prelude::*;
use tracing::warn;

/// Min and max of every objective over `solutions`, in `objectives` order.
///
/// # Errors
/// `EmptySolutionSet` for an empty set, `NonFiniteObjective` for a NaN or infinite value and
/// `DegenerateObjectiveRange` for an objective whose range is zero, since normalizing it
/// would divide by zero.
pub fn objective_ranges(
    objectives: &[Objective],
    solutions: &[ParetoSolution],
) -> Result<Vec<(f64, f64)>, RankingError> {
    if solutions.is_empty() {
        return Err(RankingError::EmptySolutionSet);
    }

    objectives
        .iter()
        .map(|&objective| {
            let (min, max) = solutions
                .par_iter()
                .map(|solution| value_of(solution, objective))
                .try_fold(
                    || (f64::INFINITY, f64::NEG_INFINITY),
                    |(min, max), value| value.map(|v| (min.min(v), max.max(v))),
                )
                .try_reduce(
                    || (f64::INFINITY, f64::NEG_INFINITY),
                    |(min_a, max_a), (min_b, max_b)| Ok((min_a.min(min_b), max_a.max(max_b))),
                )?;
            if !(max - min > 0.0) {
                warn!(?objective, min, max, "objective has no spread across the set");
                return Err(RankingError::DegenerateObjectiveRange { objective });
            }
            Ok((min, max))
        })
        .collect()
}

fn value_of(solution: &ParetoSolution, objective: Objective) -> Result<f64, RankingError> {
    let value = solution
        .value(objective)
        .ok_or(RankingError::MissingObjective {
            id: solution.id,
            objective,
        })?;
    if !value.is_finite() {
        return Err(RankingError::NonFiniteObjective {
            id: solution.id,
            objective,
            value,
        });
    }
    Ok(value)
}

/// Normalized value in [0, 1] where 0 is best.
fn normalize(value: f64, (min, max): (f64, f64), objective: Objective) -> f64 {
    let scaled = (value - min) / (max - min);
    match objective.direction() {
        OptimizationDirection::Maximize => 1.0 - scaled,
        OptimizationDirection::Minimize => scaled,
    }
}

/// Scores one solution against ranges taken from its whole set.
pub fn score(
    solution: &ParetoSolution,
    objectives: &[Objective],
    ranges: &[(f64, f64)],
) -> Result<TopsisScore, RankingError> {
    let normalized = objectives
        .iter()
        .zip(ranges)
        .map(|(&objective, &range)| {
            value_of(solution, objective).map(|value| normalize(value, range, objective))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let distance_to_positive_ideal = normalized.iter().map(|n| n * n).sum::<f64>().sqrt();
    let distance_to_negative_ideal = normalized
        .iter()
        .map(|n| (1.0 - n) * (1.0 - n))
        .sum::<f64>()
        .sqrt();
    let relative_closeness = distance_to_negative_ideal
        / (distance_to_negative_ideal + distance_to_positive_ideal);

    Ok(TopsisScore {
        normalized,
        distance_to_positive_ideal,
        distance_to_negative_ideal,
        relative_closeness,
    })
}

/// Ranks `solutions` on `objectives`, replacing any previous scores.
///
/// `objectives` must be 2 to 4 distinct objectives. All ranges are computed before any
/// solution is scored, and nothing is written unless every solution scores successfully.
pub fn rank(objectives: &[Objective], solutions: &mut [ParetoSolution]) -> Result<(), RankingError> {
    check_objectives(objectives)?;
    let ranges = objective_ranges(objectives, solutions)?;
    let scores = solutions
        .par_iter()
        .map(|solution| score(solution, objectives, &ranges))
        .collect::<Result<Vec<_>, _>>()?;

    solutions
        .par_iter_mut()
        .zip(scores)
        .for_each(|(solution, score)| solution.topsis = Some(score));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FLOAT_COMPARISON_EPSILON;
    use crate::ranking::tests::solution;
    use crate::ranking::SolutionSet;
    use proptest::prelude::*;

    const TWO: [Objective; 2] = [Objective::NetRevenue, Objective::MaxDebt];

    #[test]
    fn test_ideal_and_anti_ideal_solutions() {
        let mut solutions = vec![
            solution(0, 20.0, 0.0),  // best on both
            solution(1, 15.0, 5.0),
            solution(2, 10.0, 10.0), // worst on both
        ];
        rank(&TWO, &mut solutions).unwrap();

        assert_eq!(solutions[0].relative_closeness(), Some(1.0));
        assert_eq!(solutions[2].relative_closeness(), Some(0.0));
        let middle = solutions[1].topsis.as_ref().unwrap();
        assert_eq!(middle.normalized, vec![0.5, 0.5]);
        assert!((middle.relative_closeness - 0.5).abs() < FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_revenue_is_inverted() {
        let mut solutions = vec![solution(0, 30.0, 4.0), solution(1, 10.0, 2.0)];
        rank(&TWO, &mut solutions).unwrap();
        assert_eq!(solutions[0].topsis.as_ref().unwrap().normalized, vec![0.0, 1.0]);
        assert_eq!(solutions[1].topsis.as_ref().unwrap().normalized, vec![1.0, 0.0]);
    }

    #[test]
    fn test_only_listed_objectives_count() {
        let base = |id, revenue, debt, fund| {
            let mut s = solution(id, revenue, debt);
            s.objectives.insert(Objective::ReserveFund, fund);
            s
        };
        let solutions = vec![base(0, 20.0, 0.0, 100.0), base(1, 10.0, 10.0, 0.0)];

        let mut two = solutions.clone();
        rank(&TWO, &mut two).unwrap();
        assert_eq!(two[0].relative_closeness(), Some(1.0));

        let mut three = solutions;
        rank(
            &[Objective::NetRevenue, Objective::MaxDebt, Objective::ReserveFund],
            &mut three,
        )
        .unwrap();
        let score = three[0].topsis.as_ref().unwrap();
        assert_eq!(score.distance_to_positive_ideal, 1.0);
        assert!((score.distance_to_negative_ideal - 2.0f64.sqrt()).abs() < FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_degenerate_objective_fails_without_scoring() {
        let mut solutions = vec![solution(0, 20.0, 3.0), solution(1, 10.0, 3.0)];
        assert_eq!(
            rank(&TWO, &mut solutions).unwrap_err(),
            RankingError::DegenerateObjectiveRange {
                objective: Objective::MaxDebt
            }
        );
        assert!(solutions.iter().all(|s| s.topsis.is_none()));

        let mut single = vec![solution(0, 20.0, 3.0)];
        assert!(matches!(
            rank(&TWO, &mut single),
            Err(RankingError::DegenerateObjectiveRange { .. })
        ));
        assert_eq!(
            rank(&TWO, &mut []).unwrap_err(),
            RankingError::EmptySolutionSet
        );
    }

    #[test]
    fn test_objective_list_is_checked_before_ranking() {
        let mut solutions = vec![solution(0, 1.0, 2.0), solution(1, 3.0, 4.0)];
        assert_eq!(
            rank(&[], &mut solutions).unwrap_err(),
            RankingError::InvalidObjectiveCount(0)
        );
        assert_eq!(
            rank(&[Objective::MaxDebt], &mut solutions).unwrap_err(),
            RankingError::InvalidObjectiveCount(1)
        );
        assert_eq!(
            rank(&[Objective::MaxDebt, Objective::MaxDebt], &mut solutions).unwrap_err(),
            RankingError::DuplicateObjective(Objective::MaxDebt)
        );
        assert!(solutions.iter().all(|s| s.topsis.is_none()));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut solutions = vec![
            solution(0, 20.0, 0.0),
            solution(1, f64::NAN, 5.0),
            solution(2, 10.0, 10.0),
        ];
        assert!(matches!(
            rank(&TWO, &mut solutions),
            Err(RankingError::NonFiniteObjective {
                id: 1,
                objective: Objective::NetRevenue,
                ..
            })
        ));
        assert!(solutions.iter().all(|s| s.topsis.is_none()));

        let mut infinite = vec![solution(0, 20.0, f64::INFINITY), solution(1, 10.0, 1.0)];
        assert!(matches!(
            rank(&TWO, &mut infinite),
            Err(RankingError::NonFiniteObjective { id: 0, .. })
        ));
    }

    #[test]
    fn test_filtered_set_is_normalized_on_its_own_ranges() {
        let mut set = SolutionSet::new(
            TWO.to_vec(),
            vec![
                solution(0, 20.0, 10.0),
                solution(1, 15.0, 5.0),
                solution(2, 10.0, 0.0),
            ],
        )
        .unwrap();
        set.rank().unwrap();
        let before = set.solutions()[1].topsis.clone().unwrap();
        assert_eq!(before.normalized, vec![0.5, 0.5]);

        let mut filtered = set.retain_into(|s| s.id != 2);
        filtered.rank().unwrap();
        let after = filtered.solutions()[1].topsis.clone().unwrap();
        assert_eq!(after.normalized, vec![1.0, 0.0]);
        assert!((after.relative_closeness - 0.5).abs() < FLOAT_COMPARISON_EPSILON);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_closeness_is_bounded(
            values in prop::collection::vec((-50.0..50.0f64, 0.0..100.0f64), 2..30)
        ) {
            let mut solutions: Vec<ParetoSolution> = values
                .iter()
                .enumerate()
                .map(|(id, &(revenue, debt))| solution(id, revenue, debt))
                .collect();
            match rank(&TWO, &mut solutions) {
                Ok(()) => {
                    for s in &solutions {
                        let closeness = s.relative_closeness().unwrap();
                        prop_assert!((0.0..=1.0).contains(&closeness));
                        prop_assert!(!closeness.is_nan());
                    }
                }
                Err(err) => {
                    let is_degenerate = matches!(err, RankingError::DegenerateObjectiveRange { .. });
                    prop_assert!(is_degenerate);
                }
            }
        }
    }
}
