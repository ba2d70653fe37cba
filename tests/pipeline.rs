use hydro_hedge::config::ModelConfig;
use hydro_hedge::policy::{Policy, PolicyKind};
use hydro_hedge::ranking::{BrushingConstraints, Objective, ParetoSolution, SolutionSet};
use hydro_hedge::sampling::{SamplerConfig, ScenarioSampler};
use hydro_hedge::simulation::evaluation::{evaluate_policy, evaluate_population};

fn sampled(points: usize, count: usize) -> Vec<hydro_hedge::Scenario> {
    let config = SamplerConfig {
        points,
        ..SamplerConfig::default()
    };
    ScenarioSampler::new(&config)
        .unwrap()
        .sample_many(count)
        .unwrap()
}

#[test]
fn sampled_static_population_ranks_end_to_end() {
    let config = ModelConfig {
        max_concurrency: 2,
        ..ModelConfig::default()
    };
    let scenarios = sampled(11, 40);
    let population = vec![
        vec![0.0, 0.0],
        vec![5.0, 0.0],
        vec![15.0, 0.5],
        vec![30.0, 1.0],
    ];

    let results =
        evaluate_population(PolicyKind::Static, &population, &scenarios, &config).unwrap();
    let solutions: Vec<ParetoSolution> = population
        .iter()
        .zip(results)
        .enumerate()
        .map(|(id, (vector, result))| {
            ParetoSolution::from_evaluation(id, vector.clone(), &result.unwrap())
        })
        .collect();
    for solution in &solutions {
        assert!(solution.value(Objective::MaxDebt).unwrap() >= 0.0);
        assert!(solution.value(Objective::ReserveFund).unwrap() >= 0.0);
    }

    let mut set = SolutionSet::new(
        vec![Objective::NetRevenue, Objective::MaxDebt, Objective::ReserveFund],
        solutions,
    )
    .unwrap();
    match set.rank() {
        Ok(()) => {
            let best = set.best_compromise().unwrap();
            let closeness = best.relative_closeness().unwrap();
            assert!((0.0..=1.0).contains(&closeness));
            assert!(set
                .solutions()
                .iter()
                .all(|s| s.relative_closeness().unwrap() <= closeness));
        }
        Err(e) => panic!("ranking failed: {e}"),
    }
}

#[test]
fn evaluating_one_vector_matches_the_population_path() {
    let config = ModelConfig {
        max_concurrency: 3,
        ..ModelConfig::default()
    };
    let scenarios = sampled(6, 10);
    let length = Policy::decision_count(PolicyKind::Dynamic, &config);
    let vector: Vec<f64> = (0..length).map(|i| (i as f64 * 0.37).fract()).collect();

    let direct = evaluate_policy(
        &Policy::from_vector(PolicyKind::Dynamic, &vector, &config).unwrap(),
        &scenarios,
        &config,
    )
    .unwrap();
    let pooled = evaluate_population(
        PolicyKind::Dynamic,
        std::slice::from_ref(&vector),
        &scenarios,
        &config,
    )
    .unwrap()
    .remove(0)
    .unwrap();
    assert_eq!(direct, pooled);
}

#[test]
fn optimizer_rows_brush_and_rerank() {
    let objectives = [Objective::NetRevenue, Objective::MaxDebt];
    // optimizer output: two decisions, negated revenue, debt, no constraints
    let rows = [
        [0.1, 0.2, -120.0, 30.0],
        [0.3, 0.4, -110.0, 10.0],
        [0.5, 0.6, -100.0, 0.0],
        [0.7, 0.8, -105.0, 20.0],
    ];
    let solutions = rows
        .iter()
        .enumerate()
        .map(|(id, row)| ParetoSolution::from_optimizer_row(id, row, 2, &objectives, 0).unwrap())
        .collect();
    let set = SolutionSet::new(objectives.to_vec(), solutions).unwrap();

    // row 3 is dominated by row 1
    let mut front = set.non_dominated(&objectives).unwrap();
    assert_eq!(
        front.solutions().iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    front.rank().unwrap();
    assert_eq!(front.best_compromise().map(|s| s.id), Some(1));

    let mut brushed = front.brushed(
        &BrushingConstraints {
            max_debt: Some(0.2),
            ..Default::default()
        },
        100.0,
    );
    brushed.rank().unwrap();
    assert_eq!(
        brushed.solutions().iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(brushed.solutions()[0].relative_closeness(), Some(0.5));
}
