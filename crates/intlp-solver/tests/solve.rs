use intlp_solver::{BranchAndBoundSolver, Error, INF, Matrix, Problem, Solver, SolutionStatus, TwoPhaseSimplexSolver};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn problem(objective: &[f64], constraints: Vec<Vec<f64>>, rhs: &[f64]) -> Result<Problem, Error> {
    Problem::new(
        Matrix::from_vec(objective)?,
        Matrix::from_rows(constraints)?,
        Matrix::from_vec(rhs)?,
    )
}

#[test]
fn test_relaxation_satisfies_constraints() {
    init_tracing();

    // Maximize 2x + 3y s.t. 3x + 2y <= 13, 4x + 5y <= 11
    let p = problem(&[2.0, 3.0], vec![vec![3.0, 2.0], vec![4.0, 5.0]], &[13.0, 11.0]).unwrap();
    let solver = TwoPhaseSimplexSolver::new();

    let solution = solver.run(&p);

    assert_eq!(solution.status(), SolutionStatus::Optimal);
    assert!(solution.objective_value.is_finite());
    assert!(solution.values.iter().all(|&v| v >= 0.0));
    assert!(p.is_feasible(&solution.values, solver.tolerance()));
    assert!((p.evaluate(&solution.values) - solution.objective_value).abs() < 1e-9);
}

#[test]
fn test_dimension_checks() {
    assert!(matches!(
        problem(&[1.0, 1.0], vec![vec![1.0, 1.0, 1.0]], &[1.0]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        problem(&[1.0, 1.0], vec![vec![1.0, 1.0]], &[1.0, 2.0]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(problem(&[1.0, 1.0], vec![vec![1.0, 1.0], vec![1.0, 0.0]], &[1.0, 2.0]).is_ok());
}

#[test]
fn test_sentinels_through_both_solvers() {
    init_tracing();

    let lp = TwoPhaseSimplexSolver::new();
    let milp = BranchAndBoundSolver::new(&lp, 0.0001, true);

    let infeasible = problem(&[1.0], vec![vec![1.0]], &[-1.0]).unwrap();
    assert_eq!(lp.run(&infeasible).objective_value, -INF);
    assert_eq!(milp.run(&infeasible).objective_value, -INF);

    let unbounded = problem(&[1.0], vec![vec![-1.0]], &[0.0]).unwrap();
    assert_eq!(lp.run(&unbounded).objective_value, INF);
    assert_eq!(milp.run(&unbounded).objective_value, INF);
}

#[test]
fn test_integer_solution_of_fixed_examples() {
    init_tracing();

    let lp = TwoPhaseSimplexSolver::new();
    let solvers: Vec<Box<dyn Solver + '_>> = vec![
        Box::new(BranchAndBoundSolver::new(&lp, 0.0001, true)),
        Box::new(BranchAndBoundSolver::new(&lp, 0.0001, false)),
    ];

    let unit = problem(&[1.0, 1.0], vec![vec![1.0, 1.0]], &[1.0]).unwrap();
    let homework = problem(&[2.0, 3.0], vec![vec![3.0, 2.0], vec![4.0, 5.0]], &[13.0, 11.0]).unwrap();

    for solver in &solvers {
        let solution = solver.run(&unit);
        assert_eq!(solution.objective_value, 1.0);
        assert!(solution.values.iter().all(|v| v.fract() == 0.0));

        let solution = solver.run(&homework);
        assert!((solution.objective_value - 6.0).abs() < 1e-9);
        assert!(homework.is_feasible(&solution.values, 1e-9));
    }
}

#[test]
fn test_branch_and_bound_over_dyn_solver() {
    let lp: Box<dyn Solver> = Box::new(TwoPhaseSimplexSolver::new());
    let milp = BranchAndBoundSolver::new(lp.as_ref(), 0.0001, true);

    // Maximize 5x + 4y s.t. 6x + 4y <= 24, x + 2y <= 6
    // Relaxation: x=3, y=1.5 (z=21); integer optimum z=20 at x=4, y=0
    let p = problem(&[5.0, 4.0], vec![vec![6.0, 4.0], vec![1.0, 2.0]], &[24.0, 6.0]).unwrap();
    let solution = milp.run(&p);

    assert!((solution.objective_value - 20.0).abs() < 1e-9);
    assert!((solution.values[0] - 4.0).abs() < 1e-9);
    assert!(solution.values[1].abs() < 1e-9);
}
