//! The solver capability shared by the relaxation and integer solvers.

use crate::problem::Problem;
use crate::solution::Solution;

/// Objective value reported for unbounded problems. `-INF` marks infeasibility.
pub const INF: f64 = f64::INFINITY;

/// Anything that turns a [`Problem`] into a [`Solution`].
///
/// Infeasible and unbounded problems are ordinary outcomes, reported through
/// the `-INF`/`INF` sentinels rather than as errors.
pub trait Solver {
    fn run(&self, problem: &Problem) -> Solution;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn run(&self, problem: &Problem) -> Solution {
        (**self).run(problem)
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn run(&self, problem: &Problem) -> Solution {
        (**self).run(problem)
    }
}
