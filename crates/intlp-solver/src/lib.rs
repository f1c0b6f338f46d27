mod branch_and_bound;
mod error;
mod matrix;
mod problem;
mod simplex;
mod solution;
mod solver;

pub use branch_and_bound::{BranchAndBoundSolver, SearchReport};
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use problem::{Problem, ProblemDef};
pub use simplex::TwoPhaseSimplexSolver;
pub use solution::{Solution, SolutionStatus};
pub use solver::{INF, Solver};
