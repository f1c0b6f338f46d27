use crate::matrix::Matrix;
use crate::solver::INF;

/// The result of solving a problem
///
/// Unbounded and infeasible outcomes are encoded in `objective_value` as
/// `INF` and `-INF`. An infeasible `values` is zero-filled; an unbounded one
/// holds the vertex the unbounded ray was found from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Optimal objective value, or a sentinel
    pub objective_value: f64,
    /// Value of each variable
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

impl Solution {
    pub fn new(objective_value: f64, values: Vec<f64>) -> Self {
        Self {
            objective_value,
            values,
        }
    }

    pub fn infeasible(num_variables: usize) -> Self {
        Self::new(-INF, vec![0.0; num_variables])
    }

    pub fn unbounded(num_variables: usize) -> Self {
        Self::new(INF, vec![0.0; num_variables])
    }

    pub fn status(&self) -> SolutionStatus {
        if self.objective_value == INF {
            SolutionStatus::Unbounded
        } else if self.objective_value == -INF {
            SolutionStatus::Infeasible
        } else {
            SolutionStatus::Optimal
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status() == SolutionStatus::Optimal
    }

    pub fn is_infeasible(&self) -> bool {
        self.status() == SolutionStatus::Infeasible
    }

    pub fn is_unbounded(&self) -> bool {
        self.status() == SolutionStatus::Unbounded
    }

    /// Solution vector as a `1 x n` matrix; `None` for a problem without variables
    pub fn to_matrix(&self) -> Option<Matrix> {
        Matrix::from_vec(&self.values).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let s = Solution::infeasible(3);
        assert_eq!(s.status(), SolutionStatus::Infeasible);
        assert_eq!(s.objective_value, -INF);
        assert_eq!(s.values, vec![0.0; 3]);

        let s = Solution::unbounded(2);
        assert!(s.is_unbounded());
        assert!(!s.is_optimal());
        assert_eq!(s.values.len(), 2);

        let s = Solution::new(6.5, vec![0.25, 2.0]);
        assert!(s.is_optimal());
        assert!(!s.is_infeasible());
    }

    #[test]
    fn test_to_matrix() {
        let m = Solution::new(1.0, vec![1.0, 0.0]).to_matrix().unwrap();
        assert_eq!((m.rows(), m.cols()), (1, 2));
        assert!(Solution::new(0.0, Vec::new()).to_matrix().is_none());
    }
}
