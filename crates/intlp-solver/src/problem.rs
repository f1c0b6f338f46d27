use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// A validated integer program:
///
/// ```text
/// maximize    objective . x
/// subject to  constraints . x <= rhs
///             x >= 0
///             x[j] integral for every integer variable j
/// ```
///
/// A `Problem` never changes after construction. Adding a constraint yields a
/// new problem and leaves the original untouched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ProblemDef", into = "ProblemDef"))]
pub struct Problem {
    objective: Matrix,
    constraints: Matrix,
    rhs: Matrix,
    /// One flag per variable
    integer: Vec<bool>,
}

/// Plain-data form of a [`Problem`], used for (de)serialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemDef {
    pub objective: Vec<f64>,
    pub constraints: Vec<Vec<f64>>,
    pub rhs: Vec<f64>,
    /// Indices of integer variables; all variables when absent
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub integer_variables: Option<Vec<usize>>,
}

impl Problem {
    /// Build a problem where every variable is integer-restricted.
    ///
    /// `objective` must be `1 x n`, `constraints` `m x n` and `rhs` either
    /// `1 x m` or `m x 1`.
    pub fn new(objective: Matrix, constraints: Matrix, rhs: Matrix) -> Result<Self> {
        if objective.rows() != 1 {
            return Err(Error::InvalidArgument(format!(
                "The objective must be a row vector, got ({}, {})",
                objective.rows(),
                objective.cols()
            )));
        }
        if constraints.cols() != objective.cols() {
            return Err(Error::InvalidArgument(format!(
                "The constraints have {} columns but the objective has {} variables",
                constraints.cols(),
                objective.cols()
            )));
        }
        if !rhs.is_vector() {
            return Err(Error::InvalidArgument(format!(
                "The right-hand side must be a vector, got ({}, {})",
                rhs.rows(),
                rhs.cols()
            )));
        }
        let rhs = if rhs.rows() == 1 { rhs } else { rhs.transpose() };
        if rhs.cols() != constraints.rows() {
            return Err(Error::InvalidArgument(format!(
                "The right-hand side has {} entries but there are {} constraints",
                rhs.cols(),
                constraints.rows()
            )));
        }

        let n = objective.cols();
        Ok(Self {
            objective,
            constraints,
            rhs,
            integer: vec![true; n],
        })
    }

    /// Restrict integrality to the given variables; the others become continuous
    pub fn with_integer_variables(&self, indices: &[usize]) -> Result<Self> {
        let n = self.num_variables();
        let mut integer = vec![false; n];
        for &j in indices {
            if j >= n {
                return Err(Error::OutOfRange(format!(
                    "Variable {} must be between 0 and {}",
                    j,
                    n - 1
                )));
            }
            integer[j] = true;
        }
        Ok(Self {
            integer,
            ..self.clone()
        })
    }

    /// Return a copy with the constraint `coefficients . x <= rhs` added.
    ///
    /// When an identical row already exists no row is appended; the existing
    /// right-hand side is tightened to the smaller of the two values.
    pub fn with_constraint(&self, coefficients: &[f64], rhs: f64) -> Result<Self> {
        if coefficients.len() != self.num_variables() {
            return Err(Error::InvalidArgument(format!(
                "A constraint needs one coefficient per variable: {} is different than {}",
                coefficients.len(),
                self.num_variables()
            )));
        }
        Ok(self.push_constraint(coefficients, rhs))
    }

    /// `x[variable] <= value`
    pub fn with_upper_bound(&self, variable: usize, value: f64) -> Result<Self> {
        let row = self.unit_row(variable, 1.0)?;
        self.with_constraint(&row, value)
    }

    /// `x[variable] >= value`, stored as `-x[variable] <= -value`
    pub fn with_lower_bound(&self, variable: usize, value: f64) -> Result<Self> {
        let row = self.unit_row(variable, -1.0)?;
        self.with_constraint(&row, -value)
    }

    pub fn objective(&self) -> &Matrix {
        &self.objective
    }

    pub fn constraints(&self) -> &Matrix {
        &self.constraints
    }

    /// Right-hand side as a `1 x m` row vector
    pub fn rhs(&self) -> &Matrix {
        &self.rhs
    }

    pub fn num_variables(&self) -> usize {
        self.objective.cols()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.rows()
    }

    pub fn is_integer(&self, variable: usize) -> bool {
        self.integer.get(variable).copied().unwrap_or(false)
    }

    pub fn integer_variables(&self) -> Vec<usize> {
        self.integer
            .iter()
            .enumerate()
            .filter_map(|(j, &int)| int.then_some(j))
            .collect()
    }

    /// Objective value at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .as_slice()
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Whether `values` is non-negative and satisfies every constraint,
    /// both up to an absolute `tolerance`
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.num_variables() || values.iter().any(|&x| x < -tolerance) {
            return false;
        }
        let rhs = self.rhs.as_slice();
        (0..self.num_constraints()).all(|i| {
            let lhs: f64 = self
                .constraints
                .row_slice(i)
                .iter()
                .zip(values)
                .map(|(a, x)| a * x)
                .sum();
            lhs <= rhs[i] + tolerance
        })
    }

    /// `with_constraint` for coefficients of the right length.
    pub(crate) fn push_constraint(&self, coefficients: &[f64], rhs: f64) -> Self {
        let mut rhs_values = self.rhs.as_slice().to_vec();
        let constraints = match self.constraints.position_of_row(coefficients) {
            Some(i) => {
                rhs_values[i] = rhs_values[i].min(rhs);
                self.constraints.clone()
            }
            None => {
                rhs_values.push(rhs);
                self.constraints.append_row(coefficients)
            }
        };

        Self {
            objective: self.objective.clone(),
            constraints,
            rhs: Matrix::from_raw(1, rhs_values.len(), rhs_values),
            integer: self.integer.clone(),
        }
    }

    /// Unit row selecting `variable`, scaled by `coefficient`
    fn unit_row(&self, variable: usize, coefficient: f64) -> Result<Vec<f64>> {
        let n = self.num_variables();
        if variable >= n {
            return Err(Error::OutOfRange(format!(
                "Variable {} must be between 0 and {}",
                variable,
                n - 1
            )));
        }
        let mut row = vec![0.0; n];
        row[variable] = coefficient;
        Ok(row)
    }
}

impl TryFrom<ProblemDef> for Problem {
    type Error = Error;

    fn try_from(def: ProblemDef) -> Result<Self> {
        let problem = Problem::new(
            Matrix::from_vec(&def.objective)?,
            Matrix::from_rows(def.constraints)?,
            Matrix::from_vec(&def.rhs)?,
        )?;
        match def.integer_variables {
            Some(indices) => problem.with_integer_variables(&indices),
            None => Ok(problem),
        }
    }
}

impl From<Problem> for ProblemDef {
    fn from(problem: Problem) -> Self {
        let all_integer = problem.integer.iter().all(|&int| int);
        ProblemDef {
            objective: problem.objective.as_slice().to_vec(),
            constraints: problem.constraints.to_rows(),
            rhs: problem.rhs.as_slice().to_vec(),
            integer_variables: (!all_integer).then(|| problem.integer_variables()),
        }
    }
}
