use tracing::{debug, trace};

use crate::problem::Problem;
use crate::solution::Solution;
use crate::solver::{INF, Solver};

/// Two-phase simplex solver for the continuous relaxation of a [`Problem`]
pub struct TwoPhaseSimplexSolver {
    /// Dantzig pivots per phase before falling back to Bland's rule
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for TwoPhaseSimplexSolver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl TwoPhaseSimplexSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn phase1(&self, tableau: &mut Tableau) -> bool {
        // Auxiliary objective: maximize -sum(artificials), i.e. w + sum(a) = 0
        let obj_row = tableau.objective_row();
        let n_cols = tableau.width();
        let art_start = tableau.artificial_start();

        tableau.data[obj_row] = vec![0.0; n_cols];
        for j in art_start..n_cols - 1 {
            tableau.data[obj_row][j] = 1.0;
        }

        // Price out the artificials that start in the basis
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= tableau.data[i][j];
                }
            }
        }

        if let SimplexResult::Unbounded = self.optimize(tableau) {
            // -sum(a) is bounded above by zero, so this only happens numerically
            return false;
        }

        let infeasibility = -tableau.data[obj_row][n_cols - 1];
        if infeasibility > self.tolerance {
            debug!(infeasibility, "phase 1 could not eliminate the artificial variables");
            return false;
        }

        self.drive_out_artificials(tableau);
        tableau.drop_artificials();
        true
    }

    /// Pivot artificial variables still basic at zero level out of the basis.
    /// Rows where no real column can replace them are linearly dependent and
    /// get removed.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.artificial_start();
        let mut redundant = Vec::new();

        for i in 0..tableau.objective_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            match (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                Some(col) => self.pivot(tableau, i, col),
                None => redundant.push(i),
            }
        }

        for &i in redundant.iter().rev() {
            trace!(row = i as u64, "dropping redundant constraint row");
            tableau.data.remove(i);
            tableau.basic_vars.remove(i);
        }
    }

    fn phase2(&self, tableau: &mut Tableau, problem: &Problem) -> SimplexResult {
        // Restore the real objective as z - c.x = 0 and price out the basis
        let obj_row = tableau.objective_row();
        let n_cols = tableau.width();

        tableau.data[obj_row] = vec![0.0; n_cols];
        for (j, &c) in problem.objective().as_slice().iter().enumerate() {
            tableau.data[obj_row][j] = -c;
        }

        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        self.optimize(tableau)
    }

    fn optimize(&self, tableau: &mut Tableau) -> SimplexResult {
        let mut iterations = 0;
        loop {
            let bland = iterations >= self.max_iterations;
            if iterations == self.max_iterations {
                debug!(iterations = iterations as u64, "switching to Bland's rule");
            }

            let Some(pivot_col) = self.find_pivot_column(tableau, bland) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col, bland) else {
                trace!(column = pivot_col as u64, "no leaving row, objective is unbounded");
                return SimplexResult::Unbounded;
            };

            trace!(row = pivot_row as u64, column = pivot_col as u64, "pivot");
            self.pivot(tableau, pivot_row, pivot_col);
            iterations += 1;
        }
    }

    /// Most negative reduced cost, lowest index on ties. With `bland` set, the
    /// lowest index with a negative reduced cost.
    fn find_pivot_column(&self, tableau: &Tableau, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.objective_row()];
        let candidates = &obj[..obj.len() - 1];

        if bland {
            return candidates.iter().position(|&v| v < -self.tolerance);
        }

        let mut min_val = -self.tolerance;
        let mut min_col = None;
        for (j, &v) in candidates.iter().enumerate() {
            if v < min_val {
                min_val = v;
                min_col = Some(j);
            }
        }
        min_col
    }

    /// Minimum ratio test. Ties go to the lowest row, or with `bland` set to
    /// the row whose basic variable has the lowest index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize, bland: bool) -> Option<usize> {
        let rhs_col = tableau.width() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.objective_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            let better = match min_row {
                None => true,
                Some(_) if ratio < min_ratio - self.tolerance => true,
                Some(best) => {
                    bland
                        && (ratio - min_ratio).abs() <= self.tolerance
                        && tableau.basic_vars[i] < tableau.basic_vars[best]
                }
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.width();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, n_vars: usize) -> Solution {
        let objective_value = tableau.data[tableau.objective_row()][tableau.width() - 1];
        Solution::new(objective_value, self.basic_values(tableau, n_vars))
    }

    /// Decision variable values of the current basis, non-basic ones at zero
    fn basic_values(&self, tableau: &Tableau, n_vars: usize) -> Vec<f64> {
        let rhs_col = tableau.width() - 1;
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = self.snap(tableau.data[i][rhs_col]);
            }
        }
        values
    }

    fn snap(&self, value: f64) -> f64 {
        if value.abs() <= self.tolerance { 0.0 } else { value }
    }
}

impl Solver for TwoPhaseSimplexSolver {
    fn run(&self, problem: &Problem) -> Solution {
        let n_vars = problem.num_variables();
        let mut tableau = Tableau::build(problem);

        debug!(
            variables = n_vars as u64,
            constraints = problem.num_constraints() as u64,
            artificials = tableau.n_artificial as u64,
            "solving relaxation"
        );

        if tableau.n_artificial > 0 && !self.phase1(&mut tableau) {
            return Solution::infeasible(n_vars);
        }

        match self.phase2(&mut tableau, problem) {
            SimplexResult::Optimal => self.extract_solution(&tableau, n_vars),
            // Keep the vertex the unbounded ray starts from so branch and
            // bound can still branch on its fractional variables
            SimplexResult::Unbounded => Solution::new(INF, self.basic_values(&tableau, n_vars)),
        }
    }
}

/// Dense tableau: one row per constraint plus the objective row (last), one
/// column per decision, slack and artificial variable plus the rhs (last).
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn build(problem: &Problem) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();
        let rhs = problem.rhs().as_slice();

        // Rows with a negative rhs are negated, turning the slack into a
        // surplus that cannot start in the basis
        let n_artificial = rhs.iter().filter(|&&b| b < 0.0).count();
        let total_cols = n_vars + n_constraints + n_artificial + 1;

        let mut data = vec![vec![0.0; total_cols]; n_constraints + 1];
        let mut basic_vars = vec![0; n_constraints];
        let mut artificial_idx = n_vars + n_constraints;

        for (i, row) in data.iter_mut().take(n_constraints).enumerate() {
            let flip = rhs[i] < 0.0;
            let sign = if flip { -1.0 } else { 1.0 };

            for (j, &coef) in problem.constraints().row_slice(i).iter().enumerate() {
                row[j] = sign * coef;
            }
            row[n_vars + i] = sign;
            row[total_cols - 1] = sign * rhs[i];

            if flip {
                row[artificial_idx] = 1.0;
                basic_vars[i] = artificial_idx;
                artificial_idx += 1;
            } else {
                basic_vars[i] = n_vars + i;
            }
        }

        Tableau {
            data,
            basic_vars,
            n_vars,
            n_slack: n_constraints,
            n_artificial,
        }
    }

    fn objective_row(&self) -> usize {
        self.data.len() - 1
    }

    fn width(&self) -> usize {
        self.data[0].len()
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn drop_artificials(&mut self) {
        let art_start = self.artificial_start();
        for row in &mut self.data {
            let rhs = row[row.len() - 1];
            row.truncate(art_start);
            row.push(rhs);
        }
        self.n_artificial = 0;
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
}
