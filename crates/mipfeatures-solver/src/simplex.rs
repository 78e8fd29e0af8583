use crate::problem::{ConstraintOp, LpProblem, Objective};
use crate::solution::Solution;
use crate::SolveError;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule.
const BLAND_AFTER: usize = 50;

/// Simplex solver for linear programming problems
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for pivot selection
    tolerance: f64,
    /// Largest artificial value accepted as feasible after phase 1
    feasibility_tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
        }
    }
}

impl Solver {
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

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    /// Solve the LP problem from scratch using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        let mut model = self.model(problem)?;
        Ok(model.optimize())
    }

    /// Build a reusable model: the tableau is put into standard form and
    /// phase 1 runs once, so later objective changes only need phase 2.
    pub fn model(&self, problem: &LpProblem) -> Result<SimplexModel, SolveError> {
        problem.validate()?;

        let (columns, n_struct) = map_columns(problem);
        let mut tableau = self.build_tableau(problem, &columns, n_struct);

        let (feasibility, phase1_iterations) = if tableau.n_artificial > 0 {
            self.phase1(&mut tableau)
        } else {
            (Feasibility::Feasible, 0)
        };

        Ok(SimplexModel {
            solver: *self,
            tableau,
            columns,
            objective: problem.objective.clone(),
            feasibility,
            phase1_iterations,
        })
    }

    fn build_tableau(&self, problem: &LpProblem, columns: &[ColumnMap], n_struct: usize) -> Tableau {
        // Rows over the shifted, non-negative structural columns
        let mut rows: Vec<(Vec<f64>, ConstraintOp, f64)> = Vec::with_capacity(problem.num_constraints());
        for c in &problem.constraints {
            let mut coefficients = vec![0.0; n_struct];
            let mut rhs = c.rhs;
            for (map, &a) in columns.iter().zip(&c.coefficients) {
                if a != 0.0 {
                    rhs -= map.substitute(a, &mut coefficients);
                }
            }
            rows.push((coefficients, c.op, rhs));
        }
        for (j, b) in problem.bounds.iter().enumerate() {
            if let ColumnMap::Shifted { column, .. } = columns[j] {
                if b.upper.is_finite() {
                    let mut coefficients = vec![0.0; n_struct];
                    coefficients[column] = 1.0;
                    rows.push((coefficients, ConstraintOp::Le, b.upper - b.lower));
                }
            }
        }

        // Ensure non-negative RHS; a flipped inequality changes direction
        for (coefficients, op, rhs) in rows.iter_mut() {
            if *rhs < 0.0 {
                *rhs = -*rhs;
                coefficients.iter_mut().for_each(|a| *a = -*a);
                *op = match op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
            }
        }

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let n_constraints = rows.len();
        let total_cols = n_struct + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_struct,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_struct;
        let mut artificial_idx = n_struct + n_slack;

        for (i, (coefficients, op, rhs)) in rows.into_iter().enumerate() {
            tableau.data[i][..n_struct].copy_from_slice(&coefficients);
            tableau.data[i][total_cols - 1] = rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> (Feasibility, usize) {
        // Auxiliary objective: maximize -sum(artificials)
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        tableau.data[obj_row].fill(0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        // Price out the basic artificials
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        let mut iterations = 0;
        match self.run(tableau, n_cols - 1, &mut iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::IterationLimit => return (Feasibility::IterationLimit, iterations),
            // The auxiliary problem is bounded by zero
            SimplexResult::Unbounded => return (Feasibility::Infeasible, iterations),
        }

        let rhs_col = tableau.rhs_col();
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col] > self.feasibility_tolerance {
                return (Feasibility::Infeasible, iterations);
            }
        }

        self.drive_out_artificials(tableau);
        (Feasibility::Feasible, iterations)
    }

    /// Pivot zero-valued artificials out of the basis. A row with no usable
    /// pivot is redundant and keeps its artificial at zero for good.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        let rhs_col = tableau.rhs_col();
        for i in 0..tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for j in 0..art_start {
                let magnitude = tableau.data[i][j].abs();
                if magnitude > self.tolerance && best.is_none_or(|(_, m)| magnitude > m) {
                    best = Some((j, magnitude));
                }
            }
            if let Some((col, _)) = best {
                tableau.data[i][rhs_col] = 0.0;
                tableau.pivot(i, col);
            }
        }
    }

    /// Primal simplex iterations on whatever objective row the tableau holds.
    /// Only columns below `enter_limit` may enter the basis.
    fn run(&self, tableau: &mut Tableau, enter_limit: usize, iterations: &mut usize) -> SimplexResult {
        let rhs_col = tableau.rhs_col();
        let mut degenerate = 0;
        loop {
            let bland = degenerate >= BLAND_AFTER;
            let Some(pivot_col) = self.find_pivot_column(tableau, enter_limit, bland) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col, bland) else {
                return SimplexResult::Unbounded;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate += 1;
            } else {
                degenerate = 0;
            }
            tableau.pivot(pivot_row, pivot_col);
            *iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, enter_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.obj_row();
        let reduced = &tableau.data[obj_row][..enter_limit];

        if bland {
            // Lowest index with a positive reduced cost
            return reduced.iter().position(|&r| r > self.tolerance);
        }

        // Most positive reduced cost
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &r) in reduced.iter().enumerate() {
            if r > max_val {
                max_val = r;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize, bland: bool) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            let better = match min_row {
                None => true,
                Some(r) if bland => {
                    ratio < min_ratio - self.tolerance
                        || (ratio <= min_ratio + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[r])
                }
                Some(_) => ratio < min_ratio,
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }
}

/// A standard-form tableau kept alive between solves so the objective can be
/// swapped and re-optimized from the last optimal basis.
#[derive(Debug, Clone)]
pub struct SimplexModel {
    solver: Solver,
    tableau: Tableau,
    columns: Vec<ColumnMap>,
    objective: Objective,
    feasibility: Feasibility,
    phase1_iterations: usize,
}

impl SimplexModel {
    pub fn num_variables(&self) -> usize {
        self.columns.len()
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) -> Result<(), SolveError> {
        if coefficients.len() != self.num_variables() {
            return Err(SolveError::ObjectiveLength {
                expected: self.num_variables(),
                found: coefficients.len(),
            });
        }
        if let Some(j) = coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolveError::NonFiniteObjective(format!("x{j}")));
        }
        self.objective = Objective { coefficients, minimize };
        Ok(())
    }

    pub fn set_objective_coefficient(&mut self, index: usize, value: f64) -> Result<(), SolveError> {
        let len = self.num_variables();
        let Some(slot) = self.objective.coefficients.get_mut(index) else {
            return Err(SolveError::VariableIndex { index, len });
        };
        if !value.is_finite() {
            return Err(SolveError::NonFiniteObjective(format!("x{index}")));
        }
        *slot = value;
        Ok(())
    }

    pub fn set_minimize(&mut self, minimize: bool) {
        self.objective.minimize = minimize;
    }

    /// Optimize the current objective, starting from the basis left by the
    /// previous call.
    pub fn optimize(&mut self) -> Solution {
        match self.feasibility {
            Feasibility::Feasible => {}
            Feasibility::Infeasible => return Solution::infeasible(),
            Feasibility::IterationLimit => return Solution::iteration_limit(self.phase1_iterations),
        }

        self.price_objective();

        let enter_limit = self.tableau.art_start();
        let mut iterations = 0;
        match self.solver.run(&mut self.tableau, enter_limit, &mut iterations) {
            SimplexResult::Optimal => self.extract_solution(iterations),
            SimplexResult::Unbounded => Solution::unbounded(iterations),
            SimplexResult::IterationLimit => Solution::iteration_limit(iterations),
        }
    }

    /// Write the objective into the last row as reduced costs of the
    /// current basis. Simplex maximizes, so a minimization is negated.
    fn price_objective(&mut self) {
        let sign = if self.objective.minimize { -1.0 } else { 1.0 };
        let obj_row = self.tableau.obj_row();
        let n_cols = self.tableau.n_cols();

        self.tableau.data[obj_row].fill(0.0);
        for (map, &c) in self.columns.iter().zip(&self.objective.coefficients) {
            if c != 0.0 {
                map.substitute(sign * c, &mut self.tableau.data[obj_row]);
            }
        }

        for i in 0..obj_row {
            let basic = self.tableau.basic_vars[i];
            let ratio = self.tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    self.tableau.data[obj_row][j] -= ratio * self.tableau.data[i][j];
                }
            }
        }
    }

    fn extract_solution(&self, iterations: usize) -> Solution {
        let rhs_col = self.tableau.rhs_col();

        let mut structural = vec![0.0; self.tableau.n_struct];
        for (i, &basic) in self.tableau.basic_vars.iter().enumerate() {
            if basic < self.tableau.n_struct {
                structural[basic] = self.tableau.data[i][rhs_col];
            }
        }

        let values: Vec<f64> = self.columns.iter().map(|map| map.value(&structural)).collect();
        let objective_value = values
            .iter()
            .zip(&self.objective.coefficients)
            .map(|(v, c)| v * c)
            .sum();

        Solution::optimal(values, objective_value, iterations)
    }
}

/// How an original variable is expressed in non-negative tableau columns.
#[derive(Debug, Clone, Copy)]
enum ColumnMap {
    /// x = offset + x'
    Shifted { column: usize, offset: f64 },
    /// x = offset - x'
    Mirrored { column: usize, offset: f64 },
    /// x = x+ - x-
    Split { positive: usize, negative: usize },
}

impl ColumnMap {
    /// Add `a * x` to `row` in tableau columns; returns the constant term
    /// the substitution leaves behind.
    fn substitute(&self, a: f64, row: &mut [f64]) -> f64 {
        match *self {
            ColumnMap::Shifted { column, offset } => {
                row[column] += a;
                a * offset
            }
            ColumnMap::Mirrored { column, offset } => {
                row[column] -= a;
                a * offset
            }
            ColumnMap::Split { positive, negative } => {
                row[positive] += a;
                row[negative] -= a;
                0.0
            }
        }
    }

    fn value(&self, structural: &[f64]) -> f64 {
        match *self {
            ColumnMap::Shifted { column, offset } => offset + structural[column],
            ColumnMap::Mirrored { column, offset } => offset - structural[column],
            ColumnMap::Split { positive, negative } => structural[positive] - structural[negative],
        }
    }
}

fn map_columns(problem: &LpProblem) -> (Vec<ColumnMap>, usize) {
    let mut n_struct = 0;
    let columns = problem
        .bounds
        .iter()
        .map(|b| {
            let map = if b.lower.is_finite() {
                ColumnMap::Shifted {
                    column: n_struct,
                    offset: b.lower,
                }
            } else if b.upper.is_finite() {
                ColumnMap::Mirrored {
                    column: n_struct,
                    offset: b.upper,
                }
            } else {
                n_struct += 1;
                ColumnMap::Split {
                    positive: n_struct - 1,
                    negative: n_struct,
                }
            };
            n_struct += 1;
            map
        })
        .collect();
    (columns, n_struct)
}

#[derive(Debug, Clone)]
struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_struct: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn rhs_col(&self) -> usize {
        self.n_cols() - 1
    }

    fn art_start(&self) -> usize {
        self.n_struct + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        let n_cols = self.n_cols();

        // Update basic variable
        self.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = self.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        self.data[i][j] -= factor * self.data[row][j];
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feasibility {
    Feasible,
    Infeasible,
    IterationLimit,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}
