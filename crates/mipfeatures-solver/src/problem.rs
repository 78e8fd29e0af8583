use crate::SolveError;

/// Represents a linear programming problem
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
    /// Bounds for each variable, `[0, +inf)` unless set
    pub bounds: Vec<VariableBounds>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Box bounds on a single variable. Either side may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for VariableBounds {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }
}

impl VariableBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
            bounds: vec![VariableBounds::default(); n],
        }
    }

    /// Problem with `n` variables named `x0..x{n-1}`.
    pub fn with_variables(n: usize) -> Self {
        Self::new((0..n).map(|j| format!("x{j}")).collect())
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    /// Add `lower <= a.x <= upper`, emitting one or two rows depending on
    /// which sides are finite. A row with both sides infinite is dropped.
    pub fn add_range_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, lower: f64, upper: f64) {
        let name = name.into();
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) if lower == upper => {
                self.add_constraint(name, coefficients, ConstraintOp::Eq, upper);
            }
            (true, true) => {
                self.add_constraint(format!("{name}_lo"), coefficients.clone(), ConstraintOp::Ge, lower);
                self.add_constraint(format!("{name}_up"), coefficients, ConstraintOp::Le, upper);
            }
            (true, false) => self.add_constraint(name, coefficients, ConstraintOp::Ge, lower),
            (false, true) => self.add_constraint(name, coefficients, ConstraintOp::Le, upper),
            (false, false) => {}
        }
    }

    pub fn set_bounds(&mut self, index: usize, lower: f64, upper: f64) {
        self.bounds[index] = VariableBounds::new(lower, upper);
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check dimensions and reject NaN / infinite data before a tableau is built.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(SolveError::ObjectiveLength {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.bounds.len() != n {
            return Err(SolveError::BoundsLength {
                expected: n,
                found: self.bounds.len(),
            });
        }
        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolveError::NonFiniteObjective(self.variables[j].clone()));
        }
        for (j, b) in self.bounds.iter().enumerate() {
            if b.lower.is_nan() || b.upper.is_nan() || b.lower == f64::INFINITY || b.upper == f64::NEG_INFINITY {
                return Err(SolveError::InvalidBounds {
                    variable: self.variables[j].clone(),
                    lower: b.lower,
                    upper: b.upper,
                });
            }
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolveError::ConstraintLength {
                    constraint: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(SolveError::NonFiniteConstraint(c.name.clone()));
            }
        }
        Ok(())
    }
}
