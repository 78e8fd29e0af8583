use mipfeatures_solver::Solver;

/// Which polyhedral bounds algorithm feeds the flatness feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundsMethod {
    /// One reusable model, warm-started between bound solves
    #[default]
    Fast,
    /// A fresh model for every bound solve
    Precise,
}

/// Knobs shared by every feature group.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureConfig {
    /// Distance from an integer below which a relaxed value counts as
    /// integral; also the slack allowed in row feasibility checks and the
    /// cutoff for nonzero singular values.
    pub rounding_tolerance: f64,
    /// Monte-Carlo trials for the rounding sampler
    pub rounding_samples: usize,
    /// Seed for the rounding sampler's RNG
    pub seed: u64,
    pub bounds_method: BoundsMethod,
    /// Simplex pivot limit per solve
    pub max_iterations: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rounding_tolerance: 1e-5,
            rounding_samples: 1000,
            seed: 2113585,
            bounds_method: BoundsMethod::Fast,
            max_iterations: 10000,
        }
    }
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounding_tolerance(mut self, tol: f64) -> Self {
        self.rounding_tolerance = tol;
        self
    }

    pub fn with_rounding_samples(mut self, samples: usize) -> Self {
        self.rounding_samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_bounds_method(mut self, method: BoundsMethod) -> Self {
        self.bounds_method = method;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn solver(&self) -> Solver {
        Solver::new().with_max_iterations(self.max_iterations)
    }
}
