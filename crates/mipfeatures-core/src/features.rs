use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bounds::{flatness, polyhedral_bounds, polyhedral_bounds_fast};
use crate::conditioning::svd_range;
use crate::config::{BoundsMethod, FeatureConfig};
use crate::graph::GraphFeatures;
use crate::relaxation::{solve_relaxation, RelaxationStatus};
use crate::rounding::sample_roundings;
use crate::stats::Summary;
use crate::violations::integer_violations;
use crate::{FeatureError, Instance};

/// A single feature. Anything that is not a finite number is `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(untagged))]
pub enum FeatureValue {
    Value(f64),
    Undefined,
}

impl FeatureValue {
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            FeatureValue::Value(value)
        } else {
            FeatureValue::Undefined
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Value(v) => Some(*v),
            FeatureValue::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, FeatureValue::Value(_))
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::new(value)
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FeatureValue::Undefined, FeatureValue::new)
    }
}

impl From<usize> for FeatureValue {
    fn from(value: usize) -> Self {
        FeatureValue::Value(value as f64)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Value(if value { 1.0 } else { 0.0 })
    }
}

/// Independently computed block of features. A failing group leaves every
/// one of its features undefined and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureGroup {
    Size,
    Relaxation,
    Statistics,
    Conditioning,
    Graph,
    Bounds,
}

impl FeatureGroup {
    /// Output order
    pub const ALL: [FeatureGroup; 6] = [
        FeatureGroup::Size,
        FeatureGroup::Relaxation,
        FeatureGroup::Statistics,
        FeatureGroup::Conditioning,
        FeatureGroup::Graph,
        FeatureGroup::Bounds,
    ];

    pub fn names(&self) -> &'static [&'static str] {
        match self {
            FeatureGroup::Size => &[
                "variables",
                "continuous_variables",
                "integer_variables",
                "binary_variables",
                "constraints",
                "nonzeros",
            ],
            FeatureGroup::Relaxation => &[
                "lp_has_solution",
                "relaxation_integer_violations",
                "relaxation_total_fractionality",
                "feasible_round_ups",
                "feasible_round_downs",
                "prob_feasible_rounding",
            ],
            FeatureGroup::Statistics => &[
                "objective_min",
                "objective_max",
                "objective_mean",
                "objective_stdev",
                "rhs_min",
                "rhs_max",
                "rhs_mean",
                "rhs_stdev",
                "lhs_coefficient_min",
                "lhs_coefficient_max",
                "lhs_coefficient_mean",
                "lhs_coefficient_stdev",
                "variable_degree_min",
                "variable_degree_max",
                "variable_degree_mean",
                "variable_degree_stdev",
                "constraint_degree_min",
                "constraint_degree_max",
                "constraint_degree_mean",
                "constraint_degree_stdev",
            ],
            FeatureGroup::Conditioning => &["svd_smallest", "svd_largest", "svd_condition"],
            FeatureGroup::Graph => &[
                "vc_girth",
                "vc_clustering_coefficient",
                "vc_szeged_index",
                "vc_revised_szeged_index",
                "vc_beta",
                "vc_energy",
                "vc_adjacency_eigenvalue_stdev",
                "vc_algebraic_connectivity",
                "vc_eigenvector_centrality_mean",
                "vc_eigenvector_centrality_std",
                "vc_density",
            ],
            FeatureGroup::Bounds => &["lattice_flatness"],
        }
    }
}

/// A feature group that failed, with the reason
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureGap {
    pub group: FeatureGroup,
    pub message: String,
}

/// Named features in a fixed order, plus what went wrong on the way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureVector {
    features: Vec<(&'static str, FeatureValue)>,
    relaxation_status: Option<RelaxationStatus>,
    gaps: Vec<FeatureGap>,
}

impl FeatureVector {
    fn empty() -> Self {
        Self {
            features: Vec::new(),
            relaxation_status: None,
            gaps: Vec::new(),
        }
    }

    fn record(&mut self, group: FeatureGroup, values: Result<Vec<FeatureValue>, FeatureError>) {
        let names = group.names();
        match values {
            Ok(values) => {
                debug_assert_eq!(values.len(), names.len(), "{:?}", group);
                self.features.extend(names.iter().copied().zip(values));
            }
            Err(err) => {
                tracing::warn!(?group, error = %err, "feature group failed");
                self.features
                    .extend(names.iter().map(|&name| (name, FeatureValue::Undefined)));
                self.gaps.push(FeatureGap {
                    group,
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.features.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FeatureValue)> + '_ {
        self.features.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `None` when the relaxation group failed.
    pub fn relaxation_status(&self) -> Option<RelaxationStatus> {
        self.relaxation_status
    }

    pub fn gaps(&self) -> &[FeatureGap] {
        &self.gaps
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

type GroupResult = Result<Vec<FeatureValue>, FeatureError>;

/// Raw per-group outcomes, before they are laid out in output order
struct GroupResults {
    size: GroupResult,
    relaxation: Result<(RelaxationStatus, Vec<FeatureValue>), FeatureError>,
    statistics: GroupResult,
    conditioning: GroupResult,
    graph: GroupResult,
    bounds: GroupResult,
}

impl GroupResults {
    fn into_vector(self) -> FeatureVector {
        let mut vector = FeatureVector::empty();
        vector.record(FeatureGroup::Size, self.size);
        let relaxation = self.relaxation.map(|(status, values)| {
            vector.relaxation_status = Some(status);
            values
        });
        vector.record(FeatureGroup::Relaxation, relaxation);
        vector.record(FeatureGroup::Statistics, self.statistics);
        vector.record(FeatureGroup::Conditioning, self.conditioning);
        vector.record(FeatureGroup::Graph, self.graph);
        vector.record(FeatureGroup::Bounds, self.bounds);
        vector
    }
}

/// Computes every feature group for an instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureCalculator {
    config: FeatureConfig,
}

impl FeatureCalculator {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn compute(&self, instance: &dyn Instance) -> FeatureVector {
        tracing::debug!(
            variables = instance.num_variables(),
            constraints = instance.num_constraints(),
            nonzeros = instance.num_nonzeros(),
            "computing features"
        );

        #[cfg(feature = "parallel")]
        let results = self.parallel(instance);
        #[cfg(not(feature = "parallel"))]
        let results = self.sequential(instance);

        results.into_vector()
    }

    #[cfg(any(test, not(feature = "parallel")))]
    fn sequential(&self, instance: &dyn Instance) -> GroupResults {
        GroupResults {
            size: self.size(instance),
            relaxation: self.relaxation(instance),
            statistics: self.statistics(instance),
            conditioning: self.conditioning(instance),
            graph: self.graph(instance),
            bounds: self.bounds(instance),
        }
    }

    #[cfg(feature = "parallel")]
    fn parallel(&self, instance: &dyn Instance) -> GroupResults {
        let ((size, relaxation, statistics), (conditioning, graph, bounds)) = rayon::join(
            || {
                let (size, (relaxation, statistics)) = rayon::join(
                    || self.size(instance),
                    || rayon::join(|| self.relaxation(instance), || self.statistics(instance)),
                );
                (size, relaxation, statistics)
            },
            || {
                let (conditioning, (graph, bounds)) = rayon::join(
                    || self.conditioning(instance),
                    || rayon::join(|| self.graph(instance), || self.bounds(instance)),
                );
                (conditioning, graph, bounds)
            },
        );

        GroupResults {
            size,
            relaxation,
            statistics,
            conditioning,
            graph,
            bounds,
        }
    }

    fn size(&self, instance: &dyn Instance) -> GroupResult {
        let n = instance.num_variables();
        let (mut integer, mut binary) = (0usize, 0usize);
        for j in 0..n {
            let v = instance.variable(j);
            integer += v.is_integer as usize;
            binary += v.is_binary() as usize;
        }

        Ok(vec![
            n.into(),
            (n - integer).into(),
            integer.into(),
            binary.into(),
            instance.num_constraints().into(),
            instance.num_nonzeros().into(),
        ])
    }

    fn relaxation(&self, instance: &dyn Instance) -> Result<(RelaxationStatus, Vec<FeatureValue>), FeatureError> {
        let tolerance = self.config.rounding_tolerance;
        let relaxation = solve_relaxation(instance, &self.config.solver())?;
        let violations = integer_violations(instance, &relaxation, tolerance);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let probability = sample_roundings(
            instance,
            &relaxation,
            self.config.rounding_samples,
            tolerance,
            &mut rng,
        );

        Ok((
            relaxation.status(),
            vec![
                relaxation.is_optimal().into(),
                violations.violations.into(),
                violations.total_fractionality.into(),
                violations.up_locks.into(),
                violations.down_locks.into(),
                probability.into(),
            ],
        ))
    }

    fn statistics(&self, instance: &dyn Instance) -> GroupResult {
        let m = instance.num_constraints();
        let mut coefficients = Vec::with_capacity(instance.num_nonzeros());
        let mut row_degree = Vec::with_capacity(m);
        let mut column_degree = vec![0usize; instance.num_variables()];
        for i in 0..m {
            let row = instance.constraint(i);
            coefficients.extend_from_slice(row.coefficients);
            row_degree.push(row.len());
            for &j in row.columns {
                column_degree[j] += 1;
            }
        }

        let blocks = [
            Summary::of(&instance.objective()),
            Summary::of(&instance.rhs()),
            Summary::of(&coefficients),
            Summary::of_counts(&column_degree),
            Summary::of_counts(&row_degree),
        ];
        Ok(blocks.iter().flat_map(|s| summary_values(*s)).collect())
    }

    fn conditioning(&self, instance: &dyn Instance) -> GroupResult {
        let range = svd_range(instance, self.config.rounding_tolerance)?;
        Ok(vec![
            range.smallest_nonzero.into(),
            range.largest.into(),
            range.condition().into(),
        ])
    }

    fn graph(&self, instance: &dyn Instance) -> GroupResult {
        let g = GraphFeatures::for_instance(instance)?;
        Ok(vec![
            g.girth.into(),
            g.clustering_coefficient.into(),
            g.szeged_index.into(),
            g.revised_szeged_index.into(),
            g.beta.into(),
            g.energy.into(),
            g.adjacency_eigenvalue_stdev.into(),
            g.algebraic_connectivity.into(),
            g.eigenvector_centrality_mean.into(),
            g.eigenvector_centrality_std.into(),
            g.density.into(),
        ])
    }

    fn bounds(&self, instance: &dyn Instance) -> GroupResult {
        let solver = self.config.solver();
        let bounds = match self.config.bounds_method {
            BoundsMethod::Fast => polyhedral_bounds_fast(instance, &solver)?,
            BoundsMethod::Precise => polyhedral_bounds(instance, &solver)?,
        };
        let flat = flatness(&bounds);
        tracing::debug!(method = ?self.config.bounds_method, flatness = ?flat, "polyhedral bounds");
        Ok(vec![flat.into()])
    }
}

fn summary_values(summary: Option<Summary>) -> [FeatureValue; 4] {
    match summary {
        Some(s) => [s.min.into(), s.max.into(), s.mean.into(), s.stdev.into()],
        None => [FeatureValue::Undefined; 4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MipInstance, Variable};

    fn pair() -> MipInstance {
        // max x0 + x1 s.t. 2 x0 + 2 x1 <= 3 over binaries
        MipInstance::builder()
            .variable(Variable::binary().with_objective(-1.0))
            .variable(Variable::binary().with_objective(-1.0))
            .constraint(vec![0, 1], vec![2.0, 2.0], f64::NEG_INFINITY, 3.0)
            .build()
            .unwrap()
    }

    fn value(vector: &FeatureVector, name: &str) -> f64 {
        vector.get(name).and_then(|v| v.as_f64()).unwrap()
    }

    #[test]
    fn test_feature_value_conversions() {
        assert_eq!(FeatureValue::from(f64::NAN), FeatureValue::Undefined);
        assert_eq!(FeatureValue::from(f64::NEG_INFINITY), FeatureValue::Undefined);
        assert_eq!(FeatureValue::from(None), FeatureValue::Undefined);
        assert_eq!(FeatureValue::from(Some(2.5)), FeatureValue::Value(2.5));
        assert_eq!(FeatureValue::from(3usize), FeatureValue::Value(3.0));
        assert_eq!(FeatureValue::from(true), FeatureValue::Value(1.0));
    }

    #[test]
    fn test_names_follow_group_order() {
        let vector = FeatureCalculator::default().compute(&pair());
        let expected: Vec<&str> = FeatureGroup::ALL
            .iter()
            .flat_map(|g| g.names().iter().copied())
            .collect();

        assert_eq!(vector.names().collect::<Vec<_>>(), expected);
        assert_eq!(vector.len(), 47);
        assert!(vector.is_complete());
    }

    #[test]
    fn test_size_features() {
        let instance = MipInstance::builder()
            .variable(Variable::binary())
            .variable(Variable::integer(0.0, 5.0))
            .variable(Variable::continuous(0.0, 1.0))
            .constraint(vec![0, 1, 2], vec![1.0, 1.0, 1.0], f64::NEG_INFINITY, 4.0)
            .build()
            .unwrap();
        let vector = FeatureCalculator::default().compute(&instance);

        assert_eq!(value(&vector, "variables"), 3.0);
        assert_eq!(value(&vector, "continuous_variables"), 1.0);
        assert_eq!(value(&vector, "integer_variables"), 2.0);
        assert_eq!(value(&vector, "binary_variables"), 1.0);
        assert_eq!(value(&vector, "constraints"), 1.0);
        assert_eq!(value(&vector, "nonzeros"), 3.0);
    }

    #[test]
    fn test_relaxation_features() {
        let vector = FeatureCalculator::default().compute(&pair());

        assert_eq!(vector.relaxation_status(), Some(RelaxationStatus::Optimal));
        assert_eq!(value(&vector, "lp_has_solution"), 1.0);
        // The LP optimum puts 1.5 on x0 + x1: one variable is at 0.5
        assert_eq!(value(&vector, "relaxation_integer_violations"), 1.0);
        assert!((value(&vector, "relaxation_total_fractionality") - 0.5).abs() < 1e-9);
        assert_eq!(value(&vector, "feasible_round_downs"), 1.0);
        assert_eq!(value(&vector, "feasible_round_ups"), 0.0);
        // Rounding the fractional variable down keeps the row, up breaks it
        let p = value(&vector, "prob_feasible_rounding");
        assert!((p - 0.5).abs() < 0.1, "p = {}", p);
    }

    #[test]
    fn test_statistics_features() {
        let vector = FeatureCalculator::default().compute(&pair());

        assert_eq!(value(&vector, "objective_min"), -1.0);
        assert_eq!(value(&vector, "objective_stdev"), 0.0);
        assert_eq!(value(&vector, "rhs_mean"), 3.0);
        assert_eq!(vector.get("rhs_stdev"), Some(FeatureValue::Undefined));
        assert_eq!(value(&vector, "lhs_coefficient_max"), 2.0);
        assert_eq!(value(&vector, "variable_degree_mean"), 1.0);
        assert_eq!(value(&vector, "constraint_degree_max"), 2.0);
    }

    #[test]
    fn test_zero_samples_leave_probability_undefined() {
        let config = FeatureConfig::default().with_rounding_samples(0);
        let vector = FeatureCalculator::new(config).compute(&pair());
        assert_eq!(vector.get("prob_feasible_rounding"), Some(FeatureValue::Undefined));
        assert!(vector.is_complete());
    }

    #[test]
    fn test_same_seed_same_vector() {
        let config = FeatureConfig::default().with_seed(99);
        let a = FeatureCalculator::new(config).compute(&pair());
        let b = FeatureCalculator::new(config).compute(&pair());
        assert_eq!(a, b);
    }

    #[test]
    fn test_bounds_methods_agree() {
        let fast = FeatureCalculator::new(FeatureConfig::default().with_bounds_method(BoundsMethod::Fast)).compute(&pair());
        let precise =
            FeatureCalculator::new(FeatureConfig::default().with_bounds_method(BoundsMethod::Precise)).compute(&pair());

        let (a, b) = (value(&fast, "lattice_flatness"), value(&precise, "lattice_flatness"));
        assert!((a - b).abs() < 1e-6);
        assert!((a - 1.0).abs() < 1e-9);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_run_matches_sequential_groups() {
        let calculator = FeatureCalculator::default();
        let instance = pair();

        let expected = calculator.sequential(&instance).into_vector();
        let vector = calculator.compute(&instance);

        assert_eq!(vector, expected);
        assert!(vector.is_complete());
        assert_eq!(vector.relaxation_status(), Some(RelaxationStatus::Optimal));
        assert_eq!(value(&vector, "variables"), 2.0);
        assert_eq!(value(&vector, "binary_variables"), 2.0);
        assert_eq!(value(&vector, "relaxation_integer_violations"), 1.0);
        assert_eq!(value(&vector, "feasible_round_downs"), 1.0);
        assert_eq!(value(&vector, "feasible_round_ups"), 0.0);
        assert_eq!(value(&vector, "vc_girth"), 0.0);
        assert!((value(&vector, "lattice_flatness") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_instance() {
        let instance = MipInstance::builder().build().unwrap();
        let vector = FeatureCalculator::default().compute(&instance);

        assert_eq!(value(&vector, "variables"), 0.0);
        assert_eq!(vector.get("objective_mean"), Some(FeatureValue::Undefined));
        assert_eq!(vector.get("svd_largest"), Some(FeatureValue::Undefined));
        assert_eq!(vector.get("lattice_flatness"), Some(FeatureValue::Undefined));
        assert_eq!(vector.get("vc_density"), Some(FeatureValue::Undefined));
        assert_eq!(vector.get("unknown_feature"), None);
        assert!(vector.iter().all(|(_, v)| v.as_f64().is_none_or(f64::is_finite)));
    }
}
