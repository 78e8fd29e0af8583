pub mod bounds;
pub mod conditioning;
pub mod config;
pub mod error;
pub mod features;
pub mod graph;
pub mod instance;
pub mod relaxation;
pub mod rounding;
pub mod spectral;
pub mod stats;
pub mod violations;

pub use bounds::{flatness, polyhedral_bounds, polyhedral_bounds_fast, PolyhedralBound};
pub use conditioning::{svd_range, SingularValueRange};
pub use config::{BoundsMethod, FeatureConfig};
pub use error::{FeatureError, InstanceError};
pub use features::{FeatureCalculator, FeatureGap, FeatureGroup, FeatureValue, FeatureVector};
pub use graph::{incidence_graph, GraphFeatures, UndirectedGraph};
pub use instance::{Instance, InstanceBuilder, MipInstance, Row, Variable};
pub use relaxation::{solve_relaxation, RelaxationResult, RelaxationStatus};
pub use rounding::sample_roundings;
pub use stats::Summary;
pub use violations::{integer_violations, IntegerViolations};
