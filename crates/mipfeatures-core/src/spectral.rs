use nalgebra::{DMatrix, SymmetricEigen};

use crate::graph::UndirectedGraph;
use crate::stats::Summary;
use crate::FeatureError;

const EIGEN_EPSILON: f64 = f64::EPSILON;
const EIGEN_MAX_ITERATIONS: usize = 10_000;
const CENTRALITY_TOLERANCE: f64 = 1e-13;

pub fn adjacency_matrix(graph: &UndirectedGraph) -> DMatrix<f64> {
    let n = graph.vertex_count();
    let mut matrix = DMatrix::zeros(n, n);
    for (u, v) in graph.edges() {
        matrix[(u, v)] = 1.0;
        matrix[(v, u)] = 1.0;
    }
    matrix
}

/// Unnormalized Laplacian `D - A`
pub fn laplacian_matrix(graph: &UndirectedGraph) -> DMatrix<f64> {
    let mut matrix = -adjacency_matrix(graph);
    for v in 0..graph.vertex_count() {
        matrix[(v, v)] = graph.degree(v) as f64;
    }
    matrix
}

fn eigen(matrix: DMatrix<f64>, name: &'static str) -> Result<SymmetricEigen<f64, nalgebra::Dyn>, FeatureError> {
    let order = matrix.nrows();
    SymmetricEigen::try_new(matrix, EIGEN_EPSILON, EIGEN_MAX_ITERATIONS)
        .ok_or(FeatureError::EigenNoConvergence { matrix: name, order })
}

fn sorted_eigenvalues(matrix: DMatrix<f64>, name: &'static str) -> Result<Vec<f64>, FeatureError> {
    if matrix.is_empty() {
        return Ok(Vec::new());
    }
    let mut values: Vec<f64> = eigen(matrix, name)?.eigenvalues.iter().copied().collect();
    values.sort_by(f64::total_cmp);
    Ok(values)
}

/// Adjacency eigenvalues in ascending order
pub fn adjacency_spectrum(graph: &UndirectedGraph) -> Result<Vec<f64>, FeatureError> {
    sorted_eigenvalues(adjacency_matrix(graph), "adjacency")
}

/// Summary of an adjacency spectrum
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjacencyStats {
    /// Mean of `|λ|`
    pub energy: Option<f64>,
    /// Sample standard deviation of `|λ|`
    pub stdev: Option<f64>,
    /// Estrada bipartivity `Σ cosh λ / Σ exp λ`; 1 for bipartite graphs
    pub beta: Option<f64>,
}

impl AdjacencyStats {
    pub fn from_eigenvalues(eigenvalues: &[f64]) -> Self {
        let absolute: Vec<f64> = eigenvalues.iter().map(|l| l.abs()).collect();
        let Some(summary) = Summary::of(&absolute) else {
            return Self::default();
        };

        // Both sums scaled by exp(-shift) so no term exceeds one
        let shift = summary.max;
        let (even, total) = eigenvalues.iter().fold((0.0, 0.0), |(even, total), &l| {
            let up = (l - shift).exp();
            let down = (-l - shift).exp();
            (even + (up + down) / 2.0, total + up)
        });

        Self {
            energy: Some(summary.mean),
            stdev: summary.stdev,
            beta: (total > 0.0).then(|| even / total),
        }
    }
}

/// Second-smallest Laplacian eigenvalue. `None` below two vertices, exactly
/// zero for a disconnected graph.
pub fn algebraic_connectivity(graph: &UndirectedGraph) -> Result<Option<f64>, FeatureError> {
    if graph.vertex_count() < 2 {
        return Ok(None);
    }
    if !graph.is_connected() {
        return Ok(Some(0.0));
    }
    let values = sorted_eigenvalues(laplacian_matrix(graph), "Laplacian")?;
    Ok(values.get(1).copied())
}

/// Unit-norm principal eigenvector of the adjacency matrix with
/// non-negative entries. Every vertex scores 1 when there are no edges.
///
/// Computed by power iteration on `A + I` from the all-ones vector, so
/// relabeled vertices and isomorphic components score alike even when the
/// leading eigenvalue repeats.
pub fn eigenvector_centrality(graph: &UndirectedGraph) -> Result<Vec<f64>, FeatureError> {
    let n = graph.vertex_count();
    if graph.edge_count() == 0 {
        return Ok(vec![1.0; n]);
    }

    let adjacency = graph.adjacency_lists();
    let mut x = vec![1.0 / (n as f64).sqrt(); n];
    let mut next = vec![0.0; n];
    for _ in 0..EIGEN_MAX_ITERATIONS {
        for (v, neighbors) in adjacency.iter().enumerate() {
            next[v] = x[v] + neighbors.iter().map(|&w| x[w]).sum::<f64>();
        }
        let norm = next.iter().map(|y| y * y).sum::<f64>().sqrt();

        let mut delta = 0.0f64;
        for (current, &y) in x.iter_mut().zip(&next) {
            let y = y / norm;
            delta = delta.max((y - *current).abs());
            *current = y;
        }
        if delta < CENTRALITY_TOLERANCE {
            return Ok(x);
        }
    }

    Err(FeatureError::EigenNoConvergence {
        matrix: "adjacency",
        order: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{mean, sample_stdev};

    fn complete(n: usize) -> UndirectedGraph {
        let edges = (0..n).flat_map(|a| (a + 1..n).map(move |b| (a, b)));
        UndirectedGraph::from_edges(n, edges).unwrap()
    }

    #[test]
    fn test_laplacian_rows_sum_to_zero() {
        let graph = UndirectedGraph::from_edges(4, [(0, 1), (1, 2), (1, 3)]).unwrap();
        let laplacian = laplacian_matrix(&graph);
        for i in 0..4 {
            assert_eq!(laplacian.row(i).sum(), 0.0);
        }
        assert_eq!(laplacian[(1, 1)], 3.0);
        assert_eq!(laplacian[(0, 1)], -1.0);
    }

    #[test]
    fn test_complete_graph_spectrum() {
        // K4: eigenvalues 3, -1, -1, -1
        let values = adjacency_spectrum(&complete(4)).unwrap();
        assert!((values[3] - 3.0).abs() < 1e-9);
        for &l in &values[..3] {
            assert!((l + 1.0).abs() < 1e-9);
        }

        let stats = AdjacencyStats::from_eigenvalues(&values);
        assert!((stats.energy.unwrap() - 1.5).abs() < 1e-9);
        assert!((stats.stdev.unwrap() - 1.0).abs() < 1e-9);
        let beta = stats.beta.unwrap();
        assert!(beta > 0.5 && beta < 1.0);
    }

    #[test]
    fn test_bipartite_beta_is_one() {
        let square = UndirectedGraph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let stats = AdjacencyStats::from_eigenvalues(&adjacency_spectrum(&square).unwrap());
        assert!((stats.beta.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_beta_survives_large_eigenvalues() {
        let stats = AdjacencyStats::from_eigenvalues(&[-900.0, 0.0, 900.0]);
        assert!((stats.beta.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(AdjacencyStats::from_eigenvalues(&[]), AdjacencyStats::default());
    }

    #[test]
    fn test_algebraic_connectivity() {
        for n in 2..6 {
            let value = algebraic_connectivity(&complete(n)).unwrap().unwrap();
            assert!((value - n as f64).abs() < 1e-9, "K{}: {}", n, value);
        }

        let split = UndirectedGraph::from_edges(4, [(0, 1), (2, 3)]).unwrap();
        assert_eq!(algebraic_connectivity(&split).unwrap(), Some(0.0));
        assert_eq!(algebraic_connectivity(&UndirectedGraph::new(1)).unwrap(), None);
    }

    #[test]
    fn test_eigenvector_centrality() {
        let star = UndirectedGraph::from_edges(4, [(0, 1), (0, 2), (0, 3)]).unwrap();
        let centrality = eigenvector_centrality(&star).unwrap();

        let norm: f64 = centrality.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(centrality.iter().all(|&c| c >= 0.0));
        // Hub carries 1/sqrt(2), each leaf 1/sqrt(6)
        assert!((centrality[0] - 0.5f64.sqrt()).abs() < 1e-9);
        assert!((centrality[1] - (1.0f64 / 6.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_centrality_ignores_vertex_labels() {
        // Two copies of P3 under two numberings
        let a = UndirectedGraph::from_edges(6, [(0, 1), (1, 2), (3, 4), (4, 5)]).unwrap();
        let b = UndirectedGraph::from_edges(6, [(0, 3), (3, 1), (2, 4), (4, 5)]).unwrap();

        let mut ca = eigenvector_centrality(&a).unwrap();
        let mut cb = eigenvector_centrality(&b).unwrap();

        assert!((mean(&ca).unwrap() - mean(&cb).unwrap()).abs() < 1e-12);
        assert!((sample_stdev(&ca).unwrap() - sample_stdev(&cb).unwrap()).abs() < 1e-12);

        ca.sort_by(f64::total_cmp);
        cb.sort_by(f64::total_cmp);
        for (x, y) in ca.iter().zip(&cb) {
            assert!((x - y).abs() < 1e-12, "{:?} vs {:?}", ca, cb);
        }
        // Each path centre carries 1/2, each end 1/(2 sqrt 2)
        assert!((ca[5] - 0.5).abs() < 1e-9);
        assert!((ca[0] - 0.125f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_bipartite_centrality_converges() {
        let square = UndirectedGraph::from_edges(4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let centrality = eigenvector_centrality(&square).unwrap();
        assert!(centrality.iter().all(|&c| (c - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_edgeless_centrality() {
        assert_eq!(eigenvector_centrality(&UndirectedGraph::new(3)).unwrap(), vec![1.0; 3]);
        assert!(eigenvector_centrality(&UndirectedGraph::new(0)).unwrap().is_empty());
    }
}
