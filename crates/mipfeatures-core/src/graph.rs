use std::collections::VecDeque;

use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::spectral::{adjacency_spectrum, algebraic_connectivity, eigenvector_centrality, AdjacencyStats};
use crate::stats::{mean, sample_stdev};
use crate::{FeatureError, Instance};

/// Distance reported for vertices a search never reaches
pub const UNREACHABLE: usize = usize::MAX;

/// Simple undirected graph over vertices `0..n`. Self-loops and repeated
/// edges are ignored on insertion.
#[derive(Debug)]
pub struct UndirectedGraph {
    inner: UnGraph<(), ()>,
}

impl UndirectedGraph {
    pub fn new(vertices: usize) -> Self {
        let mut inner = UnGraph::with_capacity(vertices, 0);
        for _ in 0..vertices {
            inner.add_node(());
        }
        Self { inner }
    }

    pub fn from_edges<I>(vertices: usize, edges: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::new(vertices);
        for (a, b) in edges {
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    /// Returns whether a new edge was inserted.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<bool, FeatureError> {
        let vertices = self.vertex_count();
        for vertex in [a, b] {
            if vertex >= vertices {
                return Err(FeatureError::VertexOutOfRange { vertex, vertices });
            }
        }
        let (a, b) = (NodeIndex::new(a), NodeIndex::new(b));
        if a == b || self.inner.find_edge(a, b).is_some() {
            return Ok(false);
        }
        self.inner.add_edge(a, b, ());
        Ok(true)
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn neighbors(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.inner.neighbors(NodeIndex::new(vertex)).map(|n| n.index())
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.neighbors(vertex).count()
    }

    /// Sorted neighbor lists, one per vertex
    pub fn adjacency_lists(&self) -> Vec<Vec<usize>> {
        (0..self.vertex_count())
            .map(|v| {
                let mut list: Vec<usize> = self.neighbors(v).collect();
                list.sort_unstable();
                list
            })
            .collect()
    }

    /// Graphs with at most one vertex count as connected.
    pub fn is_connected(&self) -> bool {
        connected_components(&self.inner) <= 1
    }

    /// `2E / (V(V-1))`, `None` below two vertices.
    pub fn density(&self) -> Option<f64> {
        let v = self.vertex_count() as f64;
        (self.vertex_count() >= 2).then(|| 2.0 * self.edge_count() as f64 / (v * (v - 1.0)))
    }
}

/// Bipartite row/column incidence graph: row `i` is vertex `i`, column `j`
/// is vertex `num_constraints + j`, one edge per stored coefficient.
pub fn incidence_graph(instance: &dyn Instance) -> Result<UndirectedGraph, FeatureError> {
    let m = instance.num_constraints();
    let mut graph = UndirectedGraph::new(m + instance.num_variables());
    for i in 0..m {
        for &j in instance.constraint(i).columns {
            graph.add_edge(i, m + j)?;
        }
    }
    Ok(graph)
}

/// Hop counts from `source`; [`UNREACHABLE`] marks other components.
pub fn distances(graph: &UndirectedGraph, source: usize) -> Vec<usize> {
    let reached = dijkstra(&graph.inner, NodeIndex::new(source), None, |_| 1usize);
    let mut dist = vec![UNREACHABLE; graph.vertex_count()];
    for (node, d) in reached {
        dist[node.index()] = d;
    }
    dist
}

/// Length of the shortest cycle, or 0 for a forest.
pub fn girth(graph: &UndirectedGraph) -> usize {
    let adjacency = graph.adjacency_lists();
    let n = adjacency.len();
    let mut best = UNREACHABLE;

    let mut dist = vec![UNREACHABLE; n];
    let mut parent = vec![UNREACHABLE; n];
    let mut queue = VecDeque::new();
    for root in 0..n {
        dist.fill(UNREACHABLE);
        parent.fill(UNREACHABLE);
        queue.clear();
        dist[root] = 0;
        queue.push_back(root);

        while let Some(u) = queue.pop_front() {
            // Nothing shorter can close from deeper levels
            if 2 * dist[u] >= best {
                break;
            }
            for &w in &adjacency[u] {
                if dist[w] == UNREACHABLE {
                    dist[w] = dist[u] + 1;
                    parent[w] = u;
                    queue.push_back(w);
                } else if parent[u] != w {
                    best = best.min(dist[u] + dist[w] + 1);
                }
            }
        }
    }

    if best == UNREACHABLE { 0 } else { best }
}

/// Global transitivity: closed over connected triples, 0 without triples.
pub fn clustering_coefficient(graph: &UndirectedGraph) -> f64 {
    let adjacency = graph.adjacency_lists();
    let mut closed = 0usize;
    let mut triples = 0usize;

    for neighbors in &adjacency {
        let d = neighbors.len();
        triples += d * d.saturating_sub(1) / 2;
        for (k, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[k + 1..] {
                if adjacency[a].binary_search(&b).is_ok() {
                    closed += 1;
                }
            }
        }
    }

    if triples == 0 {
        0.0
    } else {
        closed as f64 / triples as f64
    }
}

/// Szeged and revised Szeged indices. Unreachable vertices are infinitely
/// far from both endpoints, so they count as equidistant.
pub fn szeged_indices(graph: &UndirectedGraph) -> (f64, f64) {
    let n = graph.vertex_count();
    let table: Vec<Vec<usize>> = (0..n).map(|s| distances(graph, s)).collect();

    let mut szeged = 0.0;
    let mut revised = 0.0;
    for (u, v) in graph.edges() {
        let (mut n_uv, mut n_vu, mut o) = (0.0, 0.0, 0.0);
        for i in (0..n).filter(|&i| i != u && i != v) {
            match table[u][i].cmp(&table[v][i]) {
                std::cmp::Ordering::Less => n_uv += 1.0,
                std::cmp::Ordering::Greater => n_vu += 1.0,
                std::cmp::Ordering::Equal => o += 1.0,
            }
        }
        szeged += n_uv * n_vu;
        revised += (n_uv + o / 2.0) * (n_vu + o / 2.0);
    }
    (szeged, revised)
}

/// Structural and spectral features of one graph
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphFeatures {
    pub girth: usize,
    pub clustering_coefficient: f64,
    pub szeged_index: f64,
    pub revised_szeged_index: f64,
    pub beta: Option<f64>,
    pub energy: Option<f64>,
    pub adjacency_eigenvalue_stdev: Option<f64>,
    pub algebraic_connectivity: Option<f64>,
    pub eigenvector_centrality_mean: Option<f64>,
    pub eigenvector_centrality_std: Option<f64>,
    pub density: Option<f64>,
}

impl GraphFeatures {
    pub fn compute(graph: &UndirectedGraph) -> Result<Self, FeatureError> {
        tracing::debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "computing graph features"
        );

        let (szeged_index, revised_szeged_index) = szeged_indices(graph);
        let spectrum = AdjacencyStats::from_eigenvalues(&adjacency_spectrum(graph)?);
        let centrality = eigenvector_centrality(graph)?;

        Ok(Self {
            girth: girth(graph),
            clustering_coefficient: clustering_coefficient(graph),
            szeged_index,
            revised_szeged_index,
            beta: spectrum.beta,
            energy: spectrum.energy,
            adjacency_eigenvalue_stdev: spectrum.stdev,
            algebraic_connectivity: algebraic_connectivity(graph)?,
            eigenvector_centrality_mean: mean(&centrality),
            eigenvector_centrality_std: sample_stdev(&centrality),
            density: graph.density(),
        })
    }

    pub fn for_instance(instance: &dyn Instance) -> Result<Self, FeatureError> {
        Self::compute(&incidence_graph(instance)?)
    }
}
