use std::collections::BTreeMap;

use nbm_core::errors::{ErrorInfo, NbmError};
use nbm_core::BlockGraph;
use serde::{Deserialize, Serialize};

/// Weighted undirected multigraph with node multiplicities.
///
/// Nodes carry a weight (`vweight`, the number of finer units an aggregated
/// node represents) and edges carry an accumulated weight. Parallel edges are
/// merged on insertion; self-loops are stored once and contribute twice to a
/// node's degree. Adjacency uses ordered maps so iteration order, and hence
/// every computation downstream, is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GraphData", from = "GraphData")]
pub struct MultiGraph {
    vweight: Vec<f64>,
    adj: Vec<BTreeMap<usize, f64>>,
    total_weight: f64,
}

impl MultiGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            vweight: Vec::new(),
            adj: Vec::new(),
            total_weight: 0.0,
        }
    }

    /// Creates a graph with `n` unit-weight nodes and no edges.
    pub fn with_nodes(n: usize) -> Self {
        Self {
            vweight: vec![1.0; n],
            adj: vec![BTreeMap::new(); n],
            total_weight: 0.0,
        }
    }

    /// Adds a node with the given multiplicity and returns its index.
    pub fn add_node(&mut self, vweight: f64) -> usize {
        self.vweight.push(vweight);
        self.adj.push(BTreeMap::new());
        self.vweight.len() - 1
    }

    /// Adds an edge, accumulating weight onto an existing parallel edge.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<(), NbmError> {
        let n = self.vweight.len();
        if u >= n || v >= n {
            return Err(NbmError::Graph(
                ErrorInfo::new("node-out-of-range", "edge endpoint does not exist")
                    .with_context("u", u.to_string())
                    .with_context("v", v.to_string())
                    .with_context("nodes", n.to_string()),
            ));
        }
        if weight <= 0.0 {
            return Err(NbmError::Graph(
                ErrorInfo::new("non-positive-weight", "edge weight must be positive")
                    .with_context("weight", weight.to_string()),
            ));
        }
        *self.adj[u].entry(v).or_insert(0.0) += weight;
        if u != v {
            *self.adj[v].entry(u).or_insert(0.0) += weight;
        }
        self.total_weight += weight;
        Ok(())
    }

    /// Number of distinct edges (parallel edges merged, self-loops counted).
    pub fn num_edges(&self) -> usize {
        self.edge_list().len()
    }

    /// Iterates over `(neighbor, weight)` pairs of `v` in ascending order.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adj[v].iter().map(|(&u, &w)| (u, w))
    }
}

impl Default for MultiGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockGraph for MultiGraph {
    fn num_nodes(&self) -> usize {
        self.vweight.len()
    }

    fn node_weight(&self, v: usize) -> f64 {
        self.vweight[v]
    }

    fn degree(&self, v: usize) -> f64 {
        let mut total = 0.0;
        for (&u, &w) in &self.adj[v] {
            total += if u == v { 2.0 * w } else { w };
        }
        total
    }

    fn self_weight(&self, v: usize) -> f64 {
        self.adj[v].get(&v).copied().unwrap_or(0.0)
    }

    fn total_edge_weight(&self) -> f64 {
        self.total_weight
    }

    fn edge_list(&self) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        for (u, nbrs) in self.adj.iter().enumerate() {
            for (&v, &w) in nbrs {
                if v >= u {
                    edges.push((u, v, w));
                }
            }
        }
        edges
    }

    fn neighbor_list(&self, v: usize) -> Vec<(usize, f64)> {
        self.neighbors(v).collect()
    }

    fn quotient(&self, partition: &[usize], blocks: usize) -> Self {
        let mut vweight = vec![0.0; blocks];
        for (v, &r) in partition.iter().enumerate() {
            vweight[r] += self.vweight[v];
        }
        let mut adj = vec![BTreeMap::new(); blocks];
        let mut total_weight = 0.0;
        for (u, v, w) in self.edge_list() {
            let (r, s) = (partition[u], partition[v]);
            let (r, s) = if r <= s { (r, s) } else { (s, r) };
            *adj[r].entry(s).or_insert(0.0) += w;
            if r != s {
                *adj[s].entry(r).or_insert(0.0) += w;
            }
            total_weight += w;
        }
        Self {
            vweight,
            adj,
            total_weight,
        }
    }
}

/// Flat exchange form used for serde and canonical hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    /// Node multiplicities in index order.
    pub vweights: Vec<f64>,
    /// Edge triples `(u, v, weight)` with `u <= v`, sorted.
    pub edges: Vec<(usize, usize, f64)>,
}

impl From<MultiGraph> for GraphData {
    fn from(graph: MultiGraph) -> Self {
        Self {
            vweights: graph.vweight.clone(),
            edges: graph.edge_list(),
        }
    }
}

impl From<GraphData> for MultiGraph {
    fn from(data: GraphData) -> Self {
        let mut graph = MultiGraph::new();
        for w in data.vweights {
            graph.add_node(w);
        }
        for (u, v, w) in data.edges {
            // Out-of-range entries in hand-written payloads are dropped rather
            // than panicking; canonical payloads produced by `From<MultiGraph>`
            // are always in range.
            let _ = graph.add_edge(u, v, w);
        }
        graph
    }
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &MultiGraph) -> Result<String, NbmError> {
    serde_json::to_string_pretty(graph)
        .map_err(|err| NbmError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<MultiGraph, NbmError> {
    serde_json::from_str(json)
        .map_err(|err| NbmError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))
}
