use sha2::{Digest, Sha256};

use crate::multigraph::MultiGraph;
use nbm_core::BlockGraph;

/// Computes the canonical structural hash for the provided graph.
///
/// The encoding folds node multiplicities and the sorted edge list into a
/// SHA-256 digest; two graphs hash equal iff they have identical node weights
/// and aggregated edge weights. Tests use this (together with partition
/// fingerprints) to assert that an operation left a structure untouched.
pub fn canonical_hash(graph: &MultiGraph) -> String {
    let mut hasher = Sha256::new();
    hasher.update((graph.num_nodes() as u64).to_le_bytes());
    for v in 0..graph.num_nodes() {
        hasher.update(graph.node_weight(v).to_bits().to_le_bytes());
    }
    let edges = graph.edge_list();
    hasher.update((edges.len() as u64).to_le_bytes());
    for (u, v, w) in edges {
        hasher.update((u as u64).to_le_bytes());
        hasher.update((v as u64).to_le_bytes());
        hasher.update(w.to_bits().to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}
