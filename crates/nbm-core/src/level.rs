//! Contracts between the nested hierarchy and the statistical engine.
//!
//! The hierarchy logic is flavor-agnostic: it only needs the capability set
//! below from whatever concrete block model variant is plugged in at level 0.

use serde::{Deserialize, Serialize};

use crate::errors::NbmError;
use crate::rng::RngHandle;

/// Weighted graph capabilities the hierarchy needs from a level's graph.
///
/// Nodes carry a multiplicity (block graphs aggregate finer nodes) and edges
/// carry an aggregated weight; self-loops are permitted.
pub trait BlockGraph: Sized + Clone {
    /// Number of nodes.
    fn num_nodes(&self) -> usize;
    /// Multiplicity of node `v`.
    fn node_weight(&self, v: usize) -> f64;
    /// Weighted degree of `v`, with self-loop weight counted twice.
    fn degree(&self, v: usize) -> f64;
    /// Weight of the self-loop at `v`, zero when absent.
    fn self_weight(&self, v: usize) -> f64;
    /// Total edge weight, self-loops counted once.
    fn total_edge_weight(&self) -> f64;
    /// All edges as `(u, v, weight)` triples with `u <= v`.
    fn edge_list(&self) -> Vec<(usize, usize, f64)>;
    /// Weighted neighbors of `v`, including `v` itself for self-loops.
    fn neighbor_list(&self, v: usize) -> Vec<(usize, f64)>;
    /// Coarse graph whose nodes are the blocks of `partition`.
    fn quotient(&self, partition: &[usize], blocks: usize) -> Self;
}

/// Entropy term selection for a single level state.
///
/// One explicit structure assembled at the call site; every caller states
/// exactly which description-length terms it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyArgs {
    /// Include the model description length (partition and, for
    /// degree-corrected states, degree sequence).
    pub dl: bool,
    /// Include the description length of the level's own edge count matrix.
    pub edges_dl: bool,
    /// Treat the graph as dense (block graphs above level 0 always are).
    pub dense: bool,
    /// Allow parallel edges and self-loops in the probability terms.
    pub multigraph: bool,
    /// Fold in the edge-count description length obtained by re-coarsening
    /// the state by its block constraint label.
    pub clabel_edges_dl: bool,
}

impl Default for EntropyArgs {
    fn default() -> Self {
        Self {
            dl: false,
            edges_dl: false,
            dense: false,
            multigraph: true,
            clabel_edges_dl: false,
        }
    }
}

/// Optional overrides applied when copying a level state.
#[derive(Debug, Clone, Default)]
pub struct StateOverrides {
    /// Replacement partition (must be contiguous).
    pub partition: Option<Vec<usize>>,
    /// Replacement constraint label.
    pub clabel: Option<Vec<usize>>,
    /// Replacement degree-correction flag.
    pub deg_corr: Option<bool>,
}

/// One layer of the hierarchy, owned by the external statistical engine.
///
/// Invariant: `num_blocks() <= num_nodes()`, and `partition()` is contiguous
/// so its values index the nodes of the next-coarser level.
pub trait LevelState: Sized + Clone {
    /// Graph representation used by this state.
    type Graph: BlockGraph;

    /// Number of nodes at this level.
    fn num_nodes(&self) -> usize;
    /// Number of blocks the partition currently occupies.
    fn num_blocks(&self) -> usize;
    /// Node-to-block membership, contiguous over `0..num_blocks()`.
    fn partition(&self) -> &[usize];
    /// Per-node constraint label forbidding merges across labeled groups.
    fn clabel(&self) -> &[usize];
    /// The level's own graph (nodes are this level's units).
    fn graph(&self) -> &Self::Graph;
    /// Constraint label folded down to one value per block.
    fn block_clabel(&self) -> Vec<usize>;
    /// Independent copy with the given overrides applied.
    fn copy_with(&self, overrides: StateOverrides) -> Result<Self, NbmError>;
    /// Description-length entropy under the stated assumptions.
    fn entropy(&self, args: &EntropyArgs) -> f64;
    /// Derives the one-level-coarser state induced by `b` (or by this state's
    /// own partition when `b` is `None`). `b` must have one entry per block.
    fn coarsen(&self, b: Option<&[usize]>, deg_corr: bool) -> Result<Self, NbmError>;
    /// Verifies that no block mixes distinct constraint labels.
    fn check_clabel(&self) -> bool;
}

/// Options for the engine's block-count reduction subroutine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilevelOpts {
    /// Greedy sweeps run after each accepted merge.
    #[serde(default = "default_sweeps_per_merge")]
    pub sweeps_per_merge: usize,
    /// Merge pairs sampled per reduction step when the block count is large;
    /// below this count all compatible pairs are enumerated.
    #[serde(default = "default_merge_candidates")]
    pub merge_candidates: usize,
    /// Inverse temperature for sweeps; an absent (infinite) value means
    /// strictly greedy. Kept out of the serialized form when infinite since
    /// JSON has no representation for it.
    #[serde(default = "default_beta", skip_serializing_if = "is_infinite")]
    pub beta: f64,
    /// Entropy terms minimized during the search.
    #[serde(default)]
    pub entropy: EntropyArgs,
}

fn default_sweeps_per_merge() -> usize {
    2
}

fn default_merge_candidates() -> usize {
    32
}

fn default_beta() -> f64 {
    f64::INFINITY
}

fn is_infinite(beta: &f64) -> bool {
    beta.is_infinite()
}

impl Default for MultilevelOpts {
    fn default() -> Self {
        Self {
            sweeps_per_merge: default_sweeps_per_merge(),
            merge_candidates: default_merge_candidates(),
            beta: default_beta(),
            entropy: EntropyArgs::default(),
        }
    }
}

/// Level states that can drive their own block count toward a target.
pub trait LevelSearch: LevelState {
    /// Reduces the block count toward `target_b` via constraint-respecting
    /// merges and sweeps. States already at or below the target are returned
    /// unchanged; an unreachable target (constraint labels forbid further
    /// merges) stops early rather than failing.
    fn multilevel(
        &self,
        target_b: usize,
        opts: &MultilevelOpts,
        rng: &mut RngHandle,
    ) -> Result<Self, NbmError>;
}
