use std::collections::BTreeSet;

use nbm_engine::BisectionOpts;
use serde::{Deserialize, Serialize};

/// Consistency checking policy for a nested state.
///
/// `Strict` re-derives every coarsening after each mutation and fails on any
/// disagreement; `Off` trusts the caller and skips the checks entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckMode {
    /// No consistency checks after mutations.
    #[default]
    Off,
    /// Verify the coarsening invariant after every mutation.
    Strict,
}

/// Block-count and partition bounds applied to the base-level search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds {
    /// Lower bound on the number of blocks.
    #[serde(default)]
    pub b_min: Option<usize>,
    /// Upper bound on the number of blocks.
    #[serde(default)]
    pub b_max: Option<usize>,
    /// Partition used as the minimal boundary candidate.
    #[serde(default)]
    pub partition_min: Option<Vec<usize>>,
    /// Partition used as the maximal boundary candidate.
    #[serde(default)]
    pub partition_max: Option<Vec<usize>>,
}

impl LevelBounds {
    /// Bounds with no constraints at all.
    pub fn unconstrained() -> Self {
        Self::default()
    }
}

/// Options for the per-level boundary search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOpts {
    /// Levels with at least this many nodes are searched with the sparse
    /// entropy terms; the full entropy is always compared exactly.
    #[serde(default = "default_sparse_threshold")]
    pub sparse_threshold: usize,
    /// Options forwarded to the engine's bisection search. The entropy term
    /// selection inside is overridden per level.
    #[serde(default)]
    pub bisection: BisectionOpts,
}

fn default_sparse_threshold() -> usize {
    100
}

impl Default for SearchOpts {
    fn default() -> Self {
        Self {
            sparse_threshold: default_sparse_threshold(),
            bisection: BisectionOpts::default(),
        }
    }
}

/// Options for the hierarchy minimization sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizeOpts {
    /// Bounds applied when searching the base level.
    #[serde(default)]
    pub bounds: LevelBounds,
    /// Hierarchy levels excluded from all moves.
    #[serde(default)]
    pub frozen_levels: BTreeSet<usize>,
    /// Upper bound on level visits before the sweep stops regardless of
    /// convergence; zero means unbounded.
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
    /// Per-level boundary search options.
    #[serde(default)]
    pub search: SearchOpts,
}

fn default_max_sweeps() -> usize {
    10_000
}

impl Default for MinimizeOpts {
    fn default() -> Self {
        Self {
            bounds: LevelBounds::default(),
            frozen_levels: BTreeSet::new(),
            max_sweeps: default_max_sweeps(),
            search: SearchOpts::default(),
        }
    }
}

impl MinimizeOpts {
    /// Ensures the configuration is well-formed and returns a sanitised copy.
    pub fn sanitised(&self) -> Self {
        let mut out = self.clone();
        out.search.sparse_threshold = out.search.sparse_threshold.max(1);
        out.search.bisection = out.search.bisection.sanitised();
        if let (Some(lo), Some(hi)) = (out.bounds.b_min, out.bounds.b_max) {
            if lo > hi {
                out.bounds.b_max = Some(lo);
            }
        }
        out
    }
}
