use std::collections::BTreeMap;

use nbm_core::errors::{ErrorInfo, NbmError};
use nbm_core::partition::{self, continuous_map, fold_by_blocks, identity};
use nbm_core::{BlockGraph, EntropyArgs, LevelState, StateOverrides};
use nbm_graph::MultiGraph;

use crate::entropy;

/// Single-level stochastic block model state.
///
/// Owns one level's graph and partition together with the cached block-level
/// aggregates the entropy terms consume. The partition is always kept in
/// contiguous form so it can index the nodes of the derived coarse state.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockState {
    graph: MultiGraph,
    b: Vec<usize>,
    clabel: Vec<usize>,
    deg_corr: bool,
    blocks: usize,
    /// Block edge counts keyed `(r, s)` with `r <= s`; self pairs stored once.
    mrs: BTreeMap<(usize, usize), f64>,
    /// Block degrees (full-matrix row sums, self-loop weight counted twice).
    wr: Vec<f64>,
    /// Block node weights.
    nr: Vec<f64>,
    /// Block member counts.
    counts: Vec<usize>,
    e_total: f64,
    deg_lnfact: f64,
}

impl BlockState {
    /// Creates a state over `graph` with the given contiguous partition.
    ///
    /// `clabel` defaults to all-zero (no merge constraints).
    pub fn new(
        graph: MultiGraph,
        b: &[usize],
        clabel: Option<&[usize]>,
        deg_corr: bool,
    ) -> Result<Self, NbmError> {
        let n = graph.num_nodes();
        partition::validate(b, n)?;
        let clabel = match clabel {
            Some(c) => {
                if c.len() != n {
                    return Err(NbmError::State(
                        ErrorInfo::new("clabel-length", "constraint label length mismatch")
                            .with_context("clabel_len", c.len().to_string())
                            .with_context("nodes", n.to_string()),
                    ));
                }
                c.to_vec()
            }
            None => vec![0; n],
        };
        let blocks = partition::num_blocks(b);
        let mut mrs = BTreeMap::new();
        for (u, v, w) in graph.edge_list() {
            let (r, s) = ordered(b[u], b[v]);
            *mrs.entry((r, s)).or_insert(0.0) += w;
        }
        let mut wr = vec![0.0; blocks];
        let mut nr = vec![0.0; blocks];
        let mut counts = vec![0usize; blocks];
        let mut deg_lnfact = 0.0;
        for v in 0..n {
            wr[b[v]] += graph.degree(v);
            nr[b[v]] += graph.node_weight(v);
            counts[b[v]] += 1;
            deg_lnfact += entropy::ln_factorial(graph.degree(v));
        }
        let e_total = graph.total_edge_weight();
        Ok(Self {
            b: b.to_vec(),
            clabel,
            deg_corr,
            blocks,
            mrs,
            wr,
            nr,
            counts,
            e_total,
            deg_lnfact,
            graph,
        })
    }

    /// Whether the state uses the degree-corrected model variant.
    pub fn deg_corr(&self) -> bool {
        self.deg_corr
    }

    /// Per-block member counts.
    pub(crate) fn member_counts(&self) -> &[usize] {
        &self.counts
    }

    /// Moves node `v` into block `r_new`, updating all cached aggregates.
    ///
    /// The caller must ensure the move does not empty a block; contiguity of
    /// the partition is preserved under that precondition.
    pub(crate) fn move_node(&mut self, v: usize, r_new: usize) {
        let r_old = self.b[v];
        if r_old == r_new {
            return;
        }
        for (u, w) in self.graph.neighbor_list(v) {
            if u == v {
                sub_pair(&mut self.mrs, ordered(r_old, r_old), w);
                add_pair(&mut self.mrs, ordered(r_new, r_new), w);
            } else {
                let s = self.b[u];
                sub_pair(&mut self.mrs, ordered(r_old, s), w);
                add_pair(&mut self.mrs, ordered(r_new, s), w);
            }
        }
        let d = self.graph.degree(v);
        self.wr[r_old] -= d;
        self.wr[r_new] += d;
        let vw = self.graph.node_weight(v);
        self.nr[r_old] -= vw;
        self.nr[r_new] += vw;
        self.counts[r_old] -= 1;
        self.counts[r_new] += 1;
        self.b[v] = r_new;
    }

    fn clabel_edges_dl(&self) -> f64 {
        let bcl = self.block_clabel();
        // Cannot fail for an internally consistent state: the folded label has
        // one entry per block and the quotient graph matches it.
        match self.coarsen(Some(&bcl), false) {
            Ok(cstate) => cstate.entropy(&EntropyArgs {
                dl: true,
                edges_dl: false,
                dense: true,
                multigraph: true,
                clabel_edges_dl: false,
            }),
            Err(_) => 0.0,
        }
    }
}

fn ordered(r: usize, s: usize) -> (usize, usize) {
    if r <= s {
        (r, s)
    } else {
        (s, r)
    }
}

fn add_pair(mrs: &mut BTreeMap<(usize, usize), f64>, key: (usize, usize), w: f64) {
    *mrs.entry(key).or_insert(0.0) += w;
}

fn sub_pair(mrs: &mut BTreeMap<(usize, usize), f64>, key: (usize, usize), w: f64) {
    if let Some(slot) = mrs.get_mut(&key) {
        *slot -= w;
        if *slot <= 1e-12 {
            mrs.remove(&key);
        }
    }
}

impl LevelState for BlockState {
    type Graph = MultiGraph;

    fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    fn num_blocks(&self) -> usize {
        self.blocks
    }

    fn partition(&self) -> &[usize] {
        &self.b
    }

    fn clabel(&self) -> &[usize] {
        &self.clabel
    }

    fn graph(&self) -> &MultiGraph {
        &self.graph
    }

    fn block_clabel(&self) -> Vec<usize> {
        fold_by_blocks(&self.clabel, &self.b, self.blocks)
    }

    fn copy_with(&self, overrides: StateOverrides) -> Result<Self, NbmError> {
        let b = overrides.partition.as_deref().unwrap_or(&self.b);
        let clabel = overrides.clabel.as_deref().unwrap_or(&self.clabel);
        let deg_corr = overrides.deg_corr.unwrap_or(self.deg_corr);
        Self::new(self.graph.clone(), b, Some(clabel), deg_corr)
    }

    fn entropy(&self, args: &EntropyArgs) -> f64 {
        let mut s = if args.dense {
            entropy::dense_term(&self.mrs, &self.nr, args.multigraph)
        } else {
            entropy::sparse_term(
                &self.mrs,
                &self.nr,
                &self.wr,
                self.e_total,
                self.deg_corr,
                self.deg_lnfact,
            )
        };
        if args.dl {
            s += entropy::partition_dl(&self.nr);
            if self.deg_corr {
                s += entropy::degree_dl(&self.nr, &self.wr);
            }
        }
        if args.edges_dl {
            s += entropy::edges_dl(self.blocks, self.e_total);
        }
        if args.clabel_edges_dl {
            s += self.clabel_edges_dl();
        }
        s
    }

    fn coarsen(&self, b: Option<&[usize]>, deg_corr: bool) -> Result<Self, NbmError> {
        let bg = self.graph.quotient(&self.b, self.blocks);
        let upper = match b {
            Some(raw) => {
                if raw.len() != self.blocks {
                    return Err(NbmError::State(
                        ErrorInfo::new("coarsen-length", "upper partition must have one entry per block")
                            .with_context("partition_len", raw.len().to_string())
                            .with_context("blocks", self.blocks.to_string()),
                    ));
                }
                continuous_map(raw)
            }
            None => identity(self.blocks),
        };
        let upper_clabel = self.block_clabel();
        Self::new(bg, &upper, Some(&upper_clabel), deg_corr)
    }

    fn check_clabel(&self) -> bool {
        let mut seen: Vec<Option<usize>> = vec![None; self.blocks];
        for (v, &r) in self.b.iter().enumerate() {
            match seen[r] {
                None => seen[r] = Some(self.clabel[v]),
                Some(label) if label != self.clabel[v] => return false,
                Some(_) => {}
            }
        }
        true
    }
}
