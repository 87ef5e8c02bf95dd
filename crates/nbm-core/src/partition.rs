//! Partition arrays and the operations the hierarchy performs on them.
//!
//! A partition assigns every node of a level to a block id. All states in the
//! workspace keep their partitions in *contiguous* form: block ids cover
//! `0..B` and are ordered by first appearance. Contiguity is what lets a
//! level's partition double as an index into the next level's nodes.

use crate::errors::{ErrorInfo, NbmError};

/// Relabels block ids to `0..B` in order of first appearance.
pub fn continuous_map(b: &[usize]) -> Vec<usize> {
    let mut remap: Vec<Option<usize>> = Vec::new();
    let mut next = 0usize;
    let mut out = Vec::with_capacity(b.len());
    for &r in b {
        if r >= remap.len() {
            remap.resize(r + 1, None);
        }
        let id = *remap[r].get_or_insert_with(|| {
            let id = next;
            next += 1;
            id
        });
        out.push(id);
    }
    out
}

/// Returns the number of distinct blocks in a contiguous partition.
pub fn num_blocks(b: &[usize]) -> usize {
    b.iter().copied().max().map_or(0, |m| m + 1)
}

/// Returns the identity partition (one block per node).
pub fn identity(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Composes two membership maps: `out[v] = outer[inner[v]]`.
///
/// `inner` maps level-l nodes to level-(l+1) nodes, `outer` maps those onward.
pub fn compose(outer: &[usize], inner: &[usize]) -> Result<Vec<usize>, NbmError> {
    let mut out = Vec::with_capacity(inner.len());
    for (v, &r) in inner.iter().enumerate() {
        let Some(&s) = outer.get(r) else {
            return Err(NbmError::State(
                ErrorInfo::new("compose-out-of-range", "inner block id exceeds outer partition")
                    .with_context("node", v.to_string())
                    .with_context("block", r.to_string())
                    .with_context("outer_len", outer.len().to_string()),
            ));
        };
        out.push(s);
    }
    Ok(out)
}

/// Tests partition equality up to block relabeling.
pub fn equivalent(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len() && continuous_map(a) == continuous_map(b)
}

/// Returns per-block node counts for a contiguous partition.
pub fn block_sizes(b: &[usize]) -> Vec<usize> {
    let mut sizes = vec![0usize; num_blocks(b)];
    for &r in b {
        sizes[r] += 1;
    }
    sizes
}

/// Folds a per-node value array down to one representative value per block.
///
/// The representative is the value of the block's first member. Used for
/// constraint-label propagation, where all members of a block are expected to
/// agree (violations are surfaced by `check_clabel`, not here).
pub fn fold_by_blocks(values: &[usize], b: &[usize], blocks: usize) -> Vec<usize> {
    let mut out = vec![usize::MAX; blocks];
    for (v, &r) in b.iter().enumerate() {
        if out[r] == usize::MAX {
            out[r] = values[v];
        }
    }
    for slot in &mut out {
        if *slot == usize::MAX {
            *slot = 0;
        }
    }
    out
}

/// Validates that a partition is contiguous and fits the given node count.
pub fn validate(b: &[usize], nodes: usize) -> Result<(), NbmError> {
    if b.len() != nodes {
        return Err(NbmError::State(
            ErrorInfo::new("partition-length", "partition length does not match node count")
                .with_context("partition_len", b.len().to_string())
                .with_context("nodes", nodes.to_string()),
        ));
    }
    let blocks = num_blocks(b);
    let mut seen = vec![false; blocks];
    for &r in b {
        seen[r] = true;
    }
    if seen.iter().any(|s| !s) {
        return Err(NbmError::State(
            ErrorInfo::new("partition-not-contiguous", "partition has unused block ids")
                .with_context("blocks", blocks.to_string())
                .with_hint("relabel with continuous_map before constructing a state"),
        ));
    }
    Ok(())
}
