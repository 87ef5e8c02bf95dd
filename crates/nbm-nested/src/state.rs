use nbm_core::errors::{ErrorInfo, NbmError};
use nbm_core::partition::{self, compose, continuous_map, fold_by_blocks, identity};
use nbm_core::{EntropyArgs, LevelSearch, LevelState, RngHandle, StateOverrides, CONSISTENCY_TOL};
use sha2::{Digest, Sha256};

use crate::config::{CheckMode, LevelBounds, SearchOpts};

/// The nested stochastic block model state of a graph.
///
/// Owns the ordered sequence `levels[0..=L]`: level 0 partitions the original
/// nodes, every higher level partitions the blocks of the level below. The
/// invariant maintained by all mutations is that level `l + 1` is always the
/// single-step coarsening of level `l`; with [`CheckMode::Strict`] this is
/// re-verified after every mutation.
#[derive(Debug, Clone)]
pub struct NestedBlockState<S: LevelState> {
    levels: Vec<S>,
    check: CheckMode,
}

impl<S: LevelState> NestedBlockState<S> {
    /// Builds a hierarchy from a base-level state and one partition per upper
    /// level. Each upper partition assigns the blocks of the level below.
    pub fn new(base: S, upper: &[Vec<usize>], check: CheckMode) -> Result<Self, NbmError> {
        let mut levels = vec![base];
        for b in upper {
            let next = levels[levels.len() - 1].coarsen(Some(b), false)?;
            levels.push(next);
        }
        let state = Self { levels, check };
        state.maybe_check()?;
        Ok(state)
    }

    /// Number of hierarchy levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// The state at level `l`.
    pub fn level(&self, l: usize) -> &S {
        &self.levels[l]
    }

    /// All level states, finest first.
    pub fn levels(&self) -> &[S] {
        &self.levels
    }

    /// One partition array per level, finest first.
    pub fn get_bs(&self) -> Vec<Vec<usize>> {
        self.levels.iter().map(|s| s.partition().to_vec()).collect()
    }

    /// `(level, nodes, blocks)` triples, finest first.
    pub fn level_summary(&self) -> Vec<(usize, usize, usize)> {
        self.levels
            .iter()
            .enumerate()
            .map(|(l, s)| (l, s.num_nodes(), s.num_blocks()))
            .collect()
    }

    /// Independent copy, optionally with replacement partitions.
    pub fn copy(&self, bs: Option<&[Vec<usize>]>) -> Result<Self, NbmError> {
        let bs = match bs {
            Some(bs) => bs.to_vec(),
            None => self.get_bs(),
        };
        if bs.is_empty() {
            return Err(NbmError::Hierarchy(ErrorInfo::new(
                "empty-hierarchy",
                "a nested state needs at least one level partition",
            )));
        }
        let base = self.levels[0].copy_with(StateOverrides {
            partition: Some(continuous_map(&bs[0])),
            ..StateOverrides::default()
        })?;
        Self::new(base, &bs[1..], self.check)
    }

    /// Expresses the partition at level `j` in terms of level-`l` node ids by
    /// composing the membership maps of the levels in between. Requires
    /// `l <= j`; `project_partition(l, l)` is level `l`'s own partition.
    pub fn project_partition(&self, j: usize, l: usize) -> Result<Vec<usize>, NbmError> {
        if l > j || j >= self.levels.len() {
            return Err(NbmError::Hierarchy(
                ErrorInfo::new("projection-order", "projection requires l <= j < levels")
                    .with_context("j", j.to_string())
                    .with_context("l", l.to_string())
                    .with_context("levels", self.levels.len().to_string()),
            ));
        }
        let mut b = self.levels[l].partition().to_vec();
        for i in (l + 1)..=j {
            b = compose(self.levels[i].partition(), &b)?;
        }
        Ok(b)
    }

    /// Maps the base constraint label up to level `l` by relabeling through
    /// each intermediate level's partition.
    pub fn propagate_clabel(&self, l: usize) -> Vec<usize> {
        let mut clabel = self.levels[0].clabel().to_vec();
        for j in 0..l {
            clabel = fold_by_blocks(
                &clabel,
                self.levels[j].partition(),
                self.levels[j].num_blocks(),
            );
        }
        clabel
    }

    /// Constraint label at level `l`, additionally keyed by the level-`l + 1`
    /// block membership so merges never cross an upper-level block.
    pub fn get_clabel(&self, l: usize) -> Result<Vec<usize>, NbmError> {
        let mut clabel = self.propagate_clabel(l);
        if l + 1 < self.levels.len() {
            let upper = self.project_partition(l + 1, l)?;
            let shift = clabel.iter().copied().max().unwrap_or(0) + 1;
            for (c, &u) in clabel.iter_mut().zip(upper.iter()) {
                *c += shift * u;
            }
        }
        Ok(clabel)
    }

    /// Installs a new partition at level `l`, rebuilding the state. The
    /// levels above `l` are regenerated so that level `l + 1` is the
    /// coarsening of the new level and every higher level keeps the grouping
    /// it represented before, expressed over the rebuilt block ids. Any
    /// previously held copies of levels above `l` are stale afterwards.
    pub fn replace_level(&mut self, l: usize, b: &[usize]) -> Result<(), NbmError> {
        let b = continuous_map(b);
        // old upper groupings, each expressed on level-l nodes
        let mut projections = Vec::new();
        for k in (l + 1)..self.levels.len() {
            projections.push(self.project_partition(k, l)?);
        }
        self.levels[l] = self.levels[l].copy_with(StateOverrides {
            partition: Some(b),
            ..StateOverrides::default()
        })?;
        // `carry` maps level-l nodes to the nodes of the level being rebuilt
        let mut carry = self.levels[l].partition().to_vec();
        for (i, proj) in projections.iter().enumerate() {
            let k = l + 1 + i;
            let blocks = partition::num_blocks(&carry);
            let grouped = fold_by_blocks(proj, &carry, blocks);
            let rebuilt = self.levels[k - 1].coarsen(Some(&grouped), false)?;
            carry = compose(rebuilt.partition(), &carry)?;
            self.levels[k] = rebuilt;
        }
        self.maybe_check()
    }

    /// Removes level `l`, folding the structure it represented into level
    /// `l - 1`. Deleting the base level is invalid and leaves the hierarchy
    /// untouched.
    pub fn delete_level(&mut self, l: usize) -> Result<(), NbmError> {
        if l == 0 {
            return Err(NbmError::Hierarchy(ErrorInfo::new(
                "delete-base-level",
                "cannot delete level 0",
            )));
        }
        let b = self.project_partition(l, l - 1)?;
        self.replace_level(l - 1, &b)?;
        self.levels.remove(l);
        self.maybe_check()
    }

    /// Inserts a pass-through copy of level `l` immediately before it, with
    /// the identity partition so the represented structure is unchanged.
    pub fn duplicate_level(&mut self, l: usize) -> Result<(), NbmError> {
        let ident = identity(self.levels[l].num_nodes());
        let copy = self.levels[l].copy_with(StateOverrides {
            partition: Some(ident),
            ..StateOverrides::default()
        })?;
        self.levels.insert(l, copy);
        self.maybe_check()
    }

    /// Entropy of level `l`. Levels above the base are always treated as
    /// dense multigraphs and every level pays its model description length;
    /// only the topmost level pays for describing its own edge count.
    pub fn level_entropy(&self, l: usize, dense: bool, multigraph: bool) -> f64 {
        let args = EntropyArgs {
            dl: true,
            edges_dl: l + 1 == self.levels.len(),
            dense: dense || l > 0,
            multigraph: multigraph || l > 0,
            clabel_edges_dl: false,
        };
        self.levels[l].entropy(&args)
    }

    /// Entropy of the whole hierarchy, summed over levels.
    pub fn entropy(&self, dense: bool, multigraph: bool) -> f64 {
        (0..self.levels.len())
            .map(|l| self.level_entropy(l, dense, multigraph))
            .sum()
    }

    /// Entropy under the default sparse-base settings.
    pub fn total_entropy(&self) -> f64 {
        self.entropy(false, true)
    }

    /// The partition at level `l` projected onto the base level, as a state.
    pub fn project_level(&self, l: usize) -> Result<S, NbmError> {
        let b = self.project_partition(l, 0)?;
        self.levels[0].copy_with(StateOverrides {
            partition: Some(continuous_map(&b)),
            ..StateOverrides::default()
        })
    }

    /// Hex digest over the level partitions, for change detection.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.levels.len() as u64).to_le_bytes());
        for s in &self.levels {
            hasher.update((s.num_nodes() as u64).to_le_bytes());
            for &r in s.partition() {
                hasher.update((r as u64).to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Verifies the hierarchy invariants: every level `l > 0` matches the
    /// re-derived coarsening of level `l - 1` up to relabeling and within the
    /// entropy tolerance, and no level has more blocks than nodes.
    pub fn consistency_check(&self) -> Result<(), NbmError> {
        let args = EntropyArgs {
            dl: true,
            edges_dl: false,
            dense: true,
            multigraph: true,
            clabel_edges_dl: false,
        };
        for (l, s) in self.levels.iter().enumerate() {
            if s.num_blocks() > s.num_nodes() {
                return Err(NbmError::Hierarchy(
                    ErrorInfo::new("blocks-exceed-nodes", "level has more blocks than nodes")
                        .with_context("level", l.to_string())
                        .with_context("blocks", s.num_blocks().to_string())
                        .with_context("nodes", s.num_nodes().to_string()),
                ));
            }
        }
        for l in 1..self.levels.len() {
            let rederived = self.levels[l - 1].coarsen(Some(self.levels[l].partition()), false)?;
            if !partition::equivalent(rederived.partition(), self.levels[l].partition()) {
                return Err(NbmError::Hierarchy(
                    ErrorInfo::new("inconsistent-level", "stored level disagrees with coarsening")
                        .with_context("level", l.to_string())
                        .with_hint("the lower level was mutated without regeneration"),
                ));
            }
            let gap = (rederived.entropy(&args) - self.levels[l].entropy(&args)).abs();
            if gap > CONSISTENCY_TOL {
                return Err(NbmError::Hierarchy(
                    ErrorInfo::new("inconsistent-entropy", "level entropy disagrees with coarsening")
                        .with_context("level", l.to_string())
                        .with_context("gap", format!("{gap:.3e}")),
                ));
            }
        }
        Ok(())
    }

    fn maybe_check(&self) -> Result<(), NbmError> {
        match self.check {
            CheckMode::Off => Ok(()),
            CheckMode::Strict => self.consistency_check(),
        }
    }

    // Raw level surgery for the optimizer's rollback paths. These bypass the
    // consistency hooks; callers restore a configuration that was valid.

    pub(crate) fn save_tail(&self, from: usize) -> Vec<S> {
        self.levels[from..].to_vec()
    }

    pub(crate) fn restore_tail(&mut self, from: usize, saved: Vec<S>) {
        self.levels.truncate(from);
        self.levels.extend(saved);
    }

    pub(crate) fn push_level(&mut self, s: S) {
        self.levels.push(s);
    }
}

impl<S: LevelSearch> NestedBlockState<S> {
    /// Searches for a better partition at level `l`.
    ///
    /// Builds two boundary candidates, a maximal one (identity partition, or
    /// `bounds.partition_max`, reduced toward `bounds.b_max`) and a minimal
    /// one (the coarsening induced by level `l + 1`, or a single block at the
    /// top, reduced toward `bounds.b_min`), both constrained by the level's
    /// combined constraint label, and runs the engine's bisection search
    /// between them.
    pub fn find_new_level(
        &self,
        l: usize,
        bounds: &LevelBounds,
        search: &SearchOpts,
        rng: &mut RngHandle,
    ) -> Result<S, NbmError> {
        let top = l + 1 == self.levels.len();
        let state = &self.levels[l];
        let n = state.num_nodes();
        let clabel = self.get_clabel(l)?;

        let search_entropy = EntropyArgs {
            dl: true,
            edges_dl: top,
            dense: l > 0 && n < search.sparse_threshold,
            multigraph: true,
            clabel_edges_dl: !top,
        };
        // candidate comparison always uses the dense terms above the base
        let compare_entropy = EntropyArgs {
            dense: l > 0,
            ..search_entropy
        };
        let mut opts = search.bisection.clone();
        opts.entropy = compare_entropy;
        opts.multilevel.entropy = search_entropy;

        let b_max = match &bounds.partition_max {
            Some(p) => continuous_map(p),
            None => identity(n),
        };
        let mut max_state = state.copy_with(StateOverrides {
            partition: Some(b_max),
            clabel: Some(clabel.clone()),
            ..StateOverrides::default()
        })?;
        if let Some(cap) = bounds.b_max {
            if max_state.num_blocks() > cap {
                max_state = max_state.multilevel(cap, &opts.multilevel, rng)?;
            }
        }

        let mut min_state = if top {
            state.copy_with(StateOverrides {
                partition: Some(vec![0; n]),
                clabel: Some(clabel),
                ..StateOverrides::default()
            })?
        } else {
            match (&bounds.partition_min, bounds.b_min) {
                (Some(p), _) => state.copy_with(StateOverrides {
                    partition: Some(continuous_map(p)),
                    clabel: Some(clabel),
                    ..StateOverrides::default()
                })?,
                (None, Some(floor)) => max_state.multilevel(floor, &opts.multilevel, rng)?,
                (None, None) => state.copy_with(StateOverrides {
                    partition: Some(continuous_map(&self.project_partition(l + 1, l)?)),
                    clabel: Some(clabel),
                    ..StateOverrides::default()
                })?,
            }
        };
        if let Some(floor) = bounds.b_min {
            if min_state.num_blocks() > floor {
                min_state = min_state.multilevel(floor, &opts.multilevel, rng)?;
            }
        }

        let best = nbm_engine::bisection_minimize(min_state, max_state, &opts, rng)?;
        if self.check == CheckMode::Strict && !best.check_clabel() {
            return Err(NbmError::Hierarchy(
                ErrorInfo::new("clabel-violation", "search produced a constraint-violating state")
                    .with_context("level", l.to_string()),
            ));
        }
        Ok(best)
    }
}
