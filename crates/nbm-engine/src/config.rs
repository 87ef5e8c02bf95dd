use nbm_core::{EntropyArgs, MultilevelOpts};
use serde::{Deserialize, Serialize};

/// Options for the bisection search over block counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BisectionOpts {
    /// Options forwarded to the block-count reduction subroutine.
    #[serde(default)]
    pub multilevel: MultilevelOpts,
    /// Entropy terms compared between candidate states.
    #[serde(default)]
    pub entropy: EntropyArgs,
    /// Maximum interval-narrowing iterations before falling back to an
    /// exhaustive scan of the remaining range.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
}

fn default_max_iters() -> usize {
    64
}

impl Default for BisectionOpts {
    fn default() -> Self {
        Self {
            multilevel: MultilevelOpts::default(),
            entropy: EntropyArgs::default(),
            max_iters: default_max_iters(),
        }
    }
}

impl BisectionOpts {
    /// Ensures the configuration is well-formed and returns a sanitised copy.
    pub fn sanitised(&self) -> Self {
        let mut out = self.clone();
        out.max_iters = out.max_iters.max(1);
        out.multilevel.merge_candidates = out.multilevel.merge_candidates.max(1);
        out
    }
}
