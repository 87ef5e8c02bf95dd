#![deny(missing_docs)]

//! Core traits and data types for nested blockmodel inference.
//!
//! This crate defines the contract between the hierarchy-management logic and
//! the single-level statistical engine, plus the shared ambient pieces:
//! structured errors, the deterministic RNG policy, and partition utilities.

pub mod errors;
pub mod level;
pub mod partition;
pub mod rng;

pub use errors::{ErrorInfo, NbmError};
pub use level::{BlockGraph, EntropyArgs, LevelSearch, LevelState, MultilevelOpts, StateOverrides};
pub use rng::{derive_substream_seed, RngHandle};

/// Numeric tolerance used by consistency checks across the workspace.
///
/// Accept/reject decisions in the optimizer use exact comparison; only the
/// debug-mode coarsening checks compare entropies within this tolerance.
pub const CONSISTENCY_TOL: f64 = 1e-6;
