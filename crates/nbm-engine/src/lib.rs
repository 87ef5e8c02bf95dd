#![deny(missing_docs)]

//! Single-level stochastic block model engine.
//!
//! This crate provides the statistical machinery the nested hierarchy treats
//! as a black box: a concrete [`BlockState`] with description-length entropy
//! terms, Metropolis node-move sweeps, block-count reduction via guided
//! merges, and a bisection search between boundary block counts. Everything is
//! deterministic given the caller's RNG seed.

mod bisection;
mod block_state;
mod config;
/// Description-length terms shared by the state implementations.
pub mod entropy;
mod multilevel;
mod sweep;

pub use bisection::bisection_minimize;
pub use block_state::BlockState;
pub use config::BisectionOpts;
pub use sweep::{metropolis_sweep, SweepOutcome};
