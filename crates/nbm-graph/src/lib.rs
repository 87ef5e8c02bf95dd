#![deny(missing_docs)]

//! Weighted multigraph storage for nested blockmodel inference.
//!
//! Block graphs at every hierarchy level are weighted dense graphs with
//! possible self and parallel edges; this crate provides the shared storage,
//! the partition-quotient aggregation used to coarsen a level, and canonical
//! hashing for structural fingerprints.

mod hash;
mod multigraph;

pub use hash::canonical_hash;
pub use multigraph::{graph_from_json, graph_to_json, GraphData, MultiGraph};
