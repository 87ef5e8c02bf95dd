#![deny(missing_docs)]

//! Nested stochastic block model hierarchy fitting.
//!
//! A nested state stacks block partitions on top of each other: level 0
//! partitions the graph's nodes, every higher level partitions the blocks of
//! the level below, down to a single root block. [`hierarchy_minimize`] fits
//! the whole stack by minimizing its total description length through
//! replace, delete and insert moves over the levels, delegating the per-level
//! partition search to the statistical engine behind the
//! [`nbm_core::LevelSearch`] seam. [`get_hierarchy_tree`] turns a fitted
//! state into an explicit containment tree for downstream consumers.

mod config;
mod minimize;
mod state;
mod tree;

pub use config::{CheckMode, LevelBounds, MinimizeOpts, SearchOpts};
pub use minimize::hierarchy_minimize;
pub use state::NestedBlockState;
pub use tree::{get_hierarchy_tree, HierarchyTree};
