//! Hyper tree grid storage.
//!
//! The generator talks to storage only through the traits in [`store`];
//! [`HyperTreeGrid`] is the in-memory implementation that owns the trees,
//! the leaf attributes and the axis coordinates.

pub mod store;
pub mod tree;
pub mod forest;
pub mod attributes;
pub mod grid;

pub use store::{LeafAttributeSink, TreeCursor, TreeForest};
pub use tree::{HyperTree, HyperTreeCursor, TreeNode};
pub use forest::HyperTreeForest;
pub use attributes::{BitArray, LeafData, CELL_VALUE_NAME};
pub use grid::HyperTreeGrid;
