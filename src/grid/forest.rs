//! Forest of hyper trees, one per root cell of the grid.

use crate::core::Branching;
use super::store::TreeForest;
use super::tree::{HyperTree, HyperTreeCursor};

#[derive(Clone, Debug)]
pub struct HyperTreeForest {
    branching: Branching,
    trees: Vec<HyperTree>,
}

impl HyperTreeForest {
    /// Create `tree_count` trees, each a single root leaf.
    pub fn new(branching: Branching, tree_count: usize) -> Self {
        Self {
            branching,
            trees: (0..tree_count).map(|_| HyperTree::new(branching)).collect(),
        }
    }

    pub fn branching(&self) -> Branching {
        self.branching
    }

    pub fn tree(&self, index: usize) -> &HyperTree {
        &self.trees[index]
    }

    pub fn trees(&self) -> &[HyperTree] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [HyperTree] {
        &mut self.trees
    }

    /// Total number of leaves over all trees.
    pub fn leaf_count(&self) -> usize {
        self.trees.iter().map(HyperTree::leaf_count).sum()
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(HyperTree::node_count).sum()
    }

    /// Deepest level count over all trees.
    pub fn number_of_levels(&self) -> usize {
        self.trees.iter().map(HyperTree::number_of_levels).max().unwrap_or(0)
    }
}

impl TreeForest for HyperTreeForest {
    type Cursor<'a> = HyperTreeCursor<'a>
    where
        Self: 'a;

    fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn cursor_at_root(&mut self, tree_index: usize) -> HyperTreeCursor<'_> {
        self.trees[tree_index].cursor()
    }
}
