//! Arena-backed hyper tree and its cursor.
//!
//! Nodes live in a single `Vec`; the children of a refined node are stored
//! contiguously starting at `first_child`. Leaves are numbered with a
//! per-tree ordinal the first time a cursor asks for one.

use glam::UVec3;

use crate::core::Branching;
use super::store::TreeCursor;

const NONE: u32 = u32::MAX;

/// A single node of a hyper tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeNode {
    /// Parent node index, `u32::MAX` for the root
    pub parent: u32,
    /// Index of the first child, `u32::MAX` for leaves
    pub first_child: u32,
    /// Leaf ordinal, `u32::MAX` for internal and not yet numbered nodes
    pub leaf: u32,
}

impl TreeNode {
    fn leaf(parent: u32) -> Self {
        Self { parent, first_child: NONE, leaf: NONE }
    }

    pub fn is_leaf(&self) -> bool {
        self.first_child == NONE
    }
}

/// One tree of a hyper tree grid.
///
/// A fresh tree is a single unnumbered root leaf. Leaves receive ordinals
/// `0, 1, 2, ...` in the order cursors first ask for them, so a depth-first
/// walk that numbers every leaf it finishes yields ordinals in discovery
/// order, densely covering `0..leaf_count`. A numbered leaf can no longer
/// be subdivided.
#[derive(Clone, Debug)]
pub struct HyperTree {
    nodes: Vec<TreeNode>,
    branching: Branching,
    leaf_count: u32,
    /// Next ordinal to hand out
    numbered: u32,
    number_of_levels: u32,
}

impl HyperTree {
    pub fn new(branching: Branching) -> Self {
        Self {
            nodes: vec![TreeNode::leaf(NONE)],
            branching,
            leaf_count: 1,
            numbered: 0,
            number_of_levels: 1,
        }
    }

    pub fn branching(&self) -> Branching {
        self.branching
    }

    pub fn node(&self, index: u32) -> &TreeNode {
        &self.nodes[index as usize]
    }

    pub fn nodes_slice(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count as usize
    }

    /// Number of leaves that have been given an ordinal.
    pub fn numbered_leaf_count(&self) -> usize {
        self.numbered as usize
    }

    /// Depth of the deepest leaf + 1.
    pub fn number_of_levels(&self) -> usize {
        self.number_of_levels as usize
    }

    /// Cursor at the root of this tree.
    pub fn cursor(&mut self) -> HyperTreeCursor<'_> {
        HyperTreeCursor { tree: self, path: vec![0], steps: Vec::new() }
    }

    /// Depth of every leaf in depth-first order, children in fan-out order.
    pub fn leaf_depths(&self) -> Vec<usize> {
        let mut depths = Vec::with_capacity(self.leaf_count());
        let block = self.branching.block_size() as u32;
        let mut stack = vec![(0u32, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = self.nodes[index as usize];
            if node.is_leaf() {
                depths.push(depth);
            } else {
                stack.extend((0..block).rev().map(|c| (node.first_child + c, depth + 1)));
            }
        }
        depths
    }

    fn number_leaf(&mut self, index: u32) -> u32 {
        let node = &mut self.nodes[index as usize];
        if node.leaf == NONE {
            node.leaf = self.numbered;
            self.numbered += 1;
        }
        node.leaf
    }

    fn subdivide(&mut self, index: u32, level: usize) {
        let node = self.nodes[index as usize];
        assert!(node.is_leaf(), "cannot subdivide internal node {index}");
        assert_eq!(node.leaf, NONE, "cannot subdivide numbered leaf {index}");

        let block = self.branching.block_size();
        // Leaves never outnumber nodes, so this bounds both counters
        assert!(
            self.nodes.len().saturating_add(block) < NONE as usize,
            "hyper tree node count exceeds u32 range"
        );
        let first_child = self.nodes.len() as u32;
        self.nodes.extend((0..block).map(|_| TreeNode::leaf(index)));
        self.leaf_count += block as u32 - 1;

        let parent = &mut self.nodes[index as usize];
        parent.first_child = first_child;
        self.number_of_levels = self.number_of_levels.max(level as u32 + 2);
    }
}

/// Cursor over a [`HyperTree`], holding the path from the root.
pub struct HyperTreeCursor<'a> {
    tree: &'a mut HyperTree,
    /// Node indices from the root to the current node
    path: Vec<u32>,
    /// Child index taken at each step below the root
    steps: Vec<u32>,
}

impl HyperTreeCursor<'_> {
    fn current(&self) -> &TreeNode {
        // path always holds at least the root
        &self.tree.nodes[self.path[self.path.len() - 1] as usize]
    }

    /// Index of the current node in the tree's arena.
    pub fn node_index(&self) -> u32 {
        self.path[self.path.len() - 1]
    }

    /// Integer coordinates of the current cell among all cells of its level
    /// inside this tree.
    pub fn cell_index(&self) -> UVec3 {
        let ext = self.tree.branching.axis_extents();
        self.steps.iter().fold(UVec3::ZERO, |idx, &child| {
            idx * ext + self.tree.branching.child_offset(child as usize)
        })
    }
}

impl TreeCursor for HyperTreeCursor<'_> {
    fn level(&self) -> usize {
        self.steps.len()
    }

    fn is_leaf(&self) -> bool {
        self.current().is_leaf()
    }

    fn leaf_ordinal(&mut self) -> usize {
        assert!(self.current().is_leaf(), "cursor is not on a leaf");
        let index = self.node_index();
        self.tree.number_leaf(index) as usize
    }

    fn subdivide_leaf(&mut self) {
        let index = self.node_index();
        let level = self.level();
        self.tree.subdivide(index, level);
    }

    fn to_child(&mut self, child: usize) {
        let node = *self.current();
        assert!(!node.is_leaf(), "cursor is on a leaf");
        assert!(child < self.tree.branching.block_size(), "child {child} out of range");
        self.path.push(node.first_child + child as u32);
        self.steps.push(child as u32);
    }

    fn to_parent(&mut self) {
        assert!(self.path.len() > 1, "cursor is already at the root");
        self.path.pop();
        self.steps.pop();
    }
}
