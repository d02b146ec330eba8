//! Seams between the generator and the storage it builds into.
//!
//! The generator only ever reaches tree topology through a [`TreeCursor`]
//! and writes leaf values through a [`LeafAttributeSink`]; any tree
//! implementation honoring these traits can be driven by it.

/// Cursor over a single tree.
///
/// A cursor exclusively borrows its tree, so structural changes go through
/// it and no other handle into the tree can be left dangling.
pub trait TreeCursor {
    /// Depth of the current node (root = 0).
    fn level(&self) -> usize;

    /// True if the current node has no children.
    fn is_leaf(&self) -> bool;

    /// Ordinal of the current leaf within its tree.
    ///
    /// A leaf is numbered on the first call, in call order, and keeps its
    /// ordinal afterwards. Numbering every leaf of a tree once yields
    /// ordinals densely covering `0..leaf_count`.
    fn leaf_ordinal(&mut self) -> usize;

    /// Turn the current leaf into an internal node with a full block of
    /// leaf children. The cursor stays on the node.
    fn subdivide_leaf(&mut self);

    /// Move to a child of the current (internal) node.
    fn to_child(&mut self, child: usize);

    /// Move back to the parent of the current node.
    fn to_parent(&mut self);
}

/// A collection of independently rooted trees.
pub trait TreeForest {
    type Cursor<'a>: TreeCursor
    where
        Self: 'a;

    fn tree_count(&self) -> usize;

    /// Cursor positioned at the root of `tree_index`.
    fn cursor_at_root(&mut self, tree_index: usize) -> Self::Cursor<'_>;
}

/// Sparse, grow-on-demand per-leaf attribute storage.
pub trait LeafAttributeSink {
    /// Number of allocated slots (highest written leaf id + 1).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_scalar(&mut self, leaf_id: usize, value: f64);

    fn insert_mask(&mut self, leaf_id: usize, blanked: bool);
}
