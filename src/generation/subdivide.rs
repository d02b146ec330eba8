//! Descriptor-driven subdivision of one tree at a time.
//!
//! The walk is depth-first with children visited in fan-out order. It keeps
//! an explicit frame stack instead of recursing, so tree depth is bounded by
//! memory rather than the thread stack.

use crate::descriptor::DescriptorLayout;
use crate::grid::store::{LeafAttributeSink, TreeCursor};

/// A refined node whose children are still being visited.
struct Frame {
    level: usize,
    /// Ordinal of this node among refined nodes of its level
    ordinal: usize,
    next_child: usize,
}

/// Builds trees from a validated [`DescriptorLayout`].
///
/// Holds the per-level refined-node counters for one generation pass. Trees
/// must be fed in forest order, since each refined node's ordinal (and so
/// the position of its children in the next level) depends on every refined
/// node finished before it.
pub struct Subdivider<'a> {
    layout: &'a DescriptorLayout,
    counters: Vec<usize>,
    stack: Vec<Frame>,
}

impl<'a> Subdivider<'a> {
    /// Start a generation pass with all counters at zero.
    pub fn new(layout: &'a DescriptorLayout) -> Self {
        Self::with_counters(layout, layout.level_counters())
    }

    /// Resume a pass from a counter snapshot taken before some tree.
    pub fn with_counters(layout: &'a DescriptorLayout, counters: Vec<usize>) -> Self {
        assert_eq!(
            counters.len(),
            layout.level_count(),
            "one counter per descriptor level"
        );
        Self {
            layout,
            counters,
            stack: Vec::with_capacity(layout.max_depth()),
        }
    }

    pub fn layout(&self) -> &DescriptorLayout {
        self.layout
    }

    /// Refined nodes finished so far, per level.
    pub fn counters(&self) -> &[usize] {
        &self.counters
    }

    /// Build the tree rooted at `tree_index` through `cursor`, writing one
    /// scalar (and blank bit when masked) per leaf at
    /// `leaf_offset + cursor.leaf_ordinal()`. Leaves are numbered as the
    /// walk finishes them, so ids follow depth-first discovery order.
    ///
    /// Returns the number of leaves written.
    ///
    /// # Panics
    /// If the layout and the walk disagree on a token position, which
    /// cannot happen for a layout produced by [`DescriptorLayout::parse`].
    pub fn generate_tree<C, S>(
        &mut self,
        tree_index: usize,
        cursor: &mut C,
        sink: &mut S,
        leaf_offset: usize,
    ) -> usize
    where
        C: TreeCursor,
        S: LeafAttributeSink,
    {
        debug_assert!(self.stack.is_empty());
        let block_size = self.layout.block_size();

        if !self.visit(0, tree_index, cursor, sink, leaf_offset) {
            return 1;
        }

        let mut leaves = 0;
        while let Some(frame) = self.stack.last_mut() {
            if frame.next_child < block_size {
                let child = frame.next_child;
                frame.next_child += 1;
                let level = frame.level + 1;
                let pointer = child + frame.ordinal * block_size;

                cursor.to_child(child);
                if !self.visit(level, pointer, cursor, sink, leaf_offset) {
                    leaves += 1;
                    cursor.to_parent();
                }
            } else {
                let level = frame.level;
                self.stack.pop();
                self.counters[level] += 1;
                if !self.stack.is_empty() {
                    cursor.to_parent();
                }
            }
        }
        leaves
    }

    /// Handle the node under the cursor. Returns true if it was refined and
    /// a frame was pushed for its children.
    fn visit<C, S>(
        &mut self,
        level: usize,
        pointer: usize,
        cursor: &mut C,
        sink: &mut S,
        leaf_offset: usize,
    ) -> bool
    where
        C: TreeCursor,
        S: LeafAttributeSink,
    {
        debug_assert_eq!(cursor.level(), level, "cursor and walk disagree on depth");
        debug_assert!(cursor.is_leaf(), "visited node already refined");

        // Depth cap overrides the descriptor
        let refine = self.layout.refines(level, pointer) && level + 1 < self.layout.max_depth();

        if refine {
            cursor.subdivide_leaf();
            self.stack.push(Frame {
                level,
                ordinal: self.counters[level],
                next_child: 0,
            });
        } else {
            let id = leaf_offset + cursor.leaf_ordinal();
            sink.insert_scalar(id, level as f64);
            if self.layout.is_masked() {
                sink.insert_mask(id, self.layout.is_blanked(level, pointer));
            }
        }
        refine
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::core::Branching;
    use crate::grid::{HyperTree, LeafData};

    /// Sink that records every write and fails on a second write to an id.
    #[derive(Default)]
    struct RecordingSink {
        scalars: BTreeMap<usize, f64>,
        mask: BTreeMap<usize, bool>,
    }

    impl LeafAttributeSink for RecordingSink {
        fn len(&self) -> usize {
            self.scalars.keys().next_back().map_or(0, |&id| id + 1)
        }

        fn insert_scalar(&mut self, leaf_id: usize, value: f64) {
            assert!(self.scalars.insert(leaf_id, value).is_none(), "leaf {leaf_id} written twice");
        }

        fn insert_mask(&mut self, leaf_id: usize, blanked: bool) {
            assert!(self.mask.insert(leaf_id, blanked).is_none(), "mask {leaf_id} written twice");
        }
    }

    fn layout(descriptor: &str, mask: Option<&str>, b: Branching, roots: usize, depth: usize) -> DescriptorLayout {
        DescriptorLayout::parse(descriptor, mask, b, roots, depth).unwrap()
    }

    #[test]
    fn test_leaf_roots() {
        let layout = layout("...|", None, Branching::new(3, 2), 3, 1);
        let mut subdivider = Subdivider::new(&layout);
        let mut sink = RecordingSink::default();
        let mut offset = 0;
        for tree_index in 0..3 {
            let mut tree = HyperTree::new(layout.branching());
            let leaves = subdivider.generate_tree(tree_index, &mut tree.cursor(), &mut sink, offset);
            assert_eq!(leaves, 1);
            offset += leaves;
        }
        assert_eq!(sink.scalars.len(), 3);
        assert!(sink.scalars.values().all(|&v| v == 0.0));
        assert!(sink.mask.is_empty());
    }

    #[test]
    fn test_single_refined_root() {
        let layout = layout("R|....", None, Branching::new(2, 2), 1, 4);
        let mut tree = HyperTree::new(layout.branching());
        let mut data = LeafData::new();
        let leaves = Subdivider::new(&layout).generate_tree(0, &mut tree.cursor(), &mut data, 0);
        assert_eq!(leaves, 4);
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(data.scalars(), &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_scalar_is_leaf_depth() {
        // Child 2 of the root is refined again
        let layout = layout("R|..R.|....", None, Branching::new(2, 2), 1, 5);
        let mut tree = HyperTree::new(layout.branching());
        let mut data = LeafData::new();
        Subdivider::new(&layout).generate_tree(0, &mut tree.cursor(), &mut data, 0);

        assert_eq!(tree.number_of_levels(), 3);
        let depths = tree.leaf_depths();
        assert_eq!(depths.len(), 7);
        for (ordinal, depth) in depths.iter().enumerate() {
            assert_eq!(data.scalar(ordinal), Some(*depth as f64));
        }
    }

    #[test]
    fn test_leaf_ids_in_discovery_order() {
        let layout = layout("R|..R.|....", None, Branching::new(2, 2), 1, 3);
        let mut tree = HyperTree::new(layout.branching());
        let mut data = LeafData::new();
        Subdivider::new(&layout).generate_tree(0, &mut tree.cursor(), &mut data, 0);
        assert_eq!(data.scalars(), &[1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_children_windows_follow_refined_ordinals() {
        // Two refined roots in a 1D binary forest; the second root's children
        // start at pointer 2 of level 1.
        let layout = layout("RR|.R..|..", None, Branching::new(1, 2), 2, 3);
        let mut subdivider = Subdivider::new(&layout);
        let mut data = LeafData::new();

        let mut first = HyperTree::new(layout.branching());
        let n0 = subdivider.generate_tree(0, &mut first.cursor(), &mut data, 0);
        assert_eq!(n0, 3);
        assert_eq!(subdivider.counters(), &[1, 1, 0]);

        let mut second = HyperTree::new(layout.branching());
        let n1 = subdivider.generate_tree(1, &mut second.cursor(), &mut data, n0);
        assert_eq!(n1, 2);
        assert_eq!(subdivider.counters(), &[2, 1, 0]);

        assert_eq!(first.number_of_levels(), 3);
        assert_eq!(second.number_of_levels(), 2);
        assert_eq!(data.scalars(), &[1.0, 2.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_depth_cap_forces_leaves() {
        let layout = layout("R|R...|....", None, Branching::new(2, 2), 1, 2);
        let mut tree = HyperTree::new(layout.branching());
        let mut data = LeafData::new();
        let leaves = Subdivider::new(&layout).generate_tree(0, &mut tree.cursor(), &mut data, 0);
        assert_eq!(leaves, 4);
        assert_eq!(leaves, layout.leaf_count());
        assert_eq!(tree.number_of_levels(), 2);
    }

    #[test]
    fn test_mask_bits_written() {
        let layout = layout("R.|....", Some("10|0110"), Branching::new(2, 2), 2, 2);
        let mut subdivider = Subdivider::new(&layout);
        let mut sink = RecordingSink::default();
        let mut offset = 0;
        for tree_index in 0..2 {
            let mut tree = HyperTree::new(layout.branching());
            offset += subdivider.generate_tree(tree_index, &mut tree.cursor(), &mut sink, offset);
        }
        assert_eq!(offset, 5);
        let blanked: Vec<bool> = sink.mask.values().copied().collect();
        assert_eq!(blanked, vec![true, false, false, true, true]);
    }

    #[test]
    fn test_leaf_ids_offset_per_tree() {
        let layout = layout("R.|........", None, Branching::new(3, 2), 2, 2);
        let mut subdivider = Subdivider::new(&layout);
        let mut sink = RecordingSink::default();
        let mut tree0 = HyperTree::new(layout.branching());
        let mut tree1 = HyperTree::new(layout.branching());
        subdivider.generate_tree(0, &mut tree0.cursor(), &mut sink, 0);
        let offset = sink.len();
        subdivider.generate_tree(1, &mut tree1.cursor(), &mut sink, offset);
        let ids: Vec<usize> = sink.scalars.keys().copied().collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
        assert_eq!(sink.scalars[&8], 0.0);
    }

    #[test]
    #[should_panic(expected = "one counter per descriptor level")]
    fn test_counter_snapshot_must_match_levels() {
        let layout = layout("R|..", None, Branching::new(1, 2), 1, 2);
        Subdivider::with_counters(&layout, vec![0]);
    }
}
