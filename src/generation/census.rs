//! Sequential census of a descriptor, used to plan parallel generation.
//!
//! Walking the layout once without building anything yields, for every root
//! tree, the counter snapshot the subdivider holds when it reaches that tree
//! and the number of leaves it will emit. With those, trees can be built in
//! any order and still produce the same leaf ids as a sequential pass.

use crate::descriptor::DescriptorLayout;
use crate::grid::store::{LeafAttributeSink, TreeCursor};

use super::subdivide::Subdivider;

/// Cursor that tracks depth only. Every node reports leaf ordinal 0.
#[derive(Debug, Default)]
struct CensusCursor {
    level: usize,
    refined: Vec<bool>,
}

impl TreeCursor for CensusCursor {
    fn level(&self) -> usize {
        self.level
    }

    fn is_leaf(&self) -> bool {
        !self.refined.get(self.level).copied().unwrap_or(false)
    }

    fn leaf_ordinal(&mut self) -> usize {
        0
    }

    fn subdivide_leaf(&mut self) {
        if self.refined.len() <= self.level {
            self.refined.resize(self.level + 1, false);
        }
        self.refined[self.level] = true;
    }

    fn to_child(&mut self, _child: usize) {
        self.level += 1;
        if let Some(flag) = self.refined.get_mut(self.level) {
            *flag = false;
        }
    }

    fn to_parent(&mut self) {
        self.level -= 1;
    }
}

/// Sink that only counts scalar writes.
#[derive(Debug, Default)]
struct CountingSink {
    writes: usize,
}

impl LeafAttributeSink for CountingSink {
    fn len(&self) -> usize {
        self.writes
    }

    fn insert_scalar(&mut self, _leaf_id: usize, _value: f64) {
        self.writes += 1;
    }

    fn insert_mask(&mut self, _leaf_id: usize, _blanked: bool) {}
}

/// Where one root tree starts in a generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreePlan {
    /// Level counters as they stand when the tree is reached
    pub counters: Vec<usize>,
    /// Forest-wide id of the tree's first leaf
    pub leaf_offset: usize,
    pub leaf_count: usize,
}

/// Per-tree plans for a whole forest, in tree order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForestPlan {
    pub trees: Vec<TreePlan>,
    pub total_leaves: usize,
}

/// Run the census for `tree_count` roots over `layout`.
pub fn plan_forest(layout: &DescriptorLayout, tree_count: usize) -> ForestPlan {
    let mut subdivider = Subdivider::new(layout);
    let mut sink = CountingSink::default();
    let mut trees = Vec::with_capacity(tree_count);
    let mut total_leaves = 0;

    for tree_index in 0..tree_count {
        let counters = subdivider.counters().to_vec();
        let mut cursor = CensusCursor::default();
        let leaf_count = subdivider.generate_tree(tree_index, &mut cursor, &mut sink, 0);
        trees.push(TreePlan { counters, leaf_offset: total_leaves, leaf_count });
        total_leaves += leaf_count;
    }

    debug_assert_eq!(sink.len(), total_leaves);
    log::debug!("Census: {} trees, {} leaves", tree_count, total_leaves);
    ForestPlan { trees, total_leaves }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Branching;

    #[test]
    fn test_plan_offsets_are_prefix_sums() {
        let layout =
            DescriptorLayout::parse("R.R|........ ........", None, Branching::new(3, 2), 3, 2)
                .unwrap();
        let plan = plan_forest(&layout, 3);

        assert_eq!(plan.total_leaves, 17);
        assert_eq!(plan.total_leaves, layout.leaf_count());
        let offsets: Vec<usize> = plan.trees.iter().map(|t| t.leaf_offset).collect();
        let counts: Vec<usize> = plan.trees.iter().map(|t| t.leaf_count).collect();
        assert_eq!(counts, vec![8, 1, 8]);
        assert_eq!(offsets, vec![0, 8, 9]);
    }

    #[test]
    fn test_counter_snapshots() {
        let layout =
            DescriptorLayout::parse("RR|.R..|..", None, Branching::new(1, 2), 2, 3).unwrap();
        let plan = plan_forest(&layout, 2);
        assert_eq!(plan.trees[0].counters, vec![0, 0, 0]);
        assert_eq!(plan.trees[1].counters, vec![1, 1, 0]);
        assert_eq!(plan.total_leaves, 5);
    }

    #[test]
    fn test_depth_cap_respected() {
        let layout =
            DescriptorLayout::parse("R|R...|....", None, Branching::new(2, 2), 1, 2).unwrap();
        let plan = plan_forest(&layout, 1);
        assert_eq!(plan.total_leaves, 4);
    }

    #[test]
    fn test_empty_forest() {
        let layout = DescriptorLayout::parse("", None, Branching::new(3, 2), 0, 1).unwrap();
        let plan = plan_forest(&layout, 0);
        assert!(plan.trees.is_empty());
        assert_eq!(plan.total_leaves, 0);
    }

    #[test]
    fn test_census_cursor_tracks_depth() {
        let mut cursor = CensusCursor::default();
        assert!(cursor.is_leaf());
        cursor.subdivide_leaf();
        assert!(!cursor.is_leaf());
        cursor.to_child(3);
        assert_eq!(cursor.level(), 1);
        assert!(cursor.is_leaf());
        cursor.to_parent();
        assert_eq!(cursor.level(), 0);
        assert!(!cursor.is_leaf());
    }
}
