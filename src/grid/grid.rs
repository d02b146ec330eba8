//! Hyper tree grid: a rectilinear arrangement of root cells, each holding
//! one hyper tree, plus per-leaf attributes.

use glam::{DVec3, UVec3};

use crate::core::Branching;
use super::attributes::LeafData;
use super::forest::HyperTreeForest;
use super::store::LeafAttributeSink;

#[derive(Clone, Debug)]
pub struct HyperTreeGrid {
    /// Root cells per axis
    grid_size: UVec3,
    branching: Branching,
    use_dual_grid: bool,
    /// Point coordinates per axis, `grid_size[axis] + 1` values each
    coordinates: [Vec<f64>; 3],
    forest: HyperTreeForest,
    leaf_data: LeafData,
}

impl HyperTreeGrid {
    /// Create a grid of single-leaf trees with unit-spaced coordinates.
    pub fn new(grid_size: UVec3, branching: Branching) -> Self {
        let tree_count = (grid_size.x as usize) * (grid_size.y as usize) * (grid_size.z as usize);
        let unit = |n: u32| (0..=n).map(f64::from).collect::<Vec<_>>();
        Self {
            grid_size,
            branching,
            use_dual_grid: false,
            coordinates: [unit(grid_size.x), unit(grid_size.y), unit(grid_size.z)],
            forest: HyperTreeForest::new(branching, tree_count),
            leaf_data: LeafData::new(),
        }
    }

    pub fn grid_size(&self) -> UVec3 {
        self.grid_size
    }

    pub fn branching(&self) -> Branching {
        self.branching
    }

    pub fn dimension(&self) -> u32 {
        self.branching.dimension
    }

    pub fn branch_factor(&self) -> u32 {
        self.branching.factor
    }

    pub fn use_dual_grid(&self) -> bool {
        self.use_dual_grid
    }

    pub fn set_use_dual_grid(&mut self, dual: bool) {
        self.use_dual_grid = dual;
    }

    /// Point coordinates along `axis` (0 = x, 1 = y, 2 = z).
    pub fn coordinates(&self, axis: usize) -> &[f64] {
        &self.coordinates[axis]
    }

    /// Replace the point coordinates along `axis`.
    ///
    /// # Panics
    /// If `values` does not hold `grid_size[axis] + 1` entries.
    pub fn set_coordinates(&mut self, axis: usize, values: Vec<f64>) {
        let expected = self.grid_size[axis] as usize + 1;
        assert_eq!(values.len(), expected, "axis {axis} needs {expected} coordinates");
        self.coordinates[axis] = values;
    }

    /// First coordinate of each axis.
    pub fn origin(&self) -> DVec3 {
        let first = |axis: usize| self.coordinates[axis].first().copied().unwrap_or(0.0);
        DVec3::new(first(0), first(1), first(2))
    }

    /// Linear index of the root cell at `(x, y, z)`, x fastest.
    pub fn tree_index(&self, x: u32, y: u32, z: u32) -> usize {
        let n = self.grid_size;
        ((z as usize * n.y as usize + y as usize) * n.x as usize) + x as usize
    }

    pub fn tree_count(&self) -> usize {
        self.forest.trees().len()
    }

    pub fn forest(&self) -> &HyperTreeForest {
        &self.forest
    }

    pub fn leaf_data(&self) -> &LeafData {
        &self.leaf_data
    }

    pub fn leaf_data_mut(&mut self) -> &mut LeafData {
        &mut self.leaf_data
    }

    /// Split borrow of the trees and the attribute storage.
    pub fn parts_mut(&mut self) -> (&mut HyperTreeForest, &mut LeafData) {
        (&mut self.forest, &mut self.leaf_data)
    }

    pub fn number_of_leaves(&self) -> usize {
        self.forest.leaf_count()
    }

    pub fn number_of_levels(&self) -> usize {
        self.forest.number_of_levels()
    }

    /// True if the attribute arrays hold exactly one slot per leaf.
    pub fn check_attributes(&self) -> bool {
        let leaves = self.number_of_leaves();
        self.leaf_data.len() == leaves
            && (!self.leaf_data.has_mask() || self.leaf_data.mask().len() == leaves)
    }
}
