//! Grid generation pipeline: configuration, descriptor parsing, and the
//! per-tree subdivision driver.
//!
//! [`GridSource`] orchestrates:
//! 1. Config validation and descriptor parsing ([`DescriptorLayout`])
//! 2. Grid parameters and axis coordinates
//! 3. One [`Subdivider`] pass over every root tree, in forest order
//!
//! Every error is reported before the output grid is touched.

pub mod census;
pub mod config;
pub mod subdivide;

pub use census::{plan_forest, ForestPlan, TreePlan};
pub use config::SourceConfig;
pub use subdivide::Subdivider;

use std::fmt;
use std::time::Instant;

use glam::DVec3;
use rayon::prelude::*;

use crate::core::Result;
use crate::descriptor::DescriptorLayout;
use crate::grid::{HyperTreeGrid, LeafAttributeSink, LeafData, TreeForest};

/// What a source reports about its output before generating it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridInformation {
    /// Upper bound on the number of levels
    pub levels: u32,
    pub dimension: u32,
    pub origin: DVec3,
}

/// Builds hyper tree grids from a [`SourceConfig`].
#[derive(Clone, Debug, Default)]
pub struct GridSource {
    config: SourceConfig,
}

impl GridSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SourceConfig {
        &mut self.config
    }

    /// Level bound, dimension and origin, without generating anything.
    pub fn information(&self) -> GridInformation {
        GridInformation {
            levels: self.config.max_level,
            dimension: self.config.dimension,
            origin: DVec3::ZERO,
        }
    }

    /// Validate the configuration and parse its descriptor.
    pub fn parse_layout(&self) -> Result<DescriptorLayout> {
        self.config.validate()?;
        DescriptorLayout::parse(
            &self.config.descriptor,
            self.config.material_mask(),
            self.config.branching(),
            self.config.root_tree_count(),
            self.config.requested_depth(),
        )
    }

    /// Generate a new grid.
    pub fn generate(&self) -> Result<HyperTreeGrid> {
        let layout = self.parse_layout()?;
        let mut grid = self.prepare_grid(&layout);
        self.populate(&layout, &mut grid);
        Ok(grid)
    }

    /// Generate into an existing grid, replacing its contents.
    ///
    /// On error the grid is left as it was.
    pub fn generate_into(&self, grid: &mut HyperTreeGrid) -> Result<()> {
        let layout = self.parse_layout()?;
        *grid = self.prepare_grid(&layout);
        self.populate(&layout, grid);
        Ok(())
    }

    /// Generate a new grid, building root trees on the rayon pool.
    ///
    /// Produces the same grid as [`GridSource::generate`].
    pub fn generate_parallel(&self) -> Result<HyperTreeGrid> {
        let layout = self.parse_layout()?;
        let mut grid = self.prepare_grid(&layout);
        let start = Instant::now();

        let plan = plan_forest(&layout, grid.tree_count());
        let (forest, leaf_data) = grid.parts_mut();

        let parts: Vec<LeafData> = forest
            .trees_mut()
            .par_iter_mut()
            .zip(plan.trees.par_iter())
            .enumerate()
            .map(|(tree_index, (tree, tree_plan))| {
                let mut subdivider = Subdivider::with_counters(&layout, tree_plan.counters.clone());
                let mut data = LeafData::with_capacity(tree_plan.leaf_count);
                let leaves = subdivider.generate_tree(tree_index, &mut tree.cursor(), &mut data, 0);
                debug_assert_eq!(leaves, tree_plan.leaf_count);
                data
            })
            .collect();

        for (tree_plan, data) in plan.trees.iter().zip(&parts) {
            leaf_data.merge_at(tree_plan.leaf_offset, data);
        }

        self.finish(&grid, start);
        Ok(grid)
    }

    /// Fresh grid carrying the configured parameters and coordinates.
    fn prepare_grid(&self, layout: &DescriptorLayout) -> HyperTreeGrid {
        let cfg = &self.config;
        let mut grid = HyperTreeGrid::new(cfg.grid_size, cfg.branching());
        grid.set_use_dual_grid(cfg.dual);
        for axis in 0..3 {
            grid.set_coordinates(axis, axis_coordinates(cfg.grid_size[axis], cfg.grid_scale[axis]));
        }

        let data = grid.leaf_data_mut();
        data.set_name(crate::grid::CELL_VALUE_NAME);
        data.reserve(self.reserve_hint().min(layout.leaf_count()));
        grid
    }

    /// Initial scalar capacity, `(branch_factor^(max_level - 1))^2`.
    fn reserve_hint(&self) -> usize {
        let exponent = self.config.max_level.saturating_sub(1);
        (self.config.branch_factor as usize)
            .saturating_pow(exponent)
            .saturating_pow(2)
    }

    fn populate(&self, layout: &DescriptorLayout, grid: &mut HyperTreeGrid) {
        let start = Instant::now();
        let size = grid.grid_size();
        let mut subdivider = Subdivider::new(layout);

        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let tree_index = grid.tree_index(x, y, z);
                    let (forest, leaf_data) = grid.parts_mut();
                    let offset = leaf_data.len();
                    let mut cursor = forest.cursor_at_root(tree_index);
                    subdivider.generate_tree(tree_index, &mut cursor, leaf_data, offset);
                }
            }
        }

        self.finish(grid, start);
    }

    fn finish(&self, grid: &HyperTreeGrid, start: Instant) {
        assert!(
            grid.check_attributes(),
            "leaf attributes out of step with the forest: {} values for {} leaves",
            grid.leaf_data().len(),
            grid.number_of_leaves()
        );
        log::info!(
            "Generated {} trees, {} leaves, {} levels in {:.1}ms",
            grid.tree_count(),
            grid.number_of_leaves(),
            grid.number_of_levels(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        if grid.leaf_data().has_mask() {
            log::debug!("{} leaves blanked", grid.leaf_data().blanked_count());
        }
    }
}

impl fmt::Display for GridSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = &self.config;
        let size = cfg.grid_size;
        let scale = cfg.grid_scale;
        writeln!(f, "Grid size:      {} x {} x {}", size.x, size.y, size.z)?;
        writeln!(f, "Grid scale:     {} x {} x {}", scale.x, scale.y, scale.z)?;
        writeln!(f, "Max level:      {}", cfg.max_level)?;
        writeln!(f, "Dimension:      {}", cfg.dimension)?;
        writeln!(f, "Branch factor:  {}", cfg.branch_factor)?;
        match cfg.branching().checked_block_size() {
            Some(block) => writeln!(f, "Block size:     {}", block)?,
            None => writeln!(f, "Block size:     overflow")?,
        }
        writeln!(f, "Dual grid:      {}", cfg.dual)?;
        writeln!(f, "Material mask:  {}", cfg.use_material_mask)?;
        writeln!(f, "Descriptor:     {}", cfg.descriptor)?;
        write!(f, "Mask:           {}", cfg.material_mask)
    }
}

/// `count + 1` evenly spaced coordinates starting at zero.
pub fn axis_coordinates(count: u32, scale: f64) -> Vec<f64> {
    (0..=count).map(|j| scale * f64::from(j)).collect()
}
