//! Core type aliases and re-exports

pub use glam::{DVec3, UVec3};

use crate::core::error::Error;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Refinement shape shared by every tree of a grid.
///
/// A refined node splits each of the first `dimension` axes into `factor`
/// parts, producing `factor^dimension` children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Branching {
    /// Number of refined axes (1..=3)
    pub dimension: u32,
    /// Children per refined axis
    pub factor: u32,
}

impl Branching {
    pub const fn new(dimension: u32, factor: u32) -> Self {
        Self { dimension, factor }
    }

    /// Number of children of a refined node.
    pub fn block_size(&self) -> usize {
        (self.factor as usize).pow(self.dimension)
    }

    /// Block size, or `None` if it does not fit in a `usize`.
    pub fn checked_block_size(&self) -> Option<usize> {
        (self.factor as usize).checked_pow(self.dimension)
    }

    /// Check the shape and return its block size.
    ///
    /// The dimension must be 1..=3, the factor at least 2, and the block
    /// size must fit in a `usize`.
    pub fn validate(&self) -> Result<usize> {
        if !(1..=3).contains(&self.dimension) {
            return Err(Error::Config(format!(
                "dimension must be 1, 2 or 3, got {}",
                self.dimension
            )));
        }
        if self.factor < 2 {
            return Err(Error::Config(format!(
                "branch factor must be at least 2, got {}",
                self.factor
            )));
        }
        self.checked_block_size().ok_or_else(|| {
            Error::Config(format!(
                "branch factor {} is too large for dimension {}",
                self.factor, self.dimension
            ))
        })
    }

    /// Children per axis; axes beyond the dimension collapse to 1.
    pub fn axis_extents(&self) -> UVec3 {
        let f = self.factor;
        match self.dimension {
            0 => UVec3::ONE,
            1 => UVec3::new(f, 1, 1),
            2 => UVec3::new(f, f, 1),
            _ => UVec3::splat(f),
        }
    }

    /// Per-axis offset of a child inside its parent.
    ///
    /// Children are numbered with z outermost and x fastest, so child `i`
    /// sits at `x + ex * (y + ey * z)`.
    pub fn child_offset(&self, child: usize) -> UVec3 {
        let ext = self.axis_extents();
        let c = child as u32;
        UVec3::new(c % ext.x, (c / ext.x) % ext.y, c / (ext.x * ext.y))
    }
}
