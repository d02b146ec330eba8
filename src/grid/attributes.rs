//! Per-leaf attribute arrays.

use super::store::LeafAttributeSink;

/// Name given to the per-leaf scalar array.
pub const CELL_VALUE_NAME: &str = "Cell Value";

/// Packed, grow-on-demand bit array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitArray {
    words: Vec<u64>,
    len: usize,
}

impl BitArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set bit `index`, growing the array with zeros if needed.
    pub fn insert(&mut self, index: usize, value: bool) {
        if index >= self.len {
            self.len = index + 1;
            self.words.resize(self.len.div_ceil(64), 0);
        }
        let bit = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= bit;
        } else {
            self.words[index / 64] &= !bit;
        }
    }

    /// Bit at `index`; bits past the end read as zero.
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Leaf attribute storage: one scalar per leaf and an optional blank bit.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafData {
    name: String,
    scalars: Vec<f64>,
    /// Empty until the first mask write
    blanked: BitArray,
}

impl Default for LeafData {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafData {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            name: CELL_VALUE_NAME.to_string(),
            scalars: Vec::with_capacity(capacity),
            blanked: BitArray::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Reserve room for at least `additional` more scalars.
    pub fn reserve(&mut self, additional: usize) {
        self.scalars.reserve(additional);
    }

    pub fn scalars(&self) -> &[f64] {
        &self.scalars
    }

    pub fn scalar(&self, leaf_id: usize) -> Option<f64> {
        self.scalars.get(leaf_id).copied()
    }

    /// True once any blank bit has been written.
    pub fn has_mask(&self) -> bool {
        !self.blanked.is_empty()
    }

    pub fn mask(&self) -> &BitArray {
        &self.blanked
    }

    pub fn is_blanked(&self, leaf_id: usize) -> bool {
        self.blanked.get(leaf_id)
    }

    pub fn blanked_count(&self) -> usize {
        self.blanked.count_ones()
    }

    /// Copy every slot of `other` into this storage, shifted by `offset`.
    pub fn merge_at(&mut self, offset: usize, other: &LeafData) {
        for (i, &value) in other.scalars.iter().enumerate() {
            self.insert_scalar(offset + i, value);
        }
        for i in 0..other.blanked.len() {
            self.insert_mask(offset + i, other.blanked.get(i));
        }
    }

    pub fn clear(&mut self) {
        self.scalars.clear();
        self.blanked = BitArray::new();
    }
}

impl LeafAttributeSink for LeafData {
    fn len(&self) -> usize {
        self.scalars.len()
    }

    fn insert_scalar(&mut self, leaf_id: usize, value: f64) {
        if leaf_id >= self.scalars.len() {
            self.scalars.resize(leaf_id + 1, 0.0);
        }
        self.scalars[leaf_id] = value;
    }

    fn insert_mask(&mut self, leaf_id: usize, blanked: bool) {
        self.blanked.insert(leaf_id, blanked);
    }
}
