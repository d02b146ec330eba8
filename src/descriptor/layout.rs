//! Per-level descriptor tables built from a validated token stream.

use crate::core::{Branching, Error, Result};
use super::token::{tokens, Symbol, Token};

/// Tokens of one level while it is being accumulated.
#[derive(Default)]
struct LevelBuffer {
    descriptor: String,
    blanked: Vec<bool>,
    refined: usize,
    leaves: usize,
}

impl LevelBuffer {
    fn push(&mut self, token: &Token) {
        self.descriptor.push(token.symbol.as_char());
        if token.material.is_some() {
            self.blanked.push(token.is_blanked());
        }
    }

    fn len(&self) -> usize {
        self.refined + self.leaves
    }
}

/// Validated, level-by-level view of a grid descriptor.
///
/// `levels[i]` holds the `R`/`.` tokens of depth `i` across the whole forest,
/// separators removed. Level 0 has one token per root tree; every deeper
/// level has `block_size` tokens per `R` of the level above, grouped by
/// parent in the order the parents appear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorLayout {
    branching: Branching,
    levels: Vec<String>,
    /// Blank flag per token, parallel to `levels`; empty unless a material
    /// mask was parsed
    masks: Vec<Vec<bool>>,
    max_depth: usize,
}

impl DescriptorLayout {
    /// Parse and validate a descriptor and its optional material mask.
    ///
    /// Errors are reported in descriptor order: a level whose cardinality
    /// is wrong fails before any character after its `|` is looked at.
    ///
    /// `requested_max_depth` is lowered to the number of described levels
    /// when the descriptor is shallower; it is never raised.
    pub fn parse(
        descriptor: &str,
        material_mask: Option<&str>,
        branching: Branching,
        root_tree_count: usize,
        requested_max_depth: usize,
    ) -> Result<Self> {
        let block_size = branching.validate()?;
        let masked = material_mask.is_some();

        let mut levels = Vec::new();
        let mut masks = Vec::new();
        let mut current = LevelBuffer::default();
        let mut expected = root_tree_count;

        for token in tokens(descriptor, material_mask)? {
            let token = token?;
            match token.symbol {
                Symbol::Space => continue,
                Symbol::LevelEnd => {
                    check_cardinality(descriptor, levels.len(), &current, expected)?;
                    expected = current.refined.saturating_mul(block_size);
                    let closed = std::mem::take(&mut current);
                    levels.push(closed.descriptor);
                    if masked {
                        masks.push(closed.blanked);
                    }
                }
                Symbol::Refine => {
                    if token.is_blanked() {
                        return Err(Error::RefinedWithoutMaterial { position: token.position });
                    }
                    current.push(&token);
                    current.refined += 1;
                }
                Symbol::Leaf => {
                    current.push(&token);
                    current.leaves += 1;
                }
            }
        }

        // Trailing level has no terminating '|'
        check_cardinality(descriptor, levels.len(), &current, expected)?;
        levels.push(current.descriptor);
        if masked {
            masks.push(current.blanked);
        }

        let requested_max_depth = requested_max_depth.max(1);
        let max_depth = if levels.len() < requested_max_depth {
            log::debug!(
                "Descriptor describes {} levels, lowering maximum depth from {}",
                levels.len(),
                requested_max_depth
            );
            levels.len()
        } else {
            requested_max_depth
        };

        Ok(Self { branching, levels, masks, max_depth })
    }

    pub fn branching(&self) -> Branching {
        self.branching
    }

    pub fn block_size(&self) -> usize {
        self.branching.block_size()
    }

    /// Number of parsed levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Effective maximum depth: generation never refines a node at
    /// `max_depth - 1` or deeper.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// True if a material mask was parsed alongside the descriptor.
    pub fn is_masked(&self) -> bool {
        !self.masks.is_empty()
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> &str {
        &self.levels[level]
    }

    /// Blank flags of a level, one per token, if masking is enabled.
    pub fn level_mask(&self, level: usize) -> Option<&[bool]> {
        self.masks.get(level).map(Vec::as_slice)
    }

    /// Number of `R` tokens at a level.
    pub fn refined_count(&self, level: usize) -> usize {
        self.levels[level].bytes().filter(|&b| b == b'R').count()
    }

    /// Fresh per-level refined-node counters, all zero.
    pub fn level_counters(&self) -> Vec<usize> {
        vec![0; self.levels.len()]
    }

    /// Number of leaves a generation pass produces under the depth cap.
    ///
    /// Every node at the last reachable level is a leaf regardless of its
    /// token.
    pub fn leaf_count(&self) -> usize {
        let last = self.max_depth.saturating_sub(1);
        self.levels
            .iter()
            .take(self.max_depth)
            .enumerate()
            .map(|(level, tokens)| {
                if level == last {
                    tokens.len()
                } else {
                    tokens.bytes().filter(|&b| b == b'.').count()
                }
            })
            .sum()
    }

    /// Whether the node at `pointer` in `level` is marked for refinement.
    ///
    /// # Panics
    /// If `pointer` is outside the level; this means the generator walked a
    /// layout the parser never validated.
    pub fn refines(&self, level: usize, pointer: usize) -> bool {
        let tokens = self.levels.get(level).map(|l| l.as_bytes());
        token_at(tokens, level, pointer) == b'R'
    }

    /// Whether the mask blanks the node at `pointer` in `level`.
    ///
    /// Always false without a mask.
    ///
    /// # Panics
    /// Same as [`DescriptorLayout::refines`].
    pub fn is_blanked(&self, level: usize, pointer: usize) -> bool {
        self.is_masked() && token_at(self.masks.get(level).map(Vec::as_slice), level, pointer)
    }
}

fn token_at<T: Copy>(tokens: Option<&[T]>, level: usize, pointer: usize) -> T {
    match tokens.and_then(|tokens| tokens.get(pointer)) {
        Some(&t) => t,
        None => panic!(
            "descriptor layout has no token at level {level}, position {pointer}: \
             parser and generator disagree"
        ),
    }
}

fn check_cardinality(
    descriptor: &str,
    level: usize,
    buffer: &LevelBuffer,
    expected: usize,
) -> Result<()> {
    if buffer.len() == expected {
        return Ok(());
    }
    if level == 0 {
        Err(Error::RootCardinality {
            descriptor: descriptor.to_string(),
            expected,
            found: buffer.len(),
        })
    } else {
        Err(Error::LevelCardinality {
            level,
            level_descriptor: buffer.descriptor.clone(),
            expected,
            found: buffer.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCTREE: Branching = Branching::new(3, 2);
    const QUADTREE: Branching = Branching::new(2, 2);

    fn parse(descriptor: &str, roots: usize, depth: usize) -> Result<DescriptorLayout> {
        DescriptorLayout::parse(descriptor, None, OCTREE, roots, depth)
    }

    #[test]
    fn test_single_level() {
        let layout = parse("...|", 3, 5).unwrap();
        assert_eq!(layout.level_count(), 2);
        assert_eq!(layout.level(0), "...");
        assert_eq!(layout.level(1), "");
        assert_eq!(layout.max_depth(), 2);
        assert_eq!(layout.leaf_count(), 3);
        assert!(!layout.is_masked());
    }

    #[test]
    fn test_separators_are_stripped() {
        let layout = DescriptorLayout::parse("R. | .. R.", None, QUADTREE, 2, 3).unwrap();
        assert_eq!(layout.levels(), &["R.".to_string(), "..R.".to_string()]);
        assert_eq!(layout.refined_count(1), 1);
    }

    #[test]
    fn test_cardinality_law_holds() {
        let layout = parse("R.|R.......|........", 2, 10).unwrap();
        for level in 1..layout.level_count() {
            assert_eq!(
                layout.level(level).len(),
                layout.refined_count(level - 1) * layout.block_size()
            );
        }
        assert_eq!(layout.level(0).len(), 2);
    }

    #[test]
    fn test_rejects_short_second_level() {
        let err = parse(
            "RR.|R..........|................................................",
            3,
            4,
        )
        .unwrap_err();
        match err {
            Error::LevelCardinality { level, expected, found, level_descriptor } => {
                assert_eq!(level, 1);
                assert_eq!(expected, 16);
                assert_eq!(found, 11);
                assert_eq!(level_descriptor, "R..........");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_wrong_root_count() {
        let err = parse("..|", 3, 2).unwrap_err();
        assert!(matches!(err, Error::RootCardinality { expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_root_count_checked_without_terminator() {
        let err = parse("....", 3, 1).unwrap_err();
        assert!(matches!(err, Error::RootCardinality { expected: 3, found: 4, .. }));
        assert!(parse("...", 3, 1).is_ok());
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(matches!(parse("", 1, 1), Err(Error::RootCardinality { .. })));
        let layout = parse("", 0, 1).unwrap();
        assert_eq!(layout.level_count(), 1);
        assert_eq!(layout.leaf_count(), 0);
    }

    #[test]
    fn test_trailing_empty_level_requires_no_refinement() {
        assert!(matches!(
            parse("R.|", 2, 3),
            Err(Error::LevelCardinality { level: 1, expected: 8, found: 0, .. })
        ));
    }

    #[test]
    fn test_unrecognized_character_reported() {
        let err = parse("R.|X.......", 2, 2).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedToken { found: 'X', position: 3, .. }));
    }

    #[test]
    fn test_depth_lowered_to_described_levels() {
        let layout = parse("R|........", 1, 8).unwrap();
        assert_eq!(layout.level_count(), 2);
        assert_eq!(layout.max_depth(), 2);
    }

    #[test]
    fn test_depth_cap_kept_when_shallower() {
        let layout = parse("R|R.......|........", 1, 2).unwrap();
        assert_eq!(layout.level_count(), 3);
        assert_eq!(layout.max_depth(), 2);
        // Level 1 is the last reachable level: all 8 nodes are leaves
        assert_eq!(layout.leaf_count(), 8);
    }

    #[test]
    fn test_mask_tables_parallel_descriptor() {
        let layout = DescriptorLayout::parse(
            "R.|.R..|....",
            Some("11|0111|1001"),
            Branching::new(2, 2),
            2,
            3,
        )
        .unwrap();
        assert!(layout.is_masked());
        assert_eq!(layout.level_mask(1), Some(&[true, false, false, false][..]));
        for level in 0..layout.level_count() {
            assert_eq!(layout.level_mask(level).unwrap().len(), layout.level(level).len());
        }
        assert!(layout.is_blanked(1, 0));
        assert!(!layout.is_blanked(1, 1));
        assert!(layout.is_blanked(2, 1));
    }

    #[test]
    fn test_refined_without_material_rejected() {
        let err = DescriptorLayout::parse("R.|..", Some("01|11"), Branching::new(1, 2), 2, 2)
            .unwrap_err();
        assert!(matches!(err, Error::RefinedWithoutMaterial { position: 0 }));
    }

    #[test]
    fn test_blanked_leaf_accepted() {
        let layout = DescriptorLayout::parse("R.|..", Some("10|00"), Branching::new(1, 2), 2, 2)
            .unwrap();
        assert!(layout.is_blanked(0, 1));
        assert!(layout.is_blanked(1, 0));
    }

    #[test]
    fn test_counters_one_per_level() {
        let layout = parse("R|........", 1, 2).unwrap();
        assert_eq!(layout.level_counters(), vec![0, 0]);
    }

    #[test]
    #[should_panic(expected = "parser and generator disagree")]
    fn test_out_of_range_lookup_panics() {
        let layout = parse("...", 3, 1).unwrap();
        layout.refines(0, 3);
    }

    #[test]
    fn test_multibyte_mask_characters_indexed_by_token() {
        let layout =
            DescriptorLayout::parse("..", Some("é0"), Branching::new(1, 2), 2, 1).unwrap();
        assert!(!layout.is_blanked(0, 0));
        assert!(layout.is_blanked(0, 1));

        let layout = DescriptorLayout::parse(
            "R.|....",
            Some("ü1|ø0é0"),
            QUADTREE,
            2,
            2,
        )
        .unwrap();
        assert_eq!(layout.level_mask(1), Some(&[false, true, false, true][..]));
        assert!(layout.is_blanked(1, 3));
    }

    #[test]
    fn test_cardinality_reported_before_later_characters() {
        let err = parse("..|x", 3, 2).unwrap_err();
        assert!(matches!(err, Error::RootCardinality { expected: 3, found: 2, .. }));

        let err = DescriptorLayout::parse("R.|...|x", None, Branching::new(1, 2), 2, 3)
            .unwrap_err();
        assert!(matches!(err, Error::LevelCardinality { level: 1, expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_rejects_invalid_branching() {
        for branching in [
            Branching::new(3, u32::MAX),
            Branching::new(2, 0),
            Branching::new(2, 1),
            Branching::new(0, 2),
            Branching::new(4, 2),
        ] {
            let err = DescriptorLayout::parse(".", None, branching, 1, 1).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{branching:?} gave {err}");
        }
    }
}
