//! Error types for hyper tree grid generation

use std::fmt;

use thiserror::Error;

/// Separator characters that must line up between descriptor and mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Separator {
    /// `' '`, ignored inside a level
    Space,
    /// `'|'`, closes a level
    Level,
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Space => write!(f, "Space"),
            Separator::Level => write!(f, "Level"),
        }
    }
}

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Material mask is used but has length {mask} != {descriptor} which is the length of the grid descriptor")]
    MaskLengthMismatch { descriptor: usize, mask: usize },

    #[error("Unrecognized character: {found:?} at position {position} in string {descriptor:?}")]
    UnrecognizedToken {
        found: char,
        position: usize,
        descriptor: String,
    },

    #[error("{separator} separators do not match between descriptor and material mask at position {position}")]
    SeparatorMismatch { separator: Separator, position: usize },

    #[error("A refined branch must contain material (position {position})")]
    RefinedWithoutMaterial { position: usize },

    #[error("String {descriptor:?} describes {found} root cells != {expected}")]
    RootCardinality {
        descriptor: String,
        expected: usize,
        found: usize,
    },

    #[error("String level descriptor {level_descriptor:?} (level {level}) has cardinality {found} which is not expected value of {expected}")]
    LevelCardinality {
        level: usize,
        level_descriptor: String,
        expected: usize,
        found: usize,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors raised while validating the descriptor grammar or
    /// its level cardinalities.
    pub fn is_descriptor_error(&self) -> bool {
        matches!(
            self,
            Error::MaskLengthMismatch { .. }
                | Error::UnrecognizedToken { .. }
                | Error::SeparatorMismatch { .. }
                | Error::RefinedWithoutMaterial { .. }
                | Error::RootCardinality { .. }
                | Error::LevelCardinality { .. }
        )
    }
}
