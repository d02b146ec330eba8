//! Paired token stream over a descriptor and its optional material mask.
//!
//! Both strings are zipped once up front, so separator alignment between
//! them is checked here and never re-derived while levels are assembled.

use crate::core::{Error, Result, Separator};

/// One descriptor character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// `R`: the cell is refined
    Refine,
    /// `.`: the cell is a leaf
    Leaf,
    /// `' '`: ignored separator
    Space,
    /// `|`: end of level
    LevelEnd,
}

impl Symbol {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Symbol::Refine),
            '.' => Some(Symbol::Leaf),
            ' ' => Some(Symbol::Space),
            '|' => Some(Symbol::LevelEnd),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Refine => 'R',
            Symbol::Leaf => '.',
            Symbol::Space => ' ',
            Symbol::LevelEnd => '|',
        }
    }

    pub fn separator(self) -> Option<Separator> {
        match self {
            Symbol::Space => Some(Separator::Space),
            Symbol::LevelEnd => Some(Separator::Level),
            Symbol::Refine | Symbol::Leaf => None,
        }
    }
}

fn mask_separator(c: char) -> Option<Separator> {
    match c {
        ' ' => Some(Separator::Space),
        '|' => Some(Separator::Level),
        _ => None,
    }
}

/// A descriptor symbol paired with the mask character at the same position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    /// Character index in the descriptor
    pub position: usize,
    pub symbol: Symbol,
    /// Mask character, present only when masking is enabled
    pub material: Option<char>,
}

impl Token {
    /// True if the mask marks this cell as having no material.
    pub fn is_blanked(&self) -> bool {
        self.material == Some('0')
    }
}

/// Lazy paired token stream, yielding tokens in descriptor order.
///
/// An unknown character or a misaligned separator is yielded as an error at
/// its position; the stream ends after the first error.
pub struct Tokens<'a> {
    descriptor: &'a str,
    chars: std::iter::Enumerate<std::str::Chars<'a>>,
    mask: Option<std::str::Chars<'a>>,
    failed: bool,
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (position, c) = self.chars.next()?;
        let token = self.pair(position, c);
        self.failed = token.is_err();
        Some(token)
    }
}

impl Tokens<'_> {
    fn pair(&mut self, position: usize, c: char) -> Result<Token> {
        let symbol = Symbol::from_char(c).ok_or_else(|| Error::UnrecognizedToken {
            found: c,
            position,
            descriptor: self.descriptor.to_string(),
        })?;

        let material = self.mask.as_mut().and_then(|chars| chars.next());

        if let Some(m) = material {
            match (symbol.separator(), mask_separator(m)) {
                (Some(a), Some(b)) if a == b => {}
                (Some(separator), _) | (None, Some(separator)) => {
                    return Err(Error::SeparatorMismatch { separator, position });
                }
                (None, None) => {}
            }
        }

        Ok(Token { position, symbol, material })
    }
}

/// Pair `descriptor` with `mask` if given.
///
/// Only the length check happens up front; every other problem is reported
/// by the stream when it reaches the offending character.
pub fn tokens<'a>(descriptor: &'a str, mask: Option<&'a str>) -> Result<Tokens<'a>> {
    if let Some(mask) = mask {
        let descriptor_len = descriptor.chars().count();
        let mask_len = mask.chars().count();
        if mask_len != descriptor_len {
            return Err(Error::MaskLengthMismatch {
                descriptor: descriptor_len,
                mask: mask_len,
            });
        }
    }

    Ok(Tokens {
        descriptor,
        chars: descriptor.chars().enumerate(),
        mask: mask.map(str::chars),
        failed: false,
    })
}

/// Tokenize the whole of `descriptor`, pairing each character with `mask`
/// if given.
///
/// Fails on a length mismatch, an unknown descriptor character, or a
/// separator in either string that is not matched by the same separator in
/// the other.
pub fn tokenize(descriptor: &str, mask: Option<&str>) -> Result<Vec<Token>> {
    tokens(descriptor, mask)?.collect()
}
