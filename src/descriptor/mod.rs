//! Grid descriptor grammar.
//!
//! A descriptor lists, level by level, the refine (`R`) or leaf (`.`) status
//! of every node of a forest. `|` closes a level and `' '` may be used freely
//! for readability. An optional material mask of the same shape marks
//! blanked cells with `0`:
//!
//! ```text
//! descriptor: "R. | .R.. | ...."
//! mask:       "11 | 0111 | 1001"
//! ```

pub mod token;
pub mod layout;

pub use token::{tokenize, tokens, Symbol, Token, Tokens};
pub use layout::DescriptorLayout;
