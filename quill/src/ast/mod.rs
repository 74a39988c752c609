//! Abstract Syntax Tree definitions
//!
//! The parser produces one [`Spanned<Expr>`] per top-level statement; the
//! runtime consumes them without mutating the tree.

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of top-level statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Spanned<Expr>>,
}
