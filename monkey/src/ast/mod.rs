//! Abstract Syntax Tree definitions

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of statements; its value is the value of the last one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Spanned<Stmt>>,
}
