//! Monkey interpreter library
//!
//! A small scripting language whose centrepiece is a mutable, shared array
//! value with a fixed method table and a JSON codec.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::{Error, Result};
