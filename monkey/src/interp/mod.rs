//! Tree-walking interpreter
//!
//! The array value lives in [`array`]; [`codec`] converts arrays to and from
//! JSON text and [`invoke`] lets array methods call back into interpreted
//! functions.

pub mod array;
pub mod codec;
mod env;
pub mod equality;
mod error;
mod eval;
mod invoke;
mod value;

pub use array::{Array, ArrayMethod, ArrayRef, Arity};
pub use env::{child_env, EnvRef, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{BuiltinFn, Interpreter};
pub use invoke::Closure;
pub use value::Value;
