//! Closure invocation bridge
//!
//! Array methods that run interpreted code (`map`, `filter`, `reduce`) and
//! ordinary calls of function values all enter the evaluator through
//! [`Interpreter::invoke`].

use super::env::{child_env, EnvRef};
use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::value::Value;
use crate::ast::{Expr, LineIndex, Spanned};
use std::fmt;
use std::rc::Rc;

/// A function value: declared parameter names, a body block and the scope
/// the literal was evaluated in
pub struct Closure {
    pub params: Vec<String>,
    pub body: Spanned<Expr>,
    pub env: EnvRef,
    /// Line table of the source the literal appeared in
    pub lines: Rc<LineIndex>,
}

impl Closure {
    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

// The captured environment may contain this closure; printing it would recurse.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.body.span)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Evaluate `closure`'s body in a fresh child of `scope`
    ///
    /// Each `(index, value)` pair binds `closure.params[index]`. Callers check
    /// the closure's arity first; an index past the parameter list is a bug in
    /// the caller and panics. A `Return` result is unwrapped.
    pub fn invoke(
        &mut self,
        closure: &Closure,
        scope: &EnvRef,
        bound: impl IntoIterator<Item = (usize, Value)>,
    ) -> InterpResult<Value> {
        let local = child_env(scope);
        {
            let mut frame = local.borrow_mut();
            for (index, value) in bound {
                let Some(name) = closure.params.get(index) else {
                    panic!(
                        "closure parameter {index} bound, but only {} declared",
                        closure.arity()
                    );
                };
                frame.define(name.as_str(), value);
            }
        }

        tracing::trace!(params = closure.arity(), "invoking closure");
        let caller_lines = self.swap_line_index(Rc::clone(&closure.lines));
        let result = self.eval_call_body(&closure.body, &local);
        self.swap_line_index(caller_lines);
        Ok(result?.unwrap_return())
    }

    /// Call a function value with positional arguments in its captured scope
    pub fn call_closure(
        &mut self,
        line: usize,
        closure: &Closure,
        args: Vec<Value>,
    ) -> InterpResult<Value> {
        if closure.arity() != args.len() {
            return Err(RuntimeError::argument_error(line, closure.arity(), args.len()));
        }
        self.invoke(closure, &closure.env, args.into_iter().enumerate())
    }
}
