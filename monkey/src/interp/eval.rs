//! Expression evaluator

use super::array::{self, Array};
use super::codec;
use super::env::{EnvRef, Environment};
use super::equality::values_equal;
use super::error::{InterpResult, RuntimeError};
use super::invoke::Closure;
use super::value::Value;
use crate::ast::{BinOp, Expr, LineIndex, Program, Span, Spanned, Stmt, UnOp};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

/// Maximum nesting of function bodies
const MAX_RECURSION_DEPTH: usize = 10_000;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Builtin function type; the first argument is the call-site line
pub type BuiltinFn = fn(usize, &[Value]) -> InterpResult<Value>;

/// The interpreter
pub struct Interpreter {
    /// Global environment
    global_env: EnvRef,
    /// Builtin functions
    builtins: HashMap<String, BuiltinFn>,
    /// Current recursion depth
    recursion_depth: usize,
    /// Line lookup for the source of the code being evaluated; swapped for
    /// the closure's own while its body runs
    line_index: Rc<LineIndex>,
}

impl Interpreter {
    /// Create a new interpreter
    pub fn new() -> Self {
        let mut interp = Interpreter {
            global_env: Environment::new().into_ref(),
            builtins: HashMap::new(),
            recursion_depth: 0,
            line_index: Rc::default(),
        };
        interp.register_builtins();
        interp
    }

    fn register_builtins(&mut self) {
        self.builtins.insert("puts".to_string(), builtin_puts);
        self.builtins.insert("len".to_string(), builtin_len);
        self.builtins.insert("type".to_string(), builtin_type);
        self.builtins.insert("to_json".to_string(), builtin_to_json);
        self.builtins.insert("from_json".to_string(), builtin_from_json);
    }

    /// Get the global environment (for REPL)
    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Run a program in the global environment
    ///
    /// A top-level `return` stops the program; its value is the result.
    pub fn run(&mut self, program: &Program) -> InterpResult<Value> {
        let env = self.global_env.clone();
        let result = self.eval_block(&program.stmts, &env)?;
        Ok(result.unwrap_return())
    }

    /// Lex, parse and run `source`
    ///
    /// Bindings persist in the global environment across calls, which is
    /// what the REPL relies on.
    pub fn run_source(&mut self, source: &str) -> crate::Result<Value> {
        let tokens = crate::lexer::tokenize(source)?;
        let program = crate::parser::parse("<input>", source, tokens)?;
        tracing::debug!(statements = program.stmts.len(), "loaded program");
        self.line_index = Rc::new(LineIndex::new(source));
        Ok(self.run(&program)?)
    }

    fn line_of(&self, span: Span) -> usize {
        self.line_index.line_of(span.start)
    }

    /// Make `lines` the current line table, returning the previous one
    pub(super) fn swap_line_index(&mut self, lines: Rc<LineIndex>) -> Rc<LineIndex> {
        std::mem::replace(&mut self.line_index, lines)
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    /// Evaluate a function body, guarding the recursion depth
    pub(super) fn eval_call_body(
        &mut self,
        body: &Spanned<Expr>,
        env: &EnvRef,
    ) -> InterpResult<Value> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.recursion_depth -= 1;
            return Err(RuntimeError::stack_overflow(self.line_of(body.span)));
        }
        let result = self.eval(body, env);
        self.recursion_depth -= 1;
        result
    }

    /// Inner eval implementation
    fn eval_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        let line = self.line_of(expr.span);
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::UIntLit(n) => Ok(Value::UInt(*n)),
            Expr::FloatLit(f) => Ok(Value::Float(*f)),
            Expr::StringLit(s) => Ok(Value::string(s.as_str())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::Nil => Ok(Value::Nil),

            Expr::Var(name) => {
                if let Some(value) = env.borrow().get(name) {
                    return Ok(value);
                }
                Err(RuntimeError::undefined_variable(line, name))
            }

            Expr::Array(elems) => {
                let members = self.eval_args(elems, env)?;
                Ok(Value::array(members))
            }

            Expr::Binary { left, op, right } => {
                let lhs = self.eval(left, env)?;
                // Short-circuit
                match op {
                    BinOp::And if !lhs.is_truthy() => return Ok(lhs),
                    BinOp::Or if lhs.is_truthy() => return Ok(lhs),
                    BinOp::And | BinOp::Or => return self.eval(right, env),
                    _ => {}
                }
                let rhs = self.eval(right, env)?;
                eval_binary(line, *op, lhs, rhs)
            }

            Expr::Unary { op, expr: operand } => {
                let value = self.eval(operand, env)?;
                eval_unary(line, *op, value)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.eval(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch, env)
                } else {
                    Ok(Value::Nil)
                }
            }

            Expr::Block(stmts) => self.eval_block(stmts, env),

            Expr::Function { params, body } => Ok(Value::Closure(Rc::new(Closure {
                params: params.clone(),
                body: (**body).clone(),
                env: Rc::clone(env),
                lines: Rc::clone(&self.line_index),
            }))),

            Expr::Call { callee, args } => {
                // Builtins are found only when nothing in scope shadows them
                if let Expr::Var(name) = &callee.node {
                    if !env.borrow().contains(name) {
                        if let Some(builtin) = self.builtins.get(name).copied() {
                            let args = self.eval_args(args, env)?;
                            return builtin(line, &args);
                        }
                    }
                }
                let callee = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                match callee {
                    Value::Closure(closure) => self.call_closure(line, &closure, args),
                    other => Err(RuntimeError::not_callable(line, other.type_name())),
                }
            }

            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver, env)?;
                let args = self.eval_args(args, env)?;
                let line = self.line_of(method.span);
                match receiver {
                    Value::Array(arr) => array::dispatch(self, line, env, &method.node, &arr, args),
                    other => Err(RuntimeError::no_method_error(
                        line,
                        &method.node,
                        other.type_name(),
                    )),
                }
            }

            Expr::Index { expr: target, index } => {
                let target = self.eval(target, env)?;
                let index = self.eval(index, env)?;
                eval_index(line, target, index)
            }
        }
    }

    /// Evaluate statements in `env`; the value of the last one is the result
    ///
    /// A `Return` value stops the block and is handed back still wrapped.
    fn eval_block(&mut self, stmts: &[Spanned<Stmt>], env: &EnvRef) -> InterpResult<Value> {
        let mut result = Value::Nil;
        for stmt in stmts {
            result = self.eval_stmt(stmt, env)?;
            if matches!(result, Value::Return(_)) {
                break;
            }
        }
        Ok(result)
    }

    fn eval_stmt(&mut self, stmt: &Spanned<Stmt>, env: &EnvRef) -> InterpResult<Value> {
        match &stmt.node {
            Stmt::Let { name, value } => {
                let value = self.eval(value, env)?;
                if matches!(value, Value::Return(_)) {
                    return Ok(value);
                }
                env.borrow_mut().define(name.as_str(), value);
                Ok(Value::Nil)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?.unwrap_return(),
                    None => Value::Nil,
                };
                Ok(Value::Return(Box::new(value)))
            }
            Stmt::Expr(expr) => self.eval(expr, env),
        }
    }

    fn eval_args(&mut self, args: &[Spanned<Expr>], env: &EnvRef) -> InterpResult<Vec<Value>> {
        args.iter()
            .map(|arg| self.eval(arg, env).map(Value::unwrap_return))
            .collect()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate binary operation; no numeric promotion, integers wrap
fn eval_binary(line: usize, op: BinOp, left: Value, right: Value) -> InterpResult<Value> {
    let mismatch = |left: &Value, right: &Value| {
        RuntimeError::type_error(
            line,
            format!("{} {op} {}", left.type_name(), right.type_name()),
        )
    };
    match op {
        BinOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            let Some(ordering) = compare_values(&left, &right) else {
                return Err(mismatch(&left, &right));
            };
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Gt => ordering == Ordering::Greater,
                BinOp::Le => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinOp::Add => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(a.wrapping_add(*b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
            _ => Err(mismatch(&left, &right)),
        },
        BinOp::Sub => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(a.wrapping_sub(*b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
            _ => Err(mismatch(&left, &right)),
        },
        BinOp::Mul => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(a.wrapping_mul(*b))),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
            _ => Err(mismatch(&left, &right)),
        },
        BinOp::Div => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) | (Value::UInt(_), Value::UInt(0)) => {
                Err(RuntimeError::division_by_zero(line))
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(a / b)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
            _ => Err(mismatch(&left, &right)),
        },
        BinOp::Mod => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) | (Value::UInt(_), Value::UInt(0)) => {
                Err(RuntimeError::division_by_zero(line))
            }
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(a % b)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a % b)),
            _ => Err(mismatch(&left, &right)),
        },
        // Handled by the caller
        BinOp::And | BinOp::Or => unreachable!("logical operators short-circuit"),
    }
}

/// Ordering of same-kind numbers and strings
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn eval_unary(line: usize, op: UnOp, value: Value) -> InterpResult<Value> {
    match op {
        UnOp::Neg => match value {
            Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(RuntimeError::type_error(
                line,
                format!("cannot negate {}", other.type_name()),
            )),
        },
        UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
    }
}

/// `a[i]`; negative indexes count from the end, out of range is nil
fn eval_index(line: usize, target: Value, index: Value) -> InterpResult<Value> {
    match (&target, &index) {
        (Value::Array(arr), Value::Int(i)) => {
            let arr = arr.borrow();
            let len = arr.len() as i64;
            let i = if *i < 0 { i + len } else { *i };
            if (0..len).contains(&i) {
                Ok(arr.members()[i as usize].clone())
            } else {
                Ok(Value::Nil)
            }
        }
        (Value::Array(_), other) => Err(RuntimeError::type_error(
            line,
            format!("array index must be integer, got {}", other.type_name()),
        )),
        _ => Err(RuntimeError::type_error(
            line,
            format!("cannot index {}", target.type_name()),
        )),
    }
}

// ============ Built-in Functions ============

fn expect_args(line: usize, args: &[Value], count: usize) -> InterpResult<()> {
    if args.len() != count {
        return Err(RuntimeError::argument_error(line, count, args.len()));
    }
    Ok(())
}

/// puts(...) prints each argument on its own line
fn builtin_puts(_line: usize, args: &[Value]) -> InterpResult<Value> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for arg in args {
        // A closed stdout is not a program error
        let _ = writeln!(out, "{arg}");
    }
    Ok(Value::Nil)
}

fn builtin_len(line: usize, args: &[Value]) -> InterpResult<Value> {
    expect_args(line, args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Array(arr) => Ok(Value::Int(arr.borrow().len() as i64)),
        other => Err(RuntimeError::param_type_error(
            line,
            "first",
            "len",
            "string or array",
            other.type_name(),
        )),
    }
}

fn builtin_type(line: usize, args: &[Value]) -> InterpResult<Value> {
    expect_args(line, args, 1)?;
    Ok(Value::string(args[0].type_name()))
}

fn builtin_to_json(line: usize, args: &[Value]) -> InterpResult<Value> {
    expect_args(line, args, 1)?;
    match &args[0] {
        Value::Array(arr) => {
            let text = codec::serialize(&arr.borrow()).map_err(|e| e.at_line(line))?;
            Ok(Value::string(text))
        }
        other => Err(RuntimeError::param_type_error(
            line,
            "first",
            "to_json",
            "array",
            other.type_name(),
        )),
    }
}

fn builtin_from_json(line: usize, args: &[Value]) -> InterpResult<Value> {
    expect_args(line, args, 1)?;
    match &args[0] {
        Value::Str(text) => {
            let arr: Array = codec::deserialize(text).map_err(|e| e.at_line(line))?;
            Ok(Value::Array(arr.into_ref()))
        }
        other => Err(RuntimeError::param_type_error(
            line,
            "first",
            "from_json",
            "string",
            other.type_name(),
        )),
    }
}
