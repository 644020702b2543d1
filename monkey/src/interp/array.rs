//! The array value and its method table

use super::env::EnvRef;
use super::equality::{self, values_equal};
use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::invoke::Closure;
use super::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, mutable array handle
pub type ArrayRef = Rc<RefCell<Array>>;

/// Ordered, heterogeneous, resizable sequence of values
#[derive(Debug, Clone, Default)]
pub struct Array {
    members: Vec<Value>,
}

impl Array {
    pub fn new(members: Vec<Value>) -> Self {
        Array { members }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> ArrayRef {
        Rc::new(RefCell::new(self))
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn first(&self) -> Value {
        self.members.first().cloned().unwrap_or(Value::Nil)
    }

    pub fn last(&self) -> Value {
        self.members.last().cloned().unwrap_or(Value::Nil)
    }

    /// Everything after the first member; `None` when empty
    pub fn tail(&self) -> Option<Array> {
        let (_, rest) = self.members.split_first()?;
        Some(Array::new(rest.to_vec()))
    }

    pub fn count(&self, needle: &Value) -> usize {
        self.members
            .iter()
            .filter(|member| values_equal(member, needle))
            .count()
    }

    pub fn includes(&self, needle: &Value) -> bool {
        equality::includes(&self.members, needle)
    }

    pub fn index_of(&self, needle: &Value) -> Option<usize> {
        self.members
            .iter()
            .position(|member| values_equal(member, needle))
    }

    pub fn push(&mut self, value: Value) {
        self.members.push(value);
    }

    pub fn unshift(&mut self, value: Value) {
        self.members.insert(0, value);
    }

    /// Remove the last member, or the member at `index` (negative counts
    /// from the end)
    pub fn pop(&mut self, line: usize, index: Option<i64>) -> InterpResult<Value> {
        let len = self.members.len() as i64;
        let Some(index) = index else {
            return self
                .members
                .pop()
                .ok_or_else(|| RuntimeError::index_error(line, -1));
        };
        let index = if index < 0 { index + len } else { index };
        if index < 0 || index >= len {
            return Err(RuntimeError::index_error(line, index));
        }
        Ok(self.members.remove(index as usize))
    }

    /// Remove the first member (nil when empty), or the member at `index`
    ///
    /// Unlike [`Array::pop`], a negative index is not counted from the end.
    pub fn shift(&mut self, line: usize, index: Option<i64>) -> InterpResult<Value> {
        let Some(index) = index else {
            if self.members.is_empty() {
                return Ok(Value::Nil);
            }
            return Ok(self.members.remove(0));
        };
        if index < 0 || index >= self.members.len() as i64 {
            return Err(RuntimeError::index_error(line, index));
        }
        Ok(self.members.remove(index as usize))
    }

    /// New array with `self`'s members followed by `other`'s
    pub fn merge(&self, other: &Array) -> Array {
        let mut members = Vec::with_capacity(self.len() + other.len());
        members.extend_from_slice(&self.members);
        members.extend_from_slice(&other.members);
        Array::new(members)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_nested(f, &mut Vec::new())
    }
}

impl Array {
    fn write_nested(
        &self,
        f: &mut fmt::Formatter<'_>,
        open: &mut Vec<*const RefCell<Array>>,
    ) -> fmt::Result {
        write!(f, "[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match member {
                Value::Str(s) => write!(f, "{s:?}")?,
                Value::Array(inner) => write_handle(f, inner, open)?,
                other => write!(f, "{other}")?,
            }
        }
        write!(f, "]")
    }
}

/// Render an array handle; one already being rendered prints as `[...]`
pub(super) fn write_handle(
    f: &mut fmt::Formatter<'_>,
    handle: &ArrayRef,
    open: &mut Vec<*const RefCell<Array>>,
) -> fmt::Result {
    let ptr = Rc::as_ptr(handle);
    if open.contains(&ptr) {
        return write!(f, "[...]");
    }
    open.push(ptr);
    let result = handle.borrow().write_nested(f, open);
    open.pop();
    result
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::new(iter.into_iter().collect())
    }
}

/// Accepted argument counts of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Either(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::Either(a, b) => count == a || count == b,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::Either(a, b) => write!(f, "{a}|{b}"),
        }
    }
}

/// Methods callable on an array value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMethod {
    Len,
    Empty,
    First,
    Last,
    Tail,
    Count,
    Includes,
    Index,
    Push,
    Unshift,
    Pop,
    Shift,
    Merge,
    Filter,
    Map,
    Reduce,
}

impl ArrayMethod {
    /// Resolve a method name, including the `head`, `rest` and `grep` aliases
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "len" => ArrayMethod::Len,
            "empty" => ArrayMethod::Empty,
            "first" | "head" => ArrayMethod::First,
            "last" => ArrayMethod::Last,
            "tail" | "rest" => ArrayMethod::Tail,
            "count" => ArrayMethod::Count,
            "includes" => ArrayMethod::Includes,
            "index" => ArrayMethod::Index,
            "push" => ArrayMethod::Push,
            "unshift" => ArrayMethod::Unshift,
            "pop" => ArrayMethod::Pop,
            "shift" => ArrayMethod::Shift,
            "merge" => ArrayMethod::Merge,
            "filter" | "grep" => ArrayMethod::Filter,
            "map" => ArrayMethod::Map,
            "reduce" => ArrayMethod::Reduce,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ArrayMethod::Len => "len",
            ArrayMethod::Empty => "empty",
            ArrayMethod::First => "first",
            ArrayMethod::Last => "last",
            ArrayMethod::Tail => "tail",
            ArrayMethod::Count => "count",
            ArrayMethod::Includes => "includes",
            ArrayMethod::Index => "index",
            ArrayMethod::Push => "push",
            ArrayMethod::Unshift => "unshift",
            ArrayMethod::Pop => "pop",
            ArrayMethod::Shift => "shift",
            ArrayMethod::Merge => "merge",
            ArrayMethod::Filter => "filter",
            ArrayMethod::Map => "map",
            ArrayMethod::Reduce => "reduce",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            ArrayMethod::Len
            | ArrayMethod::Empty
            | ArrayMethod::First
            | ArrayMethod::Last
            | ArrayMethod::Tail => Arity::Exactly(0),
            ArrayMethod::Count
            | ArrayMethod::Includes
            | ArrayMethod::Index
            | ArrayMethod::Push
            | ArrayMethod::Unshift
            | ArrayMethod::Merge
            | ArrayMethod::Filter
            | ArrayMethod::Map => Arity::Exactly(1),
            ArrayMethod::Pop | ArrayMethod::Shift => Arity::Either(0, 1),
            ArrayMethod::Reduce => Arity::Either(1, 2),
        }
    }
}

/// Run `method` on `receiver`
///
/// `scope` is the caller's scope; closures passed to `map`, `filter` and
/// `reduce` run in fresh children of it.
pub fn dispatch(
    interp: &mut Interpreter,
    line: usize,
    scope: &EnvRef,
    method: &str,
    receiver: &ArrayRef,
    args: Vec<Value>,
) -> InterpResult<Value> {
    let Some(resolved) = ArrayMethod::from_name(method) else {
        return Err(RuntimeError::no_method_error(line, method, "array"));
    };
    let arity = resolved.arity();
    if !arity.accepts(args.len()) {
        return Err(RuntimeError::argument_error(line, arity, args.len()));
    }
    tracing::trace!(method = resolved.name(), args = args.len(), line, "array method");

    let mut args = args.into_iter();
    match resolved {
        ArrayMethod::Len => Ok(Value::Int(receiver.borrow().len() as i64)),
        ArrayMethod::Empty => Ok(Value::Bool(receiver.borrow().is_empty())),
        ArrayMethod::First => Ok(receiver.borrow().first()),
        ArrayMethod::Last => Ok(receiver.borrow().last()),
        ArrayMethod::Tail => Ok(receiver
            .borrow()
            .tail()
            .map_or(Value::Nil, |tail| Value::Array(tail.into_ref()))),
        ArrayMethod::Count => {
            let needle = next_arg(&mut args);
            Ok(Value::Int(receiver.borrow().count(&needle) as i64))
        }
        ArrayMethod::Includes => {
            let needle = next_arg(&mut args);
            Ok(Value::Bool(receiver.borrow().includes(&needle)))
        }
        ArrayMethod::Index => {
            let needle = next_arg(&mut args);
            Ok(receiver
                .borrow()
                .index_of(&needle)
                .map_or(Value::Nil, |i| Value::Int(i as i64)))
        }
        ArrayMethod::Push => {
            receiver.borrow_mut().push(next_arg(&mut args));
            Ok(Value::Array(Rc::clone(receiver)))
        }
        ArrayMethod::Unshift => {
            receiver.borrow_mut().unshift(next_arg(&mut args));
            Ok(Value::Array(Rc::clone(receiver)))
        }
        ArrayMethod::Pop => {
            let index = index_arg(line, resolved, args.next())?;
            receiver.borrow_mut().pop(line, index)
        }
        ArrayMethod::Shift => {
            let index = index_arg(line, resolved, args.next())?;
            receiver.borrow_mut().shift(line, index)
        }
        ArrayMethod::Merge => match next_arg(&mut args) {
            Value::Array(other) => {
                let merged = receiver.borrow().merge(&other.borrow());
                Ok(Value::Array(merged.into_ref()))
            }
            other => Err(RuntimeError::param_type_error(
                line,
                "first",
                resolved.name(),
                "array",
                other.type_name(),
            )),
        },
        ArrayMethod::Filter => {
            let block = closure_arg(line, resolved, next_arg(&mut args), 1)?;
            let members = snapshot(receiver);
            let mut kept = Vec::new();
            for member in members {
                let cond = interp.invoke(&block, scope, [(0, member.clone())])?;
                if cond.is_truthy() {
                    kept.push(member);
                }
            }
            Ok(Value::array(kept))
        }
        ArrayMethod::Map => {
            let block = closure_arg(line, resolved, next_arg(&mut args), 1)?;
            let members = snapshot(receiver);
            let mut mapped = Vec::with_capacity(members.len());
            for member in members {
                mapped.push(interp.invoke(&block, scope, [(0, member)])?);
            }
            Ok(Value::array(mapped))
        }
        ArrayMethod::Reduce => {
            let block = closure_arg(line, resolved, next_arg(&mut args), 2)?;
            let members = snapshot(receiver);
            let mut members = members.into_iter();
            let seed = match args.next() {
                Some(seed) => seed,
                None => match members.next() {
                    Some(first) => first,
                    None => return Ok(Value::Nil),
                },
            };
            members.try_fold(seed, |acc, member| {
                interp.invoke(&block, scope, [(0, acc), (1, member)])
            })
        }
    }
}

/// Members at the time the method started; a closure body may mutate the
/// receiver while we iterate
fn snapshot(receiver: &ArrayRef) -> Vec<Value> {
    receiver.borrow().members().to_vec()
}

/// Next argument; arity has already been checked
fn next_arg(args: &mut impl Iterator<Item = Value>) -> Value {
    args.next().unwrap_or(Value::Nil)
}

fn index_arg(line: usize, method: ArrayMethod, arg: Option<Value>) -> InterpResult<Option<i64>> {
    match arg {
        None => Ok(None),
        Some(Value::Int(index)) => Ok(Some(index)),
        Some(other) => Err(RuntimeError::param_type_error(
            line,
            "first",
            method.name(),
            "integer",
            other.type_name(),
        )),
    }
}

fn closure_arg(
    line: usize,
    method: ArrayMethod,
    arg: Value,
    params: usize,
) -> InterpResult<Rc<Closure>> {
    match arg {
        Value::Closure(closure) if closure.arity() == params => Ok(closure),
        other => {
            let expected = match params {
                1 => "function of one parameter",
                _ => "function of two parameters",
            };
            let got = match &other {
                Value::Closure(closure) => format!("function of {} parameter(s)", closure.arity()),
                other => other.type_name().to_string(),
            };
            Err(RuntimeError::param_type_error(
                line,
                "first",
                method.name(),
                expected,
                &got,
            ))
        }
    }
}
