//! Runtime values for the interpreter

use super::array::{self, Array, ArrayRef};
use super::invoke::Closure;
use std::fmt;
use std::rc::Rc;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit unsigned integer
    UInt(u64),
    /// 64-bit floating point
    Float(f64),
    /// Immutable string
    Str(Rc<String>),
    /// Boolean
    Bool(bool),
    /// Absence of a value
    Nil,
    /// Mutable array shared by every binding that holds it
    Array(ArrayRef),
    /// Function value
    Closure(Rc<Closure>),
    /// Result of an explicit `return`; unwrapped at the call boundary
    Return(Box<Value>),
}

impl Value {
    /// Wrap a list of members in a fresh array handle
    pub fn array(members: Vec<Value>) -> Value {
        Value::Array(Array::new(members).into_ref())
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(s.into()))
    }

    /// `false` and `nil` are falsy; everything else is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            Value::Return(inner) => inner.is_truthy(),
            _ => true,
        }
    }

    /// Type tag used in error messages and by `type()`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::UInt(_) => "uinteger",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::Array(_) => "array",
            Value::Closure(_) => "function",
            Value::Return(_) => "return",
        }
    }

    /// Strip a `Return` wrapper, if any
    pub fn unwrap_return(self) -> Value {
        match self {
            Value::Return(inner) => *inner,
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Array(arr) => array::write_handle(f, arr, &mut Vec::new()),
            Value::Closure(closure) => write!(f, "fn({})", closure.params.join(", ")),
            Value::Return(inner) => write!(f, "{inner}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        super::equality::values_equal(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::UInt(7)), "7");
        assert_eq!(format!("{}", Value::Float(2.5)), "2.5");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Nil), "nil");
        assert_eq!(format!("{}", Value::string("plain")), "plain");
    }

    #[test]
    fn test_array_display_quotes_strings() {
        let arr = Value::array(vec![
            Value::Int(1),
            Value::string("two"),
            Value::array(vec![Value::Nil]),
        ]);
        insta::assert_snapshot!(arr.to_string(), @r#"[1, "two", [nil]]"#);
    }

    #[test]
    fn test_value_truthy() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Float(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn test_unwrap_return() {
        let wrapped = Value::Return(Box::new(Value::Int(3)));
        assert_eq!(wrapped.unwrap_return(), Value::Int(3));
        assert_eq!(Value::Int(4).unwrap_return(), Value::Int(4));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int(1).type_name(), "integer");
        assert_eq!(Value::UInt(1).type_name(), "uinteger");
        assert_eq!(Value::array(vec![]).type_name(), "array");
        assert_eq!(Value::Nil.type_name(), "nil");
    }
}
