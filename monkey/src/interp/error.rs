//! Runtime errors for the interpreter

use thiserror::Error;

/// Runtime error during interpretation
///
/// Every error carries the source line of the expression that raised it.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Wrong number of arguments; `expected` is an arity such as `1` or `1|2`
    ArgumentError { expected: String, got: usize },
    /// An argument has the wrong kind for its position
    ParamTypeError {
        position: String,
        method: String,
        expected: String,
        got: String,
    },
    /// Index out of range after any normalization
    IndexError { index: i64 },
    /// Method not part of the receiver's method table
    NoMethodError { method: String, type_name: String },
    /// Undefined variable
    UndefinedVariable,
    /// Call of a value that is not a function
    NotCallable,
    /// Operand type mismatch
    TypeError,
    /// Division by zero
    DivisionByZero,
    /// Stack overflow (deep recursion)
    StackOverflow,
    /// A value could not be encoded as structured text
    SerializeError,
    /// Structured text could not be decoded into an array
    DeserializeError,
}

impl RuntimeError {
    pub fn argument_error(line: usize, expected: impl ToString, got: usize) -> Self {
        let expected = expected.to_string();
        RuntimeError {
            message: format!("ArgumentError: wrong number of arguments (expected {expected}, got {got})"),
            kind: ErrorKind::ArgumentError { expected, got },
            line,
        }
    }

    pub fn param_type_error(
        line: usize,
        position: &str,
        method: &str,
        expected: &str,
        got: &str,
    ) -> Self {
        RuntimeError {
            kind: ErrorKind::ParamTypeError {
                position: position.to_string(),
                method: method.to_string(),
                expected: expected.to_string(),
                got: got.to_string(),
            },
            message: format!(
                "ParamTypeError: {position} argument of `{method}` should be {expected}, got {got}"
            ),
            line,
        }
    }

    pub fn index_error(line: usize, index: i64) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexError { index },
            message: format!("IndexError: index {index} out of range"),
            line,
        }
    }

    pub fn no_method_error(line: usize, method: &str, type_name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::NoMethodError {
                method: method.to_string(),
                type_name: type_name.to_string(),
            },
            message: format!("NoMethodError: undefined method `{method}` for {type_name}"),
            line,
        }
    }

    pub fn undefined_variable(line: usize, name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedVariable,
            message: format!("undefined variable: {name}"),
            line,
        }
    }

    pub fn not_callable(line: usize, type_name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::NotCallable,
            message: format!("value of type {type_name} is not callable"),
            line,
        }
    }

    pub fn type_error(line: usize, message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("type error: {}", message.into()),
            line,
        }
    }

    pub fn division_by_zero(line: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
            line,
        }
    }

    pub fn stack_overflow(line: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: "stack overflow: too deep recursion".to_string(),
            line,
        }
    }

    pub fn serialize_error(line: usize, reason: impl std::fmt::Display) -> Self {
        RuntimeError {
            kind: ErrorKind::SerializeError,
            message: format!("cannot serialize: {reason}"),
            line,
        }
    }

    pub fn deserialize_error(line: usize, reason: impl std::fmt::Display) -> Self {
        RuntimeError {
            kind: ErrorKind::DeserializeError,
            message: format!("cannot deserialize: {reason}"),
            line,
        }
    }

    /// Re-tag an error raised without source context
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
