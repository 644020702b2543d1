//! JSON text codec for arrays
//!
//! Encoding goes through `serde::Serialize` impls on [`Array`] and [`Value`].
//! An empty array encodes as `null`, so `[]` and an absent value converge.
//! Decoding parses into a `serde_json::Value` first and converts from there.
//!
//! JSON numbers carry no signedness, so an unsigned integer that fits in
//! `i64` decodes as a signed one. Only values above `i64::MAX` come back as
//! `UInt`.

use super::array::Array;
use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use serde::ser::{Error as _, SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::Value as Json;
use std::cell::RefCell;
use std::rc::Rc;

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            return serializer.serialize_none();
        }
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for member in self.members() {
            seq.serialize_element(member)?;
        }
        seq.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Value::Float(x) => Err(S::Error::custom(format!("non-finite float {x}"))),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Nil => serializer.serialize_unit(),
            Value::Array(arr) => arr.borrow().serialize(serializer),
            Value::Closure(_) => Err(S::Error::custom("function values have no JSON form")),
            Value::Return(_) => Err(S::Error::custom("return value escaped its function")),
        }
    }
}

/// Encode `array` as JSON text
pub fn serialize(array: &Array) -> InterpResult<String> {
    if contains_cycle(array.members(), &mut Vec::new()) {
        return Err(RuntimeError::serialize_error(0, "array contains itself"));
    }
    let text = serde_json::to_string(array).map_err(|e| RuntimeError::serialize_error(0, e))?;
    tracing::debug!(members = array.len(), bytes = text.len(), "serialized array");
    Ok(text)
}

/// Whether an array reachable from `members` is nested inside itself
fn contains_cycle(members: &[Value], open: &mut Vec<*const RefCell<Array>>) -> bool {
    members.iter().any(|member| {
        let Value::Array(inner) = member else {
            return false;
        };
        let ptr = Rc::as_ptr(inner);
        if open.contains(&ptr) {
            return true;
        }
        open.push(ptr);
        let found = contains_cycle(inner.borrow().members(), open);
        open.pop();
        found
    })
}

/// Decode JSON text into an array; `null` decodes to an empty array
pub fn deserialize(text: &str) -> InterpResult<Array> {
    let json: Json =
        serde_json::from_str(text).map_err(|e| RuntimeError::deserialize_error(0, e))?;
    let array = match json {
        Json::Null => Array::default(),
        Json::Array(items) => convert_list(items)?,
        other => {
            return Err(RuntimeError::deserialize_error(
                0,
                format!("not an array: {}", json_kind(&other)),
            ));
        }
    };
    tracing::debug!(members = array.len(), "deserialized array");
    Ok(array)
}

fn convert_list(items: Vec<Json>) -> InterpResult<Array> {
    items.into_iter().map(json_to_value).collect()
}

fn json_to_value(json: Json) -> InterpResult<Value> {
    Ok(match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(RuntimeError::deserialize_error(0, format!("unsupported number {n}")));
            }
        }
        Json::String(s) => Value::string(s),
        Json::Array(items) => Value::Array(convert_list(items)?.into_ref()),
        Json::Object(_) => {
            return Err(RuntimeError::deserialize_error(0, "objects are not supported"));
        }
    })
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::error::ErrorKind;

    fn array(members: Vec<Value>) -> Array {
        Array::new(members)
    }

    #[test]
    fn test_serialize_scalars() {
        let arr = array(vec![
            Value::Int(-1),
            Value::UInt(2),
            Value::Float(1.5),
            Value::string("a\"b"),
            Value::Bool(true),
            Value::Nil,
        ]);
        insta::assert_snapshot!(serialize(&arr).unwrap(), @r#"[-1,2,1.5,"a\"b",true,null]"#);
    }

    #[test]
    fn test_serialize_empty_is_null() {
        assert_eq!(serialize(&Array::default()).unwrap(), "null");
    }

    #[test]
    fn test_serialize_nested_empty_is_null() {
        let arr = array(vec![Value::Int(1), Value::array(vec![])]);
        assert_eq!(serialize(&arr).unwrap(), "[1,null]");
    }

    #[test]
    fn test_serialize_nested() {
        let arr = array(vec![
            Value::array(vec![Value::Int(1), Value::Int(2)]),
            Value::array(vec![Value::string("x")]),
        ]);
        insta::assert_snapshot!(serialize(&arr).unwrap(), @r#"[[1,2],["x"]]"#);
    }

    #[test]
    fn test_serialize_rejects_non_finite_float() {
        let err = serialize(&array(vec![Value::Float(f64::INFINITY)])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SerializeError);
    }

    #[test]
    fn test_serialize_rejects_return_wrapper() {
        let arr = array(vec![Value::Return(Box::new(Value::Int(1)))]);
        let err = serialize(&arr).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SerializeError);
    }

    #[test]
    fn test_deserialize_null_is_empty() {
        assert!(deserialize("null").unwrap().is_empty());
        assert!(deserialize(" null ").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_members() {
        let arr = deserialize(r#"[1, 2.5, "s", false, null, [3]]"#).unwrap();
        assert_eq!(arr.len(), 6);
        assert_eq!(arr.members()[0], Value::Int(1));
        assert_eq!(arr.members()[1], Value::Float(2.5));
        assert_eq!(arr.members()[2], Value::string("s"));
        assert_eq!(arr.members()[3], Value::Bool(false));
        assert_eq!(arr.members()[4], Value::Nil);
        assert_eq!(arr.members()[5], Value::array(vec![Value::Int(3)]));
    }

    #[test]
    fn test_deserialize_large_unsigned() {
        let arr = deserialize("[18446744073709551615]").unwrap();
        assert_eq!(arr.members()[0], Value::UInt(u64::MAX));
    }

    #[test]
    fn test_deserialize_rejects_non_array() {
        let err = deserialize("42").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeserializeError);
        assert!(err.message.contains("not an array"), "{}", err.message);
    }

    #[test]
    fn test_deserialize_rejects_objects() {
        let err = deserialize(r#"[{"a": 1}]"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeserializeError);
    }

    #[test]
    fn test_deserialize_syntax_error() {
        let err = deserialize("[1,").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeserializeError);
    }

    #[test]
    fn test_round_trip_scalar_array() {
        let original = array(vec![
            Value::Int(7),
            Value::string("seven"),
            Value::Float(7.25),
            Value::Bool(false),
        ]);
        let decoded = deserialize(&serialize(&original).unwrap()).unwrap();
        assert_eq!(
            Value::Array(decoded.into_ref()),
            Value::Array(original.into_ref())
        );
    }

    #[test]
    fn test_unsigned_within_signed_range_decodes_as_int() {
        let original = array(vec![Value::UInt(5), Value::UInt(u64::MAX)]);
        let text = serialize(&original).unwrap();
        insta::assert_snapshot!(text, @"[5,18446744073709551615]");
        let decoded = deserialize(&text).unwrap();
        assert_eq!(decoded.members()[0], Value::Int(5));
        assert_ne!(decoded.members()[0], Value::UInt(5));
        assert_eq!(decoded.members()[1], Value::UInt(u64::MAX));
    }

    #[test]
    fn test_serialize_rejects_self_containing_array() {
        let inner = Value::array(vec![Value::Int(1)]);
        if let Value::Array(handle) = &inner {
            handle.borrow_mut().push(inner.clone());
        }
        let err = serialize(&array(vec![inner])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SerializeError);
        assert!(err.message.contains("contains itself"), "{}", err.message);
    }

    #[test]
    fn test_serialize_shared_member_twice() {
        let shared = Value::array(vec![Value::Int(1)]);
        let arr = array(vec![shared.clone(), shared]);
        assert_eq!(serialize(&arr).unwrap(), "[[1],[1]]");
    }

    #[test]
    fn test_round_trip_empty() {
        let text = serialize(&Array::default()).unwrap();
        assert!(deserialize(&text).unwrap().is_empty());
    }
}
