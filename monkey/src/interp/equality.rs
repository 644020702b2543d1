//! Value equality and containment
//!
//! Scalar pairs of the same kind compare directly. Every other pairing,
//! including mixed numeric kinds, goes through [`structurally_equal`], so an
//! integer never equals a float and closures only equal themselves.

use super::array::Array;
use super::value::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Pairs of array handles already under comparison
type Visited = HashSet<(*const RefCell<Array>, *const RefCell<Array>)>;

/// Equality used by `count`, `includes`, `index` and `==`
pub fn values_equal(a: &Value, b: &Value) -> bool {
    equal_in(a, b, &mut Visited::new())
}

/// Fallback comparison of complete representations
///
/// Arrays that contain themselves terminate: a pair of handles met again
/// while it is still being compared counts as equal.
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    structural_in(a, b, &mut Visited::new())
}

fn equal_in(a: &Value, b: &Value, visited: &mut Visited) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::UInt(x), Value::UInt(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => structural_in(a, b, visited),
    }
}

fn structural_in(a: &Value, b: &Value, visited: &mut Visited) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Array(x), Value::Array(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            if !visited.insert((Rc::as_ptr(x), Rc::as_ptr(y))) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.members()
                    .iter()
                    .zip(y.members())
                    .all(|(l, r)| equal_in(l, r, visited))
        }
        (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
        (Value::Return(x), Value::Return(y)) => equal_in(x, y, visited),
        _ => false,
    }
}

/// Whether any member equals `needle`; stops at the first match
pub fn includes(members: &[Value], needle: &Value) -> bool {
    members.iter().any(|member| values_equal(member, needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_same_kind() {
        assert!(values_equal(&Value::Int(3), &Value::Int(3)));
        assert!(!values_equal(&Value::Int(3), &Value::Int(4)));
        assert!(values_equal(&Value::UInt(3), &Value::UInt(3)));
        assert!(values_equal(&Value::Float(1.5), &Value::Float(1.5)));
        assert!(values_equal(&Value::string("a"), &Value::string("a")));
        assert!(!values_equal(&Value::string("a"), &Value::string("b")));
        assert!(values_equal(&Value::Bool(false), &Value::Bool(false)));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert!(!values_equal(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
    }

    #[test]
    fn test_mixed_numeric_kinds_are_never_equal() {
        assert!(!values_equal(&Value::Int(1), &Value::Float(1.0)));
        assert!(!values_equal(&Value::Int(1), &Value::UInt(1)));
        assert!(!values_equal(&Value::UInt(0), &Value::Float(0.0)));
    }

    #[test]
    fn test_mixed_kinds() {
        assert!(!values_equal(&Value::Int(0), &Value::Bool(false)));
        assert!(!values_equal(&Value::Nil, &Value::Bool(false)));
        assert!(!values_equal(&Value::string("1"), &Value::Int(1)));
        assert!(values_equal(&Value::Nil, &Value::Nil));
    }

    #[test]
    fn test_arrays_compare_structurally() {
        let a = Value::array(vec![Value::Int(1), Value::array(vec![Value::string("x")])]);
        let b = Value::array(vec![Value::Int(1), Value::array(vec![Value::string("x")])]);
        let c = Value::array(vec![Value::Int(1)]);
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
        assert!(values_equal(&a, &a.clone()));
    }

    #[test]
    fn test_array_member_kinds_matter() {
        let ints = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let floats = Value::array(vec![Value::Float(1.0), Value::Float(2.0)]);
        assert!(!values_equal(&ints, &floats));
    }

    #[test]
    fn test_return_wrappers_compare_inner() {
        let a = Value::Return(Box::new(Value::Int(1)));
        let b = Value::Return(Box::new(Value::Int(1)));
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &Value::Int(1)));
    }

    /// `[1, self]`, built the way a program does it with `push`
    fn self_containing(first: i64) -> Value {
        let arr = Value::array(vec![Value::Int(first)]);
        if let Value::Array(handle) = &arr {
            handle.borrow_mut().push(arr.clone());
        }
        arr
    }

    #[test]
    fn test_distinct_cyclic_arrays_terminate() {
        let a = self_containing(1);
        let b = self_containing(1);
        let c = self_containing(2);
        assert!(values_equal(&a, &b));
        assert!(values_equal(&b, &a));
        assert!(!values_equal(&a, &c));
        assert!(structurally_equal(&a, &b));
    }

    #[test]
    fn test_cyclic_array_against_acyclic() {
        let cyclic = self_containing(1);
        let flat = Value::array(vec![Value::Int(1), Value::array(vec![Value::Int(1)])]);
        assert!(!values_equal(&cyclic, &flat));
        assert!(includes(&[Value::Nil, self_containing(1)], &cyclic));
    }

    #[test]
    fn test_includes_short_circuits_on_first_match() {
        let members = vec![Value::Int(1), Value::string("a"), Value::Float(2.0)];
        assert!(includes(&members, &Value::string("a")));
        assert!(includes(&members, &Value::Float(2.0)));
        assert!(!includes(&members, &Value::Int(2)));
        assert!(!includes(&[], &Value::Nil));
    }
}
