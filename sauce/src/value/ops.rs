use std::cmp::Ordering;

use crate::error::{Error, ErrorKind};
use crate::value::Value;

fn impossible_op(op: &str, lhs: &Value, rhs: &Value) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!(
            "tried to use {} operator on unsupported types {} and {}",
            op,
            lhs.kind(),
            rhs.kind()
        ),
    )
}

fn coerce(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    Some((some!(lhs.as_f64()), some!(rhs.as_f64())))
}

macro_rules! math_binop {
    ($name:ident, $op:tt) => {
        pub fn $name(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
            match coerce(lhs, rhs) {
                Some((a, b)) => Ok(Value::Number(a $op b)),
                None => Err(impossible_op(stringify!($op), lhs, rhs)),
            }
        }
    };
}

/// Adds two values.
///
/// If either side is a string both sides are concatenated as strings,
/// two sequences are joined, numbers are added.
pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    match (lhs, rhs) {
        (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!("{lhs}{rhs}"))),
        (Value::Seq(a), Value::Seq(b)) => Ok(Value::Seq(a.iter().chain(b).cloned().collect())),
        _ => match coerce(lhs, rhs) {
            Some((a, b)) => Ok(Value::Number(a + b)),
            None => Err(impossible_op("+", lhs, rhs)),
        },
    }
}

math_binop!(sub, -);
math_binop!(mul, *);

pub fn div(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    match coerce(lhs, rhs) {
        Some((_, b)) if b == 0.0 => Err(Error::new(
            ErrorKind::InvalidOperation,
            "tried to divide by zero",
        )),
        Some((a, b)) => Ok(Value::Number(a / b)),
        None => Err(impossible_op("/", lhs, rhs)),
    }
}

pub fn pow(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    match coerce(lhs, rhs) {
        Some((a, b)) => Ok(Value::Number(a.powf(b))),
        None => Err(impossible_op("**", lhs, rhs)),
    }
}

pub fn neg(val: &Value) -> Result<Value, Error> {
    match val.as_f64() {
        Some(x) => Ok(Value::Number(-x)),
        None => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot negate value of type {}", val.kind()),
        )),
    }
}

/// Compares two values for equality.
///
/// Numbers compare by value, everything else structurally.
pub fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    lhs == rhs
}

/// Orders two values.
///
/// Only numbers and strings are ordered, everything else is not
/// comparable.
pub fn partial_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Checks if `container` holds `value`.
///
/// Sequences are searched for an equal item, maps for a key and strings
/// for a substring.
pub fn contains(container: &Value, value: &Value) -> Result<bool, Error> {
    match container {
        Value::String(s) => Ok(s.contains(&value.to_string())),
        Value::Seq(items) => Ok(items.iter().any(|item| item == value)),
        Value::Map(map) => Ok(match value {
            Value::String(key) => map.contains_key(key.as_str()),
            Value::Number(_) => map.contains_key(&value.to_string()),
            _ => false,
        }),
        _ => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!(
                "cannot perform a containment check on value of type {}",
                container.kind()
            ),
        )),
    }
}

fn string_test(
    op: &str,
    lhs: &Value,
    rhs: &Value,
    f: fn(&str, &str) -> bool,
) -> Result<bool, Error> {
    match lhs.as_str() {
        Some(s) => Ok(f(s, &rhs.to_string())),
        None => Err(impossible_op(op, lhs, rhs)),
    }
}

pub fn begins_with(lhs: &Value, rhs: &Value) -> Result<bool, Error> {
    string_test("beginswith", lhs, rhs, |a, b| a.starts_with(b))
}

pub fn ends_with(lhs: &Value, rhs: &Value) -> Result<bool, Error> {
    string_test("endswith", lhs, rhs, |a, b| a.ends_with(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_adding() {
        assert_eq!(
            add(&Value::from(1), &Value::from(2)).unwrap(),
            Value::from(3)
        );
        assert_eq!(
            add(&Value::from("foo"), &Value::from(1)).unwrap(),
            Value::from("foo1")
        );
        assert_eq!(
            add(&Value::from(vec![1]), &Value::from(vec![2])).unwrap(),
            Value::from(vec![1, 2])
        );
        assert_eq!(
            add(&Value::from(true), &Value::from(1))
                .unwrap_err()
                .to_string(),
            "invalid operation: tried to use + operator on unsupported types bool and number"
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            sub(&Value::from(1), &Value::from(2)).unwrap(),
            Value::from(-1)
        );
        assert_eq!(
            mul(&Value::from(3), &Value::from(1.5)).unwrap(),
            Value::from(4.5)
        );
        assert_eq!(
            div(&Value::from(1), &Value::from(4)).unwrap(),
            Value::from(0.25)
        );
        assert_eq!(
            pow(&Value::from(2), &Value::from(10)).unwrap(),
            Value::from(1024)
        );
        assert_eq!(neg(&Value::from(2)).unwrap(), Value::from(-2));
        assert!(neg(&Value::from("x")).is_err());
        assert!(sub(&Value::from("a"), &Value::from(1)).is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let err = div(&Value::from(1), &Value::from(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&Value::None, &Value::None));
        assert!(!loose_eq(&Value::None, &Value::from(0)));
        assert!(loose_eq(&Value::from(1), &Value::from(1.0)));
        assert!(!loose_eq(&Value::from("1"), &Value::from(1)));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            partial_cmp(&Value::from(1), &Value::from(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            partial_cmp(&Value::from("b"), &Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(partial_cmp(&Value::from("b"), &Value::from(1)), None);
    }

    #[test]
    fn test_contains() {
        let seq = Value::from(vec![1, 2]);
        assert!(contains(&seq, &Value::from(2)).unwrap());
        assert!(!contains(&seq, &Value::from(3)).unwrap());
        assert!(contains(&Value::from("hello"), &Value::from("ell")).unwrap());
        let map = Value::from_serialize(&serde_json::json!({"a": 1}));
        assert!(contains(&map, &Value::from("a")).unwrap());
        assert!(!contains(&map, &Value::from("b")).unwrap());
        assert!(contains(&Value::from(1), &Value::from(1)).is_err());
    }

    #[test]
    fn test_string_tests() {
        assert!(begins_with(&Value::from("hello"), &Value::from("he")).unwrap());
        assert!(!begins_with(&Value::from("hello"), &Value::from("lo")).unwrap());
        assert!(ends_with(&Value::from("hello"), &Value::from("lo")).unwrap());
        assert!(ends_with(&Value::from("file1"), &Value::from(1)).unwrap());
        assert!(ends_with(&Value::from(1), &Value::from(1)).is_err());
    }
}
