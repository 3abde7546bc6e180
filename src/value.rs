//! Dynamic representation of the serialized data model.

use crate::enums::EnumMember;
use crate::record::Record;

/// An in-memory value, covering everything the codec can put on the wire.
///
/// Integers decode as [`Value::Int`] whenever they fit in `i64`;
/// [`Value::Uint`] appears only for values above `i64::MAX`. Equality
/// compares the two numerically, so a round-trip through either token form
/// stays equal.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    ByteArray(Vec<u8>),
    List(Vec<Value>),
    /// Element order is insignificant for equality; duplicates collapse on
    /// decode.
    Set(Vec<Value>),
    Tuple(Vec<Value>),
    /// Key/value pairs in insertion order. Equality is that of a mapping:
    /// same keys, each bound to an equal value.
    Map(Vec<(Value, Value)>),
    Record(Record),
    Enum(EnumMember),
}

impl Value {
    /// Wrap an unsigned integer, preferring the signed representation.
    #[must_use]
    pub fn from_u64(x: u64) -> Self {
        match i64::try_from(x) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Uint(x),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Uint(a), Uint(b)) => a == b,
            (Int(a), Uint(b)) | (Uint(b), Int(a)) => u64::try_from(*a) == Ok(*b),
            (Float(a), Float(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) | (ByteArray(a), ByteArray(b)) => a == b,
            (List(a), List(b)) | (Tuple(a), Tuple(b)) => a == b,
            (Set(a), Set(b)) => set_eq(a, b),
            (Map(a), Map(b)) => map_eq(a, b),
            (Record(a), Record(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            _ => false,
        }
    }
}

fn set_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

fn map_eq(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.iter().any(|(bk, bv)| bk == k && bv == v))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

#[test]
fn test_numeric_equality() {
    assert_eq!(Value::Int(1), Value::Uint(1));
    assert_eq!(Value::Uint(1), Value::Int(1));
    assert_ne!(Value::Int(-1), Value::Uint(u64::MAX));
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_eq!(Value::Uint(u64::MAX), Value::Uint(u64::MAX));
}

#[test]
fn test_set_equality_ignores_order() {
    let a = Value::Set(vec![Value::Int(1), Value::Int(2)]);
    let b = Value::Set(vec![Value::Int(2), Value::Int(1)]);
    assert_eq!(a, b);
    assert_ne!(a, Value::Set(vec![Value::Int(1), Value::Int(3)]));
    assert_ne!(a, Value::List(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn test_map_equality_ignores_order() {
    let a = Value::Map(vec![
        (Value::from("x"), Value::Int(1)),
        (Value::from("y"), Value::Int(2)),
    ]);
    let b = Value::Map(vec![
        (Value::from("y"), Value::Int(2)),
        (Value::from("x"), Value::Int(1)),
    ]);
    assert_eq!(a, b);
    let c = Value::Map(vec![
        (Value::from("x"), Value::Int(1)),
        (Value::from("y"), Value::Int(3)),
    ]);
    assert_ne!(a, c);
}
