//! Provides a dynamic value type abstraction.
//!
//! This module gives access to a dynamically typed value which is used by
//! the template engine during execution.  Values flow into the engine
//! through a [`Model`](crate::Model), are produced by expressions and are
//! bound into the scope stack by `var` and `foreach` tags.
//!
//! Absence is not a value.  Lookups that fail return `None` (of
//! [`Option`]), whereas [`Value::None`] is an explicit null that can be
//! stored and passed around.
//!
//! # Converting Values
//!
//! Values are typically created via the [`From`] trait:
//!
//! ```
//! # use sauce::value::Value;
//! let int_value = Value::from(42);
//! let none_value = Value::from(());
//! let true_value = Value::from(true);
//! let list = Value::from(vec![1, 2, 3]);
//! ```
//!
//! Anything that implements `Serialize` can be converted with
//! [`Value::from_serialize`]:
//!
//! ```
//! # use sauce::value::Value;
//! let value = Value::from_serialize(&vec!["a", "b"]);
//! assert_eq!(value.to_string(), r#"["a", "b"]"#);
//! ```
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{Error, ErrorKind};

pub(crate) mod ops;

/// The map type used by values and scope frames.
#[cfg(not(feature = "preserve_order"))]
pub type ValueMap = BTreeMap<String, Value>;

/// The map type used by values and scope frames.
#[cfg(feature = "preserve_order")]
pub type ValueMap = indexmap::IndexMap<String, Value>;

/// The pseudo key that resolves to the length of a collection.
pub const COUNT_KEY: &str = "@count";

/// Describes the kind of value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueKind {
    /// The value is none.
    None,
    /// The value is a bool.
    Bool,
    /// The value is a number.
    Number,
    /// The value is a string.
    String,
    /// The value is a sequence.
    Seq,
    /// The value is a map.
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
        })
    }
}

/// Represents a dynamically typed value in the template engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// An explicit null.
    #[default]
    None,
    /// A boolean.
    Bool(bool),
    /// A number.  All numbers are stored as floats.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    Seq(Vec<Value>),
    /// A map with string keys.
    Map(ValueMap),
}

fn is_integral(num: f64) -> bool {
    num.fract() == 0.0 && num.abs() < 1e17
}

fn fmt_number(num: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if num.is_nan() {
        f.write_str("NaN")
    } else if num.is_infinite() {
        write!(f, "{}inf", if num.is_sign_negative() { "-" } else { "" })
    } else if is_integral(num) {
        write!(f, "{}", num as i64)
    } else {
        write!(f, "{num}")
    }
}

/// Formats a value as it appears inside of a container.
fn fmt_repr(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::None => f.write_str("null"),
        Value::String(s) => write!(f, "{s:?}"),
        other => fmt::Display::fmt(other, f),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(val) => val.fmt(f),
            Value::Number(val) => fmt_number(*val, f),
            Value::String(val) => f.write_str(val),
            Value::Seq(items) => {
                ok!(f.write_str("["));
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(fmt_repr(item, f));
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                ok!(f.write_str("{"));
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(write!(f, "{key:?}: "));
                    ok!(fmt_repr(value, f));
                }
                f.write_str("}")
            }
        }
    }
}

impl Value {
    /// Creates a value from something that can be serialized.
    ///
    /// The conversion goes through `serde_json`.  If serialization fails
    /// the result is [`Value::None`], use [`Value::try_from_serialize`] to
    /// observe the error.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
        Value::try_from_serialize(value).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "could not convert value, using null");
            Value::None
        })
    }

    /// Like [`from_serialize`](Self::from_serialize) but fails on errors.
    pub fn try_from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
        match serde_json::to_value(value) {
            Ok(value) => Ok(Value::from(value)),
            Err(err) => Err(Error::new(ErrorKind::BadSerialization, err.to_string()).with_source(err)),
        }
    }

    /// Returns the kind of the value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Seq(_) => ValueKind::Seq,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Is this value true?
    ///
    /// `false`, zero, empty strings, empty collections and null are false,
    /// everything else is true.
    pub fn is_true(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(val) => *val,
            Value::Number(val) => *val != 0.0 && !val.is_nan(),
            Value::String(val) => !val.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Returns `true` if the value is the explicit null.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// If the value is a string, return it.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is a number, return it.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(num) => Some(*num),
            _ => None,
        }
    }

    /// Returns the length of the contained value.
    ///
    /// Strings are measured in characters.  Values without a length
    /// return `None`.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Seq(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Looks up a single key path segment.
    ///
    /// Maps are looked up by key, sequences by a numeric segment.  The
    /// `@count` segment returns the length of the value.
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => {
                if let Some(value) = map.get(name) {
                    return Some(value.clone());
                }
            }
            Value::Seq(items) => {
                if let Ok(idx) = name.parse::<usize>() {
                    return items.get(idx).cloned();
                }
            }
            _ => {}
        }
        if name == COUNT_KEY {
            self.len().map(Value::from)
        } else {
            None
        }
    }

    /// Looks up an item by a key value (`value[key]`).
    pub fn get_item(&self, key: &Value) -> Option<Value> {
        match (self, key) {
            (Value::Seq(items), Value::Number(idx)) => {
                let idx = *idx;
                if idx.fract() != 0.0 {
                    return None;
                }
                let idx = if idx < 0.0 {
                    items.len() as f64 + idx
                } else {
                    idx
                };
                if idx < 0.0 {
                    None
                } else {
                    items.get(idx as usize).cloned()
                }
            }
            (Value::Map(map), Value::String(key)) => map.get(key.as_str()).cloned(),
            (Value::Map(map), key @ Value::Number(_)) => map.get(&key.to_string()).cloned(),
            (Value::String(s), Value::Number(idx)) if *idx >= 0.0 && idx.fract() == 0.0 => {
                s.chars().nth(*idx as usize).map(Value::from)
            }
            _ => None,
        }
    }

    /// Walks a dotted key path starting at this value.
    ///
    /// ```
    /// # use sauce::{context, value::Value};
    /// let ctx = context! { user => context! { tags => vec!["a", "b"] } };
    /// assert_eq!(ctx.get_path("user.tags.1"), Some(Value::from("b")));
    /// assert_eq!(ctx.get_path("user.tags.@count"), Some(Value::from(2)));
    /// ```
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = some!(self.get_attr(head));
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }

    /// Iterates over the items of a sequence or the values of a map.
    ///
    /// Other values cannot be iterated and return `None`.
    pub fn try_iter(&self) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
        match self {
            Value::Seq(items) => Some(Box::new(items.iter())),
            Value::Map(map) => Some(Box::new(map.values())),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::None => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(num) if is_integral(*num) => serializer.serialize_i64(*num as i64),
            Value::Number(num) => serializer.serialize_f64(*num),
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = ok!(serializer.serialize_seq(Some(items.len())));
                for item in items {
                    ok!(seq.serialize_element(item));
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut m = ok!(serializer.serialize_map(Some(map.len())));
                for (key, value) in map {
                    ok!(m.serialize_entry(key, value));
                }
                m.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(num) => num.as_f64().map_or(Value::None, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Value {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<char> for Value {
    fn from(value: char) -> Value {
        Value::String(value.to_string())
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Value {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(value: Cow<'a, str>) -> Value {
        Value::String(value.into_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        value.map_or(Value::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Value {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>, S> From<HashMap<K, V, S>> for Value {
    fn from(map: HashMap<K, V, S>) -> Value {
        Value::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(feature = "preserve_order")]
impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Value {
        Value::Map(map)
    }
}

impl<V: Into<Value>> FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Value {
        Value::Seq(iter.into_iter().map(Into::into).collect())
    }
}
