//! Dynamic argument values.
//!
//! Query arguments arrive as loosely structured data. [`Value`] is the in-memory
//! form used by validation: ordered objects, a distinct `Undefined` for
//! "explicitly not provided", and the three null sentinels used by JSON fields.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamic argument value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Not provided. Stripped during normalization.
    #[default]
    Undefined,
    /// Plain null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// List of values.
    Array(Vec<Value>),
    /// Ordered map of values.
    Object(IndexMap<String, Value>),
    /// Sets a nullable JSON column to database `NULL`, or matches it in a filter.
    DbNull,
    /// The JSON `null` literal stored inside a JSON column.
    JsonNull,
    /// Matches either [`Value::DbNull`] or [`Value::JsonNull`]. Filters only.
    AnyNull,
}

impl Value {
    /// Create an empty object.
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Check for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check for plain `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check for one of the null sentinels.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::DbNull | Self::JsonNull | Self::AnyNull)
    }

    /// Check for an integer or float.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Borrow as an object.
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow as an object.
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get an integer. Floats without a fractional part convert.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Get any number as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Look up an object key. Missing keys and non-objects yield `Undefined`.
    pub fn get(&self, key: &str) -> &Value {
        static UNDEFINED: Value = Value::Undefined;
        self.as_object()
            .and_then(|map| map.get(key))
            .unwrap_or(&UNDEFINED)
    }

    /// Whether an object key holds a defined value.
    pub fn has(&self, key: &str) -> bool {
        !self.get(key).is_undefined()
    }

    /// Insert into an object, turning `Undefined` into an empty object first.
    ///
    /// Returns `false` when `self` is some other non-object value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        if self.is_undefined() {
            *self = Self::object();
        }
        match self {
            Self::Object(map) => {
                map.insert(key.into(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::DbNull => "DbNull",
            Self::JsonNull => "JsonNull",
            Self::AnyNull => "AnyNull",
        }
    }

    /// Strip `Undefined` object entries recursively.
    ///
    /// `Undefined` array elements become `Null`, matching how such arrays serialize.
    pub fn normalize(self) -> Self {
        match self {
            Self::Object(map) => Self::Object(
                map.into_iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k, v.normalize()))
                    .collect(),
            ),
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|v| match v {
                        Self::Undefined => Self::Null,
                        other => other.normalize(),
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    /// Convert to a JSON value. `Undefined` entries are dropped and sentinels
    /// render as their names.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Undefined | Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::String(s) => Json::String(s.clone()),
            Self::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            Self::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Object(map) => Json::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::DbNull => Json::String("DbNull".into()),
            Self::JsonNull => Json::String("JsonNull".into()),
            Self::AnyNull => Json::String("AnyNull".into()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::DbNull | Self::JsonNull | Self::AnyNull => f.write_str(self.type_name()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_order_and_numbers() {
        let value = Value::from(json!({ "b": 1, "a": 1.5, "c": [true, null] }));
        let map = value.as_object().unwrap();

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(map["b"], Value::Int(1));
        assert_eq!(map["a"], Value::Float(1.5));
        assert_eq!(map["c"], Value::Array(vec![Value::Bool(true), Value::Null]));
    }

    #[test]
    fn test_normalize_strips_undefined_recursively() {
        let mut inner = IndexMap::new();
        inner.insert("keep".to_string(), Value::Int(1));
        inner.insert("drop".to_string(), Value::Undefined);

        let mut outer = IndexMap::new();
        outer.insert("nested".to_string(), Value::Object(inner));
        outer.insert("gone".to_string(), Value::Undefined);
        outer.insert("list".to_string(), Value::Array(vec![Value::Undefined]));

        let normalized = Value::Object(outer).normalize();
        assert_eq!(
            normalized.to_json(),
            json!({ "nested": { "keep": 1 }, "list": [null] })
        );
    }

    #[test]
    fn test_get_and_insert() {
        let mut value = Value::Undefined;
        assert!(value.insert("take", 1));
        assert_eq!(value.get("take"), &Value::Int(1));
        assert!(value.get("missing").is_undefined());
        assert!(!Value::Int(3).clone().insert("x", 1));
    }

    #[test]
    fn test_sentinels_render_as_names() {
        let value: Value = [("a", Value::DbNull), ("b", Value::AnyNull)].into_iter().collect();
        assert_eq!(value.to_json(), json!({ "a": "DbNull", "b": "AnyNull" }));
        assert!(Value::JsonNull.is_sentinel());
        assert_eq!(Value::JsonNull.to_string(), "JsonNull");
    }

    #[test]
    fn test_as_i64_accepts_integral_floats() {
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::String("3".into()).as_i64(), None);
    }

    #[test]
    fn test_serde_round_trip_through_json() {
        let value: Value = serde_json::from_str(r#"{"id":"u1","age":16}"#).unwrap();
        assert_eq!(value.get("age"), &Value::Int(16));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"id":"u1","age":16}"#);
    }
}
