//! Wire field maps.
//!
//! A [`FieldMap`] is the prunable form of a record: field name to tagged
//! [`FieldValue`]. Records build their map directly through the builder
//! methods ([`FieldMap::with`], [`FieldMap::with_opt`]), so integers never go
//! through a floating point representation. Records without a hand-written
//! builder fall back to [`FieldMap::from_serialize`], whose output is cleaned
//! up by the [`Sanitizer`].

use std::collections::{BTreeMap, btree_map};

use serde::Serialize;
use serde_json::Value;

use crate::error::{MangoError, Result};

pub mod sanitize;

pub use sanitize::Sanitizer;

/// Name of the identifier field on every record.
pub const ID_FIELD: &str = "Id";

/// A dynamically typed wire value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer, sent without a fractional part.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(String),
    /// Array of values.
    List(Vec<FieldValue>),
    /// Nested object.
    Object(FieldMap),
}

impl FieldValue {
    /// Converts a JSON value, keeping integers as [`FieldValue::Int`] when they fit.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    n.as_f64().map_or(Self::Null, Self::Float)
                }
            }
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect(),
            ),
        }
    }

    /// Returns true for the zero value of the field's type.
    ///
    /// Zero values are `""`, `0`, `0.0` and `null`. Booleans, lists and
    /// objects are never zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.is_empty(),
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Bool(_) | Self::List(_) | Self::Object(_) => false,
        }
    }

    /// Turns integral floats back into integers, recursively.
    pub fn coerce_integral(&mut self) {
        match self {
            Self::Float(f) => {
                if let Some(i) = integral(*f) {
                    *self = Self::Int(i);
                }
            }
            Self::List(items) => items.iter_mut().for_each(Self::coerce_integral),
            Self::Object(map) => map.coerce_integral(),
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Str(_) => {}
        }
    }

    /// Renders the value as a URL query parameter.
    ///
    /// Returns `None` for `null`; lists and objects are sent as JSON.
    #[must_use]
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Str(s) => Some(s.clone()),
            Self::List(_) | Self::Object(_) => serde_json::to_string(self).ok(),
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range and fractional part are checked before the cast"
)]
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        Self::Object(value)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(values: Vec<V>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Field name to value mapping sent as a request body or query string.
///
/// Key order is irrelevant on the wire; a sorted map keeps bodies stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from any serializable value through its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`MangoError::Serialization`] if the value does not serialize
    /// to a JSON object.
    pub fn from_serialize<S: Serialize + ?Sized>(value: &S) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => {
                Ok(map.into_iter().map(|(k, v)| (k, FieldValue::from_json(v))).collect())
            }
            other => Err(MangoError::Serialization(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a field only when a value is present.
    #[must_use]
    pub fn with_opt<V: Into<FieldValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Inserts a field, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.0.insert(name.to_owned(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    /// Returns a field's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Returns true when the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Keeps only the fields matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &FieldValue) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over field names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }

    /// Turns integral floats back into integers in every field.
    pub fn coerce_integral(&mut self) {
        self.0.values_mut().for_each(FieldValue::coerce_integral);
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for FieldMap {
    type IntoIter = btree_map::IntoIter<String, FieldValue>;
    type Item = (String, FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;
    type Item = (&'a String, &'a FieldValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
