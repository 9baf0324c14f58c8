//! Canonical query parameters for read requests.
//!
//! # Design
//! Callers hand parameters over either as key/value pairs or as an already
//! URL-encoded query string. Both are normalized through [`IntoParams`] into
//! a single [`Params`] type: an ordered multi-map where a key holds either a
//! single value or an ordered list. List values are emitted as repeated keys
//! on the wire, so `any=tag:bar&any=tag:foo` and
//! `[("any", vec!["tag:bar", "tag:foo"])]` describe the same request.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// The value stored under one query key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    /// Sent as one `key=value` pair per element. An empty list sends nothing
    /// for its key.
    List(Vec<String>),
}

impl ParamValue {
    /// The single value, if this is not a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::List(_) => None,
        }
    }

    /// All values in order; a single value yields a one-element slice.
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(value) => std::slice::from_ref(value),
            ParamValue::List(values) => values,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(first) => {
                let first = std::mem::take(first);
                *self = ParamValue::List(vec![first, value]);
            }
            ParamValue::List(values) => values.push(value),
        }
    }

    fn extend(&mut self, other: ParamValue) {
        match other {
            ParamValue::Single(value) => self.push(value),
            ParamValue::List(values) => {
                for value in values {
                    self.push(value);
                }
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Single(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(values: &[&str]) -> Self {
        ParamValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        ParamValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

macro_rules! scalar_param_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Single(value.to_string())
                }
            }
        )*
    };
}

scalar_param_value!(i32, i64, u32, u64, usize, bool);

/// Ordered query parameters with single- or list-valued keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL-encoded query string. Repeated keys collect into a list
    /// in order of appearance. A leading `?` is ignored.
    pub fn parse_query(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::InvalidParameters(e.to_string()))?;

        let mut params = Params::new();
        for (key, value) in pairs {
            if key.is_empty() {
                return Err(ApiError::InvalidParameters(format!(
                    "query string has a value without a key: {value:?}"
                )));
            }
            params.append(key, value);
        }
        Ok(params)
    }

    /// Set `key` to `value`, replacing any previous value in place.
    /// Returns the replaced value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Add one more value under `key`, turning a single value into a list.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, ParamValue::Single(value))),
        }
    }

    /// Add `value` under `key`, concatenating with any values already there.
    pub fn merge(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(value),
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`Params::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into wire pairs, repeating the key for every list value.
    pub fn to_pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, value)| value.values().iter().map(move |v| (key.as_str(), v.as_str())))
            .collect()
    }

    /// Encode as an `application/x-www-form-urlencoded` query string.
    pub fn to_query_string(&self) -> Result<String> {
        serde_urlencoded::to_string(self.to_pairs()).map_err(|e| ApiError::SerializationError(e.to_string()))
    }
}

/// Anything that can be normalized into [`Params`].
///
/// Implemented for `Params` itself, URL-encoded query strings, key/value
/// pair collections and JSON values holding either an object of scalars or
/// scalar arrays, or a query string.
pub trait IntoParams {
    fn into_params(self) -> Result<Params>;
}

impl IntoParams for Params {
    fn into_params(self) -> Result<Params> {
        Ok(self)
    }
}

impl IntoParams for &Params {
    fn into_params(self) -> Result<Params> {
        Ok(self.clone())
    }
}

impl IntoParams for &str {
    fn into_params(self) -> Result<Params> {
        Params::parse_query(self)
    }
}

impl IntoParams for String {
    fn into_params(self) -> Result<Params> {
        Params::parse_query(&self)
    }
}

impl IntoParams for &String {
    fn into_params(self) -> Result<Params> {
        Params::parse_query(self)
    }
}

impl<K, V> IntoParams for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn into_params(self) -> Result<Params> {
        let mut params = Params::new();
        for (key, value) in self {
            params.merge(key, value);
        }
        Ok(params)
    }
}

impl<K, V, const N: usize> IntoParams for [(K, V); N]
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn into_params(self) -> Result<Params> {
        Vec::from(self).into_params()
    }
}

impl IntoParams for Value {
    fn into_params(self) -> Result<Params> {
        let map = match self {
            Value::Object(map) => map,
            Value::String(query) => return Params::parse_query(&query),
            other => {
                return Err(ApiError::InvalidParameters(format!(
                    "expected an object or a query string, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut params = Params::new();
        for (key, value) in map {
            let value = match value {
                Value::Array(items) if items.is_empty() => {
                    return Err(ApiError::InvalidParameters(format!(
                        "parameter {key:?} is an empty list"
                    )))
                }
                Value::Array(items) => ParamValue::List(
                    items
                        .into_iter()
                        .map(|item| json_scalar(&key, item))
                        .collect::<Result<_>>()?,
                ),
                other => ParamValue::Single(json_scalar(&key, other)?),
            };
            params.insert(key, value);
        }
        Ok(params)
    }
}

/// Normalize any supported parameter input into [`Params`].
pub fn normalize(options: impl IntoParams) -> Result<Params> {
    options.into_params()
}

fn json_scalar(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ApiError::InvalidParameters(format!(
            "parameter {key:?} must be a scalar or a list of scalars, got {}",
            json_kind(&other)
        ))),
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
