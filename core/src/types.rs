//! Request and response payload types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a write API call: `{"method": ..., "params": {...}}`.
///
/// `method` serializes before `params`, and `params` keeps the caller's key
/// order with the token appended last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteEnvelope {
    pub method: String,
    pub params: Map<String, Value>,
}

/// Parsed body of a read API response.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutput {
    /// Default JSON output.
    Json(Value),
    /// Raw XML document, returned when the query forced `format=xml`
    /// (for example `output=mrss`).
    Xml(String),
}

impl ReadOutput {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ReadOutput::Json(value) => Some(value),
            ReadOutput::Xml(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ReadOutput::Json(value) => Some(value),
            ReadOutput::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&str> {
        match self {
            ReadOutput::Json(_) => None,
            ReadOutput::Xml(doc) => Some(doc),
        }
    }
}
