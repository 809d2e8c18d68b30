use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::value::format_float;

/// A value the collector's wire format can carry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    StringList(Vec<String>),
}

impl FieldValue {
    /// Numeric view used for `metric` and `ttl`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => f.write_str(&format_float(*v)),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::StringList(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

/// The record sent to the collector for one upstream event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub host: String,
    /// Seconds since the epoch
    pub time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl OutboundEvent {
    pub fn new(host: impl Into<String>, time: i64) -> Self {
        Self {
            host: host.into(),
            time,
            description: None,
            tags: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}
