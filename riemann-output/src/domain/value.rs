use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::errors::{OutputError, Result};

/// Field holding the event's own timestamp
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// A field value of an upstream event
///
/// Values nest arbitrarily through `Sequence` and `Mapping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the value as plain text
    ///
    /// Scalars use their natural form, sequences are joined with commas
    /// (nulls skipped) and mappings are rendered as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::Sequence(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Mapping(_) => serde_json::Value::from(self.clone()).to_string(),
        }
    }
}

pub(crate) fn format_float(f: f64) -> String {
    match serde_json::Number::from_f64(f) {
        Some(n) => n.to_string(),
        None => f.to_string(),
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Mapping(map) => {
                serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A structured event handed over by the upstream pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    fields: BTreeMap<String, Value>,
    timestamp: DateTime<Utc>,
}

impl RawEvent {
    /// Build an event from its fields, taking the timestamp from `@timestamp`
    ///
    /// Events without `@timestamp` are stamped with the current time.
    pub fn new(fields: BTreeMap<String, Value>) -> Result<Self> {
        let timestamp = match fields.get(TIMESTAMP_FIELD) {
            None => Utc::now(),
            Some(value) => parse_timestamp(value)?,
        };
        Ok(Self { fields, timestamp })
    }

    /// Build an event from a decoded JSON object
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match Value::from(value) {
            Value::Mapping(fields) => Self::new(fields),
            other => Err(OutputError::Event(format!(
                "Expected a JSON object, got {}",
                serde_json::Value::from(other)
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| OutputError::Event(format!("Malformed JSON event: {}", e)))?;
        Self::from_json(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a nested field by its path segments
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(first.as_ref())?;
        for segment in rest {
            current = current.as_mapping()?.get(segment.as_ref())?;
        }
        Some(current)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| OutputError::Event(format!("Invalid {} '{}': {}", TIMESTAMP_FIELD, s, e))),
        Value::Integer(secs) => DateTime::from_timestamp(*secs, 0).ok_or_else(|| {
            OutputError::Event(format!("{} {} is out of range", TIMESTAMP_FIELD, secs))
        }),
        other => Err(OutputError::Event(format!(
            "Unsupported {} value: {:?}",
            TIMESTAMP_FIELD, other
        ))),
    }
}
