use std::collections::BTreeMap;

use crate::{
    domain::{FieldValue, OutboundEvent, RawEvent, Value},
    services::{
        flattener::{flatten, TAGS_FIELD},
        template::{has_unresolved_reference, sprintf, sprintf_scalars},
    },
    utils::errors::{OutputError, Result},
};

pub const HOST_FIELD: &str = "host";
pub const TIME_FIELD: &str = "time";
pub const MESSAGE_FIELD: &str = "message";
pub const DESCRIPTION_FIELD: &str = "description";
pub const METRIC_FIELD: &str = "metric";
pub const TTL_FIELD: &str = "ttl";

/// Default sender template: the event's own `host` field
pub const DEFAULT_SENDER: &str = "%{host}";

/// Turns upstream events into collector records
#[derive(Debug, Clone)]
pub struct EventBuilder {
    map_fields: bool,
    sender: String,
    riemann_event: BTreeMap<String, String>,
    default_host: String,
}

impl EventBuilder {
    /// Create a builder that falls back to `default_host` when the sender
    /// template cannot be resolved
    pub fn new(default_host: impl Into<String>) -> Self {
        Self {
            map_fields: false,
            sender: DEFAULT_SENDER.to_string(),
            riemann_event: BTreeMap::new(),
            default_host: default_host.into(),
        }
    }

    /// Copy every (flattened) event field into the record
    pub fn with_map_fields(mut self, map_fields: bool) -> Self {
        self.map_fields = map_fields;
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Templated fields that override mapped ones
    pub fn with_riemann_event(mut self, riemann_event: BTreeMap<String, String>) -> Self {
        self.riemann_event = riemann_event;
        self
    }

    /// Build the collector record for `event`
    pub fn build(&self, event: &RawEvent) -> Result<OutboundEvent> {
        let mut host = None;
        let mut description = event
            .get(MESSAGE_FIELD)
            .filter(|message| !message.is_null())
            .map(Value::to_text);
        let mut fields = BTreeMap::new();

        if self.map_fields {
            for (key, value) in flatten(None, event.fields()) {
                if let Some(field) = normalize_field(&value) {
                    fields.insert(key, field);
                }
            }
            // These have dedicated slots in the record.
            fields.remove(TIME_FIELD);
            if let Some(mapped) = fields.remove(HOST_FIELD) {
                host = Some(mapped.to_string());
            }
            if let Some(mapped) = fields.remove(DESCRIPTION_FIELD) {
                description = Some(mapped.to_string());
            }
        }

        for (key, template) in &self.riemann_event {
            let rendered = sprintf(template, event);
            match key.as_str() {
                HOST_FIELD => host = Some(rendered),
                DESCRIPTION_FIELD => description = Some(rendered),
                METRIC_FIELD | TTL_FIELD => {
                    let number = rendered.trim().parse::<f64>().map_err(|_| {
                        OutputError::Serialization(format!(
                            "{} '{}' (from '{}') is not a number",
                            key, rendered, template
                        ))
                    })?;
                    fields.insert(key.clone(), FieldValue::Float(number));
                }
                _ => {
                    fields.insert(key.clone(), FieldValue::String(rendered));
                }
            }
        }

        let tags = event.get(TAGS_FIELD).and_then(normalize_tags);

        let host = host.unwrap_or_else(|| self.sender_host(event));

        Ok(OutboundEvent {
            host,
            time: event.timestamp().timestamp(),
            description,
            tags,
            fields,
        })
    }

    fn sender_host(&self, event: &RawEvent) -> String {
        let rendered = sprintf_scalars(&self.sender, event);
        if rendered.is_empty() || has_unresolved_reference(&rendered) {
            tracing::debug!(
                sender = %self.sender,
                "Sender template unresolved, using default host {}",
                self.default_host
            );
            self.default_host.clone()
        } else {
            rendered
        }
    }
}

/// Convert any sequence of values into a compacted list of tag strings
///
/// Null and empty entries are removed, scalars are rendered as text and
/// nested values as their text form (JSON for mappings). Works on any
/// iterable of values, independent of the container backing it.
pub fn compact_tags<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    items
        .into_iter()
        .filter(|item| !item.is_null())
        .map(Value::to_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Normalize the `tags` field; `None` means the event has no tags
pub fn normalize_tags(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Sequence(items) => Some(compact_tags(items)),
        single => Some(compact_tags([single])),
    }
}

/// Restrict a flattened value to the shapes the wire format carries
///
/// Nulls are dropped, sequences become compacted string lists and anything
/// else that has no wire shape is sent as text.
fn normalize_field(value: &Value) -> Option<FieldValue> {
    let field = match value {
        Value::Null => return None,
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Integer(i) => FieldValue::Integer(*i),
        Value::Float(f) => FieldValue::Float(*f),
        Value::String(s) => FieldValue::String(s.clone()),
        Value::Sequence(items) => FieldValue::StringList(compact_tags(items)),
        Value::Mapping(_) => FieldValue::String(value.to_text()),
    };
    Some(field)
}
