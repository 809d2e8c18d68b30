//! `%{field}` substitution against an event
//!
//! Supported references:
//! - `%{name}` a top-level field, `%{a.b}` or `%{[a][b]}` a nested one
//! - `%{+FORMAT}` the event timestamp rendered with a strftime format (`%{+%s}` for epoch seconds)
//!
//! References that cannot be resolved are left in the output verbatim.

use chrono::format::{Item, StrftimeItems};

use crate::domain::{RawEvent, Value};

const OPEN: &str = "%{";
const CLOSE: char = '}';

/// Render `template` against `event`
pub fn sprintf(template: &str, event: &RawEvent) -> String {
    render(template, event, true)
}

/// Like [`sprintf`], but references to mappings are left unresolved
pub fn sprintf_scalars(template: &str, event: &RawEvent) -> String {
    render(template, event, false)
}

fn render(template: &str, event: &RawEvent, mappings: bool) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            output.push_str(&rest[start..]);
            return output;
        };

        let reference = &after_open[..end];
        match render_reference(reference, event, mappings) {
            Some(text) => output.push_str(&text),
            None => output.push_str(&rest[start..start + OPEN.len() + end + 1]),
        }
        rest = &after_open[end + 1..];
    }

    output.push_str(rest);
    output
}

/// Whether `text` still holds a reference, e.g. after rendering a template
/// whose field was missing
pub fn has_unresolved_reference(text: &str) -> bool {
    text.find(OPEN)
        .map(|start| text[start..].contains(CLOSE))
        .unwrap_or(false)
}

fn render_reference(reference: &str, event: &RawEvent, mappings: bool) -> Option<String> {
    if let Some(format) = reference.strip_prefix('+') {
        return format_timestamp(format, event);
    }

    match lookup(reference, event)? {
        Value::Null => None,
        Value::Mapping(_) if !mappings => None,
        value => Some(value.to_text()),
    }
}

fn lookup<'a>(reference: &str, event: &'a RawEvent) -> Option<&'a Value> {
    if reference.starts_with('[') {
        let segments = bracket_segments(reference)?;
        return event.get_path(segments.as_slice());
    }

    event.get(reference).or_else(|| {
        let segments: Vec<&str> = reference.split('.').collect();
        event.get_path(segments.as_slice())
    })
}

/// Split `[a][b]` into `["a", "b"]`
fn bracket_segments(reference: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut rest = reference;
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let end = inner.find(']')?;
        segments.push(&inner[..end]);
        rest = &inner[end + 1..];
    }
    Some(segments)
}

fn format_timestamp(format: &str, event: &RawEvent) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if format.is_empty() || items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    Some(event.timestamp().format_with_items(items.into_iter()).to_string())
}
