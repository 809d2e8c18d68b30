//! Flattening of nested event fields into dotted keys

use std::collections::BTreeMap;

use crate::domain::Value;

/// Dotted-path keys to non-mapping values
pub type FlatFieldMap = BTreeMap<String, Value>;

/// Keys starting with this character carry pipeline metadata
pub const METADATA_PREFIX: char = '@';

/// Top-level field carrying the event's tags
pub const TAGS_FIELD: &str = "tags";

/// Separator between path segments of nested keys
pub const PATH_SEPARATOR: &str = ".";

fn is_reserved(prefix: Option<&str>, key: &str) -> bool {
    key.starts_with(METADATA_PREFIX) || (prefix.is_none() && key == TAGS_FIELD)
}

/// Flatten `source` into a single-level map
///
/// Nested mappings are expanded recursively, their keys joined to the parent
/// path with `.`. Metadata keys are skipped at every depth; `tags` only at the
/// top level, where the event builder handles it separately.
pub fn flatten(prefix: Option<&str>, source: &BTreeMap<String, Value>) -> FlatFieldMap {
    let mut this_level = FlatFieldMap::new();

    for (key, contents) in source {
        if is_reserved(prefix, key) {
            continue;
        }

        let field = match prefix {
            Some(parent) => format!("{}{}{}", parent, PATH_SEPARATOR, key),
            None => key.clone(),
        };

        match contents {
            Value::Mapping(nested) => this_level.extend(flatten(Some(&field), nested)),
            value => {
                this_level.insert(field, value.clone());
            }
        }
    }

    this_level
}
