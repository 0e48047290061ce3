//! Flattening of nested JSON objects into single-level mappings

use crate::merge::Document;
use serde_json::Value;

/// Flatten a nested JSON object into a single-level mapping
///
/// Object values are descended into recursively, joining parent and child
/// keys with `delimiter`. Any non-object value (scalars, arrays, null) is a
/// leaf and is copied as-is under its compound key. An already-flat object
/// comes back unchanged.
pub fn flatten(document: &Document, delimiter: &str) -> Document {
    let mut flat = Document::new();
    flatten_into(document, None, delimiter, &mut flat);
    flat
}

fn flatten_into(document: &Document, parent_key: Option<&str>, delimiter: &str, out: &mut Document) {
    for (key, value) in document {
        let compound = match parent_key {
            Some(parent) => format!("{parent}{delimiter}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&compound), delimiter, out),
            _ => {
                out.insert(compound, value.clone());
            }
        }
    }
}
