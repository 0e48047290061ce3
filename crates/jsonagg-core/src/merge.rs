//! Key-wise merging of JSON documents

use serde_json::Value;
use std::collections::BTreeMap;

/// One parsed JSON object: a mapping from string key to arbitrary JSON value
pub type Document = serde_json::Map<String, Value>;

/// Merged view of a document sequence: every key that appears in any
/// document, mapped to that key's values in document input order
pub type MergedValues = BTreeMap<String, Vec<Value>>;

/// Merge a sequence of documents into a [`MergedValues`] mapping
///
/// Documents lacking a key contribute nothing for that key (no null
/// padding), so each value list's length equals the number of documents
/// containing the key. An empty input yields an empty mapping.
pub fn merge_documents(documents: &[Document]) -> MergedValues {
    let mut merged = MergedValues::new();
    for document in documents {
        for (key, value) in document {
            merged.entry(key.clone()).or_default().push(value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_merge_overlapping_keys() {
        let docs = [doc(json!({"a": 1, "b": 2})), doc(json!({"a": 3, "c": 4}))];
        let merged = merge_documents(&docs);

        assert_eq!(merged["a"], vec![json!(1), json!(3)]);
        assert_eq!(merged["b"], vec![json!(2)]);
        assert_eq!(merged["c"], vec![json!(4)]);
    }

    #[test]
    fn test_merge_preserves_document_order() {
        let docs = [
            doc(json!({"a": "first"})),
            doc(json!({"a": "second"})),
            doc(json!({"a": "third"})),
        ];
        let merged = merge_documents(&docs);

        assert_eq!(
            merged["a"],
            vec![json!("first"), json!("second"), json!("third")]
        );
    }

    #[test]
    fn test_merge_empty_document_contributes_nothing() {
        let docs = [doc(json!({"a": 1, "b": 2})), doc(json!({}))];
        let merged = merge_documents(&docs);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["a"], vec![json!(1)]);
        assert_eq!(merged["b"], vec![json!(2)]);
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_documents(&[]).is_empty());
    }

    #[test]
    fn test_merge_key_set_is_union() {
        let docs = [
            doc(json!({"a": 1})),
            doc(json!({"b": 2})),
            doc(json!({"a": 3, "c": 4})),
        ];
        let merged = merge_documents(&docs);

        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
