//! Aggregation engine: per-key function resolution and application
//!
//! For every key produced by the merger, the engine resolves which
//! disposition applies — an explicit per-key [`KeySpec`], the default spec,
//! or nothing — and assembles the nested result. A key explicitly listed
//! with [`KeySpec::Drop`] is excluded even when a default is set.

use crate::error::{Error, Result};
use crate::merge::{merge_documents, Document};
use crate::reader::read_matching;
use crate::registry::{FunctionSet, Registry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Keyword that marks a key as excluded from the aggregated output
pub const DROP_KEYWORD: &str = "drop";

/// Disposition for one key: apply a set of named functions, or drop the
/// key entirely. Absence from the per-key map means "fall back to the
/// default spec" and is represented by not inserting an entry at all.
#[derive(Clone, Debug)]
pub enum KeySpec {
    /// Apply these functions to the key's collected values
    Apply(FunctionSet),
    /// Exclude the key from the output, regardless of the default spec
    Drop,
}

/// Per-key spec assignments
pub type KeySpecs = BTreeMap<String, KeySpec>;

/// Final aggregated mapping: key -> (function name -> output value)
pub type Aggregated = BTreeMap<String, BTreeMap<String, Value>>;

/// Aggregate document values by key using the given specs
///
/// Each merged key resolves to its entry in `per_key` when listed (an
/// explicit [`KeySpec::Drop`] counts as listed), otherwise to `default`.
/// Keys resolving to `Drop`, to no spec at all, or to an empty function
/// set are omitted from the result.
///
/// Fails with [`Error::NoAggregationSpecs`] when both `per_key` and
/// `default` are `None` — there would be no way to determine a disposition
/// for any key. Function application errors propagate unchanged.
pub fn aggregate(
    documents: &[Document],
    per_key: Option<&KeySpecs>,
    default: Option<&KeySpec>,
) -> Result<Aggregated> {
    if per_key.is_none() && default.is_none() {
        return Err(Error::NoAggregationSpecs);
    }

    let mut out = Aggregated::new();
    for (key, values) in merge_documents(documents) {
        let spec = per_key.and_then(|specs| specs.get(&key)).or(default);
        if let Some(KeySpec::Apply(set)) = spec {
            if !set.is_empty() {
                out.insert(key, set.apply(&values)?);
            }
        }
    }
    Ok(out)
}

/// Read all JSON files matching `patterns` under `root` and aggregate them
///
/// Returns `Ok(None)` when no files matched; callers report that to the
/// user as a diagnostic, not a failure.
pub fn aggregate_files<P, S>(
    root: P,
    patterns: &[S],
    per_key: Option<&KeySpecs>,
    default: Option<&KeySpec>,
) -> Result<Option<Aggregated>>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let documents: Vec<Document> = read_matching(root, patterns)?
        .into_iter()
        .map(|(_, document)| document)
        .collect();
    if documents.is_empty() {
        return Ok(None);
    }
    aggregate(&documents, per_key, default).map(Some)
}

/// Parse a list of function names (or the `drop` keyword) into a [`KeySpec`]
///
/// `key` is only used for error reporting. Fails with
/// [`Error::DropWithFunctions`] when `drop` appears alongside named
/// functions, and with [`Error::UnknownFunction`] on a name the registry
/// does not hold.
pub fn parse_spec<S: AsRef<str>>(key: &str, names: &[S], registry: &Registry) -> Result<KeySpec> {
    if names.iter().any(|n| n.as_ref() == DROP_KEYWORD) {
        if names.len() > 1 {
            return Err(Error::DropWithFunctions {
                key: key.to_string(),
            });
        }
        return Ok(KeySpec::Drop);
    }
    Ok(KeySpec::Apply(registry.function_set(names)?))
}

/// Parse one `key=fn1,fn2` or `key=drop` argument into a per-key entry
pub fn parse_key_spec(arg: &str, registry: &Registry) -> Result<(String, KeySpec)> {
    let invalid = || Error::InvalidKeySpec {
        arg: arg.to_string(),
    };
    let (key, names) = arg.split_once('=').ok_or_else(invalid)?;
    if key.is_empty() || names.is_empty() {
        return Err(invalid());
    }
    let names: Vec<&str> = names.split(',').collect();
    let spec = parse_spec(key, &names, registry)?;
    Ok((key.to_string(), spec))
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

    fn sample_docs() -> Vec<Document> {
        vec![
            doc(json!({"a": 1, "b": 2})),
            doc(json!({"a": 3, "b": 4, "c": 5})),
            doc(json!({"c": 6})),
        ]
    }

    fn list_spec() -> KeySpec {
        KeySpec::Apply(Registry::builtin().function_set(["list"]).unwrap())
    }

    #[test]
    fn test_aggregate_per_key_with_default_fallback() {
        let registry = Registry::builtin();
        let mut per_key = KeySpecs::new();
        per_key.insert(
            "a".to_string(),
            KeySpec::Apply(registry.function_set(["sum", "min"]).unwrap()),
        );
        let default = list_spec();

        let out = aggregate(&sample_docs(), Some(&per_key), Some(&default)).unwrap();

        assert_eq!(out["a"]["sum"], json!(4));
        assert_eq!(out["a"]["min"], json!(1));
        assert_eq!(out["b"]["list"], json!([2, 4]));
        assert_eq!(out["c"]["list"], json!([5, 6]));
    }

    #[test]
    fn test_aggregate_empty_documents() {
        let default = list_spec();
        let out = aggregate(&[], None, Some(&default)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_aggregate_explicit_drop_wins_over_default() {
        let docs = vec![doc(json!({"a": 1, "b": 2})), doc(json!({"a": 3, "b": 4}))];
        let mut per_key = KeySpecs::new();
        per_key.insert("a".to_string(), KeySpec::Drop);
        let default = list_spec();

        let out = aggregate(&docs, Some(&per_key), Some(&default)).unwrap();

        assert!(!out.contains_key("a"));
        assert_eq!(out["b"]["list"], json!([2, 4]));
    }

    #[test]
    fn test_aggregate_no_default_drops_unlisted_keys() {
        let registry = Registry::builtin();
        let mut per_key = KeySpecs::new();
        per_key.insert(
            "a".to_string(),
            KeySpec::Apply(registry.function_set(["max"]).unwrap()),
        );

        let out = aggregate(&sample_docs(), Some(&per_key), None).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out["a"]["max"], json!(3));
    }

    #[test]
    fn test_aggregate_both_specs_unset_is_an_error() {
        let err = aggregate(&sample_docs(), None, None).unwrap_err();
        assert!(matches!(err, Error::NoAggregationSpecs));

        let err = aggregate(&[], None, None).unwrap_err();
        assert!(matches!(err, Error::NoAggregationSpecs));
    }

    #[test]
    fn test_aggregate_drop_as_default() {
        let registry = Registry::builtin();
        let mut per_key = KeySpecs::new();
        per_key.insert(
            "c".to_string(),
            KeySpec::Apply(registry.function_set(["count"]).unwrap()),
        );

        let out = aggregate(&sample_docs(), Some(&per_key), Some(&KeySpec::Drop)).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out["c"]["count"], json!(2));
    }

    #[test]
    fn test_aggregate_empty_function_set_omits_key() {
        let default = KeySpec::Apply(FunctionSet::default());
        let out = aggregate(&sample_docs(), None, Some(&default)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_aggregate_function_error_propagates() {
        let docs = vec![doc(json!({"a": "oops"}))];
        let registry = Registry::builtin();
        let default = KeySpec::Apply(registry.function_set(["mean"]).unwrap());

        let err = aggregate(&docs, None, Some(&default)).unwrap_err();
        assert!(matches!(err, Error::FunctionApplication { .. }));
    }

    #[test]
    fn test_aggregate_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("r1.json"), r#"{"a": 1, "b": 2}"#).unwrap();
        std::fs::write(dir.path().join("r2.json"), r#"{"a": 3, "c": 5}"#).unwrap();

        let default = list_spec();
        let out = aggregate_files(dir.path(), &["*.json"], None, Some(&default))
            .unwrap()
            .unwrap();

        assert_eq!(out["a"]["list"], json!([1, 3]));
        assert_eq!(out["b"]["list"], json!([2]));
        assert_eq!(out["c"]["list"], json!([5]));
    }

    #[test]
    fn test_aggregate_files_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let default = list_spec();

        let out = aggregate_files(dir.path(), &["*.json"], None, Some(&default)).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_parse_key_spec_functions() {
        let registry = Registry::builtin();
        let (key, spec) = parse_key_spec("loss=min,mean", &registry).unwrap();
        assert_eq!(key, "loss");
        match spec {
            KeySpec::Apply(set) => assert_eq!(set.names(), vec!["mean", "min"]),
            KeySpec::Drop => panic!("expected functions"),
        }
    }

    #[test]
    fn test_parse_key_spec_drop() {
        let registry = Registry::builtin();
        let (key, spec) = parse_key_spec("seed=drop", &registry).unwrap();
        assert_eq!(key, "seed");
        assert!(matches!(spec, KeySpec::Drop));
    }

    #[test]
    fn test_parse_key_spec_drop_with_functions_rejected() {
        let registry = Registry::builtin();
        let err = parse_key_spec("seed=drop,sum", &registry).unwrap_err();
        assert!(matches!(err, Error::DropWithFunctions { key } if key == "seed"));
    }

    #[test]
    fn test_parse_key_spec_unknown_function() {
        let registry = Registry::builtin();
        let err = parse_key_spec("loss=avg", &registry).unwrap_err();
        assert!(matches!(err, Error::UnknownFunction { name } if name == "avg"));
    }

    #[test]
    fn test_parse_key_spec_malformed() {
        let registry = Registry::builtin();
        assert!(matches!(
            parse_key_spec("loss", &registry),
            Err(Error::InvalidKeySpec { .. })
        ));
        assert!(matches!(
            parse_key_spec("=sum", &registry),
            Err(Error::InvalidKeySpec { .. })
        ));
        assert!(matches!(
            parse_key_spec("loss=", &registry),
            Err(Error::InvalidKeySpec { .. })
        ));
    }
}
