//! JSON file reading for discovered paths

use crate::discover::find_matching;
use crate::error::{Error, Result};
use crate::merge::Document;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read one JSON file into a [`Document`]
///
/// The file's top-level value must be an object.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| Error::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Find and read all matching JSON files under `root`
///
/// Directories matched by a pattern are skipped. Each entry pairs the
/// file's root-relative path with its parsed contents, in discovery order.
pub fn read_matching<P, S>(root: P, patterns: &[S]) -> Result<Vec<(PathBuf, Document)>>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let root = root.as_ref();
    let mut out = Vec::new();
    for path in find_matching(root, patterns)? {
        if !path.is_file() {
            continue;
        }
        let document = read_json(&path)?;
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        out.push((relative, document));
    }
    Ok(out)
}
