//! Tabular collection of flattened JSON files for CSV export
//!
//! Each matching file becomes one row, keyed by its root-relative location.
//! Columns are the union of all flattened keys across the collected files;
//! cells a file lacks are filled with a configurable rest value at write
//! time.

use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::merge::Document;
use crate::reader::read_matching;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the column holding each file's root-relative path
pub const LOCATION_COLUMN: &str = "Location";

/// One collected file: its location and flattened contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedRow {
    /// Path relative to the collection root
    pub location: PathBuf,
    /// Flattened file contents
    pub contents: Document,
}

/// Collected files ready for CSV export, sorted by location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedTable {
    /// Rows, one per collected file
    pub rows: Vec<CollectedRow>,
}

impl CollectedTable {
    /// Check whether no files were collected
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names: `Location` first, then the sorted union of all
    /// flattened keys across the collected files
    pub fn column_names(&self) -> Vec<String> {
        let keys: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|row| row.contents.keys())
            .map(String::as_str)
            .filter(|key| *key != LOCATION_COLUMN)
            .collect();

        let mut columns = Vec::with_capacity(keys.len() + 1);
        columns.push(LOCATION_COLUMN.to_string());
        columns.extend(keys.into_iter().map(String::from));
        columns
    }

    /// Write the table as CSV with the given field delimiter
    ///
    /// Cells where a row lacks a column are filled with `restval`.
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8, restval: &str) -> Result<()> {
        let columns = self.column_names();
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        csv_writer.write_record(&columns)?;
        for row in &self.rows {
            let record: Vec<String> = columns
                .iter()
                .map(|column| {
                    if column == LOCATION_COLUMN {
                        row.location.display().to_string()
                    } else {
                        row.contents
                            .get(column)
                            .map(render_value)
                            .unwrap_or_else(|| restval.to_string())
                    }
                })
                .collect();
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Collect all matching JSON files under `root` into a [`CollectedTable`],
/// flattening each file's contents with `flatten_delimiter`
pub fn collect<P, S>(root: P, patterns: &[S], flatten_delimiter: &str) -> Result<CollectedTable>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut rows: Vec<CollectedRow> = read_matching(root, patterns)?
        .into_iter()
        .map(|(location, document)| CollectedRow {
            location,
            contents: flatten(&document, flatten_delimiter),
        })
        .collect();
    rows.sort_by(|a, b| a.location.cmp(&b.location));
    Ok(CollectedTable { rows })
}

/// Validate a CSV field delimiter, which must be a single byte
pub fn delimiter_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        &[byte] => Ok(byte),
        _ => Err(Error::InvalidDelimiter {
            delimiter: delimiter.to_string(),
        }),
    }
}

/// Render a leaf value as a bare CSV cell: strings unquoted, everything
/// else in its JSON rendering
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
