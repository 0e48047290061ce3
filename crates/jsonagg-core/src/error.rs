//! Error types for jsonagg-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jsonagg-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matched file is not valid JSON
    #[error("failed to parse JSON '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON file's top level is not an object
    #[error("top-level JSON value in '{path}' is not an object")]
    NotAnObject { path: PathBuf },

    /// Neither per-key nor default aggregation functions were configured
    #[error("no aggregation functions configured: per-key and default specs are both unset")]
    NoAggregationSpecs,

    /// A key's spec mixes `drop` with named functions
    #[error("key '{key}' combines 'drop' with named aggregation functions")]
    DropWithFunctions { key: String },

    /// A function name is not present in the registry
    #[error("unknown aggregation function '{name}'")]
    UnknownFunction { name: String },

    /// An aggregation function failed on a key's collected values
    #[error("aggregation function '{function}' failed: {message}")]
    FunctionApplication { function: String, message: String },

    /// A CSV field delimiter that is not a single byte
    #[error("CSV delimiter must be a single byte, got '{delimiter}'")]
    InvalidDelimiter { delimiter: String },

    /// A malformed key=functions argument
    #[error("invalid key spec '{arg}': expected 'key=fn1,fn2' or 'key=drop'")]
    InvalidKeySpec { arg: String },

    /// An invalid glob pattern
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// CSV writing error from the csv crate
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
