//! jsonagg-core: Core library for aggregating JSON result files
//!
//! This library provides functionality to:
//! - Discover files under a root directory via multiple glob patterns
//! - Merge many JSON documents key-wise into per-key value lists
//! - Apply named aggregation functions (count, sum, mean, ...) per key,
//!   with explicit per-key assignments, a default, or a drop marker
//! - Flatten nested documents and collect them into a CSV table

pub mod aggregate;
pub mod collect;
pub mod discover;
pub mod error;
pub mod flatten;
pub mod merge;
pub mod reader;
pub mod registry;

pub use aggregate::{
    aggregate, aggregate_files, parse_key_spec, parse_spec, Aggregated, KeySpec, KeySpecs,
    DROP_KEYWORD,
};
pub use collect::{collect, delimiter_byte, CollectedRow, CollectedTable, LOCATION_COLUMN};
pub use discover::find_matching;
pub use error::{Error, Result};
pub use flatten::flatten;
pub use merge::{merge_documents, Document, MergedValues};
pub use reader::{read_json, read_matching};
pub use registry::{AggFn, FunctionSet, Registry};
