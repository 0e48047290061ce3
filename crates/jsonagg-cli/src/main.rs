//! jsonagg CLI
//!
//! Command-line tool for aggregating values of matching JSON files by key
//! and for collecting flattened JSON files into a CSV table.

use clap::{Parser, Subcommand};
use jsonagg_core::{
    aggregate_files, collect, delimiter_byte, parse_key_spec, parse_spec, Aggregated, KeySpecs,
    Registry,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jsonagg")]
#[command(about = "Aggregate JSON result files by key", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate values of matching JSON files by key
    Aggregate {
        /// Root directory for JSON file searching
        root: PathBuf,

        /// Glob patterns, relative to the root, used to collect matching files
        #[arg(short, long, num_args = 1.., default_values_t = [String::from("*.json")])]
        patterns: Vec<String>,

        /// Default aggregation function names applied to keys without an
        /// explicit spec, or 'drop' to keep only explicitly listed keys
        #[arg(short = 'f', long = "agg-fns", num_args = 1.., default_values_t = [String::from("list")])]
        agg_fns: Vec<String>,

        /// Per-key assignments in the form key=fn1,fn2 or key=drop
        #[arg(short = 'k', long = "key-fns", num_args = 1..)]
        key_fns: Vec<String>,

        /// Aggregate each immediate subdirectory of the root separately
        #[arg(short, long)]
        multidir: bool,

        /// Path where aggregated JSON is written; printed to stdout when
        /// omitted. With --multidir, interpreted relative to each subdirectory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Collect matching JSON files, flatten them, and write a CSV table
    Collect {
        /// Root directory for JSON file searching
        root: PathBuf,

        /// Glob patterns, relative to the root, used to collect matching files
        #[arg(short, long, num_args = 1.., default_values_t = [String::from("*.json")])]
        patterns: Vec<String>,

        /// Path where the CSV is written
        #[arg(short, long, default_value = "collected.csv")]
        out: PathBuf,

        /// Field delimiter for the CSV output (single byte)
        #[arg(short, long, default_value = ",")]
        delimiter: String,

        /// Fill value for files lacking a flattened key
        #[arg(short, long, default_value = "-")]
        restval: String,

        /// Delimiter joining nested keys during flattening
        #[arg(long, default_value = ".")]
        flatten_delimiter: String,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> jsonagg_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            root,
            patterns,
            agg_fns,
            key_fns,
            multidir,
            out,
        } => cmd_aggregate(&root, &patterns, &agg_fns, &key_fns, multidir, out.as_deref()),
        Commands::Collect {
            root,
            patterns,
            out,
            delimiter,
            restval,
            flatten_delimiter,
        } => cmd_collect(&root, &patterns, &out, &delimiter, &restval, &flatten_delimiter),
    }
}

fn cmd_aggregate(
    root: &Path,
    patterns: &[String],
    agg_fns: &[String],
    key_fns: &[String],
    multidir: bool,
    out: Option<&Path>,
) -> jsonagg_core::Result<()> {
    let registry = Registry::builtin();

    let default = parse_spec("(default)", agg_fns, &registry)?;
    let mut per_key = KeySpecs::new();
    for arg in key_fns {
        let (key, spec) = parse_key_spec(arg, &registry)?;
        per_key.insert(key, spec);
    }
    let per_key = if per_key.is_empty() { None } else { Some(&per_key) };
    let default = Some(&default);

    if multidir {
        let mut subdirs: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        for subdir in &subdirs {
            match aggregate_files(subdir, patterns, per_key, default)? {
                Some(aggregated) => match out {
                    Some(out_fname) => write_aggregated(&subdir.join(out_fname), &aggregated)?,
                    None => {
                        println!("{}:", subdir.display());
                        println!("{}", serde_json::to_string_pretty(&aggregated)?);
                    }
                },
                None => report_no_matches(patterns, subdir),
            }
        }
        return Ok(());
    }

    match aggregate_files(root, patterns, per_key, default)? {
        Some(aggregated) => match out {
            Some(path) => write_aggregated(path, &aggregated)?,
            None => println!("{}", serde_json::to_string_pretty(&aggregated)?),
        },
        None => report_no_matches(patterns, root),
    }
    Ok(())
}

fn cmd_collect(
    root: &Path,
    patterns: &[String],
    out: &Path,
    delimiter: &str,
    restval: &str,
    flatten_delimiter: &str,
) -> jsonagg_core::Result<()> {
    let delimiter = delimiter_byte(delimiter)?;

    let table = collect(root, patterns, flatten_delimiter)?;
    if table.is_empty() {
        report_no_matches(patterns, root);
        return Ok(());
    }

    let file = File::create(out)?;
    let writer = BufWriter::new(file);
    table.write_csv(writer, delimiter, restval)?;

    println!("Collected {} files to {}", table.row_count(), out.display());
    Ok(())
}

/// Write aggregated output as pretty-printed JSON (keys sorted)
fn write_aggregated(path: &Path, aggregated: &Aggregated) -> jsonagg_core::Result<()> {
    let content = serde_json::to_string_pretty(aggregated)?;
    fs::write(path, content)?;
    println!("Wrote aggregated JSON to {}", path.display());
    Ok(())
}

fn report_no_matches(patterns: &[String], root: &Path) {
    eprintln!(
        "Found no files matching {:?} in {}.",
        patterns,
        root.display()
    );
}
