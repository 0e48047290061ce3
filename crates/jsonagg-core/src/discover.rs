//! Multi-pattern file discovery under a root directory

use crate::error::Result;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find all paths under `root` matching any of the glob patterns
///
/// Each pattern is matched against paths relative to `root` with standard
/// glob semantics (`*`, `**`, `?`, character classes). `*` and `?` stay
/// within one path component; `**` is required to descend into
/// subdirectories. The result is grouped
/// by pattern in the order the patterns were given, with matches for each
/// pattern in traversal order (sorted by file name). Matches may include
/// directories; callers filter as needed. No matches is a normal result,
/// not an error.
pub fn find_matching<P, S>(root: P, patterns: &[S]) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let root = root.as_ref();
    let compiled = patterns
        .iter()
        .map(|p| Pattern::new(p.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // Walk once; entries that cannot be read are skipped, and a missing
    // root simply yields no matches
    let mut entries: Vec<(PathBuf, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        entries.push((relative.to_path_buf(), path.to_path_buf()));
    }

    // Keep `*` and `?` from crossing path separators; only `**` recurses
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };

    let mut matches = Vec::new();
    for pattern in &compiled {
        for (relative, path) in &entries {
            if pattern.matches_path_with(relative, options) {
                matches.push(path.clone());
            }
        }
    }
    Ok(matches)
}
