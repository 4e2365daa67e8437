//! Test-file discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;

use crate::error::DiscoveryError;

/// Expand `patterns` relative to `cwd` and keep files ending in `suffix`.
///
/// With no patterns, every `*<suffix>` file directly in `cwd` is a candidate.
/// The result is deduplicated and sorted by path.
pub fn discover(
    cwd: &Path,
    patterns: &[String],
    suffix: &str,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let default_pattern;
    let patterns: Vec<&str> = if patterns.is_empty() {
        default_pattern = format!("*{}", Pattern::escape(suffix));
        vec![default_pattern.as_str()]
    } else {
        patterns.iter().map(String::as_str).collect()
    };

    let root = Pattern::escape(&cwd.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            format!("{}/{}", root, pattern)
        };

        let paths = glob::glob(&full).map_err(|source| DiscoveryError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        for entry in paths {
            let path = entry?;
            if is_test_file(&path, suffix) {
                files.insert(path);
            }
        }
    }

    debug!(count = files.len(), "discovered test files");
    Ok(files.into_iter().collect())
}

fn is_test_file(path: &Path, suffix: &str) -> bool {
    path.is_file()
        && path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(suffix))
            .unwrap_or(false)
}

/// `path` relative to `cwd` for display, falling back to the path itself.
pub fn display_path(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
