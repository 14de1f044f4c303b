//! Input path handling

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Base file name of a path, used as the document identifier
pub fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidPath(format!("{} has no file name", path.display())))
}

/// Expand a list of inputs into an ordered list of files.
///
/// Directories are walked recursively in file-name order with hidden
/// entries skipped. Anything else is passed through unchanged, including
/// paths that do not exist: those fail later, per file, at read time.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let walker = WalkDir::new(input)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                Error::InvalidPath(format!("cannot walk {}: {}", input.display(), e))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        debug!("Expanded directory {:?}", input);
    }

    Ok(files)
}

/// Report inputs whose base names collide; the later one wins on output.
///
/// Returns `(name, earlier, later)` for each collision.
pub fn base_name_collisions(paths: &[PathBuf]) -> Vec<(String, PathBuf, PathBuf)> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    let mut collisions = Vec::new();

    for path in paths {
        let Ok(name) = base_name(path) else { continue };
        if let Some(earlier) = seen.insert(name.clone(), path) {
            warn!(
                "Inputs {:?} and {:?} share the name {}; the later one overwrites the earlier output",
                earlier, path, name
            );
            collisions.push((name, earlier.clone(), path.clone()));
        }
    }

    collisions
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
