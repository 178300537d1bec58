//! Auto-discovery of the namelists subdirectory.
//!
//! A directory qualifies when it contains all 29 canonical `<name>.nml`
//! files. The walk is deterministic (directories visited in sorted order)
//! and exhaustive: finding more than one candidate is an error rather than
//! a silent first-match, so a root with stale copies of its namelists
//! cannot be read ambiguously.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::namelist::ParameterSet;

use super::error::Error;

/// Returns the single directory under `root` (inclusive) containing a
/// complete namelist set, relative to `root`.
pub fn find_namelists_dir(root: &Path) -> Result<PathBuf, Error> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "configuration root '{}' is not a directory",
            root.display()
        )));
    }

    let mut candidates = Vec::new();
    walk(root, root, &mut candidates)?;

    if candidates.len() > 1 {
        return Err(Error::AmbiguousLocation { candidates });
    }
    match candidates.pop() {
        Some(found) => {
            debug!(dir = %found.display(), "discovered namelists directory");
            Ok(found)
        }
        None => Err(Error::NotFound(format!(
            "no complete namelist set under '{}'",
            root.display()
        ))),
    }
}

fn walk(root: &Path, dir: &Path, candidates: &mut Vec<PathBuf>) -> Result<(), Error> {
    if has_complete_namelist_set(dir) {
        // The walk only ever descends from the root, so strip_prefix holds.
        if let Ok(relative) = dir.strip_prefix(root) {
            candidates.push(if relative.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                relative.to_path_buf()
            });
        }
    }

    let mut subdirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for subdir in subdirs {
        walk(root, &subdir, candidates)?;
    }
    Ok(())
}

/// True iff `dir` contains every canonical `<name>.nml` file.
pub fn has_complete_namelist_set(dir: &Path) -> bool {
    ParameterSet::NAMES
        .iter()
        .all(|name| dir.join(format!("{name}.nml")).is_file())
}
