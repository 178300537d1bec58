//! File-parameter extraction.
//!
//! Derives, from a [`ParameterSet`], the subset of parameters whose values
//! name data files. Classification is by file extension alone: a parameter
//! is file-valued iff its value is a scalar string ending in a recognized
//! data extension. A name-based heuristic (parameter name contains `file`)
//! is kept only as a diagnostic: parameters that look file-like by name but
//! fail the extension test are logged and skipped, never classified.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::model::namelist::ParameterSet;

/// Extensions recognized as data files referenced by namelist parameters.
pub const DATA_EXTENSIONS: [&str; 5] = [".nc", ".cdf", ".asc", ".txt", ".dat"];

/// Parameter names that contain `file` but never name a data file.
const NAME_HEURISTIC_EXCLUDES: [&str; 3] = ["use_file", "nfiles", "file_period"];

/// Location of one file-valued parameter within a [`ParameterSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterLocation {
    pub namelist: String,
    pub group: String,
    pub param: String,
}

/// Read-only index of every file-valued parameter in a [`ParameterSet`],
/// with lookups deduplicated by path value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileParameterIndex {
    entries: IndexMap<ParameterLocation, String>,
}

impl FileParameterIndex {
    /// Scans every `(namelist, group, param)` triple of `params`.
    pub fn scan(params: &ParameterSet) -> Self {
        let mut entries = IndexMap::new();

        for (namelist, group, param, value) in params.parameters() {
            match value.as_str() {
                Some(s) if has_data_extension(s) => {
                    entries.insert(
                        ParameterLocation {
                            namelist: namelist.to_string(),
                            group: group.to_string(),
                            param: param.to_string(),
                        },
                        s.to_string(),
                    );
                }
                _ if name_suggests_file(param) => {
                    debug!(
                        namelist,
                        group,
                        param,
                        "parameter name looks file-like but its value is not a \
                         recognized data path; skipping"
                    );
                }
                _ => {}
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParameterLocation, &str)> {
        self.entries.iter().map(|(loc, path)| (loc, path.as_str()))
    }

    /// Unique declared paths, in first-appearance order. The scan walks
    /// namelists in the fixed schema order, so this order is stable across
    /// reads of the same configuration.
    pub fn unique_paths(&self) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        for path in self.entries.values() {
            let path = PathBuf::from(path);
            if !seen.contains(&path) {
                seen.push(path);
            }
        }
        seen
    }

    /// Unique relative paths; these become binding-registry keys.
    pub fn relative_paths(&self) -> Vec<PathBuf> {
        self.unique_paths()
            .into_iter()
            .filter(|p| !p.is_absolute())
            .collect()
    }

    /// Unique absolute paths; pass-through references, never bound.
    pub fn absolute_paths(&self) -> Vec<PathBuf> {
        self.unique_paths()
            .into_iter()
            .filter(|p| p.is_absolute())
            .collect()
    }
}

/// True iff `value` ends in one of [`DATA_EXTENSIONS`].
pub fn has_data_extension(value: &str) -> bool {
    DATA_EXTENSIONS.iter().any(|ext| value.ends_with(ext))
}

fn name_suggests_file(param: &str) -> bool {
    param.contains("file")
        && !param.contains("profile")
        && !NAME_HEURISTIC_EXCLUDES.contains(&param)
}

/// True iff `path` ends in an extension handled by the ascii codec.
pub fn is_ascii_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("asc" | "txt" | "dat")
    )
}

/// True iff `path` ends in an extension handled by the dataset codec.
pub fn is_dataset_extension(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("nc" | "cdf"))
}
