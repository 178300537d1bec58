//! Error types for configuration management.
//!
//! One taxonomy covers the whole configuration lifecycle: path validation,
//! namelist-directory discovery, binding misuse, and write-target conflicts.
//! Codec failures are wrapped rather than flattened so the underlying format
//! diagnostics survive.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::namelist::UnknownNamelist;

/// Errors that can occur while reading, writing, or editing a configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A path escapes its configuration root, or a relative path was
    /// required where an absolute one was given (or vice versa).
    #[error("invalid path '{}': {detail}", path.display())]
    InvalidPath {
        /// The offending path, as declared.
        path: PathBuf,
        /// Description of the violation.
        detail: String,
    },

    /// An expected file or subdirectory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A data file referenced by the namelists is absent from the source
    /// directory.
    #[error("missing data file '{}' under '{}'", path.display(), dir.display())]
    MissingFile {
        /// Declared relative path.
        path: PathBuf,
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// Namelist-directory auto-discovery found more than one candidate.
    #[error("ambiguous namelists location: candidates {candidates:?}")]
    AmbiguousLocation {
        /// Every directory that holds a complete namelist set, relative to
        /// the searched root, in walk order.
        candidates: Vec<PathBuf>,
    },

    /// The write target is occupied and `overwrite` was not requested.
    #[error("write target '{}' already exists and is not empty", .0.display())]
    Exists(PathBuf),

    /// A declared data path has an extension no codec understands.
    #[error("unsupported data format for '{}': unrecognized extension", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A binding operation required loaded data but found none.
    #[error("binding '{}' holds no data", .0.display())]
    NotLoaded(PathBuf),

    /// A binding already holds data and was not explicitly reset.
    #[error("binding '{}' already holds data", .0.display())]
    AlreadyLoaded(PathBuf),

    /// An absolute path (or a path not in the registry) was used as a
    /// binding key.
    #[error("invalid binding key '{}': {detail}", path.display())]
    InvalidKey {
        /// The rejected key.
        path: PathBuf,
        /// Description of the violation.
        detail: String,
    },

    /// A namelist name outside the fixed JULES schema was addressed.
    #[error(transparent)]
    UnknownNamelist(#[from] UnknownNamelist),

    /// A codec failed to read or write an underlying file.
    #[error("codec error: {0}")]
    Codec(#[from] crate::io::error::Error),

    /// A non-codec filesystem operation failed.
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_path(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_key(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::InvalidKey {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn missing_file(path: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self::MissingFile {
            path: path.into(),
            dir: dir.into(),
        }
    }
}
