//! Lexical path validation.
//!
//! Configurations are copied wholesale between root directories, so every
//! relative path they declare must stay inside whichever root it is joined
//! to. The check is purely lexical: no filesystem access, no symlink
//! resolution, just component accounting.

use std::path::{Component, Path};

use super::error::Error;

/// Validates that `path` is relative and, once joined to its root and
/// normalized, remains inside that root.
///
/// `.` and `./sub` are fine; any `..` that climbs above the root (or an
/// absolute path) is an [`Error::InvalidPath`].
pub fn validate_inside_root(path: &Path) -> Result<(), Error> {
    if path.is_absolute() {
        return Err(Error::invalid_path(path, "expected a path relative to the configuration root"));
    }

    let mut depth: i64 = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::invalid_path(path, "escapes the configuration root"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::invalid_path(path, "expected a path relative to the configuration root"));
            }
        }
    }
    Ok(())
}

/// Validates that `path` is absolute. Used for pass-through data references
/// that are resolved only at execution time.
pub fn validate_absolute(path: &Path) -> Result<(), Error> {
    if !path.is_absolute() {
        return Err(Error::invalid_path(path, "expected an absolute path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn plain_relative_paths_are_accepted() {
        for p in [".", "namelists", "data/driving/met.txt", "./a/b"] {
            assert!(validate_inside_root(Path::new(p)).is_ok(), "{p}");
        }
    }

    #[test]
    fn interior_parent_segments_are_accepted() {
        // a/../b normalizes to b, still inside the root.
        assert!(validate_inside_root(Path::new("a/../b")).is_ok());
    }

    #[test]
    fn escaping_paths_are_rejected() {
        for p in ["..", "../shared", "a/../../b", "./.."] {
            let err = validate_inside_root(Path::new(p)).unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{p}");
        }
    }

    #[test]
    fn absolute_paths_are_rejected_where_relative_required() {
        assert!(validate_inside_root(Path::new("/abs/data.nc")).is_err());
        assert!(validate_absolute(Path::new("/abs/data.nc")).is_ok());
        assert!(validate_absolute(Path::new("rel/data.nc")).is_err());
    }
}
