//! The configuration lifecycle: a [`ParameterSet`], its namelists
//! subdirectory, and the data bindings derived from it, carried together
//! with an explicit attached/detached tag.
//!
//! Attached means the value is backed by a real directory and `update`
//! writes through to it; detached means mutation is purely in-memory. The
//! tag travels with the value itself, never as ambient state.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::io;
use crate::model::namelist::ParameterSet;
use crate::model::value::Value;

use super::binding::BindingRegistry;
use super::discover;
use super::error::Error;
use super::index::FileParameterIndex;
use super::path::validate_inside_root;

/// Whether a [`Configuration`] is backed by a directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Detached,
    Attached(PathBuf),
}

impl Attachment {
    pub fn backing_dir(&self) -> Option<&Path> {
        match self {
            Attachment::Detached => None,
            Attachment::Attached(dir) => Some(dir),
        }
    }
}

/// Options for [`Configuration::read`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Namelists subdirectory relative to the configuration root; discovered
    /// automatically when `None`.
    pub namelists_subdir: Option<PathBuf>,
    /// Load every relative binding during the read. On by default: the
    /// result is then portable and can be written to any new root.
    pub eager_load: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            namelists_subdir: None,
            eager_load: true,
        }
    }
}

/// An in-memory patch: namelist → group → parameter edits, applied by
/// [`Configuration::update`]. Groups and parameters may be created; namelist
/// names must belong to the fixed schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: IndexMap<String, IndexMap<String, IndexMap<String, Value>>>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        mut self,
        namelist: impl Into<String>,
        group: impl Into<String>,
        param: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.entries
            .entry(namelist.into())
            .or_default()
            .entry(group.into())
            .or_default()
            .insert(param.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Namelists this patch touches.
    pub fn namelists(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A complete JULES configuration: parameters, namelists location, and data
/// bindings, plus the attachment tag.
///
/// Invariants held at all times:
/// - the binding registry's key set equals the set of unique relative paths
///   among the file-valued parameters (absolute paths are never bound);
/// - the namelists subdirectory and every relative data path stay inside the
///   configuration root;
/// - equality compares parameter and binding content, never the backing
///   directory.
#[derive(Debug, Clone)]
pub struct Configuration {
    params: ParameterSet,
    namelists_subdir: PathBuf,
    bindings: BindingRegistry,
    attachment: Attachment,
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.namelists_subdir == other.namelists_subdir
            && self.bindings == other.bindings
    }
}

impl Configuration {
    /// Builds a detached configuration from a parameter set.
    ///
    /// The binding registry is derived from the file-valued parameters, one
    /// unloaded binding per unique relative path.
    pub fn detached(
        params: ParameterSet,
        namelists_subdir: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let namelists_subdir = namelists_subdir.into();
        validate_inside_root(&namelists_subdir)?;

        let index = FileParameterIndex::scan(&params);
        let relative = index.relative_paths();
        for path in &relative {
            validate_inside_root(path)?;
        }
        let bindings = BindingRegistry::build(relative)?;

        Ok(Self {
            params,
            namelists_subdir,
            bindings,
            attachment: Attachment::Detached,
        })
    }

    /// Reads a configuration from `dir`, returning a value attached to it.
    ///
    /// The namelists subdirectory is taken from `options` or auto-discovered;
    /// all namelist files are parsed, the binding registry is built, and
    /// (by default) every relative binding is loaded eagerly.
    pub fn read(dir: &Path, options: ReadOptions) -> Result<Self, Error> {
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "configuration root '{}' is not a directory",
                dir.display()
            )));
        }
        info!(dir = %dir.display(), "reading configuration");

        let namelists_subdir = match options.namelists_subdir {
            Some(subdir) => {
                validate_inside_root(&subdir)?;
                subdir
            }
            None => discover::find_namelists_dir(dir)?,
        };

        let namelists_dir = dir.join(&namelists_subdir);
        let mut params = ParameterSet::empty();
        for name in ParameterSet::NAMES {
            let file_path = namelists_dir.join(format!("{name}.nml"));
            if !file_path.is_file() {
                return Err(Error::NotFound(format!(
                    "namelist file '{}' is missing",
                    file_path.display()
                )));
            }
            let namelist = io::namelist::read(&file_path)?;
            params
                .set_namelist(name, namelist)
                .map_err(Error::UnknownNamelist)?;
        }

        let mut config = Self::detached(params, namelists_subdir)?;
        config.attachment = Attachment::Attached(dir.to_path_buf());
        if options.eager_load {
            config.bindings.load_all(dir)?;
        }
        Ok(config)
    }

    /// Writes the configuration under `dest_dir`, returning a value attached
    /// to it.
    ///
    /// Fails with [`Error::Exists`] if `dest_dir` is occupied and `overwrite`
    /// is false, and with [`Error::NotLoaded`] if any relative binding holds
    /// no data (the portability gate). Absolute-path parameters are left
    /// untouched. Writes are not transactional: a failure partway through
    /// can leave a partially written directory.
    pub fn write(&self, dest_dir: &Path, overwrite: bool) -> Result<Self, Error> {
        if dest_dir.is_file() {
            return Err(Error::Exists(dest_dir.to_path_buf()));
        }
        if !overwrite && dest_dir.is_dir() && fs::read_dir(dest_dir)?.next().is_some() {
            return Err(Error::Exists(dest_dir.to_path_buf()));
        }
        if let Some(unloaded) = self.bindings.iter().find(|b| !b.is_loaded()) {
            return Err(Error::NotLoaded(unloaded.path().to_path_buf()));
        }
        info!(dir = %dest_dir.display(), "writing configuration");

        let namelists_dir = dest_dir.join(&self.namelists_subdir);
        fs::create_dir_all(&namelists_dir)?;
        for (name, namelist) in self.params.iter() {
            let file_path = namelists_dir.join(format!("{name}.nml"));
            io::namelist::write(&file_path, namelist, true)?;
        }

        self.bindings.write_all(dest_dir)?;

        let mut written = self.clone();
        written.attachment = Attachment::Attached(dest_dir.to_path_buf());
        Ok(written)
    }

    /// Returns a value-identical copy with no filesystem association.
    pub fn detach(&self) -> Self {
        if self.is_detached() {
            warn!("detaching a configuration that is already detached");
        }
        let mut detached = self.clone();
        detached.attachment = Attachment::Detached;
        detached
    }

    /// Applies `patch` to the named namelist groups.
    ///
    /// The binding registry is reconciled afterwards so the key set tracks
    /// the (possibly edited) file-valued parameters: new relative paths join
    /// unloaded, dropped ones are removed, surviving bindings keep their
    /// data. When attached, only the namelist files the patch touched are
    /// rewritten; when detached the change is purely in-memory.
    ///
    /// The patch is staged on a scratch copy first; if any edited path fails
    /// validation the configuration is left exactly as it was.
    pub fn update(&mut self, patch: &Patch) -> Result<(), Error> {
        let mut params = self.params.clone();
        for (name, groups) in &patch.entries {
            let namelist = params.namelist_mut(name)?;
            for (group_name, group_patch) in groups {
                let group = namelist.group_or_insert(group_name.clone());
                for (param, value) in group_patch {
                    group.set(param.clone(), value.clone());
                }
            }
        }

        let index = FileParameterIndex::scan(&params);
        let relative = index.relative_paths();
        for path in &relative {
            validate_inside_root(path)?;
        }
        let mut bindings = self.bindings.clone();
        bindings.reconcile(relative)?;

        self.params = params;
        self.bindings = bindings;

        if let Attachment::Attached(dir) = &self.attachment {
            let namelists_dir = dir.join(&self.namelists_subdir);
            fs::create_dir_all(&namelists_dir)?;
            for name in patch.namelists() {
                let namelist = self.params.namelist(name)?;
                let file_path = namelists_dir.join(format!("{name}.nml"));
                info!(path = %file_path.display(), "rewriting patched namelist");
                io::namelist::write(&file_path, namelist, true)?;
            }
        }
        Ok(())
    }

    /// Loads every unloaded relative binding from the backing directory.
    /// Only meaningful while attached.
    pub fn load_data(&mut self) -> Result<(), Error> {
        match &self.attachment {
            Attachment::Attached(dir) => {
                let dir = dir.clone();
                self.bindings.load_all(&dir)
            }
            Attachment::Detached => Err(Error::NotFound(
                "configuration is detached; there is no backing directory to load from".into(),
            )),
        }
    }

    /// True iff every relative binding holds loaded data, i.e. the
    /// configuration is self-contained and safe to write to any new root.
    pub fn is_portable(&self) -> bool {
        self.bindings.is_fully_loaded()
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.attachment, Attachment::Detached)
    }

    pub fn backing_dir(&self) -> Option<&Path> {
        self.attachment.backing_dir()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn namelists_subdir(&self) -> &Path {
        &self.namelists_subdir
    }

    /// Absolute namelists directory, when attached.
    pub fn namelists_dir(&self) -> Option<PathBuf> {
        self.backing_dir().map(|dir| dir.join(&self.namelists_subdir))
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingRegistry {
        &mut self.bindings
    }

    /// Every file parameter as declared: relative paths joined to the
    /// backing directory when attached, absolute paths as-is.
    pub fn input_files(&self) -> Vec<PathBuf> {
        let index = FileParameterIndex::scan(&self.params);
        index
            .unique_paths()
            .into_iter()
            .map(|path| {
                if path.is_absolute() {
                    path
                } else if let Some(dir) = self.backing_dir() {
                    dir.join(path)
                } else {
                    path
                }
            })
            .collect()
    }
}
