//! Data bindings: the association between a namelist-declared relative path
//! and the typed in-memory data loaded from (or destined for) it.
//!
//! Only relative paths are ever bound. Absolute paths in the namelists are
//! pass-through references that stay valid wherever the configuration is
//! written, so the registry rejects them as keys outright.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use crate::io;
use crate::model::data::{AsciiData, Dataset};

use super::error::Error;
use super::index::{is_ascii_extension, is_dataset_extension};

/// Which codec serves a binding, chosen once from the declared extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Ascii,
    Dataset,
}

/// Classifies a declared path by extension.
pub fn classify(path: &Path) -> Result<BindingKind, Error> {
    if is_ascii_extension(path) {
        Ok(BindingKind::Ascii)
    } else if is_dataset_extension(path) {
        Ok(BindingKind::Dataset)
    } else {
        Err(Error::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Typed contents of a loaded binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingData {
    Ascii(AsciiData),
    Dataset(Dataset),
}

impl BindingData {
    pub fn kind(&self) -> BindingKind {
        match self {
            BindingData::Ascii(_) => BindingKind::Ascii,
            BindingData::Dataset(_) => BindingKind::Dataset,
        }
    }

    pub fn as_ascii(&self) -> Option<&AsciiData> {
        match self {
            BindingData::Ascii(data) => Some(data),
            BindingData::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            BindingData::Dataset(data) => Some(data),
            BindingData::Ascii(_) => None,
        }
    }
}

impl From<AsciiData> for BindingData {
    fn from(data: AsciiData) -> Self {
        BindingData::Ascii(data)
    }
}

impl From<Dataset> for BindingData {
    fn from(data: Dataset) -> Self {
        BindingData::Dataset(data)
    }
}

/// One relative path from the namelists plus its optionally loaded data.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBinding {
    path: PathBuf,
    kind: BindingKind,
    data: Option<BindingData>,
}

impl DataBinding {
    fn new(path: PathBuf, kind: BindingKind) -> Self {
        Self {
            path,
            kind,
            data: None,
        }
    }

    /// The declared relative path, exactly as it appears in the namelists.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&BindingData> {
        self.data.as_ref()
    }

    /// Installs in-memory data. Write-once: a loaded binding must be
    /// [`reset`](Self::reset) first. The data's type must match the kind the
    /// extension declared.
    pub fn set_data(&mut self, data: impl Into<BindingData>) -> Result<(), Error> {
        if self.data.is_some() {
            return Err(Error::AlreadyLoaded(self.path.clone()));
        }
        let data = data.into();
        if data.kind() != self.kind {
            return Err(Error::UnsupportedFormat(self.path.clone()));
        }
        self.data = Some(data);
        Ok(())
    }

    /// Clears the loaded data, making the binding loadable again.
    pub fn reset(&mut self) -> Option<BindingData> {
        self.data.take()
    }
}

/// The registry: exactly one [`DataBinding`] per unique relative path in the
/// file-parameter index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingRegistry {
    bindings: IndexMap<PathBuf, DataBinding>,
}

impl BindingRegistry {
    /// Creates one unloaded binding per unique relative path, typed by
    /// extension.
    pub fn build<I, P>(paths: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut bindings = IndexMap::new();
        for path in paths {
            let path: PathBuf = path.into();
            if path.is_absolute() {
                return Err(Error::invalid_key(path, "absolute paths are never bound"));
            }
            let kind = classify(&path)?;
            bindings
                .entry(path.clone())
                .or_insert_with(|| DataBinding::new(path, kind));
        }
        Ok(Self { bindings })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.bindings.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.bindings.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataBinding> {
        self.bindings.values()
    }

    pub fn get(&self, path: &Path) -> Option<&DataBinding> {
        self.bindings.get(path)
    }

    /// Keyed access, with absolute or unregistered paths rejected as
    /// [`Error::InvalidKey`].
    pub fn binding(&self, path: &Path) -> Result<&DataBinding, Error> {
        self.check_key(path)?;
        self.bindings
            .get(path)
            .ok_or_else(|| Error::invalid_key(path, "no binding with this path"))
    }

    pub fn binding_mut(&mut self, path: &Path) -> Result<&mut DataBinding, Error> {
        self.check_key(path)?;
        self.bindings
            .get_mut(path)
            .ok_or_else(|| Error::invalid_key(path, "no binding with this path"))
    }

    fn check_key(&self, path: &Path) -> Result<(), Error> {
        if path.is_absolute() {
            return Err(Error::invalid_key(path, "absolute paths are never bound"));
        }
        Ok(())
    }

    /// Reads one binding's data from `source_dir` via the matching codec.
    pub fn load(&mut self, path: &Path, source_dir: &Path) -> Result<(), Error> {
        self.check_key(path)?;
        let binding = self
            .bindings
            .get_mut(path)
            .ok_or_else(|| Error::invalid_key(path, "no binding with this path"))?;
        if binding.is_loaded() {
            return Err(Error::AlreadyLoaded(binding.path.clone()));
        }

        let full_path = source_dir.join(path);
        if !full_path.is_file() {
            return Err(Error::missing_file(path, source_dir));
        }

        let data = match binding.kind {
            BindingKind::Ascii => BindingData::Ascii(io::ascii::read(&full_path)?),
            BindingKind::Dataset => BindingData::Dataset(io::dataset::read(&full_path)?),
        };
        binding.data = Some(data);
        Ok(())
    }

    /// Loads every unloaded binding from `source_dir`.
    pub fn load_all(&mut self, source_dir: &Path) -> Result<(), Error> {
        let paths: Vec<PathBuf> = self
            .bindings
            .values()
            .filter(|b| !b.is_loaded())
            .map(|b| b.path.clone())
            .collect();
        for path in paths {
            self.load(&path, source_dir)?;
        }
        Ok(())
    }

    /// Serializes one binding's data under `dest_dir`, creating parent
    /// directories as needed.
    pub fn write(&self, path: &Path, dest_dir: &Path) -> Result<(), Error> {
        let binding = self.binding(path)?;
        let data = binding
            .data
            .as_ref()
            .ok_or_else(|| Error::NotLoaded(binding.path.clone()))?;

        let full_path = dest_dir.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(path = %full_path.display(), "writing data binding");
        match data {
            BindingData::Ascii(ascii) => io::ascii::write(&full_path, ascii)?,
            BindingData::Dataset(dataset) => io::dataset::write(&full_path, dataset)?,
        }
        Ok(())
    }

    /// Serializes every binding under `dest_dir`. Fails up front with
    /// [`Error::NotLoaded`] if any binding holds no data.
    pub fn write_all(&self, dest_dir: &Path) -> Result<(), Error> {
        if let Some(unloaded) = self.bindings.values().find(|b| !b.is_loaded()) {
            return Err(Error::NotLoaded(unloaded.path.clone()));
        }
        for path in self.bindings.keys() {
            self.write(path, dest_dir)?;
        }
        Ok(())
    }

    /// True iff every binding currently holds loaded data.
    pub fn is_fully_loaded(&self) -> bool {
        self.bindings.values().all(DataBinding::is_loaded)
    }

    /// Reconciles the key set against a new list of relative paths: paths no
    /// longer referenced are dropped, new ones join unloaded, and surviving
    /// bindings keep their data.
    pub fn reconcile<I, P>(&mut self, paths: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut next = IndexMap::new();
        for path in paths {
            let path: PathBuf = path.into();
            if path.is_absolute() {
                return Err(Error::invalid_key(path, "absolute paths are never bound"));
            }
            if let Some(existing) = self.bindings.shift_remove(&path) {
                next.insert(path, existing);
            } else {
                let kind = classify(&path)?;
                next.insert(path.clone(), DataBinding::new(path, kind));
            }
        }
        self.bindings = next;
        Ok(())
    }
}
