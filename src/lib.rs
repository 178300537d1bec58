//! A pure Rust library for managing declarative configurations of the JULES
//! land-surface model: the fixed set of Fortran namelist files, the data
//! files those namelists reference by path, and the guarantee that the two
//! stay consistent while a configuration moves between directories.
//!
//! # Features
//!
//! - **Fixed-schema namelists** — the closed set of 29 JULES namelist files
//!   as an always-complete [`ParameterSet`]; unknown names are checked
//!   errors, not silent insertions
//! - **File-parameter indexing** — every parameter whose value names a data
//!   file, extracted and deduplicated by a [`FileParameterIndex`]
//! - **Data bindings** — one typed binding per unique relative path,
//!   holding ascii tables or gridded datasets in memory; absolute paths are
//!   pass-through references and are never bound
//! - **Attached/detached lifecycle** — a [`Configuration`] either writes
//!   through to a backing directory or mutates purely in memory, with the
//!   state carried explicitly on the value
//! - **Portability** — a configuration whose relative bindings are all
//!   loaded is self-contained and can be written to any new root
//! - **Execution** — launch the JULES binary against an attached
//!   configuration, capturing its output streams
//!
//! # Quick Start
//!
//! ```
//! use jules_kit::{AsciiData, Configuration, ParameterSet, Patch};
//!
//! // A minimal parameter set referencing one relative data file.
//! let mut params = ParameterSet::empty();
//! params
//!     .namelist_mut("ancillaries")?
//!     .group_or_insert("jules_frac")
//!     .set("file", "frac.dat");
//!
//! // Construction derives one unloaded binding per unique relative path.
//! let mut config = Configuration::detached(params, "namelists")?;
//! assert!(config.is_detached());
//! assert!(!config.is_portable());
//!
//! // Bind in-memory data to make the configuration portable.
//! let frac = AsciiData::new(vec![vec![0.7, 0.2, 0.1]], "surface fractions");
//! config
//!     .bindings_mut()
//!     .binding_mut("frac.dat".as_ref())?
//!     .set_data(frac)?;
//! assert!(config.is_portable());
//!
//! // Detached updates never touch a filesystem.
//! let patch = Patch::new().set("timesteps", "jules_time", "timestep_len", 1800i64);
//! config.update(&patch)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A portable configuration round-trips through a directory with
//! [`Configuration::write`] and [`Configuration::read`], and
//! [`Configuration::update`] on an attached value rewrites exactly the
//! namelist files a [`Patch`] touches.
//!
//! # Module Organization
//!
//! - [`model`] — namelist values, the fixed-schema [`ParameterSet`], and the
//!   typed data carried by bindings
//! - [`io`] — codecs for the on-disk formats: namelist text, ascii tables,
//!   self-describing datasets
//! - [`config`] — the portable configuration core: indexing, bindings,
//!   lifecycle, path validation, auto-discovery
//! - [`run`] — external execution of the JULES binary and the
//!   [`Experiment`] convenience wrapper

pub mod config;
pub mod io;
pub mod model;
pub mod run;

pub use model::data::{AsciiData, Dataset, Variable};
pub use model::namelist::{Namelist, NamelistGroup, ParameterSet, UnknownNamelist};
pub use model::value::Value;

pub use config::{
    Attachment, BindingData, BindingKind, BindingRegistry, Configuration, DataBinding,
    FileParameterIndex, Patch, ReadOptions,
};

pub use run::{Experiment, JulesContainer, JulesExe};

pub use config::Error as ConfigError;
pub use run::Error as RunError;
