//! The portable configuration core: file-parameter indexing, data bindings,
//! the attached/detached lifecycle, and the invariants tying them together.

pub mod binding;
pub mod discover;
pub mod error;
pub mod index;
pub mod path;
pub mod state;

pub use binding::{BindingData, BindingKind, BindingRegistry, DataBinding};
pub use error::Error;
pub use index::{FileParameterIndex, ParameterLocation};
pub use state::{Attachment, Configuration, Patch, ReadOptions};
