//! Codecs for the on-disk formats a JULES configuration is built from.
//!
//! Each codec is a pure transform between bytes and the typed values in
//! [`crate::model`]: Fortran namelist text, whitespace-delimited ascii data
//! with an optional comment line, and a self-describing gridded dataset.

use std::fmt;

pub mod error;

pub mod ascii;
pub mod dataset;
pub mod namelist;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Namelist,
    Ascii,
    Dataset,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Namelist => write!(f, "namelist"),
            Format::Ascii => write!(f, "ascii"),
            Format::Dataset => write!(f, "dataset"),
        }
    }
}
