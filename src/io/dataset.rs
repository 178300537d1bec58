//! Self-describing gridded dataset codec.
//!
//! Encodes a [`Dataset`] as JSON: dims, variables, and attributes carry their
//! own names and extents, so a file is readable without outside knowledge of
//! its layout. Stands in for the NetCDF files the simulation itself consumes;
//! swapping in a NetCDF-backed codec only touches this module.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::model::data::Dataset;

use super::Format;
use super::error::Error;

pub fn read(path: &Path) -> Result<Dataset, Error> {
    let file = File::open(path)?;
    let dataset: Dataset = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::parse(Format::Dataset, e.line(), e.to_string()))?;
    if !dataset.is_consistent() {
        return Err(Error::parse(
            Format::Dataset,
            0,
            "variable extents do not match declared dimensions",
        ));
    }
    Ok(dataset)
}

pub fn write(path: &Path, dataset: &Dataset) -> Result<(), Error> {
    if !dataset.is_consistent() {
        return Err(Error::encode(
            Format::Dataset,
            "variable extents do not match declared dimensions",
        ));
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), dataset)
        .map_err(|e| Error::encode(Format::Dataset, e.to_string()))?;
    Ok(())
}
