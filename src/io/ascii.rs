//! Whitespace-delimited ascii data codec.
//!
//! JULES ascii inputs are numeric tables with an optional single leading
//! comment line prefixed by `#` or `!`. The comment is the first non-empty
//! line when it carries a prefix; later `#`/`!` lines are skipped on read.

use std::fs;
use std::path::Path;

use crate::model::data::AsciiData;

use super::Format;
use super::error::Error;

pub fn read(path: &Path) -> Result<AsciiData, Error> {
    let text = fs::read_to_string(path)?;
    read_str(&text)
}

pub fn read_str(text: &str) -> Result<AsciiData, Error> {
    let mut comment = String::new();
    let mut values: Vec<Vec<f64>> = Vec::new();
    let mut lead = true;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(['#', '!']) {
            // The comment is the first non-empty line, wherever blank
            // lines push it.
            if lead {
                comment = rest.trim().to_string();
            }
            lead = false;
            continue;
        }
        lead = false;

        let row: Result<Vec<f64>, _> = trimmed.split_whitespace().map(str::parse).collect();
        let row = row.map_err(|e| {
            Error::parse(Format::Ascii, idx + 1, format!("bad numeric value: {e}"))
        })?;
        values.push(row);
    }

    let data = AsciiData::new(values, comment);
    if !data.is_rectangular() {
        return Err(Error::parse(Format::Ascii, 0, "rows have differing lengths"));
    }
    Ok(data)
}

pub fn write(path: &Path, data: &AsciiData) -> Result<(), Error> {
    fs::write(path, write_str(data)?)?;
    Ok(())
}

pub fn write_str(data: &AsciiData) -> Result<String, Error> {
    if !data.is_rectangular() {
        return Err(Error::encode(Format::Ascii, "rows have differing lengths"));
    }

    let mut out = String::new();
    if !data.comment.is_empty() {
        out.push_str("# ");
        out.push_str(&data.comment);
        out.push('\n');
    }
    for row in &data.values {
        let rendered: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&rendered.join(" "));
        out.push('\n');
    }
    Ok(out)
}
