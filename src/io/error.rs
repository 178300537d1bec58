use std::path::PathBuf;

use thiserror::Error;

use super::Format;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("refusing to overwrite existing file '{}'", .0.display())]
    Exists(PathBuf),

    #[error("failed to encode {format} data: {details}")]
    Encode { format: Format, details: String },
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn encode(format: Format, details: impl Into<String>) -> Self {
        Self::Encode {
            format,
            details: details.into(),
        }
    }
}
