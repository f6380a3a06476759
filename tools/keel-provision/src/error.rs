//! Provisioning errors

use std::path::PathBuf;

use thiserror::Error;

/// Everything that stops an image from being built or written
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid board description: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("board description needs exactly one of [main_board] or [main_module]")]
    BoardKind,

    #[error("serial '{0}' must be 1 to 15 characters")]
    Serial(String),

    #[error("{what}: {value} is out of range")]
    OutOfRange { what: &'static str, value: u64 },

    #[error("too many {what}: {count}, at most {max}")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("{name} is {len} bytes, larger than a component may be ({max})")]
    TooBig {
        name: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{first} at {first_at:#06x} overlaps {second} at {second_at:#06x}")]
    Overlap {
        first: &'static str,
        first_at: u32,
        second: &'static str,
        second_at: u32,
    },

    #[error("{name} ends at {end:#06x}, past the end of a {capacity} byte eeprom")]
    Capacity {
        name: &'static str,
        end: u32,
        capacity: u32,
    },

    #[error("wire encoder does not produce {0} byte order")]
    ByteOrder(&'static str),

    #[error("image read-back failed for {name}: {detail}")]
    Verify { name: &'static str, detail: String },
}
