//! Common record header
//!
//! Header format:
//! - MAGIC (4 bytes): identifies the record kind
//! - STRUCT_SIZE (4 bytes): size of the record's fixed part
//! - VERSION (4 bytes): layout version of the record kind
//! - LENGTH (4 bytes): total bytes including trailing arrays
//! - CHECKSUM (4 bytes): see [`crate::checksum`]

use crate::checksum::seal;
use crate::wire::{put_u32_at, DecodeError, WireReader, WireWriter};
use alloc::vec::Vec;

/// Size of the encoded header in bytes
pub const HEADER_LEN: usize = 20;

/// Offset of the STRUCT_SIZE field
pub const STRUCT_SIZE_OFFSET: usize = 4;

/// Offset of the LENGTH field
pub const LENGTH_OFFSET: usize = 12;

/// Offset of the CHECKSUM field
pub const CHECKSUM_OFFSET: usize = 16;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub magic: u32,
    pub struct_size: u32,
    pub version: u32,
    pub length: u32,
    pub checksum: u32,
}

impl Header {
    /// Header for a record about to be encoded
    ///
    /// Length and checksum are filled in by [`finish_record`].
    pub const fn new(magic: u32, struct_size: u32, version: u32) -> Self {
        Self {
            magic,
            struct_size,
            version,
            length: 0,
            checksum: 0,
        }
    }

    /// Decode the header from the first 20 bytes of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = WireReader::new(bytes);
        Ok(Self {
            magic: r.u32()?,
            struct_size: r.u32()?,
            version: r.u32()?,
            length: r.u32()?,
            checksum: r.u32()?,
        })
    }

    /// Append the encoded header
    pub fn write(&self, out: &mut Vec<u8>) {
        WireWriter::new(out)
            .u32(self.magic)
            .u32(self.struct_size)
            .u32(self.version)
            .u32(self.length)
            .u32(self.checksum);
    }
}

/// Fix up STRUCT_SIZE, LENGTH and CHECKSUM of a fully encoded record
pub fn finish_record(bytes: &mut [u8], struct_size: usize) {
    put_u32_at(bytes, STRUCT_SIZE_OFFSET, struct_size as u32);
    put_u32_at(bytes, LENGTH_OFFSET, bytes.len() as u32);
    seal(bytes);
}
