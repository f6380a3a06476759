//! Record checksum
//!
//! Each byte is added into the running sum shifted by its position within a
//! 32-bit word, so the sum matches a word-at-a-time addition of the record
//! read as little-endian u32s. The stored checksum field itself is skipped.
//! This is deliberately weak; it only catches blank or torn writes.

use crate::header::{CHECKSUM_OFFSET, HEADER_LEN};
use crate::wire::{put_u32_at, u32_at};

/// Initial value of the running sum
pub const CHECKSUM_SEED: u32 = 0x1234_5678;

const CHECKSUM_FIELD: core::ops::Range<usize> = CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4;

/// Compute the checksum over all of `bytes`
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| !CHECKSUM_FIELD.contains(i))
        .fold(CHECKSUM_SEED, |sum, (i, &b)| {
            sum.wrapping_add((b as u32) << ((i % 4) * 8))
        })
}

/// Checksum stored in the record header
pub fn stored_checksum(bytes: &[u8]) -> Option<u32> {
    u32_at(bytes, CHECKSUM_OFFSET)
}

/// Verify a complete record
pub fn verify(bytes: &[u8]) -> bool {
    verify_span(bytes, bytes.len())
}

/// Verify the stored checksum against the first `span` bytes only
///
/// Older record layouts were shorter; their checksum covers that prefix.
pub fn verify_span(bytes: &[u8], span: usize) -> bool {
    if span < HEADER_LEN || span > bytes.len() {
        return false;
    }
    stored_checksum(bytes) == Some(checksum(&bytes[..span]))
}

/// Compute and store the checksum of a complete record
pub fn seal(bytes: &mut [u8]) {
    let sum = checksum(bytes);
    put_u32_at(bytes, CHECKSUM_OFFSET, sum);
}
