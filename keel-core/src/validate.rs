//! Structural and checksum validation
//!
//! Structural checks only need the header, so they run on the first,
//! possibly partial, read. The checksum needs the whole record and runs
//! after the remainder has been fetched.

use crate::issues::ReadIssues;
use crate::registry::{component_for_magic, descriptor};
use keel_protocol::{checksum, ComponentType, Header, HEADER_LEN, MAX_COMPONENT_SIZE};

/// Check `header` against the registry entry for `component`
///
/// `buf_len` is the number of record bytes available to the caller.
/// Every failing check contributes a bit; nothing short-circuits.
pub fn validate_structural(header: &Header, component: ComponentType, buf_len: usize) -> ReadIssues {
    let d = descriptor(component);
    let mut issues = ReadIssues::empty();

    if buf_len < HEADER_LEN {
        issues |= ReadIssues::BUF_LEN_MAIN;
    }

    if header.magic != d.magic {
        issues |= ReadIssues::MAGIC;
        if component_for_magic(header.magic).is_some() {
            issues |= ReadIssues::TYPE_MISMATCH;
        }
    }

    if !(d.version_min..=d.version_max).contains(&header.version) {
        issues |= ReadIssues::VERSION;
    }

    if !(d.struct_size_min..=d.struct_size_max).contains(&header.struct_size) {
        issues |= ReadIssues::STRUCT_SIZE;
    }

    let length = header.length as usize;
    if length > MAX_COMPONENT_SIZE {
        issues |= ReadIssues::COMP_TOO_BIG;
    } else if length < HEADER_LEN || length < header.struct_size as usize {
        issues |= ReadIssues::LENGTH;
    } else if buf_len < length {
        issues |= ReadIssues::BUF_LEN_COMP;
    }

    issues
}

/// Verify the checksum of a complete record
pub fn validate_checksum(bytes: &[u8]) -> bool {
    checksum::verify(bytes)
}
