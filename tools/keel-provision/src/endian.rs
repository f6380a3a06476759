//! Host and target byte order
//!
//! Images are always little-endian. The record encoders write every field
//! with explicit little-endian conversion, so on a big-endian host each
//! multi-byte field is swapped on the way out. [`check_encoder`] confirms
//! that before anything is written.

use keel_protocol::Header;

use crate::error::ProvisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        }
    }

    fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

/// Byte order of the board EEPROM format
pub const TARGET: ByteOrder = ByteOrder::Little;

/// Whether fields change byte order between host memory and the image
pub const fn swaps() -> bool {
    !matches!(
        (ByteOrder::host(), TARGET),
        (ByteOrder::Little, ByteOrder::Little) | (ByteOrder::Big, ByteOrder::Big)
    )
}

/// Encode a known header and check every field lands in target order
pub fn check_encoder() -> Result<(), ProvisionError> {
    const PROBE: u32 = 0x0102_0304;

    let mut out = Vec::new();
    Header::new(PROBE, PROBE, PROBE).write(&mut out);

    let expected = TARGET.u32_bytes(PROBE);
    if out.len() < 12 || out.chunks(4).take(3).any(|field| field != expected) {
        return Err(ProvisionError::ByteOrder(TARGET.name()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_matches_target() {
        check_encoder().unwrap();
    }

    #[test]
    fn test_swaps_only_on_big_endian_hosts() {
        assert_eq!(swaps(), ByteOrder::host() == ByteOrder::Big);
    }

    #[test]
    fn test_u32_bytes() {
        assert_eq!(ByteOrder::Little.u32_bytes(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(ByteOrder::Big.u32_bytes(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
    }
}
