//! HAT EEPROM reader
//!
//! Walks the atoms straight off the bus: one small read per atom header,
//! and a data read only for the vendor info atom.

use alloc::vec;
use keel_hal::EepromBus;
use keel_protocol::hat::{
    atom_type, AtomHeader, HatHeader, VendorInfo, ATOM_CRC_LEN, ATOM_HEADER_LEN, HAT_HEADER_LEN,
    VENDOR_INFO_FIXED_LEN,
};
use keel_protocol::{DecodeError, HatInfo};

/// Largest vendor info atom: fixed part, two 255-byte strings, CRC
pub const MAX_VENDOR_ATOM_LEN: usize = VENDOR_INFO_FIXED_LEN + 2 * 255 + ATOM_CRC_LEN;

/// Errors from reading a HAT EEPROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HatError {
    /// Bus transaction failed
    Bus,
    /// Bad signature or an atom running past the image
    Decode(DecodeError),
}

impl From<DecodeError> for HatError {
    fn from(e: DecodeError) -> Self {
        HatError::Decode(e)
    }
}

/// Read the vendor info of the HAT EEPROM at `address`
///
/// `Ok(None)` when the image is valid but has no vendor info atom.
pub fn read_hat<B: EepromBus>(bus: &mut B, address: u8) -> Result<Option<HatInfo>, HatError> {
    let mut head = [0u8; HAT_HEADER_LEN];
    bus.read(address, 0, &mut head).map_err(|_| HatError::Bus)?;
    let header = HatHeader::parse(&head)?;

    let mut offset = HAT_HEADER_LEN as u32;
    for index in 0..header.atom_count {
        let mut raw = [0u8; ATOM_HEADER_LEN];
        bus.read(address, offset, &mut raw).map_err(|_| HatError::Bus)?;
        let atom = AtomHeader::parse(&raw)?;

        let end = atom
            .span()
            .and_then(|span| offset.checked_add(span))
            .filter(|&end| end <= header.total_len)
            .ok_or(DecodeError::Truncated)?;

        if atom.atom_type == atom_type::VENDOR_INFO {
            let len = (atom.dlen as usize).min(MAX_VENDOR_ATOM_LEN);
            let mut data = vec![0u8; len];
            bus.read(address, offset + ATOM_HEADER_LEN as u32, &mut data)
                .map_err(|_| HatError::Bus)?;
            let info = VendorInfo::parse(&data)?;
            return Ok(Some(info.into()));
        }

        log_trace!(
            "hat {:#x}: skipping atom {} type {:#x}",
            address,
            index,
            atom.atom_type
        );
        offset = end;
    }

    Ok(None)
}
