//! Raspberry Pi HAT EEPROM format
//!
//! Third-party daughterboards carry the HAT ID layout instead of ours. There
//! is no directory; atoms follow the 12-byte header back to back:
//! ```text
//! ┌───────────┬─────────┬──────────┬──────────┬─────────┐
//! │ SIGNATURE │ VERSION │ RESERVED │ NUMATOMS │ EEPLEN  │
//! │ 4B "R-Pi" │ 1B      │ 1B       │ 2B       │ 4B      │
//! └───────────┴─────────┴──────────┴──────────┴─────────┘
//! atom: TYPE 2B, COUNT 2B, DLEN 4B, DATA (DLEN bytes, last 2 are a CRC-16)
//! ```
//!
//! The CRC is written by [`encode_atom`] but not checked when reading.

use crate::wire::{DecodeError, WireReader, WireWriter};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

/// "R-Pi" read as a little-endian u32
pub const HAT_SIGNATURE: u32 = 0x6950_2D52;

/// Size of the EEPROM header
pub const HAT_HEADER_LEN: usize = 12;

/// Size of an atom header
pub const ATOM_HEADER_LEN: usize = 8;

/// Trailing CRC bytes included in every atom's DLEN
pub const ATOM_CRC_LEN: usize = 2;

/// Fixed part of the vendor info atom
pub const VENDOR_INFO_FIXED_LEN: usize = 22;

/// Canonical dashed UUID text length
pub const UUID_STRING_LEN: usize = 36;

/// Atom type identifiers
pub mod atom_type {
    pub const VENDOR_INFO: u16 = 0x0001;
    pub const GPIO_MAP: u16 = 0x0002;
    pub const DEVICE_TREE: u16 = 0x0003;
    pub const CUSTOM: u16 = 0x0004;
}

/// HAT EEPROM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HatHeader {
    pub version: u8,
    pub atom_count: u16,
    /// Total image length in bytes
    pub total_len: u32,
}

impl HatHeader {
    /// Whether `bytes` begins with the HAT signature
    pub fn has_signature(bytes: &[u8]) -> bool {
        crate::wire::u32_at(bytes, 0) == Some(HAT_SIGNATURE)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = WireReader::new(bytes);
        if r.u32()? != HAT_SIGNATURE {
            return Err(DecodeError::WrongMagic);
        }
        let version = r.u8()?;
        r.skip(1)?;
        Ok(Self {
            version,
            atom_count: r.u16()?,
            total_len: r.u32()?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        WireWriter::new(out)
            .u32(HAT_SIGNATURE)
            .u8(self.version)
            .u8(0)
            .u16(self.atom_count)
            .u32(self.total_len);
    }
}

/// Header of one atom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AtomHeader {
    pub atom_type: u16,
    pub count: u16,
    /// Data length including the trailing CRC
    pub dlen: u32,
}

impl AtomHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = WireReader::new(bytes);
        Ok(Self {
            atom_type: r.u16()?,
            count: r.u16()?,
            dlen: r.u32()?,
        })
    }

    /// Bytes the atom occupies, header included
    ///
    /// `None` when DLEN is so large the span does not fit a u32.
    pub fn span(&self) -> Option<u32> {
        self.dlen.checked_add(ATOM_HEADER_LEN as u32)
    }
}

/// One atom found by [`AtomWalker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom<'a> {
    /// Offset of the atom header in the image
    pub offset: usize,
    pub header: AtomHeader,
    /// Atom data, CRC included
    pub data: &'a [u8],
}

/// Walks the atoms of an in-memory HAT image
///
/// Each atom starts where the previous one's data ended. Stops after
/// `atom_count` atoms or at the first atom that runs past the image.
pub struct AtomWalker<'a> {
    image: &'a [u8],
    offset: usize,
    remaining: u16,
}

impl<'a> AtomWalker<'a> {
    pub fn new(image: &'a [u8]) -> Result<Self, DecodeError> {
        let header = HatHeader::parse(image)?;
        Ok(Self {
            image,
            offset: HAT_HEADER_LEN,
            remaining: header.atom_count,
        })
    }
}

impl<'a> Iterator for AtomWalker<'a> {
    type Item = Result<Atom<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let offset = self.offset;
        let atom = self
            .image
            .get(offset..)
            .ok_or(DecodeError::Truncated)
            .and_then(AtomHeader::parse)
            .and_then(|header| {
                let start = offset + ATOM_HEADER_LEN;
                let end = usize::try_from(header.dlen)
                    .ok()
                    .and_then(|dlen| start.checked_add(dlen))
                    .ok_or(DecodeError::Truncated)?;
                self.image
                    .get(start..end)
                    .map(|data| Atom {
                        offset,
                        header,
                        data,
                    })
                    .ok_or(DecodeError::Truncated)
            });

        match atom {
            Ok(atom) => {
                self.offset = offset + ATOM_HEADER_LEN + atom.data.len();
                Some(Ok(atom))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Decoded VENDOR_INFO atom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorInfo {
    /// UUID as stored, least significant word first
    pub uuid: [u32; 4],
    pub product_id: u16,
    pub product_version: u16,
    pub vendor: String,
    pub product: String,
}

impl VendorInfo {
    /// Decode the atom data (CRC may be present or not)
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = WireReader::new(data);
        let uuid = [r.u32()?, r.u32()?, r.u32()?, r.u32()?];
        let product_id = r.u16()?;
        let product_version = r.u16()?;
        let vendor_len = r.u8()? as usize;
        let product_len = r.u8()? as usize;
        let vendor = String::from_utf8_lossy(r.slice(vendor_len)?).into_owned();
        let product = String::from_utf8_lossy(r.slice(product_len)?).into_owned();
        Ok(Self {
            uuid,
            product_id,
            product_version,
            vendor,
            product,
        })
    }

    /// UUID in canonical dashed lowercase form
    pub fn uuid_string(&self) -> heapless::String<UUID_STRING_LEN> {
        let [w0, w1, w2, w3] = self.uuid;
        let mut out = heapless::String::new();
        // 36 characters always fit
        let _ = write!(
            out,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:04x}{:08x}",
            w3,
            w2 >> 16,
            w2 & 0xFFFF,
            w1 >> 16,
            w1 & 0xFFFF,
            w0
        );
        out
    }

    /// Atom data without CRC
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            VENDOR_INFO_FIXED_LEN + self.vendor.len() + self.product.len(),
        );
        let mut w = WireWriter::new(&mut out);
        for word in self.uuid {
            w.u32(word);
        }
        w.u16(self.product_id)
            .u16(self.product_version)
            .u8(self.vendor.len() as u8)
            .u8(self.product.len() as u8)
            .bytes(self.vendor.as_bytes())
            .bytes(self.product.as_bytes());
        out
    }
}

/// Identity of a HAT daughterboard, kept for the life of the firmware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HatInfo {
    pub uuid: String,
    pub product_id: u16,
    pub product_version: u16,
    pub vendor: String,
    pub product: String,
}

impl From<VendorInfo> for HatInfo {
    fn from(info: VendorInfo) -> Self {
        Self {
            uuid: String::from(info.uuid_string().as_str()),
            product_id: info.product_id,
            product_version: info.product_version,
            vendor: info.vendor,
            product: info.product,
        }
    }
}

/// Find and decode the vendor info atom of an in-memory image
pub fn parse_image(image: &[u8]) -> Result<Option<HatInfo>, DecodeError> {
    for atom in AtomWalker::new(image)? {
        let atom = atom?;
        if atom.header.atom_type == atom_type::VENDOR_INFO {
            return VendorInfo::parse(atom.data).map(|v| Some(v.into()));
        }
    }
    Ok(None)
}

/// CRC-16/ARC over `bytes`
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |crc, &b| {
        (0..8).fold(crc ^ b as u16, |crc, _| {
            if crc & 1 != 0 {
                (crc >> 1) ^ 0xA001
            } else {
                crc >> 1
            }
        })
    })
}

/// Append one atom (header, data, CRC)
pub fn encode_atom(out: &mut Vec<u8>, atom_type: u16, count: u16, data: &[u8]) {
    let start = out.len();
    WireWriter::new(out)
        .u16(atom_type)
        .u16(count)
        .u32((data.len() + ATOM_CRC_LEN) as u32)
        .bytes(data);
    let crc = crc16(&out[start..]);
    WireWriter::new(out).u16(crc);
}

/// Build a complete image from `(type, data)` atoms
pub fn encode_image(version: u8, atoms: &[(u16, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (count, (atom_type, data)) in atoms.iter().enumerate() {
        encode_atom(&mut body, *atom_type, count as u16, data);
    }
    let mut out = Vec::with_capacity(HAT_HEADER_LEN + body.len());
    HatHeader {
        version,
        atom_count: atoms.len() as u16,
        total_len: (HAT_HEADER_LEN + body.len()) as u32,
    }
    .write(&mut out);
    out.extend_from_slice(&body);
    out
}
