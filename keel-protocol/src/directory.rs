//! Root directory ("info") record
//!
//! Layout:
//! - HEADER (20 bytes)
//! - CAPACITY (4 bytes): EEPROM size in bytes
//! - ENTRY_COUNT (4 bytes): number of entries, at most 16
//! - WRITE_DATE (4 bytes): 0xYYYYMMDD
//! - ENTRIES (12 bytes each): type, location, length

use crate::component::{magic, ComponentType};
use crate::header::{finish_record, Header};
use crate::wire::{DecodeError, WireReader, WireWriter};
use alloc::vec::Vec;

/// Maximum number of directory entries
pub const MAX_DIRECTORY_ENTRIES: usize = 16;

/// Size of the fixed part of the root directory
pub const DIRECTORY_FIXED_LEN: usize = 32;

/// Size of one directory entry
pub const DIRECTORY_ENTRY_LEN: usize = 12;

/// Where one record instance lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirectoryEntry {
    /// Raw type id; unknown ids are kept so newer images still load
    pub type_id: u32,
    /// Absolute byte offset in the EEPROM
    pub location: u32,
    /// Declared length of the record
    pub length: u32,
}

impl DirectoryEntry {
    pub const fn new(component: ComponentType, location: u32, length: u32) -> Self {
        Self {
            type_id: component.as_u32(),
            location,
            length,
        }
    }

    pub fn component(&self) -> Option<ComponentType> {
        ComponentType::from_u32(self.type_id)
    }
}

/// Decoded root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDirectory {
    pub header: Header,
    /// EEPROM size in bytes
    pub capacity: u32,
    /// Date the image was written, 0xYYYYMMDD
    pub write_date: u32,
    pub entries: heapless::Vec<DirectoryEntry, MAX_DIRECTORY_ENTRIES>,
}

impl RootDirectory {
    /// Empty directory for an EEPROM of `capacity` bytes
    pub fn new(capacity: u32, write_date: u32) -> Self {
        Self {
            header: Header::new(magic::ROOT_DIRECTORY, DIRECTORY_FIXED_LEN as u32, 1),
            capacity,
            write_date,
            entries: heapless::Vec::new(),
        }
    }

    /// Add an entry; fails when the directory is full
    pub fn push(&mut self, entry: DirectoryEntry) -> Result<(), DirectoryEntry> {
        self.entries.push(entry)
    }

    /// Entries for `component`, in stored order
    pub fn entries_of(
        &self,
        component: ComponentType,
    ) -> impl Iterator<Item = &DirectoryEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.type_id == component.as_u32())
    }

    /// Total encoded length for `entry_count` entries
    pub const fn encoded_len(entry_count: usize) -> usize {
        DIRECTORY_FIXED_LEN + entry_count * DIRECTORY_ENTRY_LEN
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = Header::parse(bytes)?;
        if header.magic != magic::ROOT_DIRECTORY {
            return Err(DecodeError::WrongMagic);
        }

        let mut r = WireReader::at(bytes, crate::header::HEADER_LEN);
        let capacity = r.u32()?;
        let entry_count = r.u32()? as usize;
        let write_date = r.u32()?;

        if entry_count > MAX_DIRECTORY_ENTRIES {
            return Err(DecodeError::CountMismatch);
        }
        if r.remaining() < entry_count * DIRECTORY_ENTRY_LEN {
            return Err(DecodeError::Truncated);
        }

        let mut entries = heapless::Vec::new();
        for _ in 0..entry_count {
            let entry = DirectoryEntry {
                type_id: r.u32()?,
                location: r.u32()?,
                length: r.u32()?,
            };
            // bounded by the count check above
            let _ = entries.push(entry);
        }

        Ok(Self {
            header,
            capacity,
            write_date,
            entries,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(self.entries.len()));
        self.header.write(&mut out);
        let mut w = WireWriter::new(&mut out);
        w.u32(self.capacity)
            .u32(self.entries.len() as u32)
            .u32(self.write_date);
        for entry in &self.entries {
            w.u32(entry.type_id).u32(entry.location).u32(entry.length);
        }
        finish_record(&mut out, DIRECTORY_FIXED_LEN);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::verify;

    fn sample() -> RootDirectory {
        let mut dir = RootDirectory::new(16 * 1024, 0x2025_0314);
        dir.push(DirectoryEntry::new(ComponentType::MainBoard, 0x400, 80))
            .unwrap();
        dir.push(DirectoryEntry::new(ComponentType::MainBoardModule, 0x800, 60))
            .unwrap();
        dir.push(DirectoryEntry::new(ComponentType::MainBoardModule, 0x900, 60))
            .unwrap();
        dir
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes.len(), 32 + 3 * 12);
        assert!(verify(&bytes));
        // entry_count at offset 24
        assert_eq!(&bytes[24..28], &[3, 0, 0, 0]);
        // first entry type at offset 32
        assert_eq!(&bytes[32..36], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_decode_encoded() {
        let dir = sample();
        let decoded = RootDirectory::decode(&dir.encode()).unwrap();
        assert_eq!(decoded.capacity, dir.capacity);
        assert_eq!(decoded.write_date, 0x2025_0314);
        assert_eq!(decoded.entries, dir.entries);
        assert_eq!(decoded.header.length, 68);
    }

    #[test]
    fn test_decode_rejects_too_many_entries() {
        let mut bytes = sample().encode();
        bytes[24] = 17;
        assert_eq!(
            RootDirectory::decode(&bytes),
            Err(DecodeError::CountMismatch)
        );
    }

    #[test]
    fn test_decode_truncated_entries() {
        let bytes = sample().encode();
        assert_eq!(
            RootDirectory::decode(&bytes[..40]),
            Err(DecodeError::Truncated)
        );
    }

    #[test]
    fn test_entries_of_keeps_order() {
        let dir = sample();
        let locations: Vec<u32> = dir
            .entries_of(ComponentType::MainBoardModule)
            .map(|e| e.location)
            .collect();
        assert_eq!(locations, [0x800, 0x900]);
    }

    #[test]
    fn test_unknown_type_id_preserved() {
        let mut dir = sample();
        dir.push(DirectoryEntry {
            type_id: 42,
            location: 0x2000,
            length: 24,
        })
        .unwrap();
        let decoded = RootDirectory::decode(&dir.encode()).unwrap();
        assert_eq!(decoded.entries[3].type_id, 42);
        assert_eq!(decoded.entries[3].component(), None);
    }
}
