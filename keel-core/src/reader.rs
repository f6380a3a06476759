//! Component reader
//!
//! Reads one record instance in at most two bus transactions. The first
//! read uses the length the directory declares; once the header is in hand
//! its own LENGTH is authoritative and any remainder is fetched with a
//! second read that resumes on a 4-byte boundary of the scratch buffer.

use crate::issues::{ReadFailure, ReadIssues};
use crate::registry::{descriptor, ComponentDescriptor};
use crate::resolve::resolve;
use crate::validate::{validate_checksum, validate_structural};
use alloc::vec::Vec;
use keel_hal::EepromBus;
use keel_protocol::checksum::verify_span;
use keel_protocol::{ComponentType, Header, RootDirectory, HEADER_LEN, MAX_COMPONENT_SIZE};

/// Which chip to read and the directory to resolve against
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// I2C address of the EEPROM
    pub address: u8,
    /// Root directory of that EEPROM, once read
    pub directory: Option<&'a RootDirectory>,
}

/// A record read into an owned buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComponent {
    pub component: ComponentType,
    pub instance: usize,
    pub header: Header,
    /// Exactly `header.length` bytes
    pub bytes: Vec<u8>,
    /// Non-fatal issues found on the way
    pub issues: ReadIssues,
}

/// Result of reading into a caller-supplied buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The whole record was copied
    Full {
        header: Header,
        len: usize,
        issues: ReadIssues,
    },
    /// Only the header fitted; `issues` includes `BUF_LEN_COMP`
    HeaderOnly { header: Header, issues: ReadIssues },
}

#[repr(C, align(4))]
struct Scratch([u8; MAX_COMPONENT_SIZE]);

struct Fetched {
    header: Header,
    len: usize,
    issues: ReadIssues,
}

/// Reads record instances through a 4-byte-aligned scratch buffer
pub struct ComponentReader {
    scratch: Scratch,
}

impl Default for ComponentReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentReader {
    pub const fn new() -> Self {
        Self {
            scratch: Scratch([0; MAX_COMPONENT_SIZE]),
        }
    }

    /// Read instance `instance` of `component` into an owned buffer
    pub fn read<B: EepromBus>(
        &mut self,
        bus: &mut B,
        target: Target<'_>,
        component: ComponentType,
        instance: usize,
    ) -> Result<RawComponent, ReadFailure> {
        let fetched = self.fetch(bus, target, component, instance)?;
        Ok(RawComponent {
            component,
            instance,
            header: fetched.header,
            bytes: self.scratch.0[..fetched.len].to_vec(),
            issues: fetched.issues,
        })
    }

    /// Read instance `instance` of `component` into `dest`
    ///
    /// Allocates nothing. A `dest` too short for the header is a failure;
    /// one that holds the header but not the record yields `HeaderOnly`.
    pub fn read_into<B: EepromBus>(
        &mut self,
        bus: &mut B,
        target: Target<'_>,
        component: ComponentType,
        instance: usize,
        dest: &mut [u8],
    ) -> Result<Component, ReadFailure> {
        if dest.len() < HEADER_LEN {
            return Err(ReadFailure::new(component, instance, ReadIssues::BUF_LEN_MAIN));
        }

        let fetched = self.fetch(bus, target, component, instance)?;
        let src = &self.scratch.0[..fetched.len];
        match dest.get_mut(..fetched.len) {
            Some(full) => {
                full.copy_from_slice(src);
                Ok(Component::Full {
                    header: fetched.header,
                    len: fetched.len,
                    issues: fetched.issues,
                })
            }
            None => {
                dest[..HEADER_LEN].copy_from_slice(&src[..HEADER_LEN]);
                Ok(Component::HeaderOnly {
                    header: fetched.header,
                    issues: fetched.issues | ReadIssues::BUF_LEN_COMP,
                })
            }
        }
    }

    fn fetch<B: EepromBus>(
        &mut self,
        bus: &mut B,
        target: Target<'_>,
        component: ComponentType,
        instance: usize,
    ) -> Result<Fetched, ReadFailure> {
        let fail = |issues: ReadIssues| ReadFailure::new(component, instance, issues);
        let desc = descriptor(component);

        let location = resolve(target.directory, component, instance)
            .map_err(|_| fail(ReadIssues::NOT_FOUND))?
            .location();

        let mut issues = ReadIssues::empty();
        let declared = location.length as usize;
        if declared > MAX_COMPONENT_SIZE {
            issues |= ReadIssues::BUF_LEN_COMP;
        }
        let first = declared.clamp(HEADER_LEN, MAX_COMPONENT_SIZE);

        log_trace!(
            "eeprom {:#x}: {} #{} at {:#x}, {} bytes",
            target.address,
            desc.name,
            instance,
            location.offset,
            first
        );

        let buf = &mut self.scratch.0;
        bus.read(target.address, location.offset, &mut buf[..first])
            .map_err(|_| fail(issues | ReadIssues::BUS))?;

        let header = Header::parse(&buf[..HEADER_LEN]).map_err(|_| fail(ReadIssues::LENGTH))?;
        let structural = validate_structural(&header, component, first);
        if structural.is_fatal() {
            return Err(fail(issues | structural));
        }

        let total = header.length as usize;
        if total > first {
            let resume = first & !3;
            bus.read(
                target.address,
                location.offset.saturating_add(resume as u32),
                &mut buf[resume..total],
            )
            .map_err(|_| fail(issues | ReadIssues::BUS))?;
        }

        if !validate_checksum(&buf[..total]) {
            match legacy_span(desc, &buf[..total]) {
                Some(span) => {
                    buf[span..total].fill(0);
                    issues |= ReadIssues::LEGACY_SHAPE;
                }
                None => return Err(fail(issues | ReadIssues::CHECKSUM)),
            }
        }

        Ok(Fetched {
            header,
            len: total,
            issues,
        })
    }
}

/// First prior layout whose checksum span matches, newest first
fn legacy_span(desc: &ComponentDescriptor, record: &[u8]) -> Option<usize> {
    desc.prior_shapes
        .iter()
        .map(|shape| shape.checksum_span as usize)
        .find(|&span| span < record.len() && verify_span(record, span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{main_board_record, module_record, ImageBuilder, MemoryBus, MAIN_ADDRESS};
    use keel_protocol::checksum::seal;
    use keel_protocol::records::MAIN_BOARD_LEGACY_LEN;
    use keel_protocol::{DirectoryEntry, Record};

    fn target(dir: &RootDirectory) -> Target<'_> {
        Target {
            address: MAIN_ADDRESS,
            directory: Some(dir),
        }
    }

    #[test]
    fn test_root_directory_two_phase() {
        let image = ImageBuilder::new()
            .record(0x400, &main_board_record("SER-1"))
            .record(0x800, &module_record(0, 0x20))
            .record(0x880, &module_record(1, 0x21));
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image.build());
        let mut reader = ComponentReader::new();

        let root = reader
            .read(
                &mut bus,
                Target {
                    address: MAIN_ADDRESS,
                    directory: None,
                },
                ComponentType::RootDirectory,
                0,
            )
            .unwrap();
        assert_eq!(root.bytes.len(), 32 + 3 * 12);
        assert_eq!(root.issues, ReadIssues::empty());
        // provisional 32 bytes, then the remainder from offset 32
        assert_eq!(bus.reads, [(MAIN_ADDRESS, 0, 32), (MAIN_ADDRESS, 32, 36)]);
    }

    #[test]
    fn test_partial_then_full_equivalence() {
        let module = module_record(0, 0x20);
        let len = module.len() as u32;
        let mut image = ImageBuilder::new().record(0x800, &module).build();

        let mut reader = ComponentReader::new();
        let mut full = None;
        for declared in [len, 20, 21, 27, 40, len - 1] {
            let mut dir = RootDirectory::decode(&image).unwrap();
            dir.entries[0].length = declared;
            let encoded = dir.encode();
            image[..encoded.len()].copy_from_slice(&encoded);

            let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image.clone());
            let raw = reader
                .read(&mut bus, target(&dir), ComponentType::MainBoardModule, 0)
                .unwrap();
            assert_eq!(raw.bytes, module);
            assert!(bus.reads.len() <= 2);
            match &full {
                None => full = Some(raw),
                Some(first) => assert_eq!(first.bytes, raw.bytes),
            }
        }
    }

    #[test]
    fn test_remainder_read_is_aligned() {
        let module = module_record(0, 0x20);
        let mut dir = RootDirectory::new(8192, 0);
        dir.push(DirectoryEntry::new(ComponentType::MainBoardModule, 0x800, 27))
            .unwrap();
        let mut image = vec![0xFF; 8192];
        image[..dir.encode().len()].copy_from_slice(&dir.encode());
        image[0x800..0x800 + module.len()].copy_from_slice(&module);

        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::MainBoardModule, 0)
            .unwrap();
        assert_eq!(bus.reads[1], (MAIN_ADDRESS, 0x800 + 24, module.len() - 24));
    }

    #[test]
    fn test_not_found() {
        let dir = RootDirectory::new(8192, 0);
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, vec![0xFF; 8192]);
        let err = ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::GpioPins, 0)
            .unwrap_err();
        assert_eq!(err.issues(), ReadIssues::NOT_FOUND);
        assert!(bus.reads.is_empty());
    }

    #[test]
    fn test_bus_error() {
        let mut bus = MemoryBus::failing();
        let err = ComponentReader::new()
            .read(
                &mut bus,
                Target {
                    address: MAIN_ADDRESS,
                    directory: None,
                },
                ComponentType::RootDirectory,
                0,
            )
            .unwrap_err();
        assert_eq!(err.issues(), ReadIssues::BUS);
    }

    #[test]
    fn test_checksum_failure_produces_nothing() {
        let mut image = ImageBuilder::new()
            .record(0x400, &main_board_record("SER-1"))
            .build();
        image[0x400 + 30] ^= 0x01;
        let dir = RootDirectory::decode(&image).unwrap();
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        let err = ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::MainBoard, 0)
            .unwrap_err();
        assert_eq!(err.issues(), ReadIssues::CHECKSUM);
    }

    #[test]
    fn test_legacy_checksum_span_accepted() {
        let mut record = main_board_record("OLD-1");
        // older firmware checksummed only the first 76 bytes
        record[76..80].copy_from_slice(&[0xAB; 4]);
        seal(&mut record[..MAIN_BOARD_LEGACY_LEN]);
        assert!(!validate_checksum(&record));

        let image = ImageBuilder::new().record(0x400, &record).build();
        let dir = RootDirectory::decode(&image).unwrap();
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        let raw = ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::MainBoard, 0)
            .unwrap();
        assert!(raw.issues.contains(ReadIssues::LEGACY_SHAPE));
        assert_eq!(&raw.bytes[76..80], &[0; 4]);

        match Record::decode(ComponentType::MainBoard, &raw.bytes).unwrap() {
            Record::MainBoard(board) => assert_eq!(board.module_count, 0),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_at_location() {
        let image = ImageBuilder::new()
            .record(0x400, &main_board_record("SER-1"))
            .build();
        let mut dir = RootDirectory::decode(&image).unwrap();
        dir.entries[0].type_id = ComponentType::GpioPins.as_u32();
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        let err = ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::GpioPins, 0)
            .unwrap_err();
        assert!(err
            .issues()
            .contains(ReadIssues::MAGIC | ReadIssues::TYPE_MISMATCH));
    }

    #[test]
    fn test_oversized_declared_length_is_capped() {
        let module = module_record(0, 0x20);
        let mut dir = RootDirectory::new(8192, 0);
        dir.push(DirectoryEntry::new(ComponentType::MainBoardModule, 0x800, 4000))
            .unwrap();
        let mut image = vec![0xFF; 8192];
        image[..dir.encode().len()].copy_from_slice(&dir.encode());
        image[0x800..0x800 + module.len()].copy_from_slice(&module);

        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        let raw = ComponentReader::new()
            .read(&mut bus, target(&dir), ComponentType::MainBoardModule, 0)
            .unwrap();
        assert_eq!(bus.reads[0].2, MAX_COMPONENT_SIZE);
        assert!(raw.issues.contains(ReadIssues::BUF_LEN_COMP));
        assert_eq!(raw.bytes, module);
    }

    #[test]
    fn test_read_into_variants() {
        let module = module_record(0, 0x20);
        let image = ImageBuilder::new().record(0x800, &module).build();
        let dir = RootDirectory::decode(&image).unwrap();
        let mut reader = ComponentReader::new();

        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image.clone());
        let mut big = [0u8; 256];
        match reader
            .read_into(&mut bus, target(&dir), ComponentType::MainBoardModule, 0, &mut big)
            .unwrap()
        {
            Component::Full { len, .. } => assert_eq!(&big[..len], &module[..]),
            other => panic!("unexpected {:?}", other),
        }

        let mut small = [0u8; 24];
        match reader
            .read_into(&mut bus, target(&dir), ComponentType::MainBoardModule, 0, &mut small)
            .unwrap()
        {
            Component::HeaderOnly { header, issues } => {
                assert_eq!(header.length as usize, module.len());
                assert!(issues.contains(ReadIssues::BUF_LEN_COMP));
                assert_eq!(&small[..HEADER_LEN], &module[..HEADER_LEN]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut tiny = [0u8; 8];
        let err = reader
            .read_into(&mut bus, target(&dir), ComponentType::MainBoardModule, 0, &mut tiny)
            .unwrap_err();
        assert_eq!(err.issues(), ReadIssues::BUF_LEN_MAIN);
    }
}
