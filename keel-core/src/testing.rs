//! In-memory EEPROM bus and image builders for tests

use alloc::vec;
use alloc::vec::Vec;
use keel_hal::EepromBus;
use keel_protocol::component::magic;
use keel_protocol::records::{hw_code, hw_subcode, HwCommon};
use keel_protocol::{
    ComponentType, DirectoryEntry, GpioPinsRecord, Header, MainBoardRecord, MainModulePinsRecord,
    MainModuleRecord, ModuleRecord, ModuleType, PinInfo, PinUse, RootDirectory, SocketType,
};

pub const MAIN_ADDRESS: u8 = 0x57;
pub const IMAGE_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// EEPROMs backed by byte vectors; records every read
#[derive(Default)]
pub struct MemoryBus {
    chips: Vec<(u8, Vec<u8>)>,
    fail_all: bool,
    pub reads: Vec<(u8, u32, usize)>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(address: u8, image: Vec<u8>) -> Self {
        let mut bus = Self::new();
        bus.add_chip(address, image);
        bus
    }

    /// Every transaction fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn add_chip(&mut self, address: u8, image: Vec<u8>) {
        self.chips.push((address, image));
    }

    fn chip(&mut self, address: u8) -> Result<&mut Vec<u8>, BusFault> {
        if self.fail_all {
            return Err(BusFault);
        }
        self.chips
            .iter_mut()
            .find(|(a, _)| *a == address)
            .map(|(_, image)| image)
            .ok_or(BusFault)
    }
}

impl EepromBus for MemoryBus {
    type Error = BusFault;

    fn read(&mut self, address: u8, offset: u32, buf: &mut [u8]) -> Result<(), BusFault> {
        self.reads.push((address, offset, buf.len()));
        let image = self.chip(address)?;
        let start = offset as usize;
        let src = image.get(start..start + buf.len()).ok_or(BusFault)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, address: u8, offset: u32, data: &[u8]) -> Result<(), BusFault> {
        let image = self.chip(address)?;
        let start = offset as usize;
        let dst = image.get_mut(start..start + data.len()).ok_or(BusFault)?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

/// Lays records out in an erased image behind a root directory
pub struct ImageBuilder {
    records: Vec<(u32, Vec<u8>)>,
    extra_entries: Vec<DirectoryEntry>,
    with_directory: bool,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            extra_entries: Vec::new(),
            with_directory: true,
        }
    }

    /// Place `bytes` at `location` and list it in the directory
    pub fn record(mut self, location: u32, bytes: &[u8]) -> Self {
        self.records.push((location, bytes.to_vec()));
        self
    }

    /// Add a directory entry with no record behind it
    pub fn entry(mut self, entry: DirectoryEntry) -> Self {
        self.extra_entries.push(entry);
        self
    }

    /// Leave offset 0 erased
    pub fn without_directory(mut self) -> Self {
        self.with_directory = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0xFF; IMAGE_SIZE];
        let mut dir = RootDirectory::new(IMAGE_SIZE as u32, 0x2025_0601);
        for (location, bytes) in &self.records {
            let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let component = ComponentType::from_magic(magic).unwrap_or(ComponentType::MainBoard);
            dir.push(DirectoryEntry::new(component, *location, bytes.len() as u32))
                .unwrap();
            let start = *location as usize;
            image[start..start + bytes.len()].copy_from_slice(bytes);
        }
        for entry in &self.extra_entries {
            dir.push(*entry).unwrap();
        }
        if self.with_directory {
            let encoded = dir.encode();
            image[..encoded.len()].copy_from_slice(&encoded);
        }
        image
    }
}

pub fn main_board_record(serial: &str) -> Vec<u8> {
    MainBoardRecord {
        common: HwCommon::new(
            magic::MAIN_BOARD,
            serial,
            hw_code::MAIN_BOARD,
            hw_subcode::MAIN_BOARD_REV_0_5,
        ),
        chip_id: [0xAB, 0xCD, 0xEF],
        mac1: [0x5C, 0xCF, 0x7F, 0x10, 0x20, 0x30],
        mac2: [0x5E, 0xCF, 0x7F, 0x10, 0x20, 0x30],
        cpu_module: 1,
        flash_size_bytes: 4 * 1024 * 1024,
        i2c_adc: 0,
        internal_adc: 1,
        module_count: 2,
    }
    .encode()
}

/// Mezzanine module on `port` with two GPIO pins
pub fn module_record(port: u32, address: u8) -> Vec<u8> {
    let base = 4 + 8 * port as u8;
    ModuleRecord {
        header: Header::new(magic::MAIN_BOARD_MODULE, 0, 1),
        port,
        socket_type: SocketType::Mezzanine,
        header_count: 1,
        address,
        pins: vec![
            PinInfo::gpio(1, base),
            PinInfo {
                usage: PinUse::Ground,
                ..PinInfo::gpio(2, 0)
            },
            PinInfo::gpio(3, base + 1),
            PinInfo::gpio(4, base + 2),
        ],
    }
    .encode()
}

pub fn programmer_module_record(port: u32, address: u8) -> Vec<u8> {
    let mut module = ModuleRecord::decode(&module_record(port, address)).unwrap();
    module.socket_type = SocketType::Programmer;
    module.encode()
}

/// GPIO 0-16 with 6 and 7 reserved for the EEPROM bus
pub fn gpio_pins_record() -> Vec<u8> {
    let pins = (0..17u8)
        .map(|gpio| PinInfo {
            num: gpio as u32,
            usage: match gpio {
                6 => PinUse::InternalSda,
                7 => PinUse::InternalScl,
                _ => PinUse::Gpio,
            },
            ..PinInfo::gpio(gpio as u32, gpio)
        })
        .collect();
    GpioPinsRecord {
        header: Header::new(magic::GPIO_PINS, 0, 1),
        pins,
    }
    .encode()
}

pub fn main_module_record(module_type: ModuleType) -> Vec<u8> {
    MainModuleRecord {
        common: HwCommon::new(
            magic::MAIN_MODULE,
            "MOD-0001",
            hw_code::MAIN_MODULE,
            hw_subcode::MODULE_MEZZANINE,
        ),
        module_type,
        socket_type: SocketType::Mezzanine,
        jack_used: false,
    }
    .encode()
}

pub fn main_module_pins_record() -> Vec<u8> {
    MainModulePinsRecord {
        header: Header::new(magic::MAIN_MODULE_PINS, 0, 1),
        header_count: 1,
        pins: vec![PinInfo::gpio(1, 0), PinInfo::gpio(2, 1)],
    }
    .encode()
}

/// Image of a module board carrying `module_type`
pub fn module_board_image(module_type: ModuleType) -> Vec<u8> {
    ImageBuilder::new()
        .record(0x800, &main_module_record(module_type))
        .record(0x1000, &main_module_pins_record())
        .build()
}
