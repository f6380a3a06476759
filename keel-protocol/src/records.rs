//! Typed record bodies
//!
//! Each record decodes from exactly `header.length` bytes and encodes back
//! to the same layout with length and checksum filled in. Trailing pin and
//! data arrays are owned vectors here; only the encoder lays them out
//! contiguously.

use crate::component::{magic, ComponentType};
use crate::directory::RootDirectory;
use crate::header::{finish_record, Header, HEADER_LEN};
use crate::pin::{decode_pins, PinInfo};
use crate::wire::{DecodeError, WireReader, WireWriter};
use alloc::vec::Vec;

/// Hardware codes stored in [`HwCommon::code`]
pub mod hw_code {
    pub const MAIN_BOARD: u32 = 0x001;
    pub const MAIN_MODULE: u32 = 0x101;
}

/// Hardware subcodes stored in [`HwCommon::subcode`]
pub mod hw_subcode {
    pub const MAIN_BOARD_REV_0_4: u32 = 0x001;
    pub const MAIN_BOARD_REV_0_5: u32 = 0x002;
    pub const MODULE_MEZZANINE: u32 = 0x101;
    pub const MODULE_PROGRAMMER: u32 = 0x201;
}

/// Serial number field width
pub const SERIAL_LEN: usize = 16;

/// Size of the identity block shared by board records
pub const HW_COMMON_LEN: usize = HEADER_LEN + SERIAL_LEN + 8;

pub const MAIN_BOARD_LEN: usize = 80;
/// Main board layout before `module_count` was added
pub const MAIN_BOARD_LEGACY_LEN: usize = 76;
pub const MODULE_FIXED_LEN: usize = 40;
pub const GPIO_PINS_FIXED_LEN: usize = 24;
pub const SDK_INIT_DATA_FIXED_LEN: usize = 24;
pub const MAIN_MODULE_LEN: usize = 56;
/// Main module layout before `jack_used` was added
pub const MAIN_MODULE_LEGACY_LEN: usize = 52;
pub const MAIN_MODULE_PINS_FIXED_LEN: usize = 28;

fn expect_magic(bytes: &[u8], expected: u32) -> Result<Header, DecodeError> {
    let header = Header::parse(bytes)?;
    if header.magic != expected {
        return Err(DecodeError::WrongMagic);
    }
    Ok(header)
}

/// Fields that a newer layout appended read as zero on older records
fn trailing_u32(r: &mut WireReader<'_>) -> u32 {
    r.u32().unwrap_or(0)
}

/// Identity block shared by the main board and module boards
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HwCommon {
    pub header: Header,
    /// NUL-padded ASCII serial number
    pub serial: [u8; SERIAL_LEN],
    pub code: u32,
    pub subcode: u32,
}

impl HwCommon {
    pub fn new(magic: u32, serial: &str, code: u32, subcode: u32) -> Self {
        let mut field = [0u8; SERIAL_LEN];
        let n = serial.len().min(SERIAL_LEN);
        field[..n].copy_from_slice(&serial.as_bytes()[..n]);
        Self {
            header: Header::new(magic, 0, 1),
            serial: field,
            code,
            subcode,
        }
    }

    /// Serial number with NUL padding and surrounding spaces removed
    ///
    /// `None` when blank or not valid UTF-8.
    pub fn serial(&self) -> Option<&str> {
        let end = self
            .serial
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SERIAL_LEN);
        let s = core::str::from_utf8(&self.serial[..end]).ok()?.trim();
        (!s.is_empty()).then_some(s)
    }

    fn decode(r: &mut WireReader<'_>, header: Header) -> Result<Self, DecodeError> {
        r.skip(HEADER_LEN)?;
        Ok(Self {
            header,
            serial: r.array()?,
            code: r.u32()?,
            subcode: r.u32()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.header.write(out);
        WireWriter::new(out)
            .bytes(&self.serial)
            .u32(self.code)
            .u32(self.subcode);
    }
}

/// Main board identity and calibration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainBoardRecord {
    pub common: HwCommon,
    pub chip_id: [u8; 3],
    /// Station MAC address
    pub mac1: [u8; 6],
    /// Soft AP MAC address
    pub mac2: [u8; 6],
    /// CPU module variant fitted to the board
    pub cpu_module: u32,
    pub flash_size_bytes: u32,
    /// External I2C ADC fitted (0 = none)
    pub i2c_adc: u32,
    /// Internal ADC calibration class
    pub internal_adc: u32,
    /// Module sockets on the board; zero on legacy records
    pub module_count: u32,
}

impl MainBoardRecord {
    /// Chip id as a 24-bit value
    pub fn chip_id_u32(&self) -> u32 {
        u32::from_be_bytes([0, self.chip_id[0], self.chip_id[1], self.chip_id[2]])
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::MAIN_BOARD)?;
        let mut r = WireReader::new(bytes);
        let common = HwCommon::decode(&mut r, header)?;
        let chip_id = r.array()?;
        r.skip(1)?;
        Ok(Self {
            common,
            chip_id,
            mac1: r.array()?,
            mac2: r.array()?,
            cpu_module: r.u32()?,
            flash_size_bytes: r.u32()?,
            i2c_adc: r.u32()?,
            internal_adc: r.u32()?,
            module_count: trailing_u32(&mut r),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAIN_BOARD_LEN);
        self.common.encode(&mut out);
        WireWriter::new(&mut out)
            .bytes(&self.chip_id)
            .pad(1)
            .bytes(&self.mac1)
            .bytes(&self.mac2)
            .u32(self.cpu_module)
            .u32(self.flash_size_bytes)
            .u32(self.i2c_adc)
            .u32(self.internal_adc)
            .u32(self.module_count);
        finish_record(&mut out, MAIN_BOARD_LEN);
        out
    }
}

/// Socket a module plugs into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketType {
    Mezzanine,
    Programmer,
    DoubleMezzanine,
    DoubleMezzanineProgrammer,
    Unknown(u32),
}

impl SocketType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => SocketType::Mezzanine,
            2 => SocketType::Programmer,
            3 => SocketType::DoubleMezzanine,
            4 => SocketType::DoubleMezzanineProgrammer,
            other => SocketType::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            SocketType::Mezzanine => 1,
            SocketType::Programmer => 2,
            SocketType::DoubleMezzanine => 3,
            SocketType::DoubleMezzanineProgrammer => 4,
            SocketType::Unknown(other) => other,
        }
    }

    /// Socket accepts mezzanine modules
    pub fn is_mezzanine(self) -> bool {
        matches!(
            self,
            SocketType::Mezzanine
                | SocketType::DoubleMezzanine
                | SocketType::DoubleMezzanineProgrammer
        )
    }
}

/// A module socket as described by the main board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub header: Header,
    /// Socket number on the main board
    pub port: u32,
    pub socket_type: SocketType,
    pub header_count: u32,
    /// I2C address the module answers on
    pub address: u8,
    pub pins: Vec<PinInfo>,
}

impl ModuleRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::MAIN_BOARD_MODULE)?;
        let mut r = WireReader::at(bytes, HEADER_LEN);
        let port = r.u32()?;
        let socket_type = SocketType::from_u32(r.u32()?);
        let header_count = r.u32()?;
        let pin_count = r.u32()?;
        let address = r.u8()?;
        r.skip(3)?;
        let pins = decode_pins(&mut r, pin_count)?;
        Ok(Self {
            header,
            port,
            socket_type,
            header_count,
            address,
            pins,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header.write(&mut out);
        let mut w = WireWriter::new(&mut out);
        w.u32(self.port)
            .u32(self.socket_type.as_u32())
            .u32(self.header_count)
            .u32(self.pins.len() as u32)
            .u8(self.address)
            .pad(3);
        for pin in &self.pins {
            pin.encode(&mut w);
        }
        finish_record(&mut out, MODULE_FIXED_LEN);
        out
    }
}

/// Main board GPIO description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpioPinsRecord {
    pub header: Header,
    pub pins: Vec<PinInfo>,
}

impl GpioPinsRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::GPIO_PINS)?;
        let mut r = WireReader::at(bytes, HEADER_LEN);
        let pin_count = r.u32()?;
        let pins = decode_pins(&mut r, pin_count)?;
        Ok(Self { header, pins })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header.write(&mut out);
        let mut w = WireWriter::new(&mut out);
        w.u32(self.pins.len() as u32);
        for pin in &self.pins {
            pin.encode(&mut w);
        }
        finish_record(&mut out, GPIO_PINS_FIXED_LEN);
        out
    }
}

/// Opaque bootloader data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkInitDataRecord {
    pub header: Header,
    pub data: Vec<u8>,
}

impl SdkInitDataRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::SDK_INIT_DATA)?;
        let mut r = WireReader::at(bytes, HEADER_LEN);
        let data_len = r.u32()? as usize;
        let data = r
            .slice(data_len)
            .map_err(|_| DecodeError::CountMismatch)?
            .to_vec();
        Ok(Self { header, data })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header.write(&mut out);
        WireWriter::new(&mut out)
            .u32(self.data.len() as u32)
            .bytes(&self.data);
        finish_record(&mut out, SDK_INIT_DATA_FIXED_LEN);
        out
    }
}

/// Module board type, stored on the module's own EEPROM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleType(pub u32);

impl ModuleType {
    pub const PROGRAMMER_V0_1: Self = Self(0x001);
    pub const ADC_V0_1: Self = Self(0x101);
    pub const LEVEL_SHIFTER_V0_1: Self = Self(0x201);
}

/// Identity of a module board
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainModuleRecord {
    pub common: HwCommon,
    pub module_type: ModuleType,
    /// Socket the module requires
    pub socket_type: SocketType,
    /// Whether the module's jack is wired; false on legacy records
    pub jack_used: bool,
}

impl MainModuleRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::MAIN_MODULE)?;
        let mut r = WireReader::new(bytes);
        let common = HwCommon::decode(&mut r, header)?;
        Ok(Self {
            common,
            module_type: ModuleType(r.u32()?),
            socket_type: SocketType::from_u32(r.u32()?),
            jack_used: r.u8().map(|b| b != 0).unwrap_or(false),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MAIN_MODULE_LEN);
        self.common.encode(&mut out);
        WireWriter::new(&mut out)
            .u32(self.module_type.0)
            .u32(self.socket_type.as_u32())
            .u8(self.jack_used as u8)
            .pad(3);
        finish_record(&mut out, MAIN_MODULE_LEN);
        out
    }
}

/// Header pins of a module board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainModulePinsRecord {
    pub header: Header,
    pub header_count: u32,
    pub pins: Vec<PinInfo>,
}

impl MainModulePinsRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = expect_magic(bytes, magic::MAIN_MODULE_PINS)?;
        let mut r = WireReader::at(bytes, HEADER_LEN);
        let header_count = r.u32()?;
        let pin_count = r.u32()?;
        let pins = decode_pins(&mut r, pin_count)?;
        Ok(Self {
            header,
            header_count,
            pins,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.header.write(&mut out);
        let mut w = WireWriter::new(&mut out);
        w.u32(self.header_count).u32(self.pins.len() as u32);
        for pin in &self.pins {
            pin.encode(&mut w);
        }
        finish_record(&mut out, MAIN_MODULE_PINS_FIXED_LEN);
        out
    }
}

/// Any decoded record, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    RootDirectory(RootDirectory),
    MainBoard(MainBoardRecord),
    MainBoardModule(ModuleRecord),
    SdkInitData(SdkInitDataRecord),
    GpioPins(GpioPinsRecord),
    MainModule(MainModuleRecord),
    MainModulePins(MainModulePinsRecord),
}

impl Record {
    /// Decode `bytes` as a record of kind `component`
    pub fn decode(component: ComponentType, bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(match component {
            ComponentType::RootDirectory => Record::RootDirectory(RootDirectory::decode(bytes)?),
            ComponentType::MainBoard => Record::MainBoard(MainBoardRecord::decode(bytes)?),
            ComponentType::MainBoardModule => {
                Record::MainBoardModule(ModuleRecord::decode(bytes)?)
            }
            ComponentType::SdkInitData => Record::SdkInitData(SdkInitDataRecord::decode(bytes)?),
            ComponentType::GpioPins => Record::GpioPins(GpioPinsRecord::decode(bytes)?),
            ComponentType::MainModule => Record::MainModule(MainModuleRecord::decode(bytes)?),
            ComponentType::MainModulePins => {
                Record::MainModulePins(MainModulePinsRecord::decode(bytes)?)
            }
        })
    }

    pub fn component(&self) -> ComponentType {
        match self {
            Record::RootDirectory(_) => ComponentType::RootDirectory,
            Record::MainBoard(_) => ComponentType::MainBoard,
            Record::MainBoardModule(_) => ComponentType::MainBoardModule,
            Record::SdkInitData(_) => ComponentType::SdkInitData,
            Record::GpioPins(_) => ComponentType::GpioPins,
            Record::MainModule(_) => ComponentType::MainModule,
            Record::MainModulePins(_) => ComponentType::MainModulePins,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::RootDirectory(r) => r.encode(),
            Record::MainBoard(r) => r.encode(),
            Record::MainBoardModule(r) => r.encode(),
            Record::SdkInitData(r) => r.encode(),
            Record::GpioPins(r) => r.encode(),
            Record::MainModule(r) => r.encode(),
            Record::MainModulePins(r) => r.encode(),
        }
    }
}
