//! Header pin descriptions
//!
//! Pin entry layout (20 bytes):
//! - NUM (4 bytes): pin number on its header
//! - HEADER (4 bytes): bitmask of headers the pin appears on
//! - USE (4 bytes): [`PinUse`]
//! - MODULE (4 bytes): bitmask of module sockets the pin is exposed to
//! - FURTHER_INFO (2 bytes): [`FurtherInfo`]
//! - PULLED (1 byte): [`Pulled`]
//! - RESERVED (1 byte)

use crate::wire::{DecodeError, WireReader, WireWriter};
use alloc::vec::Vec;

/// Encoded size of one pin entry
pub const PIN_INFO_LEN: usize = 20;

/// What a header pin is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinUse {
    NotConnected,
    Reserved,
    Ground,
    Supply3v3,
    Supply5v,
    Gpio,
    StatusLed,
    ResetHard,
    ResetSoft,
    InternalSda,
    InternalScl,
    Tout,
    Tx,
    Rx,
    UsbDPlus,
    UsbDMinus,
    WriteProtect,
    /// EEPROM address select line 0-2
    Address(u8),
    /// Audio jack contact 1-3
    Jack(u8),
    /// Value from a newer layout
    Unknown(u32),
}

impl PinUse {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => PinUse::NotConnected,
            1 => PinUse::Reserved,
            2 => PinUse::Ground,
            3 => PinUse::Supply3v3,
            4 => PinUse::Supply5v,
            5 => PinUse::Gpio,
            6 => PinUse::StatusLed,
            7 => PinUse::ResetHard,
            8 => PinUse::ResetSoft,
            9 => PinUse::InternalSda,
            10 => PinUse::InternalScl,
            11 => PinUse::Tout,
            13 => PinUse::Tx,
            14 => PinUse::Rx,
            15 => PinUse::UsbDPlus,
            16 => PinUse::UsbDMinus,
            17 => PinUse::WriteProtect,
            18..=20 => PinUse::Address((value - 18) as u8),
            21..=23 => PinUse::Jack((value - 20) as u8),
            other => PinUse::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            PinUse::NotConnected => 0,
            PinUse::Reserved => 1,
            PinUse::Ground => 2,
            PinUse::Supply3v3 => 3,
            PinUse::Supply5v => 4,
            PinUse::Gpio => 5,
            PinUse::StatusLed => 6,
            PinUse::ResetHard => 7,
            PinUse::ResetSoft => 8,
            PinUse::InternalSda => 9,
            PinUse::InternalScl => 10,
            PinUse::Tout => 11,
            PinUse::Tx => 13,
            PinUse::Rx => 14,
            PinUse::UsbDPlus => 15,
            PinUse::UsbDMinus => 16,
            PinUse::WriteProtect => 17,
            PinUse::Address(n) => 18 + n as u32,
            PinUse::Jack(n) => 20 + n as u32,
            PinUse::Unknown(other) => other,
        }
    }
}

/// Extra detail for a pin; for GPIO pins this is the GPIO number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FurtherInfo(pub u16);

impl FurtherInfo {
    const GPIO_BASE: u16 = 0x100;
    const GPIO_MAX: u8 = 16;

    pub const NONE: Self = Self(0);

    /// Further info naming GPIO `n`
    pub const fn gpio(n: u8) -> Self {
        Self(Self::GPIO_BASE + n as u16)
    }

    /// GPIO number, when this value names one
    pub fn gpio_number(self) -> Option<u8> {
        let n = self.0.checked_sub(Self::GPIO_BASE)?;
        (n <= Self::GPIO_MAX as u16).then_some(n as u8)
    }
}

/// Pull state of a pin at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pulled {
    NotApplicable,
    Float,
    Ground,
    Supply3v3,
    Supply5v,
    Unknown(u8),
}

impl Pulled {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Pulled::NotApplicable,
            1 => Pulled::Float,
            2 => Pulled::Ground,
            3 => Pulled::Supply3v3,
            4 => Pulled::Supply5v,
            other => Pulled::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Pulled::NotApplicable => 0,
            Pulled::Float => 1,
            Pulled::Ground => 2,
            Pulled::Supply3v3 => 3,
            Pulled::Supply5v => 4,
            Pulled::Unknown(other) => other,
        }
    }
}

/// One header pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinInfo {
    pub num: u32,
    pub header_mask: u32,
    pub usage: PinUse,
    pub module_mask: u32,
    pub further_info: FurtherInfo,
    pub pulled: Pulled,
}

impl PinInfo {
    /// A GPIO pin on header pin `num`
    pub const fn gpio(num: u32, gpio: u8) -> Self {
        Self {
            num,
            header_mask: 1,
            usage: PinUse::Gpio,
            module_mask: 0,
            further_info: FurtherInfo::gpio(gpio),
            pulled: Pulled::Float,
        }
    }

    /// GPIO number for pins used as GPIO
    pub fn gpio_number(&self) -> Option<u8> {
        match self.usage {
            PinUse::Gpio => self.further_info.gpio_number(),
            _ => None,
        }
    }

    pub fn decode(r: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let num = r.u32()?;
        let header_mask = r.u32()?;
        let usage = PinUse::from_u32(r.u32()?);
        let module_mask = r.u32()?;
        let further_info = FurtherInfo(r.u16()?);
        let pulled = Pulled::from_u8(r.u8()?);
        r.skip(1)?;
        Ok(Self {
            num,
            header_mask,
            usage,
            module_mask,
            further_info,
            pulled,
        })
    }

    pub fn encode(&self, w: &mut WireWriter<'_>) {
        w.u32(self.num)
            .u32(self.header_mask)
            .u32(self.usage.as_u32())
            .u32(self.module_mask)
            .u16(self.further_info.0)
            .u8(self.pulled.as_u8())
            .pad(1);
    }
}

/// Decode `count` consecutive pin entries
pub(crate) fn decode_pins(r: &mut WireReader<'_>, count: u32) -> Result<Vec<PinInfo>, DecodeError> {
    let count = count as usize;
    if r.remaining() < count.saturating_mul(PIN_INFO_LEN) {
        return Err(DecodeError::CountMismatch);
    }
    (0..count).map(|_| PinInfo::decode(r)).collect()
}
