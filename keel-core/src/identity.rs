//! Device identity
//!
//! The name a device reports itself under. First match wins: the serial
//! number written at provisioning, then the station MAC address, then the
//! silicon chip id, which is always available.

use crate::state::EepromState;
use core::fmt::Write;

/// Longest identity string (16-character serial)
pub const IDENTITY_MAX_LEN: usize = 16;

/// Identifiers the platform can always supply, EEPROM or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlatformIdentity {
    /// Silicon chip id; the low 24 bits are used
    pub chip_id: u32,
    /// Station MAC address, when the radio has reported one
    pub station_mac: Option<[u8; 6]>,
}

/// Where the identity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentitySource {
    Serial,
    StationMac,
    ChipId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    pub source: IdentitySource,
    pub value: heapless::String<IDENTITY_MAX_LEN>,
}

impl DeviceIdentity {
    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }
}

/// Pick the device identity from `state`, falling back to `platform`
pub fn resolve_identity(state: &EepromState, platform: &PlatformIdentity) -> DeviceIdentity {
    let serial = state
        .main_board
        .as_ref()
        .and_then(|b| b.common.serial())
        .or_else(|| state.main_module.as_ref().and_then(|m| m.common.serial()));

    if let Some(serial) = serial {
        let mut value = heapless::String::new();
        // serial field is 16 bytes, always fits
        let _ = value.push_str(serial);
        return DeviceIdentity {
            source: IdentitySource::Serial,
            value,
        };
    }

    let mut value = heapless::String::new();
    if let Some(mac) = platform.station_mac {
        for byte in mac {
            let _ = write!(value, "{:02x}", byte);
        }
        return DeviceIdentity {
            source: IdentitySource::StationMac,
            value,
        };
    }

    let _ = write!(value, "{:06x}", platform.chip_id & 0xFF_FFFF);
    DeviceIdentity {
        source: IdentitySource::ChipId,
        value,
    }
}
