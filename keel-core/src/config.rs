//! Boot configuration types
//!
//! `BootConfig` is compiled into the firmware. `GpioBootState` is persisted
//! by the settings subsystem as postcard binary data and only read here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use keel_hal::i2c::{MAIN_BOARD_EEPROM_ADDRESS, MODULE_EEPROM_BASE_ADDRESS};

/// GPIOs covered by the boot-state defaults (0-16)
pub const BOOT_STATE_PINS: usize = 17;

/// Where to look for EEPROMs and what to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootConfig {
    /// Address of the EEPROM this firmware boots from
    pub eeprom_address: u8,
    /// Module socket `n` has its EEPROM at `module_eeprom_base + n`
    pub module_eeprom_base: u8,
    /// Read module board EEPROMs after the main board
    pub probe_module_boards: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            eeprom_address: MAIN_BOARD_EEPROM_ADDRESS,
            module_eeprom_base: MODULE_EEPROM_BASE_ADDRESS,
            probe_module_boards: true,
        }
    }
}

/// Level a GPIO is driven to at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinLevel {
    /// Leave as input
    #[default]
    Untouched,
    Low,
    High,
}

/// Persisted boot levels for GPIO 0-16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpioBootState {
    pub levels: [PinLevel; BOOT_STATE_PINS],
}

impl GpioBootState {
    /// Set the level of `pin`; ignored outside 0-16
    pub fn with(mut self, pin: u8, level: PinLevel) -> Self {
        if let Some(slot) = self.levels.get_mut(pin as usize) {
            *slot = level;
        }
        self
    }

    pub fn level(&self, pin: u8) -> PinLevel {
        self.levels
            .get(pin as usize)
            .copied()
            .unwrap_or_default()
    }
}
