//! I2C bus configuration and well-known addresses

/// EEPROM on the main board
pub const MAIN_BOARD_EEPROM_ADDRESS: u8 = 0x57;

/// First EEPROM address used by module boards (slot 0)
pub const MODULE_EEPROM_BASE_ADDRESS: u8 = 0x50;

/// Last address in the 24xx EEPROM range
pub const EEPROM_ADDRESS_MAX: u8 = 0x57;

/// Whether `address` falls in the 24xx EEPROM range (0x50-0x57)
pub const fn is_eeprom_address(address: u8) -> bool {
    address >= MODULE_EEPROM_BASE_ADDRESS && address <= EEPROM_ADDRESS_MAX
}

/// I2C configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}
