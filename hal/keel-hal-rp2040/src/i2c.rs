//! EEPROM I2C bus
//!
//! The board EEPROMs share I2C0 on GPIO20 (SDA) and GPIO21 (SCL). The boot
//! path is synchronous, so the bus is built in blocking mode.

use embassy_rp::i2c::{Blocking, Config, I2c, SclPin, SdaPin};
use embassy_rp::peripherals::I2C0;
use embassy_rp::Peri;
use keel_hal::I2cConfig;

/// SDA pin of the EEPROM bus
pub const EEPROM_SDA_PIN: u8 = 20;

/// SCL pin of the EEPROM bus
pub const EEPROM_SCL_PIN: u8 = 21;

/// Blocking I2C0 bus
pub type EepromI2c<'d> = I2c<'d, I2C0, Blocking>;

/// Build the EEPROM bus
///
/// Internal pull-ups are enabled; boards without external pull-ups still
/// work at 100 kHz.
pub fn eeprom_i2c<'d>(
    i2c: Peri<'d, I2C0>,
    scl: Peri<'d, impl SclPin<I2C0>>,
    sda: Peri<'d, impl SdaPin<I2C0>>,
    config: I2cConfig,
) -> EepromI2c<'d> {
    let mut cfg = Config::default();
    cfg.frequency = config.frequency;
    cfg.sda_pullup = true;
    cfg.scl_pullup = true;
    I2c::new_blocking(i2c, scl, sda, cfg)
}
