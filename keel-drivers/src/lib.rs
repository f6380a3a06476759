//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in keel-hal on top of `embedded-hal` buses:
//!
//! - 24xx-series I2C EEPROMs (implements `keel_hal::EepromBus`)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod eeprom;

pub use eeprom::{At24Eeprom, At24Error};
