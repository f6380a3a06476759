//! RP2040-specific HAL for Keel firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `keel-hal` traits, plus RP2040-specific functionality:
//!
//! - Blocking I2C bus for the board EEPROMs
//! - GPIO bank for boot-state outputs (implements `keel_hal::BootPins`)
//! - Flash settings reader (implements `keel_hal::FlashStorage`)
//! - Silicon unique id for the device identity fallback

#![no_std]

pub mod flash;
pub mod i2c;
pub mod pins;

// Re-export shared traits from keel-hal for convenience
pub use keel_hal::{BootPins, FlashStorage as FlashStorageTrait, StorageKey};
