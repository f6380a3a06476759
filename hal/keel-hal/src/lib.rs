//! Keel Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the boot path depends on, so the
//! EEPROM reader and driver dispatcher can be exercised on the host against
//! in-memory fakes and run on the board against real peripherals.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  keel-core / keel-firmware              │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  keel-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ keel-drivers  │       │ keel-hal-     │
//! │ (24xx EEPROM) │       │    rp2040     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`eeprom::EepromBus`] - Byte-addressed access to I2C EEPROMs
//! - [`gpio::BootPins`] - Drive GPIOs to their boot-state levels
//! - [`flash::FlashStorage`] - Persisted settings (read side)

#![no_std]
#![deny(unsafe_code)]

pub mod eeprom;
pub mod flash;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use eeprom::EepromBus;
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{BootPins, PinError};
pub use i2c::I2cConfig;
