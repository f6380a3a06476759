//! Board-agnostic EEPROM boot logic for Keel firmware
//!
//! This crate contains everything between the raw EEPROM bus and the rest
//! of the firmware, with no dependency on a specific microcontroller:
//!
//! - Component type registry and header validation
//! - Directory resolution and the two-phase component reader
//! - Multi-instance loading and the boot orchestrator
//! - RPi HAT EEPROM probing on module sockets
//! - Device identity and info queries
//! - Module driver dispatch and GPIO boot-state defaults
//!
//! The orchestrator never fails: it returns an [`EepromState`] in which
//! every unreadable record is `None`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
#[allow(unused_macros)]
mod logging;

pub mod boot;
pub mod config;
pub mod dispatch;
pub mod hat;
pub mod identity;
pub mod issues;
pub mod loader;
pub mod query;
pub mod reader;
pub mod registry;
pub mod resolve;
pub mod state;
pub mod validate;

#[cfg(test)]
mod testing;

pub use boot::{BootProfile, Orchestrator};
pub use config::{BootConfig, GpioBootState, PinLevel};
pub use dispatch::{dispatch, DispatchPlan, DispatchReport, DriverInit, DriverScheduler, ModuleDriver};
pub use identity::{DeviceIdentity, IdentitySource, PlatformIdentity};
pub use issues::{ReadFailure, ReadIssues};
pub use query::{answer, InfoQuery};
pub use reader::{Component, ComponentReader, RawComponent, Target};
pub use registry::{descriptor, REGISTRY};
pub use state::{EepromState, ModuleBoard, NativeModuleBoard};
