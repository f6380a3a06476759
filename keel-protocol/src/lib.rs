//! Keel EEPROM Hardware Description Format
//!
//! Every board carries a small I2C EEPROM describing itself: serial number,
//! MAC addresses, which module boards sit in which sockets and what every
//! header pin does. This crate defines that format byte for byte, shared by
//! the firmware (decode) and the host provisioning tool (encode).
//!
//! # Layout Overview
//!
//! ```text
//! offset 0x0000  ┌──────────────────────────────┐
//!                │ Root directory (Info)        │──┐ entries: type, location, length
//!                └──────────────────────────────┘  │
//! offset 0x0400  ┌──────────────────────────────┐  │
//!                │ Main board                   │◄─┤
//!                └──────────────────────────────┘  │
//! offset 0x0800  ┌──────────────────────────────┐  │
//!                │ Module 0 .. Module 3         │◄─┤
//!                └──────────────────────────────┘  │
//! offset 0x0C00  ┌──────────────────────────────┐  │
//!                │ GPIO pins                    │◄─┘
//!                └──────────────────────────────┘
//! ```
//!
//! Each record opens with the same 20-byte [`Header`]:
//! ```text
//! ┌───────┬─────────────┬─────────┬────────┬──────────┐
//! │ MAGIC │ STRUCT_SIZE │ VERSION │ LENGTH │ CHECKSUM │
//! │ 4B    │ 4B          │ 4B      │ 4B     │ 4B       │
//! └───────┴─────────────┴─────────┴────────┴──────────┘
//! ```
//!
//! All multi-byte fields are little-endian. Third-party daughterboards use
//! the unrelated Raspberry Pi HAT layout, handled by [`hat`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod checksum;
pub mod component;
pub mod directory;
pub mod hat;
pub mod header;
pub mod pin;
pub mod records;
pub mod wire;

pub use checksum::{checksum, verify, verify_span, CHECKSUM_SEED};
pub use component::{ComponentType, COMPONENT_TYPE_COUNT, MAX_COMPONENT_SIZE};
pub use directory::{DirectoryEntry, RootDirectory, MAX_DIRECTORY_ENTRIES};
pub use hat::{HatInfo, VendorInfo};
pub use header::{Header, HEADER_LEN};
pub use pin::{FurtherInfo, PinInfo, PinUse, Pulled};
pub use records::{
    GpioPinsRecord, HwCommon, MainBoardRecord, MainModulePinsRecord, MainModuleRecord,
    ModuleRecord, ModuleType, Record, SdkInitDataRecord, SocketType,
};
pub use wire::DecodeError;
