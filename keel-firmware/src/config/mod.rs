//! Firmware configuration
//!
//! Compile-time board constants plus the persisted GPIO boot state.

pub mod boot_state;

pub use boot_state::load_boot_state;

use keel_core::{BootConfig, BootProfile};

/// Boot profile this image was built for
pub const BOOT_PROFILE: BootProfile = if cfg!(feature = "bootloader") {
    BootProfile::Bootloader
} else {
    BootProfile::Application
};

/// GPIOs never driven from boot state when the EEPROM has no gpio-pins
/// record: GPIO0/GPIO1 carry the UART0 console
pub const DEFAULT_RESERVED_PINS: u32 = (1 << 0) | (1 << 1);

/// EEPROM locations on this board
pub fn boot_config() -> BootConfig {
    BootConfig {
        probe_module_boards: BOOT_PROFILE == BootProfile::Application,
        ..BootConfig::default()
    }
}
