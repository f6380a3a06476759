//! Boot-time EEPROM state
//!
//! Built once by the orchestrator and read-only afterwards. Every record is
//! optional: `None` means the hardware is absent or its record unusable,
//! and the rest of the firmware treats both the same way.

use crate::identity::DeviceIdentity;
use crate::loader::TypeOutcome;
use crate::registry::MAX_MODULES;
use core::fmt::Write;
use keel_protocol::{
    ComponentType, GpioPinsRecord, HatInfo, MainBoardRecord, MainModulePinsRecord,
    MainModuleRecord, ModuleRecord, Record, RootDirectory, SdkInitDataRecord,
    COMPONENT_TYPE_COUNT,
};

/// Status string when no board record was read
pub const UNKNOWN_STATUS: &str = "ffff:ffff";

/// A module board with our own EEPROM layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeModuleBoard {
    pub main_module: MainModuleRecord,
    pub pins: Option<MainModulePinsRecord>,
}

/// What was found on a module socket's EEPROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBoard {
    Native(NativeModuleBoard),
    /// Third-party board carrying a Raspberry Pi HAT EEPROM
    Hat(HatInfo),
}

/// Everything read from the board EEPROMs at boot
#[derive(Debug, Clone, Default)]
pub struct EepromState {
    pub directory: Option<RootDirectory>,
    pub main_board: Option<MainBoardRecord>,
    /// Module sockets, by instance order in the directory
    pub modules: [Option<ModuleRecord>; MAX_MODULES],
    pub sdk_init_data: Option<SdkInitDataRecord>,
    pub gpio_pins: Option<GpioPinsRecord>,
    /// Set when this EEPROM belongs to a module board
    pub main_module: Option<MainModuleRecord>,
    pub main_module_pins: Option<MainModulePinsRecord>,
    /// Module board EEPROM contents, same index as `modules`
    pub module_boards: [Option<ModuleBoard>; MAX_MODULES],
    pub outcomes: [TypeOutcome; COMPONENT_TYPE_COUNT],
    pub identity: Option<DeviceIdentity>,
}

impl EepromState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a decoded record; `instance` only matters for modules
    pub fn store(&mut self, instance: usize, record: Record) {
        match record {
            Record::RootDirectory(dir) => self.directory = Some(dir),
            Record::MainBoard(r) => self.main_board = Some(r),
            Record::MainBoardModule(r) => {
                if let Some(slot) = self.modules.get_mut(instance) {
                    *slot = Some(r);
                }
            }
            Record::SdkInitData(r) => self.sdk_init_data = Some(r),
            Record::GpioPins(r) => self.gpio_pins = Some(r),
            Record::MainModule(r) => self.main_module = Some(r),
            Record::MainModulePins(r) => self.main_module_pins = Some(r),
        }
    }

    /// Whether any module socket record was read
    pub fn module_present(&self) -> bool {
        self.modules.iter().any(Option::is_some)
    }

    pub fn module(&self, slot: usize) -> Option<&ModuleRecord> {
        self.modules.get(slot)?.as_ref()
    }

    pub fn module_board(&self, slot: usize) -> Option<&ModuleBoard> {
        self.module_boards.get(slot)?.as_ref()
    }

    pub fn outcome(&self, component: ComponentType) -> &TypeOutcome {
        &self.outcomes[component.index()]
    }

    /// Hardware code and subcode, main board first
    pub fn hw_code(&self) -> Option<(u32, u32)> {
        self.main_board
            .as_ref()
            .map(|b| &b.common)
            .or_else(|| self.main_module.as_ref().map(|m| &m.common))
            .map(|c| (c.code, c.subcode))
    }

    /// `code:subcode` in hex, `ffff:ffff` when unknown
    pub fn status_string(&self) -> heapless::String<17> {
        let mut out = heapless::String::new();
        // 8 + 1 + 8 characters at most
        let _ = match self.hw_code() {
            Some((code, subcode)) => write!(out, "{:04x}:{:04x}", code, subcode),
            None => out.push_str(UNKNOWN_STATUS).map_err(|_| core::fmt::Error),
        };
        out
    }
}
