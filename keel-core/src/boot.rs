//! Boot orchestrator
//!
//! Reads the record kinds a boot profile needs, in order, threading the
//! root directory into every lookup after the first. Nothing here aborts
//! boot: a missing or corrupt record is logged and left as `None`.

use crate::config::BootConfig;
use crate::hat::{read_hat, HatError};
use crate::identity::{resolve_identity, PlatformIdentity};
use crate::issues::ReadIssues;
use crate::loader::{load_instances, LoadStatus, TypeOutcome};
use crate::reader::{ComponentReader, Target};
use crate::registry::{descriptor, Cardinality, MAX_MODULES};
use crate::state::{EepromState, ModuleBoard, NativeModuleBoard};
use keel_hal::EepromBus;
use keel_protocol::{ComponentType, DecodeError, Record};

/// Which record kinds to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootProfile {
    /// Second-stage loader: board identity and SDK init data
    Bootloader,
    /// Application firmware on a main board
    Application,
    /// A module board's own EEPROM
    ModuleBoard,
}

impl BootProfile {
    /// Record kinds in read order; the root directory always comes first
    pub const fn components(self) -> &'static [ComponentType] {
        match self {
            BootProfile::Bootloader => &[
                ComponentType::RootDirectory,
                ComponentType::MainBoard,
                ComponentType::SdkInitData,
            ],
            BootProfile::Application => &[
                ComponentType::RootDirectory,
                ComponentType::MainBoard,
                ComponentType::MainBoardModule,
                ComponentType::GpioPins,
            ],
            BootProfile::ModuleBoard => &[
                ComponentType::RootDirectory,
                ComponentType::MainModule,
                ComponentType::MainModulePins,
            ],
        }
    }
}

/// Runs the boot-time EEPROM read
pub struct Orchestrator {
    profile: BootProfile,
    config: BootConfig,
    reader: ComponentReader,
}

impl Orchestrator {
    pub const fn new(profile: BootProfile, config: BootConfig) -> Self {
        Self {
            profile,
            config,
            reader: ComponentReader::new(),
        }
    }

    pub fn profile(&self) -> BootProfile {
        self.profile
    }

    /// Read everything the profile needs and settle the device identity
    ///
    /// Always returns a state; records that could not be read are `None`.
    pub fn boot<B: EepromBus>(&mut self, bus: &mut B, platform: &PlatformIdentity) -> EepromState {
        log_info!(
            "reading board eeprom at {:#x}",
            self.config.eeprom_address
        );
        let mut state = self.load_profile(bus, self.profile, self.config.eeprom_address);

        if self.profile == BootProfile::Application && self.config.probe_module_boards {
            self.probe_module_boards(bus, &mut state);
        }

        let identity = resolve_identity(&state, platform);
        log_info!(
            "device identity {} from {}",
            identity.as_str(),
            identity.source
        );
        state.identity = Some(identity);
        state
    }

    /// Read the record kinds of `profile` from the EEPROM at `address`
    pub fn load_profile<B: EepromBus>(
        &mut self,
        bus: &mut B,
        profile: BootProfile,
        address: u8,
    ) -> EepromState {
        let mut state = EepromState::new();

        for &component in profile.components() {
            let target = Target {
                address,
                directory: state.directory.as_ref(),
            };
            let loaded = load_instances(&mut self.reader, bus, target, component);
            let mut outcome = loaded.outcome;

            for raw in loaded.records {
                if raw.issues.contains(ReadIssues::LEGACY_SHAPE) {
                    log_warn!(
                        "{:#x}: {} #{} uses an older layout",
                        address,
                        descriptor(component).name,
                        raw.instance
                    );
                }
                match Record::decode(component, &raw.bytes) {
                    Ok(record) => state.store(raw.instance, record),
                    Err(e) => {
                        log_warn!(
                            "{:#x}: {} #{} does not decode: {}",
                            address,
                            descriptor(component).name,
                            raw.instance,
                            e
                        );
                        outcome.discard_one(component, ReadIssues::LENGTH);
                    }
                }
            }

            report(address, component, &outcome);
            state.outcomes[component.index()] = outcome;
        }

        state
    }

    /// Read the EEPROM behind every mezzanine module socket
    fn probe_module_boards<B: EepromBus>(&mut self, bus: &mut B, state: &mut EepromState) {
        for slot in 0..MAX_MODULES {
            let Some(socket) = state.module(slot).map(|m| m.socket_type) else {
                continue;
            };
            if !socket.is_mezzanine() {
                log_debug!("module {} is not a mezzanine, not probing", slot);
                continue;
            }
            let address = self.config.module_eeprom_base.wrapping_add(slot as u8);
            state.module_boards[slot] = self.probe_slot(bus, address);
        }
    }

    fn probe_slot<B: EepromBus>(&mut self, bus: &mut B, address: u8) -> Option<ModuleBoard> {
        let board = self.load_profile(bus, BootProfile::ModuleBoard, address);
        if let Some(main_module) = board.main_module {
            log_info!(
                "{:#x}: module board type {:#x}",
                address,
                main_module.module_type.0
            );
            return Some(ModuleBoard::Native(NativeModuleBoard {
                main_module,
                pins: board.main_module_pins,
            }));
        }

        // Not our directory magic; may be a HAT EEPROM
        let root = board.outcome(ComponentType::RootDirectory).last_issues();
        if !root.contains(ReadIssues::MAGIC) {
            return None;
        }

        match read_hat(bus, address) {
            Ok(Some(hat)) => {
                log_info!("{:#x}: hat {}", address, hat.product.as_str());
                Some(ModuleBoard::Hat(hat))
            }
            Ok(None) => {
                log_warn!("{:#x}: hat eeprom without vendor info", address);
                None
            }
            Err(HatError::Decode(DecodeError::WrongMagic)) => {
                log_debug!("{:#x}: no recognised eeprom image", address);
                None
            }
            Err(e) => {
                log_warn!("{:#x}: hat read failed: {}", address, e);
                None
            }
        }
    }
}

/// Log one kind's outcome at the severity it deserves
fn report(address: u8, component: ComponentType, outcome: &TypeOutcome) {
    let desc = descriptor(component);
    let issues = outcome.last_issues;

    match outcome.status {
        LoadStatus::Loaded if outcome.hit_corruption() => log_warn!(
            "{:#x}: {} stopped after {} instance(s), issues {:#x}",
            address,
            desc.name,
            outcome.count,
            issues
        ),
        LoadStatus::Loaded => log_debug!(
            "{:#x}: {} x{}",
            address,
            desc.name,
            outcome.count
        ),
        LoadStatus::Absent if outcome.hit_corruption() => log_warn!(
            "{:#x}: {} unreadable, issues {:#x}",
            address,
            desc.name,
            issues
        ),
        LoadStatus::Absent => log_debug!("{:#x}: no {}", address, desc.name),
        LoadStatus::Missing if desc.cardinality == Cardinality::ExactlyOne => log_error!(
            "{:#x}: required {} unavailable, issues {:#x}",
            address,
            desc.name,
            issues
        ),
        LoadStatus::Missing => log_warn!(
            "{:#x}: no {} found, issues {:#x}",
            address,
            desc.name,
            issues
        ),
        LoadStatus::Pending => {}
    }
}
