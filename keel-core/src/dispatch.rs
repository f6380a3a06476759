//! Module driver dispatch
//!
//! Turns the boot state into driver initialisations for each mezzanine
//! module, or, when the board carries no modules at all, drives the
//! unreserved GPIOs to their persisted boot levels.

use crate::config::{GpioBootState, PinLevel, BOOT_STATE_PINS};
use crate::registry::MAX_MODULES;
use crate::state::{EepromState, ModuleBoard};
use keel_hal::BootPins;
use keel_protocol::{ModuleType, PinUse};

/// GPIOs handed to one module driver
pub const MAX_MODULE_GPIOS: usize = 2;

/// Drivers the firmware knows how to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModuleDriver {
    Programmer,
    /// ADS1115 four-channel ADC
    Ads1115Adc,
    LevelShifter,
}

impl ModuleDriver {
    pub fn for_module_type(module_type: ModuleType) -> Option<Self> {
        match module_type {
            ModuleType::PROGRAMMER_V0_1 => Some(ModuleDriver::Programmer),
            ModuleType::ADC_V0_1 => Some(ModuleDriver::Ads1115Adc),
            ModuleType::LEVEL_SHIFTER_V0_1 => Some(ModuleDriver::LevelShifter),
            _ => None,
        }
    }
}

/// One driver initialisation to run later
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverInit {
    /// Module socket index
    pub slot: u8,
    pub port: u32,
    /// Module's own I2C address from the main board record
    pub address: u8,
    pub driver: ModuleDriver,
    /// First GPIOs routed to the socket, in pin order
    pub gpios: heapless::Vec<u8, MAX_MODULE_GPIOS>,
}

/// What the dispatcher decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    /// Start these drivers; may be empty when every slot was skipped
    Modules(heapless::Vec<DriverInit, MAX_MODULES>),
    /// No module records; apply boot levels to pins outside `reserved_mask`
    BootState { reserved_mask: u32 },
}

/// Defers a driver initialisation
///
/// Implementations must not run the driver synchronously.
pub trait DriverScheduler {
    type Error;

    fn schedule(&mut self, init: DriverInit) -> Result<(), Self::Error>;
}

/// Counts from one [`dispatch`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchReport {
    pub scheduled: u8,
    pub failed: u8,
    pub pins_driven: u8,
}

/// Bitmask of GPIOs that must not be driven
///
/// Every pin in the gpio-pins record that is not a plain GPIO is reserved.
/// Without that record `fallback` is used.
pub fn reserved_pins(state: &EepromState, fallback: u32) -> u32 {
    let Some(record) = state.gpio_pins.as_ref() else {
        return fallback;
    };
    record
        .pins
        .iter()
        .filter(|pin| pin.usage != PinUse::Gpio && pin.num < 32)
        .fold(0, |mask, pin| mask | 1 << pin.num)
}

fn driver_init(state: &EepromState, slot: usize) -> Option<DriverInit> {
    let module = state.module(slot)?;
    if !module.socket_type.is_mezzanine() {
        log_debug!("module {}: not a mezzanine socket", slot);
        return None;
    }

    let board = match state.module_board(slot) {
        Some(ModuleBoard::Native(board)) => board,
        Some(ModuleBoard::Hat(hat)) => {
            log_info!("module {}: hat {}, no driver", slot, hat.product.as_str());
            return None;
        }
        None => {
            log_warn!("module {}: board eeprom unreadable, skipping", slot);
            return None;
        }
    };

    let Some(driver) = ModuleDriver::for_module_type(board.main_module.module_type) else {
        log_warn!(
            "module {}: unknown module type {:#x}",
            slot,
            board.main_module.module_type.0
        );
        return None;
    };

    let gpios = module
        .pins
        .iter()
        .filter_map(|pin| pin.gpio_number())
        .take(MAX_MODULE_GPIOS)
        .collect();

    Some(DriverInit {
        slot: slot as u8,
        port: module.port,
        address: module.address,
        driver,
        gpios,
    })
}

/// Decide between module drivers and boot-state defaults
pub fn plan(state: &EepromState, fallback_reserved: u32) -> DispatchPlan {
    if !state.module_present() {
        return DispatchPlan::BootState {
            reserved_mask: reserved_pins(state, fallback_reserved),
        };
    }

    let mut inits = heapless::Vec::new();
    for slot in 0..MAX_MODULES {
        if let Some(init) = driver_init(state, slot) {
            // one init per slot, capacity is the slot count
            let _ = inits.push(init);
        }
    }
    DispatchPlan::Modules(inits)
}

/// Drive every unreserved pin that has a boot level; returns pins driven
pub fn apply_boot_state<P: BootPins>(
    pins: &mut P,
    boot_state: &GpioBootState,
    reserved_mask: u32,
) -> u8 {
    let count = pins.count().min(BOOT_STATE_PINS as u8);
    let mut driven = 0;

    for pin in 0..count {
        if reserved_mask & (1 << pin) != 0 {
            continue;
        }
        let high = match boot_state.level(pin) {
            PinLevel::Untouched => continue,
            PinLevel::Low => false,
            PinLevel::High => true,
        };
        match pins.drive(pin, high) {
            Ok(()) => driven += 1,
            Err(e) => log_warn!("gpio {}: boot level not applied: {}", pin, e),
        }
    }

    driven
}

/// Schedule module drivers, or apply boot-state defaults
pub fn dispatch<S: DriverScheduler, P: BootPins>(
    state: &EepromState,
    boot_state: &GpioBootState,
    fallback_reserved: u32,
    scheduler: &mut S,
    pins: &mut P,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    match plan(state, fallback_reserved) {
        DispatchPlan::Modules(inits) => {
            for init in inits {
                let slot = init.slot;
                let driver = init.driver;
                match scheduler.schedule(init) {
                    Ok(()) => {
                        log_debug!("module {}: {} scheduled", slot, driver);
                        report.scheduled += 1;
                    }
                    Err(_) => {
                        log_error!("module {}: could not schedule {}", slot, driver);
                        report.failed += 1;
                    }
                }
            }
        }
        DispatchPlan::BootState { reserved_mask } => {
            log_info!("no modules, applying gpio boot state");
            report.pins_driven = apply_boot_state(pins, boot_state, reserved_mask);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NativeModuleBoard;
    use crate::testing::{
        gpio_pins_record, main_module_record, module_record, programmer_module_record,
    };
    use alloc::string::String;
    use keel_hal::PinError;
    use keel_protocol::{GpioPinsRecord, HatInfo, MainModuleRecord, ModuleRecord};

    #[derive(Default)]
    struct RecordingScheduler {
        inits: Vec<DriverInit>,
        refuse: bool,
    }

    impl DriverScheduler for RecordingScheduler {
        type Error = ();

        fn schedule(&mut self, init: DriverInit) -> Result<(), ()> {
            if self.refuse {
                return Err(());
            }
            self.inits.push(init);
            Ok(())
        }
    }

    struct FakePins {
        driven: Vec<(u8, bool)>,
        broken: Option<u8>,
    }

    impl FakePins {
        fn new() -> Self {
            Self {
                driven: Vec::new(),
                broken: None,
            }
        }
    }

    impl BootPins for FakePins {
        fn count(&self) -> u8 {
            17
        }

        fn drive(&mut self, pin: u8, high: bool) -> Result<(), PinError> {
            if self.broken == Some(pin) {
                return Err(PinError::InUse);
            }
            self.driven.push((pin, high));
            Ok(())
        }
    }

    fn native(module_type: ModuleType) -> ModuleBoard {
        ModuleBoard::Native(NativeModuleBoard {
            main_module: MainModuleRecord::decode(&main_module_record(module_type)).unwrap(),
            pins: None,
        })
    }

    fn with_modules(slots: &[(Vec<u8>, Option<ModuleBoard>)]) -> EepromState {
        let mut state = EepromState::new();
        for (slot, (record, board)) in slots.iter().enumerate() {
            state.modules[slot] = Some(ModuleRecord::decode(record).unwrap());
            state.module_boards[slot] = board.clone();
        }
        state
    }

    #[test]
    fn test_driver_for_module_type() {
        assert_eq!(
            ModuleDriver::for_module_type(ModuleType::ADC_V0_1),
            Some(ModuleDriver::Ads1115Adc)
        );
        assert_eq!(ModuleDriver::for_module_type(ModuleType(0x999)), None);
    }

    #[test]
    fn test_plan_collects_two_gpios_per_module() {
        let state = with_modules(&[
            (module_record(0, 0x20), Some(native(ModuleType::ADC_V0_1))),
            (
                module_record(1, 0x21),
                Some(native(ModuleType::LEVEL_SHIFTER_V0_1)),
            ),
        ]);
        let DispatchPlan::Modules(inits) = plan(&state, 0) else {
            panic!("expected module plan");
        };
        assert_eq!(inits.len(), 2);
        assert_eq!(inits[0].driver, ModuleDriver::Ads1115Adc);
        // ground pin skipped, third GPIO dropped
        assert_eq!(inits[0].gpios.as_slice(), &[4, 5]);
        assert_eq!(inits[1].address, 0x21);
        assert_eq!(inits[1].gpios.as_slice(), &[12, 13]);
    }

    #[test]
    fn test_plan_skips_unusable_slots() {
        let hat = ModuleBoard::Hat(HatInfo {
            uuid: String::new(),
            product_id: 1,
            product_version: 1,
            vendor: String::from("Acme"),
            product: String::from("Fan HAT"),
        });
        let state = with_modules(&[
            (module_record(0, 0x20), None),
            (module_record(1, 0x21), Some(hat)),
            (module_record(2, 0x22), Some(native(ModuleType(0x777)))),
            (
                programmer_module_record(3, 0x23),
                Some(native(ModuleType::PROGRAMMER_V0_1)),
            ),
        ]);
        assert_eq!(plan(&state, 0), DispatchPlan::Modules(heapless::Vec::new()));
    }

    #[test]
    fn test_no_modules_falls_back_to_boot_state() {
        let mut state = EepromState::new();
        assert_eq!(
            plan(&state, 0b1100_0000),
            DispatchPlan::BootState {
                reserved_mask: 0b1100_0000
            }
        );

        state.gpio_pins = Some(GpioPinsRecord::decode(&gpio_pins_record()).unwrap());
        assert_eq!(
            plan(&state, 0xFFFF),
            DispatchPlan::BootState {
                reserved_mask: (1 << 6) | (1 << 7)
            }
        );
    }

    #[test]
    fn test_apply_boot_state_skips_reserved_and_untouched() {
        let boot_state = GpioBootState::default()
            .with(0, PinLevel::High)
            .with(6, PinLevel::High)
            .with(9, PinLevel::Low);
        let mut pins = FakePins::new();
        let driven = apply_boot_state(&mut pins, &boot_state, 1 << 6);
        assert_eq!(driven, 2);
        assert_eq!(pins.driven, vec![(0, true), (9, false)]);
    }

    #[test]
    fn test_apply_boot_state_continues_past_pin_errors() {
        let boot_state = GpioBootState::default()
            .with(1, PinLevel::Low)
            .with(2, PinLevel::High);
        let mut pins = FakePins::new();
        pins.broken = Some(1);
        assert_eq!(apply_boot_state(&mut pins, &boot_state, 0), 1);
        assert_eq!(pins.driven, vec![(2, true)]);
    }

    #[test]
    fn test_dispatch_schedules_and_leaves_pins_alone() {
        let state = with_modules(&[(module_record(0, 0x20), Some(native(ModuleType::ADC_V0_1)))]);
        let boot_state = GpioBootState::default().with(0, PinLevel::High);
        let mut scheduler = RecordingScheduler::default();
        let mut pins = FakePins::new();

        let report = dispatch(&state, &boot_state, 0, &mut scheduler, &mut pins);
        assert_eq!(report.scheduled, 1);
        assert_eq!(report.pins_driven, 0);
        assert_eq!(scheduler.inits[0].slot, 0);
        assert!(pins.driven.is_empty());
    }

    #[test]
    fn test_dispatch_counts_refused_schedules() {
        let state = with_modules(&[(module_record(0, 0x20), Some(native(ModuleType::ADC_V0_1)))]);
        let mut scheduler = RecordingScheduler {
            refuse: true,
            ..Default::default()
        };
        let report = dispatch(
            &state,
            &GpioBootState::default(),
            0,
            &mut scheduler,
            &mut FakePins::new(),
        );
        assert_eq!(report.failed, 1);
        assert_eq!(report.scheduled, 0);
    }

    #[test]
    fn test_dispatch_applies_boot_state_without_modules() {
        let boot_state = GpioBootState::default().with(3, PinLevel::Low);
        let mut pins = FakePins::new();
        let report = dispatch(
            &EepromState::new(),
            &boot_state,
            0,
            &mut RecordingScheduler::default(),
            &mut pins,
        );
        assert_eq!(report.pins_driven, 1);
        assert_eq!(pins.driven, vec![(3, false)]);
    }
}
