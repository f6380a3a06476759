//! Keel - board identity EEPROM firmware
//!
//! Main firmware binary for RP2040-based boards. Reads the board's
//! self-describing EEPROM once at boot, settles the device identity, and
//! brings up the module drivers the EEPROM describes.
//!
//! Named for the structural member every other part of a hull is built on.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use keel_core::{dispatch, EepromState, Orchestrator, PlatformIdentity};
use keel_drivers::At24Eeprom;
use keel_hal::I2cConfig;
use keel_hal_rp2040::bank_pins;
use keel_hal_rp2040::flash::Rp2040FlashStorage;
use keel_hal_rp2040::i2c::eeprom_i2c;
use keel_hal_rp2040::pins::PinBank;

use crate::config::{boot_config, load_boot_state, BOOT_PROFILE, DEFAULT_RESERVED_PINS};
use crate::tasks::SpawnScheduler;

// Heap allocator for record trailing arrays and HAT strings
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

mod channels;
mod config;
mod tasks;

// Boot state lives for the life of the firmware
static EEPROM_STATE: StaticCell<EepromState> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Keel firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Persisted settings and the silicon id come from flash
    let mut flash = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let chip_id = match flash.chip_id() {
        Ok(id) => id,
        Err(e) => {
            warn!("Unique id unreadable: {:?}", e);
            0
        }
    };
    let boot_state = load_boot_state(&mut flash).await;

    // Board EEPROMs on I2C0: SCL=GPIO21, SDA=GPIO20
    let i2c = eeprom_i2c(p.I2C0, p.PIN_21, p.PIN_20, I2cConfig::STANDARD);
    let mut bus = At24Eeprom::new(i2c);

    let platform = PlatformIdentity {
        chip_id,
        station_mac: None,
    };
    let mut orchestrator = Orchestrator::new(BOOT_PROFILE, boot_config());
    let state: &'static EepromState = EEPROM_STATE.init(orchestrator.boot(&mut bus, &platform));

    info!("Hardware {}", state.status_string().as_str());
    if let Some(identity) = &state.identity {
        info!("Device {}", identity.as_str());
    }

    // Module drivers, or GPIO boot-state defaults when there are none
    let mut pins = PinBank::new(bank_pins!(p));
    let mut scheduler = SpawnScheduler::new(spawner);
    let report = dispatch(
        state,
        &boot_state,
        DEFAULT_RESERVED_PINS,
        &mut scheduler,
        &mut pins,
    );
    info!(
        "Dispatch: {} drivers scheduled, {} failed, {} pins driven",
        report.scheduled, report.failed, report.pins_driven
    );

    spawner.spawn(tasks::info_task(state)).unwrap();

    info!("Boot complete, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
