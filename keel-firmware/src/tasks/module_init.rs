//! Deferred module driver initialization
//!
//! Dispatch never starts a driver in the boot path. Each initialization is
//! spawned as its own task and waits on a one-shot timer first, so the
//! executor and watchdog get to run before the heavier driver setup.

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

use keel_core::{DriverInit, DriverScheduler, ModuleDriver};

/// Delay before a module driver starts
const MODULE_INIT_DELAY: Duration = Duration::from_millis(50);

/// Module driver initialization task
///
/// One instance per module socket.
#[embassy_executor::task(pool_size = 4)]
pub async fn module_init_task(init: DriverInit) {
    Timer::after(MODULE_INIT_DELAY).await;

    info!(
        "Module {}: starting {} on port {} at {:#x}",
        init.slot, init.driver, init.port, init.address
    );

    match init.driver {
        ModuleDriver::Programmer => {
            debug!("  programmer has no GPIO lines");
        }
        ModuleDriver::Ads1115Adc | ModuleDriver::LevelShifter => {
            for gpio in &init.gpios {
                debug!("  GPIO{} routed to module", gpio);
            }
        }
    }
}

/// Schedules driver initializations as executor tasks
pub struct SpawnScheduler {
    spawner: Spawner,
}

impl SpawnScheduler {
    pub fn new(spawner: Spawner) -> Self {
        Self { spawner }
    }
}

impl DriverScheduler for SpawnScheduler {
    type Error = embassy_executor::SpawnError;

    fn schedule(&mut self, init: DriverInit) -> Result<(), Self::Error> {
        self.spawner.spawn(module_init_task(init))
    }
}
