//! GPIO bank for boot-state outputs
//!
//! Holds GPIO 0-16 (the pins a module socket or boot-state default can
//! claim) and drives them by number, since the numbers come from EEPROM
//! data rather than from the type system.

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::Peri;
use keel_hal::{BootPins, PinError};

/// Pins in the bank (GPIO 0-16)
pub const BANK_PINS: usize = 17;

/// Move GPIO 0-16 out of the peripherals into an array for [`PinBank::new`]
///
/// Usage:
/// ```ignore
/// let bank = PinBank::new(bank_pins!(p));
/// ```
#[macro_export]
macro_rules! bank_pins {
    ($p:expr) => {
        [
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_0),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_1),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_2),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_3),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_4),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_5),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_6),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_7),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_8),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_9),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_10),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_11),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_12),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_13),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_14),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_15),
            embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_16),
        ]
    };
}

/// GPIO 0-16, either unclaimed or driven as a boot-state output
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; BANK_PINS],
    outputs: [Option<Output<'static>>; BANK_PINS],
}

impl PinBank {
    pub fn new(pins: [Peri<'static, AnyPin>; BANK_PINS]) -> Self {
        Self {
            pins: pins.map(Some),
            outputs: [const { None }; BANK_PINS],
        }
    }
}

impl BootPins for PinBank {
    fn count(&self) -> u8 {
        BANK_PINS as u8
    }

    fn drive(&mut self, pin: u8, high: bool) -> Result<(), PinError> {
        let index = pin as usize;
        let level = if high { Level::High } else { Level::Low };

        let output = self.outputs.get_mut(index).ok_or(PinError::NotAvailable)?;
        if let Some(driven) = output.as_mut() {
            driven.set_level(level);
            return Ok(());
        }

        let peri = self.pins[index].take().ok_or(PinError::InUse)?;
        *output = Some(Output::new(peri, level));
        Ok(())
    }
}
