//! Image read-back
//!
//! Runs the firmware's own boot reader over the finished image, so an
//! image that passes here is one the board will accept.

use keel_core::loader::LoadStatus;
use keel_core::registry::descriptor;
use keel_core::{BootConfig, BootProfile, EepromState, Orchestrator};
use keel_hal::EepromBus;

use crate::board::BoardKind;
use crate::error::ProvisionError;
use crate::image::Image;

/// Access outside the image or to another chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfImage;

/// An image served as the EEPROM at one bus address
pub struct ImageBus<'a> {
    address: u8,
    image: &'a [u8],
}

impl<'a> ImageBus<'a> {
    pub fn new(address: u8, image: &'a [u8]) -> Self {
        Self { address, image }
    }
}

impl EepromBus for ImageBus<'_> {
    type Error = OutOfImage;

    fn read(&mut self, address: u8, offset: u32, buf: &mut [u8]) -> Result<(), OutOfImage> {
        if address != self.address {
            return Err(OutOfImage);
        }
        let start = offset as usize;
        let src = self
            .image
            .get(start..start + buf.len())
            .ok_or(OutOfImage)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, _address: u8, _offset: u32, _data: &[u8]) -> Result<(), OutOfImage> {
        Err(OutOfImage)
    }
}

/// Profiles that read an image of this kind
fn profiles(kind: BoardKind) -> &'static [BootProfile] {
    match kind {
        BoardKind::Main => &[BootProfile::Application, BootProfile::Bootloader],
        BoardKind::Module => &[BootProfile::ModuleBoard],
    }
}

/// Read `bytes` back with every profile that applies and check each
/// record kind loads as many instances as were placed
pub fn verify_image(image: &Image, bytes: &[u8]) -> Result<EepromState, ProvisionError> {
    let config = BootConfig {
        probe_module_boards: false,
        ..BootConfig::default()
    };
    let address = match image.kind {
        BoardKind::Main => config.eeprom_address,
        BoardKind::Module => config.module_eeprom_base,
    };

    let mut last = EepromState::new();
    for &profile in profiles(image.kind) {
        let mut bus = ImageBus::new(address, bytes);
        let mut orchestrator = Orchestrator::new(profile, config);
        let state = orchestrator.load_profile(&mut bus, profile, address);

        for &component in profile.components() {
            let expected = image.count(component);
            let outcome = state.outcome(component);
            let loaded = if outcome.status == LoadStatus::Loaded {
                outcome.count as usize
            } else {
                0
            };
            if loaded != expected || outcome.hit_corruption() {
                return Err(ProvisionError::Verify {
                    name: descriptor(component).name,
                    detail: format!(
                        "placed {}, read {} ({:?}, issues {:?})",
                        expected,
                        loaded,
                        outcome.status,
                        outcome.last_issues()
                    ),
                });
            }
        }
        last = state;
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSpec;
    use crate::image::build_image;
    use keel_protocol::ComponentType;

    const MAIN: &str = r#"
        [main_board]
        serial = "K0042"
        code = 0x001
        subcode = 0x002
        chip_id = 0x123456

        [[module]]
        port = 0
        socket = "mezzanine"
        address = 0x20

        [[module]]
        port = 1
        socket = "mezzanine"
        address = 0x21

        [[gpio_pin]]
        num = 7
        usage = "gpio"
        gpio = 12

        [sdk_init_data]
        data = [9, 8, 7]
    "#;

    #[test]
    fn test_main_image_reads_back() {
        let image = build_image(&BoardSpec::parse(MAIN).unwrap()).unwrap();
        let bytes = image.to_bytes();
        let state = verify_image(&image, &bytes).unwrap();

        // last profile run is the bootloader's
        assert_eq!(state.sdk_init_data.unwrap().data, vec![9, 8, 7]);
        assert_eq!(
            state.main_board.unwrap().common.serial(),
            Some("K0042")
        );
    }

    #[test]
    fn test_module_image_reads_back() {
        let text = r#"
            [main_module]
            serial = "M1"
            code = 0x101
            subcode = 0x101
            module_type = 0x201
            socket = "mezzanine"
        "#;
        let image = build_image(&BoardSpec::parse(text).unwrap()).unwrap();
        let state = verify_image(&image, &image.to_bytes()).unwrap();
        assert_eq!(
            state.main_module.unwrap().module_type,
            keel_protocol::ModuleType::LEVEL_SHIFTER_V0_1
        );
        assert!(state.main_module_pins.is_some());
    }

    #[test]
    fn test_corrupt_image_fails() {
        let image = build_image(&BoardSpec::parse(MAIN).unwrap()).unwrap();
        let mut bytes = image.to_bytes();
        let gpio = image
            .placements
            .iter()
            .find(|p| p.component == ComponentType::GpioPins)
            .unwrap();
        bytes[gpio.offset as usize + 24] ^= 0x01;

        assert!(matches!(
            verify_image(&image, &bytes),
            Err(ProvisionError::Verify { name: "gpio pins", .. })
        ));
    }

    #[test]
    fn test_image_bus_bounds() {
        let data = [1u8, 2, 3, 4];
        let mut bus = ImageBus::new(0x57, &data);
        let mut buf = [0u8; 2];
        bus.read(0x57, 2, &mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
        assert_eq!(bus.read(0x57, 3, &mut buf), Err(OutOfImage));
        assert_eq!(bus.read(0x50, 0, &mut buf), Err(OutOfImage));
        assert_eq!(bus.write(0x57, 0, &[0]), Err(OutOfImage));
    }
}
