//! EEPROM image builder
//!
//! Records go at their registry default locations. Further instances of
//! the same kind follow the previous one, 4-byte aligned. The root
//! directory at offset 0 lists every record, and unused bytes are 0xFF as
//! on an erased chip.

use keel_core::registry::descriptor;
use keel_protocol::records::{hw_code, hw_subcode};
use keel_protocol::{
    ComponentType, DirectoryEntry, GpioPinsRecord, Header, HwCommon, MainBoardRecord,
    MainModulePinsRecord, MainModuleRecord, ModuleRecord, RootDirectory, SdkInitDataRecord,
    COMPONENT_TYPE_COUNT, MAX_COMPONENT_SIZE, MAX_DIRECTORY_ENTRIES,
};

use crate::board::{padded_serial, to_pins, BoardKind, BoardSpec, MainBoardSpec, MainModuleSpec};
use crate::error::ProvisionError;

/// Value of unwritten EEPROM bytes
pub const ERASED: u8 = 0xFF;

/// One encoded record and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub component: ComponentType,
    pub instance: usize,
    pub offset: u32,
    pub bytes: Vec<u8>,
}

impl Placement {
    pub fn end(&self) -> u32 {
        self.offset + self.bytes.len() as u32
    }

    pub fn name(&self) -> &'static str {
        descriptor(self.component).name
    }
}

/// A complete image, root directory first
#[derive(Debug, Clone)]
pub struct Image {
    pub kind: BoardKind,
    pub capacity: u32,
    pub directory: RootDirectory,
    pub placements: Vec<Placement>,
}

impl Image {
    /// Instances of `component` in the image
    pub fn count(&self, component: ComponentType) -> usize {
        self.placements
            .iter()
            .filter(|p| p.component == component)
            .count()
    }

    /// Flat image of `capacity` bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![ERASED; self.capacity as usize];
        for p in &self.placements {
            out[p.offset as usize..p.end() as usize].copy_from_slice(&p.bytes);
        }
        out
    }
}

/// Encode and place every record the description asks for
pub fn build_image(spec: &BoardSpec) -> Result<Image, ProvisionError> {
    let kind = spec.kind()?;
    let records = match (kind, &spec.main_board, &spec.main_module) {
        (BoardKind::Main, Some(board), _) => main_board_records(spec, board)?,
        (BoardKind::Module, _, Some(module)) => module_board_records(spec, module)?,
        _ => return Err(ProvisionError::BoardKind),
    };
    place(records, spec.eeprom.capacity, spec.eeprom.write_date, kind)
}

fn main_board_records(
    spec: &BoardSpec,
    board: &MainBoardSpec,
) -> Result<Vec<(ComponentType, Vec<u8>)>, ProvisionError> {
    let max_modules = descriptor(ComponentType::MainBoardModule).max_quantity;
    if spec.modules.len() > max_modules {
        return Err(ProvisionError::TooMany {
            what: "modules",
            count: spec.modules.len(),
            max: max_modules,
        });
    }

    let serial = padded_serial(&board.serial)?;
    let main = MainBoardRecord {
        common: HwCommon::new(
            ComponentType::MainBoard.magic(),
            &serial,
            board.code,
            board.subcode,
        ),
        chip_id: board.chip_id_bytes()?,
        mac1: board.mac("mac1_prefix", board.mac1_prefix)?,
        mac2: board.mac("mac2_prefix", board.mac2_prefix)?,
        cpu_module: board.cpu_module,
        flash_size_bytes: board.flash_size_kb.saturating_mul(1024),
        i2c_adc: board.i2c_adc,
        internal_adc: board.internal_adc,
        module_count: board
            .module_count
            .unwrap_or(spec.modules.len() as u32),
    };

    let mut records = vec![(ComponentType::MainBoard, main.encode())];

    for module in &spec.modules {
        let record = ModuleRecord {
            header: Header::new(ComponentType::MainBoardModule.magic(), 0, 1),
            port: module.port,
            socket_type: module.socket.into(),
            header_count: module.header_count,
            address: module.address,
            pins: to_pins(&module.pins)?,
        };
        records.push((ComponentType::MainBoardModule, record.encode()));
    }

    let gpio = GpioPinsRecord {
        header: Header::new(ComponentType::GpioPins.magic(), 0, 1),
        pins: to_pins(&spec.gpio_pins)?,
    };
    records.push((ComponentType::GpioPins, gpio.encode()));

    if let Some(sdk) = &spec.sdk_init_data {
        let record = SdkInitDataRecord {
            header: Header::new(ComponentType::SdkInitData.magic(), 0, 1),
            data: sdk.data.clone(),
        };
        records.push((ComponentType::SdkInitData, record.encode()));
    }

    Ok(records)
}

fn module_board_records(
    spec: &BoardSpec,
    module: &MainModuleSpec,
) -> Result<Vec<(ComponentType, Vec<u8>)>, ProvisionError> {
    let serial = padded_serial(&module.serial)?;
    let main = MainModuleRecord {
        common: HwCommon::new(
            ComponentType::MainModule.magic(),
            &serial,
            module.code,
            module.subcode,
        ),
        module_type: module.module_type(),
        socket_type: module.socket.into(),
        jack_used: module.jack_used,
    };

    let (header_count, pins) = match &spec.main_module_pins {
        Some(p) => (p.header_count, to_pins(&p.pins)?),
        None => (1, Vec::new()),
    };
    let pins = MainModulePinsRecord {
        header: Header::new(ComponentType::MainModulePins.magic(), 0, 1),
        header_count,
        pins,
    };

    Ok(vec![
        (ComponentType::MainModule, main.encode()),
        (ComponentType::MainModulePins, pins.encode()),
    ])
}

fn align4(offset: u32) -> u32 {
    (offset + 3) & !3
}

fn place(
    records: Vec<(ComponentType, Vec<u8>)>,
    capacity: u32,
    write_date: u32,
    kind: BoardKind,
) -> Result<Image, ProvisionError> {
    if records.len() > MAX_DIRECTORY_ENTRIES {
        return Err(ProvisionError::TooMany {
            what: "directory entries",
            count: records.len(),
            max: MAX_DIRECTORY_ENTRIES,
        });
    }

    let mut directory = RootDirectory::new(capacity, write_date);
    let mut next: [Option<u32>; COMPONENT_TYPE_COUNT] = [None; COMPONENT_TYPE_COUNT];
    let mut instances = [0usize; COMPONENT_TYPE_COUNT];
    let mut placements = Vec::with_capacity(records.len() + 1);

    for (component, bytes) in records {
        let d = descriptor(component);
        if bytes.len() > MAX_COMPONENT_SIZE {
            return Err(ProvisionError::TooBig {
                name: d.name,
                len: bytes.len(),
                max: MAX_COMPONENT_SIZE,
            });
        }

        let i = component.index();
        let offset = next[i].unwrap_or(d.default_location);
        next[i] = Some(align4(offset + bytes.len() as u32));

        // bounded by the entry count check above
        let _ = directory.push(DirectoryEntry::new(component, offset, bytes.len() as u32));
        placements.push(Placement {
            component,
            instance: instances[i],
            offset,
            bytes,
        });
        instances[i] += 1;
    }

    placements.insert(
        0,
        Placement {
            component: ComponentType::RootDirectory,
            instance: 0,
            offset: 0,
            bytes: directory.encode(),
        },
    );

    check_layout(&placements, capacity)?;

    Ok(Image {
        kind,
        capacity,
        directory,
        placements,
    })
}

/// Every record inside the chip, none overlapping
fn check_layout(placements: &[Placement], capacity: u32) -> Result<(), ProvisionError> {
    let mut sorted: Vec<&Placement> = placements.iter().collect();
    sorted.sort_by_key(|p| p.offset);

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.end() > b.offset {
            return Err(ProvisionError::Overlap {
                first: a.name(),
                first_at: a.offset,
                second: b.name(),
                second_at: b.offset,
            });
        }
    }

    if let Some(p) = sorted.iter().find(|p| p.end() > capacity) {
        return Err(ProvisionError::Capacity {
            name: p.name(),
            end: p.end(),
            capacity,
        });
    }
    Ok(())
}

/// Hardware code pairs the firmware knows about
pub fn known_hw_code(code: u32, subcode: u32) -> bool {
    matches!(
        (code, subcode),
        (hw_code::MAIN_BOARD, hw_subcode::MAIN_BOARD_REV_0_4)
            | (hw_code::MAIN_BOARD, hw_subcode::MAIN_BOARD_REV_0_5)
            | (hw_code::MAIN_MODULE, hw_subcode::MODULE_MEZZANINE)
            | (hw_code::MAIN_MODULE, hw_subcode::MODULE_PROGRAMMER)
    )
}
