//! Component type registry
//!
//! One descriptor per record kind: how to recognise it, which sizes and
//! versions are acceptable, where it lives when there is no directory and
//! how many instances a board may carry. The table is indexed by type id.

use keel_protocol::component::{magic, ComponentType, COMPONENT_TYPE_COUNT};
use keel_protocol::directory::DIRECTORY_FIXED_LEN;
use keel_protocol::records::{
    GPIO_PINS_FIXED_LEN, MAIN_BOARD_LEGACY_LEN, MAIN_BOARD_LEN, MAIN_MODULE_LEGACY_LEN,
    MAIN_MODULE_LEN, MAIN_MODULE_PINS_FIXED_LEN, MODULE_FIXED_LEN, SDK_INIT_DATA_FIXED_LEN,
};

/// How many instances of a kind a board must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cardinality {
    ZeroOrMore,
    ExactlyOne,
    OneOrMore,
}

impl Cardinality {
    /// At least one instance must be present
    pub const fn is_required(self) -> bool {
        !matches!(self, Cardinality::ZeroOrMore)
    }
}

/// An older layout of a record kind
///
/// Older firmware wrote a shorter record and checksummed only that prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchemaShape {
    /// Bytes covered by the checksum in this layout
    pub checksum_span: u32,
}

/// Static description of one record kind
#[derive(Debug, Clone, Copy)]
pub struct ComponentDescriptor {
    pub component: ComponentType,
    pub name: &'static str,
    pub magic: u32,
    pub struct_size_min: u32,
    pub struct_size_max: u32,
    pub version_min: u32,
    pub version_max: u32,
    /// Location used when no root directory is readable
    pub default_location: u32,
    pub cardinality: Cardinality,
    pub max_quantity: usize,
    /// Older layouts, newest first
    pub prior_shapes: &'static [SchemaShape],
}

impl ComponentDescriptor {
    /// Size of the record's fixed part in the current layout
    pub const fn fixed_len(&self) -> usize {
        self.struct_size_max as usize
    }
}

const TABLE: [ComponentDescriptor; COMPONENT_TYPE_COUNT] = [
    ComponentDescriptor {
        component: ComponentType::RootDirectory,
        name: "info",
        magic: magic::ROOT_DIRECTORY,
        struct_size_min: DIRECTORY_FIXED_LEN as u32,
        struct_size_max: DIRECTORY_FIXED_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x0000,
        cardinality: Cardinality::ExactlyOne,
        max_quantity: 1,
        prior_shapes: &[],
    },
    ComponentDescriptor {
        component: ComponentType::MainBoard,
        name: "main board",
        magic: magic::MAIN_BOARD,
        struct_size_min: MAIN_BOARD_LEGACY_LEN as u32,
        struct_size_max: MAIN_BOARD_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x0400,
        cardinality: Cardinality::ExactlyOne,
        max_quantity: 1,
        prior_shapes: &[SchemaShape {
            checksum_span: MAIN_BOARD_LEGACY_LEN as u32,
        }],
    },
    ComponentDescriptor {
        component: ComponentType::MainBoardModule,
        name: "main board module",
        magic: magic::MAIN_BOARD_MODULE,
        struct_size_min: MODULE_FIXED_LEN as u32,
        struct_size_max: MODULE_FIXED_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x0800,
        cardinality: Cardinality::OneOrMore,
        max_quantity: MAX_MODULES,
        prior_shapes: &[],
    },
    ComponentDescriptor {
        component: ComponentType::SdkInitData,
        name: "sdk init data",
        magic: magic::SDK_INIT_DATA,
        struct_size_min: SDK_INIT_DATA_FIXED_LEN as u32,
        struct_size_max: SDK_INIT_DATA_FIXED_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x3000,
        cardinality: Cardinality::ZeroOrMore,
        max_quantity: 1,
        prior_shapes: &[],
    },
    ComponentDescriptor {
        component: ComponentType::GpioPins,
        name: "gpio pins",
        magic: magic::GPIO_PINS,
        struct_size_min: GPIO_PINS_FIXED_LEN as u32,
        struct_size_max: GPIO_PINS_FIXED_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x0C00,
        cardinality: Cardinality::ExactlyOne,
        max_quantity: 1,
        prior_shapes: &[],
    },
    ComponentDescriptor {
        component: ComponentType::MainModule,
        name: "main module",
        magic: magic::MAIN_MODULE,
        struct_size_min: MAIN_MODULE_LEGACY_LEN as u32,
        struct_size_max: MAIN_MODULE_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x0800,
        cardinality: Cardinality::ExactlyOne,
        max_quantity: 1,
        prior_shapes: &[SchemaShape {
            checksum_span: MAIN_MODULE_LEGACY_LEN as u32,
        }],
    },
    ComponentDescriptor {
        component: ComponentType::MainModulePins,
        name: "main module pins",
        magic: magic::MAIN_MODULE_PINS,
        struct_size_min: MAIN_MODULE_PINS_FIXED_LEN as u32,
        struct_size_max: MAIN_MODULE_PINS_FIXED_LEN as u32,
        version_min: 1,
        version_max: 1,
        default_location: 0x1000,
        cardinality: Cardinality::ExactlyOne,
        max_quantity: 1,
        prior_shapes: &[],
    },
];

/// Maximum module sockets on a main board
pub const MAX_MODULES: usize = 4;

/// Largest `max_quantity` in the table
pub const MAX_INSTANCES: usize = MAX_MODULES;

/// Registry of all record kinds, indexed by type id
pub static REGISTRY: [ComponentDescriptor; COMPONENT_TYPE_COUNT] = TABLE;

// A mis-ordered or inconsistent table must not build.
const _: () = {
    let mut i = 0;
    while i < TABLE.len() {
        let d = &TABLE[i];
        assert!(d.component as usize == i);
        assert!(d.magic == d.component.magic());
        assert!(d.struct_size_min <= d.struct_size_max);
        assert!(d.version_min <= d.version_max);
        assert!(d.max_quantity >= 1 && d.max_quantity <= MAX_INSTANCES);
        i += 1;
    }
};

/// Descriptor for `component`
pub fn descriptor(component: ComponentType) -> &'static ComponentDescriptor {
    &REGISTRY[component.index()]
}

/// Kind whose magic is `magic`
pub fn component_for_magic(magic: u32) -> Option<ComponentType> {
    REGISTRY
        .iter()
        .find(|d| d.magic == magic)
        .map(|d| d.component)
}
