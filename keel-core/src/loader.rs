//! Multi-instance loader
//!
//! Reads instances 0, 1, 2, ... of one record kind until a read fails or
//! the kind's quantity cap is reached. Directory entries beyond the cap
//! are ignored.

use crate::issues::ReadIssues;
use crate::reader::{ComponentReader, RawComponent, Target};
use crate::registry::{descriptor, MAX_INSTANCES};
use keel_hal::EepromBus;
use keel_protocol::ComponentType;

/// Overall result for one record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadStatus {
    /// Not attempted yet
    Pending,
    /// At least one instance loaded
    Loaded,
    /// Optional kind, nothing there
    Absent,
    /// Required kind, nothing usable
    Missing,
}

/// Per-kind outcome kept in the boot state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TypeOutcome {
    pub status: LoadStatus,
    /// Instances loaded
    pub count: u8,
    /// Bitmask of [`ReadIssues`] from the read that ended the scan
    pub last_issues: u32,
}

impl Default for TypeOutcome {
    fn default() -> Self {
        Self {
            status: LoadStatus::Pending,
            count: 0,
            last_issues: 0,
        }
    }
}

impl TypeOutcome {
    pub fn last_issues(&self) -> ReadIssues {
        ReadIssues::from_bits_retain(self.last_issues)
    }

    /// The scan ended on something other than plain absence
    pub fn hit_corruption(&self) -> bool {
        let issues = self.last_issues();
        !issues.is_empty() && !issues.is_absent()
    }

    /// A loaded instance failed to decode; it no longer counts
    pub fn discard_one(&mut self, component: ComponentType, issues: ReadIssues) {
        self.count = self.count.saturating_sub(1);
        self.last_issues |= issues.bits();
        if self.count == 0 {
            self.status = status_for(component, 0);
        }
    }
}

/// All instances read for one kind
#[derive(Debug)]
pub struct Loaded {
    pub component: ComponentType,
    pub records: heapless::Vec<RawComponent, MAX_INSTANCES>,
    pub outcome: TypeOutcome,
}

fn status_for(component: ComponentType, count: usize) -> LoadStatus {
    if count > 0 {
        LoadStatus::Loaded
    } else if descriptor(component).cardinality.is_required() {
        LoadStatus::Missing
    } else {
        LoadStatus::Absent
    }
}

/// Read every instance of `component` up to its quantity cap
pub fn load_instances<B: EepromBus>(
    reader: &mut ComponentReader,
    bus: &mut B,
    target: Target<'_>,
    component: ComponentType,
) -> Loaded {
    let max = descriptor(component).max_quantity;
    let mut records = heapless::Vec::new();
    let mut last_issues = ReadIssues::empty();

    for instance in 0..max {
        match reader.read(bus, target, component, instance) {
            Ok(raw) => {
                if records.push(raw).is_err() {
                    break;
                }
            }
            Err(failure) => {
                last_issues = failure.issues();
                break;
            }
        }
    }

    let outcome = TypeOutcome {
        status: status_for(component, records.len()),
        count: records.len() as u8,
        last_issues: last_issues.bits(),
    };

    Loaded {
        component,
        records,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        main_board_record, module_record, ImageBuilder, MemoryBus, MAIN_ADDRESS,
    };
    use keel_protocol::{DirectoryEntry, ModuleRecord, RootDirectory};

    fn load(image: Vec<u8>, component: ComponentType) -> Loaded {
        let dir = RootDirectory::decode(&image).ok();
        let mut bus = MemoryBus::with_image(MAIN_ADDRESS, image);
        load_instances(
            &mut ComponentReader::new(),
            &mut bus,
            Target {
                address: MAIN_ADDRESS,
                directory: dir.as_ref(),
            },
            component,
        )
    }

    #[test]
    fn test_loads_instances_in_order() {
        let image = ImageBuilder::new()
            .record(0x800, &module_record(0, 0x20))
            .record(0x900, &module_record(1, 0x21))
            .build();
        let loaded = load(image, ComponentType::MainBoardModule);
        assert_eq!(loaded.outcome.status, LoadStatus::Loaded);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[1].instance, 1);
        assert_eq!(
            ModuleRecord::decode(&loaded.records[1].bytes).unwrap().address,
            0x21
        );
        // scan ended because there was no third entry
        assert_eq!(loaded.outcome.last_issues(), ReadIssues::NOT_FOUND);
        assert!(!loaded.outcome.hit_corruption());
    }

    #[test]
    fn test_cardinality_cap() {
        let mut builder = ImageBuilder::new();
        for i in 0..6u32 {
            builder = builder.record(0x800 + i * 0x100, &module_record(i, 0x20 + i as u8));
        }
        let loaded = load(builder.build(), ComponentType::MainBoardModule);
        assert_eq!(loaded.records.len(), 4);
        assert_eq!(loaded.outcome.count, 4);
        assert_eq!(loaded.outcome.status, LoadStatus::Loaded);
        assert_eq!(loaded.outcome.last_issues(), ReadIssues::empty());
    }

    #[test]
    fn test_required_kind_missing() {
        let image = ImageBuilder::new()
            .record(0x400, &main_board_record("S1"))
            .build();
        let loaded = load(image, ComponentType::GpioPins);
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.outcome.status, LoadStatus::Missing);
    }

    #[test]
    fn test_optional_kind_absent() {
        let image = ImageBuilder::new().build();
        let loaded = load(image, ComponentType::SdkInitData);
        assert_eq!(loaded.outcome.status, LoadStatus::Absent);
    }

    #[test]
    fn test_stops_at_first_bad_instance() {
        let image = ImageBuilder::new()
            .record(0x800, &module_record(0, 0x20))
            .entry(DirectoryEntry::new(ComponentType::MainBoardModule, 0x900, 120))
            .build();
        let loaded = load(image, ComponentType::MainBoardModule);
        assert_eq!(loaded.records.len(), 1);
        assert!(loaded.outcome.hit_corruption());
        assert!(loaded.outcome.last_issues().contains(ReadIssues::MAGIC));
    }

    #[test]
    fn test_discard_one_recomputes_status() {
        let mut outcome = TypeOutcome {
            status: LoadStatus::Loaded,
            count: 1,
            last_issues: 0,
        };
        outcome.discard_one(ComponentType::GpioPins, ReadIssues::LENGTH);
        assert_eq!(outcome.status, LoadStatus::Missing);
        assert!(outcome.hit_corruption());
    }
}
