// Static registry of the fields criteria can be attached to.
use crate::model::{CanonicalOffer, DiskClass};
use std::fmt;

/// How a field is compared against its criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact membership in a list of ids.
    IdList,
    /// Case-insensitive substring test against a list of needles.
    Text,
    /// `value <= max`.
    Maximum,
    /// `value >= min`.
    Minimum,
    /// The offer has the feature.
    Flag,
}

impl FieldKind {
    pub fn describe(self) -> &'static str {
        match self {
            FieldKind::IdList => "a list of ids",
            FieldKind::Text => "a list of substrings",
            FieldKind::Maximum => "a maximum",
            FieldKind::Minimum => "a minimum",
            FieldKind::Flag => "a presence flag",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Datacenter,
    Price,
    CpuCount,
    CpuDescription,
    RamSize,
    DiskCount(DiskClass),
    DiskTotalSize(DiskClass),
    DiskEachSize(DiskClass),
    /// Presence of at least one disk of the class. Not defined for `General`.
    DiskPresent(DiskClass),
    HwRaid,
    RedundantPsu,
    Ecc,
    Gpu,
    Ipv4,
    IntelNic,
}

/// Every field, in report order.
pub const FIELDS: [(Field, &str); 31] = [
    (Field::Id, "id"),
    (Field::Datacenter, "datacenter"),
    (Field::Price, "price"),
    (Field::RamSize, "ram_size"),
    (Field::CpuCount, "cpu_count"),
    (Field::CpuDescription, "cpu_description"),
    (Field::DiskCount(DiskClass::General), "disk_general_count"),
    (Field::DiskTotalSize(DiskClass::General), "disk_general_total_size"),
    (Field::DiskEachSize(DiskClass::General), "disk_general_each_size"),
    (Field::DiskPresent(DiskClass::Quick), "disk_quick"),
    (Field::DiskCount(DiskClass::Quick), "disk_quick_count"),
    (Field::DiskTotalSize(DiskClass::Quick), "disk_quick_total_size"),
    (Field::DiskEachSize(DiskClass::Quick), "disk_quick_each_size"),
    (Field::DiskPresent(DiskClass::Hdd), "disk_hdd"),
    (Field::DiskCount(DiskClass::Hdd), "disk_hdd_count"),
    (Field::DiskTotalSize(DiskClass::Hdd), "disk_hdd_total_size"),
    (Field::DiskEachSize(DiskClass::Hdd), "disk_hdd_each_size"),
    (Field::DiskPresent(DiskClass::Ssd), "disk_ssd"),
    (Field::DiskCount(DiskClass::Ssd), "disk_ssd_count"),
    (Field::DiskTotalSize(DiskClass::Ssd), "disk_ssd_total_size"),
    (Field::DiskEachSize(DiskClass::Ssd), "disk_ssd_each_size"),
    (Field::DiskPresent(DiskClass::Nvme), "disk_nvme"),
    (Field::DiskCount(DiskClass::Nvme), "disk_nvme_count"),
    (Field::DiskTotalSize(DiskClass::Nvme), "disk_nvme_total_size"),
    (Field::DiskEachSize(DiskClass::Nvme), "disk_nvme_each_size"),
    (Field::HwRaid, "sp_hw_raid"),
    (Field::RedundantPsu, "sp_red_psu"),
    (Field::Ecc, "sp_ecc"),
    (Field::Gpu, "sp_gpu"),
    (Field::Ipv4, "sp_ipv4"),
    (Field::IntelNic, "sp_inic"),
];

/// A field's value on one offer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Id(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

impl Field {
    pub fn from_name(name: &str) -> Option<Field> {
        FIELDS
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(field, _)| *field)
    }

    pub fn name(self) -> &'static str {
        FIELDS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, name)| *name)
            .unwrap_or("unregistered")
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Id => FieldKind::IdList,
            Field::Datacenter | Field::CpuDescription => FieldKind::Text,
            Field::Price => FieldKind::Maximum,
            Field::CpuCount
            | Field::RamSize
            | Field::DiskCount(_)
            | Field::DiskTotalSize(_)
            | Field::DiskEachSize(_) => FieldKind::Minimum,
            Field::DiskPresent(_)
            | Field::HwRaid
            | Field::RedundantPsu
            | Field::Ecc
            | Field::Gpu
            | Field::Ipv4
            | Field::IntelNic => FieldKind::Flag,
        }
    }

    /// A hit on the exclusion list also voids the inclusion result.
    pub fn exclusion_dominates(self) -> bool {
        matches!(self, Field::CpuDescription)
    }

    pub fn value(self, offer: &CanonicalOffer) -> FieldValue<'_> {
        let features = &offer.features;
        match self {
            Field::Id => FieldValue::Id(offer.id),
            Field::Datacenter => FieldValue::Text(&offer.datacenter),
            Field::Price => FieldValue::Float(offer.price_gross),
            Field::CpuCount => FieldValue::Int(offer.cpu_count),
            Field::CpuDescription => FieldValue::Text(&offer.cpu_description),
            Field::RamSize => FieldValue::Int(offer.ram_size),
            Field::DiskCount(class) => FieldValue::Int(offer.disks.get(class).count as i64),
            Field::DiskTotalSize(class) => FieldValue::Int(offer.disks.get(class).total_size),
            Field::DiskEachSize(class) => FieldValue::Int(offer.disks.get(class).smallest_size),
            Field::DiskPresent(class) => FieldValue::Bool(offer.disks.get(class).is_present()),
            Field::HwRaid => FieldValue::Bool(features.has_hw_raid),
            Field::RedundantPsu => FieldValue::Bool(features.has_redundant_psu),
            Field::Ecc => FieldValue::Bool(features.has_ecc),
            Field::Gpu => FieldValue::Bool(features.has_gpu),
            Field::Ipv4 => FieldValue::Bool(features.has_ipv4),
            Field::IntelNic => FieldValue::Bool(features.has_intel_nic),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_are_unique() {
        let names: HashSet<&str> = FIELDS.iter().map(|(_, name)| *name).collect();
        let fields: HashSet<Field> = FIELDS.iter().map(|(field, _)| *field).collect();
        assert_eq!(names.len(), FIELDS.len());
        assert_eq!(fields.len(), FIELDS.len());
    }

    #[test]
    fn test_name_round_trip() {
        for (field, name) in FIELDS {
            assert_eq!(Field::from_name(name), Some(field));
            assert_eq!(field.name(), name);
        }
        assert_eq!(Field::from_name("disk_general"), None);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Field::Price.kind(), FieldKind::Maximum);
        assert_eq!(Field::DiskEachSize(DiskClass::Hdd).kind(), FieldKind::Minimum);
        assert_eq!(Field::DiskPresent(DiskClass::Nvme).kind(), FieldKind::Flag);
        assert_eq!(Field::CpuDescription.kind(), FieldKind::Text);
        assert_eq!(Field::Id.kind(), FieldKind::IdList);
        assert!(Field::CpuDescription.exclusion_dominates());
        assert!(!Field::Datacenter.exclusion_dominates());
    }
}
