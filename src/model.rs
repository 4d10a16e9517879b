// Core structs: CanonicalOffer, DiskStats and the error types shared across modules
use serde_json::Value;
use thiserror::Error;

/// One record of the feed's `server` array, exactly as received.
pub type RawOffer = Value;

pub const UNKNOWN_DATACENTER: &str = "UNKNOWN_DATACENTER";
pub const UNKNOWN_CPU: &str = "UNKNOWN_CPU";
pub const UNKNOWN_RAM: &str = "UNKNOWN_RAM";

/// Disk classes the normalizer aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiskClass {
    General,
    Quick,
    Hdd,
    Ssd,
    Nvme,
}

impl DiskClass {
    #[cfg(test)]
    pub const ALL: [DiskClass; 5] = [
        DiskClass::General,
        DiskClass::Quick,
        DiskClass::Hdd,
        DiskClass::Ssd,
        DiskClass::Nvme,
    ];
}

/// Aggregate over the disks of one class. Sizes are in GB; `-1` means the class is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskStats {
    pub count: usize,
    pub total_size: i64,
    pub smallest_size: i64,
}

impl DiskStats {
    pub const EMPTY: DiskStats = DiskStats {
        count: 0,
        total_size: -1,
        smallest_size: -1,
    };

    pub fn from_sizes(sizes: &[i64]) -> Self {
        if sizes.is_empty() {
            return Self::EMPTY;
        }
        Self {
            count: sizes.len(),
            total_size: sizes.iter().sum(),
            smallest_size: sizes.iter().copied().min().unwrap_or(-1),
        }
    }

    pub fn is_present(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskInventory {
    pub general: DiskStats,
    pub quick: DiskStats,
    pub hdd: DiskStats,
    pub ssd: DiskStats,
    pub nvme: DiskStats,
}

impl DiskInventory {
    pub fn get(&self, class: DiskClass) -> &DiskStats {
        match class {
            DiskClass::General => &self.general,
            DiskClass::Quick => &self.quick,
            DiskClass::Hdd => &self.hdd,
            DiskClass::Ssd => &self.ssd,
            DiskClass::Nvme => &self.nvme,
        }
    }
}

/// Boolean features decoded from the `specials` list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub has_hw_raid: bool,
    pub has_redundant_psu: bool,
    pub has_ecc: bool,
    pub has_gpu: bool,
    pub has_ipv4: bool,
    pub has_intel_nic: bool,
}

/// Typed view of one auction listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOffer {
    pub id: u64,
    pub datacenter: String,
    pub price_net: f64,
    pub price_gross: f64,
    pub ram_size: i64,
    pub ram_description: String,
    pub cpu_count: i64,
    pub cpu_description: String,
    pub disk_description: String,
    pub disks: DiskInventory,
    pub features: Features,
    pub raw: RawOffer,
}

impl CanonicalOffer {
    pub fn url(&self) -> String {
        format!("https://www.hetzner.com/sb/#search={}", self.id)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MalformedOffer {
    #[error("offer is not a JSON object")]
    NotAnObject,
    #[error("serverDiskData is not an object")]
    DiskDataNotAnObject,
    #[error("disk inventory '{0}' is not a list of numbers")]
    DiskInventory(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown criteria field '{0}'")]
    UnknownField(String),
    #[error("field '{field}' does not accept {given}")]
    KindMismatch { field: String, given: String },
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("conflicting options: {0}")]
    Conflict(String),
    #[error("missing setting '{0}' for the selected provider")]
    MissingSetting(&'static str),
    #[error("cannot read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("cannot read feed file: {0}")]
    File(#[from] std::io::Error),
    #[error("invalid feed document: {0}")]
    InvalidDocument(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("api error: {0}")]
    ApiError(String),
    #[error("provider unreachable")]
    Unreachable,
    #[error("provider rejected message [{status}]: {body}")]
    Rejected { status: u16, body: String },
}
