use crate::model::{
    CanonicalOffer, DiskInventory, DiskStats, Features, MalformedOffer, RawOffer,
    UNKNOWN_CPU, UNKNOWN_DATACENTER, UNKNOWN_RAM,
};
use serde_json::{Map, Value};

/// Feed keys of the per-class disk arrays. `general` is validated but never aggregated:
/// the general class is rebuilt from the other three.
const DISK_KEYS: [&str; 4] = ["nvme", "sata", "hdd", "general"];

/// Maps a `specials` code to the feature flag it sets. Unknown codes map to nothing.
fn special_flag<'a>(features: &'a mut Features, code: &str) -> Option<&'a mut bool> {
    match code {
        "HWR" => Some(&mut features.has_hw_raid),
        "RPS" => Some(&mut features.has_redundant_psu),
        "ECC" => Some(&mut features.has_ecc),
        "GPU" => Some(&mut features.has_gpu),
        "IPv4" => Some(&mut features.has_ipv4),
        "iNIC" => Some(&mut features.has_intel_nic),
        _ => None,
    }
}

/// Normalizes every offer of a feed, keeping per-offer failures separate.
pub fn normalize_all(
    raw_offers: &[RawOffer],
    tax_percent: f64,
) -> Vec<Result<CanonicalOffer, MalformedOffer>> {
    raw_offers
        .iter()
        .map(|raw| normalize(raw, tax_percent))
        .collect()
}

/// Builds the canonical view of one raw listing. Missing fields take their defaults.
pub fn normalize(raw: &RawOffer, tax_percent: f64) -> Result<CanonicalOffer, MalformedOffer> {
    let obj = raw.as_object().ok_or(MalformedOffer::NotAnObject)?;

    let disk_map = disk_map(obj)?;
    let price_net = obj.get("price").and_then(Value::as_f64).unwrap_or(0.0);

    Ok(CanonicalOffer {
        id: obj.get("id").and_then(Value::as_u64).unwrap_or(0),
        datacenter: string_or(obj, "datacenter", UNKNOWN_DATACENTER),
        price_net,
        price_gross: price_net * (100.0 + tax_percent) / 100.0,
        ram_size: int_or_zero(obj, "ram_size"),
        ram_description: obj
            .get("ram")
            .and_then(Value::as_array)
            .and_then(|ram| ram.first())
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_RAM)
            .to_string(),
        cpu_count: int_or_zero(obj, "cpu_count"),
        cpu_description: string_or(obj, "cpu", UNKNOWN_CPU),
        disk_description: disk_description(obj),
        disks: aggregate_disks(&disk_map),
        features: features(obj),
        raw: raw.clone(),
    })
}

fn string_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn int_or_zero(obj: &Map<String, Value>, key: &str) -> i64 {
    obj.get(key).and_then(as_integral).unwrap_or(0)
}

/// Accepts integers and floats without a fractional part.
fn as_integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Free-text disk lines win; older entries only carry `hdd_count`/`hdd_size`.
fn disk_description(obj: &Map<String, Value>) -> String {
    let descriptors: Vec<&str> = obj
        .get("description")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(Value::as_str)
                .filter(|line| line.contains(" GB") || line.contains(" TB"))
                .collect()
        })
        .unwrap_or_default();

    if descriptors.is_empty() {
        format!(
            "{}x {}GB",
            int_or_zero(obj, "hdd_count"),
            int_or_zero(obj, "hdd_size")
        )
    } else {
        descriptors.join(", ")
    }
}

#[derive(Debug, Default)]
struct DiskMap {
    hdd: Vec<i64>,
    sata: Vec<i64>,
    nvme: Vec<i64>,
}

fn disk_map(obj: &Map<String, Value>) -> Result<DiskMap, MalformedOffer> {
    let Some(data) = obj.get("serverDiskData") else {
        return Ok(DiskMap::default());
    };
    if data.is_null() {
        return Ok(DiskMap::default());
    }
    let data = data
        .as_object()
        .ok_or(MalformedOffer::DiskDataNotAnObject)?;

    let mut map = DiskMap::default();
    for key in DISK_KEYS {
        let Some(entry) = data.get(key) else {
            continue;
        };
        let sizes = entry
            .as_array()
            .ok_or_else(|| MalformedOffer::DiskInventory(key.to_string()))?
            .iter()
            .map(as_integral)
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(|| MalformedOffer::DiskInventory(key.to_string()))?;
        match key {
            "hdd" => map.hdd = sizes,
            "sata" => map.sata = sizes,
            "nvme" => map.nvme = sizes,
            _ => {}
        }
    }
    Ok(map)
}

/// Each class is gathered into its own vector, so no class shares storage with another.
fn aggregate_disks(map: &DiskMap) -> DiskInventory {
    let quick: Vec<i64> = map.sata.iter().chain(&map.nvme).copied().collect();
    let general: Vec<i64> = map.hdd.iter().chain(&quick).copied().collect();

    DiskInventory {
        general: DiskStats::from_sizes(&general),
        quick: DiskStats::from_sizes(&quick),
        hdd: DiskStats::from_sizes(&map.hdd),
        ssd: DiskStats::from_sizes(&map.sata),
        nvme: DiskStats::from_sizes(&map.nvme),
    }
}

fn features(obj: &Map<String, Value>) -> Features {
    let mut features = Features::default();
    let specials = obj.get("specials").and_then(Value::as_array);
    for code in specials.into_iter().flatten().filter_map(Value::as_str) {
        if let Some(flag) = special_flag(&mut features, code) {
            *flag = true;
        }
    }
    features
}
