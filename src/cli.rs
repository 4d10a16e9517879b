use crate::analyzer::criteria::{parse_contains, parse_ids};
use crate::analyzer::{CriteriaSet, Criterion, Field};
use crate::config::{load_config, AppConfig};
use crate::model::{ConfigError, DiskClass};
use crate::notifier::{build_notifier, DummyNotifier, Notifier, Provider};
use crate::pipeline::RunOptions;
use crate::scraper::DEFAULT_FEED_URL;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TAX_PERCENT: f64 = 19.0;

/// Minimums that apply when neither the command line nor the config file sets them.
const DEFAULT_MINIMUMS: [(Field, i64); 2] = [
    (Field::CpuCount, 1),
    (Field::DiskCount(DiskClass::General), 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedgerBackend {
    /// Comma-separated ids in a text file
    File,
    /// SQLite database
    Sqlite,
}

/// Checks the Hetzner server auction for new servers matching your criteria and pushes a notification for each
#[derive(Parser, Debug)]
#[command(name = "sb-sniper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL (or file:// path) of live_data_sb.json
    #[arg(long, default_value = DEFAULT_FEED_URL)]
    pub data_url: String,

    /// Notification provider
    #[arg(long, value_enum, default_value_t = Provider::Dummy)]
    pub provider: Provider,

    /// JSON config with provider credentials and extra criteria
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tax rate (VAT) in percent [default: 19]
    #[arg(long = "tax")]
    pub tax_percent: Option<f64>,

    /// Exclude tax from the compared and reported price
    #[arg(long)]
    pub exclude_tax: bool,

    /// Max price (€)
    #[arg(long)]
    pub price: Option<f64>,

    /// Server ids (comma separated)
    #[arg(long)]
    pub id: Option<String>,

    /// Server ids to skip (comma separated)
    #[arg(long)]
    pub exclude_id: Option<String>,

    /// Datacenter (FSN1-DC15) or location (FSN), comma separated
    #[arg(long = "dc")]
    pub datacenter: Option<String>,

    /// Datacenters or locations to skip, comma separated
    #[arg(long = "exclude-dc")]
    pub exclude_datacenter: Option<String>,

    /// Min RAM (GB)
    #[arg(long = "ram")]
    pub ram_size: Option<i64>,

    /// Min CPU count [default: 1]
    #[arg(long)]
    pub cpu_count: Option<i64>,

    /// Match CPU description (comma separated substrings)
    #[arg(long = "match-cpu")]
    pub match_cpu: Option<String>,

    /// Exclude CPU description (comma separated substrings, wins over --match-cpu)
    #[arg(long = "exclude-cpu")]
    pub exclude_cpu: Option<String>,

    /// Min disk count [default: 1]
    #[arg(long)]
    pub disk_general_count: Option<i64>,
    /// Min disk capacity in total (GB)
    #[arg(long)]
    pub disk_general_total_size: Option<i64>,
    /// Min disk capacity per each disk (GB)
    #[arg(long)]
    pub disk_general_each_size: Option<i64>,

    /// Require SSD/NVMe
    #[arg(long)]
    pub disk_quick: bool,
    /// Min SSD/NVMe disk count
    #[arg(long)]
    pub disk_quick_count: Option<i64>,
    /// Min SSD/NVMe disk capacity in total (GB)
    #[arg(long)]
    pub disk_quick_total_size: Option<i64>,
    /// Min SSD/NVMe disk capacity per each disk (GB)
    #[arg(long)]
    pub disk_quick_each_size: Option<i64>,

    /// Require HDD
    #[arg(long)]
    pub disk_hdd: bool,
    /// Min HDD disk count
    #[arg(long)]
    pub disk_hdd_count: Option<i64>,
    /// Min HDD disk capacity in total (GB)
    #[arg(long)]
    pub disk_hdd_total_size: Option<i64>,
    /// Min HDD disk capacity per each disk (GB)
    #[arg(long)]
    pub disk_hdd_each_size: Option<i64>,

    /// Require SATA SSD
    #[arg(long)]
    pub disk_ssd: bool,
    /// Min SSD disk count
    #[arg(long)]
    pub disk_ssd_count: Option<i64>,
    /// Min SSD disk capacity in total (GB)
    #[arg(long)]
    pub disk_ssd_total_size: Option<i64>,
    /// Min SSD disk capacity per each disk (GB)
    #[arg(long)]
    pub disk_ssd_each_size: Option<i64>,

    /// Require NVMe
    #[arg(long)]
    pub disk_nvme: bool,
    /// Min NVMe disk count
    #[arg(long)]
    pub disk_nvme_count: Option<i64>,
    /// Min NVMe disk capacity in total (GB)
    #[arg(long)]
    pub disk_nvme_total_size: Option<i64>,
    /// Min NVMe disk capacity per each disk (GB)
    #[arg(long)]
    pub disk_nvme_each_size: Option<i64>,

    /// Require hardware RAID
    #[arg(long)]
    pub hw_raid: bool,
    /// Require redundant PSU
    #[arg(long)]
    pub red_psu: bool,
    /// Require ECC memory
    #[arg(long)]
    pub ecc: bool,
    /// Require discrete GPU
    #[arg(long)]
    pub gpu: bool,
    /// Require IPv4
    #[arg(long)]
    pub ipv4: bool,
    /// Require Intel NIC
    #[arg(long)]
    pub inic: bool,

    /// State file of already notified ids
    #[arg(short = 'f', long = "state-file", default_value = "/tmp/hah.txt")]
    pub state_file: PathBuf,

    /// Storage format of the state file
    #[arg(long, value_enum, default_value_t = LedgerBackend::File)]
    pub ledger: LedgerBackend,

    /// Do not send actual messages and ignore the state file
    #[arg(long)]
    pub test_mode: bool,

    /// Log every raw feed record
    #[arg(long)]
    pub debug: bool,

    /// Send server data as JSON payload
    #[arg(long)]
    pub send_payload: bool,

    /// Poll again every N seconds instead of exiting after one pass
    #[arg(long)]
    pub interval: Option<u64>,
}

/// Everything a run needs, validated before the first offer is looked at.
#[derive(Debug)]
pub struct Settings {
    pub data_url: String,
    pub provider: Provider,
    pub config: AppConfig,
    pub criteria: CriteriaSet,
    pub options: RunOptions,
    pub state_file: PathBuf,
    pub ledger: LedgerBackend,
    pub interval: Option<Duration>,
}

impl Settings {
    /// The configured provider. Test mode never sends, so it needs no credentials.
    pub fn notifier(&self) -> Result<Box<dyn Notifier>, ConfigError> {
        if self.options.test_mode {
            return Ok(Box::new(DummyNotifier::new()));
        }
        build_notifier(self.provider, &self.config)
    }
}

fn flag(set: bool) -> Option<Criterion> {
    set.then_some(Criterion::Required)
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };
        let options = RunOptions {
            tax_percent: self.tax_percent()?,
            test_mode: self.test_mode,
            debug: self.debug,
            send_payload: self.send_payload,
        };
        if self.interval == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let mut criteria = CriteriaSet::new();
        criteria.extend_from_json(&config.match_criteria, &config.exclude_criteria)?;
        self.apply_criteria(&mut criteria)?;
        for (field, min) in DEFAULT_MINIMUMS {
            if criteria.match_criterion(field).is_none() {
                criteria.set_match(field, Criterion::AtLeast(min))?;
            }
        }

        Ok(Settings {
            data_url: self.data_url,
            provider: self.provider,
            config,
            criteria,
            options,
            state_file: self.state_file,
            ledger: self.ledger,
            interval: self.interval.map(Duration::from_secs),
        })
    }

    fn tax_percent(&self) -> Result<f64, ConfigError> {
        match (self.exclude_tax, self.tax_percent) {
            (true, Some(_)) => Err(ConfigError::Conflict("--tax and --exclude-tax".into())),
            (true, None) => Ok(0.0),
            (false, Some(tax)) if !tax.is_finite() || tax < 0.0 => Err(ConfigError::InvalidValue {
                field: "tax".into(),
                reason: "must be a non-negative number".into(),
            }),
            (false, Some(tax)) => Ok(tax),
            (false, None) => Ok(DEFAULT_TAX_PERCENT),
        }
    }

    /// Command line criteria, overriding config entries for the same field.
    fn apply_criteria(&self, criteria: &mut CriteriaSet) -> Result<(), ConfigError> {
        let list = |field: Field, value: &Option<String>, parse: fn(Field, &str) -> Result<Criterion, ConfigError>| {
            value.as_deref().map(|v| parse(field, v)).transpose()
        };

        criteria.match_opt(Field::Id, list(Field::Id, &self.id, parse_ids)?)?;
        criteria.exclude_opt(Field::Id, list(Field::Id, &self.exclude_id, parse_ids)?)?;
        criteria.match_opt(Field::Datacenter, list(Field::Datacenter, &self.datacenter, parse_contains)?)?;
        criteria.exclude_opt(
            Field::Datacenter,
            list(Field::Datacenter, &self.exclude_datacenter, parse_contains)?,
        )?;
        criteria.match_opt(Field::CpuDescription, list(Field::CpuDescription, &self.match_cpu, parse_contains)?)?;
        criteria.exclude_opt(
            Field::CpuDescription,
            list(Field::CpuDescription, &self.exclude_cpu, parse_contains)?,
        )?;

        if let Some(price) = self.price.filter(|p| !p.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "price".into(),
                reason: format!("'{price}' is not a number"),
            });
        }
        criteria.match_opt(Field::Price, self.price.map(Criterion::AtMost))?;
        criteria.match_opt(Field::RamSize, self.ram_size.map(Criterion::AtLeast))?;
        criteria.match_opt(Field::CpuCount, self.cpu_count.map(Criterion::AtLeast))?;

        let minimums = [
            (DiskClass::General, self.disk_general_count, self.disk_general_total_size, self.disk_general_each_size),
            (DiskClass::Quick, self.disk_quick_count, self.disk_quick_total_size, self.disk_quick_each_size),
            (DiskClass::Hdd, self.disk_hdd_count, self.disk_hdd_total_size, self.disk_hdd_each_size),
            (DiskClass::Ssd, self.disk_ssd_count, self.disk_ssd_total_size, self.disk_ssd_each_size),
            (DiskClass::Nvme, self.disk_nvme_count, self.disk_nvme_total_size, self.disk_nvme_each_size),
        ];
        for (class, count, total, each) in minimums {
            criteria.match_opt(Field::DiskCount(class), count.map(Criterion::AtLeast))?;
            criteria.match_opt(Field::DiskTotalSize(class), total.map(Criterion::AtLeast))?;
            criteria.match_opt(Field::DiskEachSize(class), each.map(Criterion::AtLeast))?;
        }

        let flags = [
            (Field::DiskPresent(DiskClass::Quick), self.disk_quick),
            (Field::DiskPresent(DiskClass::Hdd), self.disk_hdd),
            (Field::DiskPresent(DiskClass::Ssd), self.disk_ssd),
            (Field::DiskPresent(DiskClass::Nvme), self.disk_nvme),
            (Field::HwRaid, self.hw_raid),
            (Field::RedundantPsu, self.red_psu),
            (Field::Ecc, self.ecc),
            (Field::Gpu, self.gpu),
            (Field::Ipv4, self.ipv4),
            (Field::IntelNic, self.inic),
        ];
        for (field, set) in flags {
            criteria.match_opt(field, flag(set))?;
        }
        Ok(())
    }
}
