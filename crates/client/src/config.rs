use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use agency_model::{BatchLimits, DEFAULT_MAX_BATCH_KIB};
use agency_runtime::{
    DEFAULT_BATCH_MAX_AMOUNT, DEFAULT_BATCH_SLEEP_MS, DEFAULT_CONFIG_PATH, DEFAULT_LOOP_AMOUNT,
    DEFAULT_LOOP_PERIOD_MS, DEFAULT_SERVER_ADDRESS, PROGRAM_NAME, logging::parse_level,
};
use agency_source::{DEFAULT_DATASET_DIR, default_dataset_path};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::Level;
use serde::Deserialize;

/// How connections to the aggregator are managed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionMode {
    /// Connect for every request and hang up after the reply.
    #[default]
    PerExchange,
    /// Keep a single connection for the whole run.
    Persistent,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub agency: String,
    pub server_address: String,
    pub dataset: PathBuf,
    /// Maximum `WIN` polls; `0` polls until results are ready.
    pub loop_amount: u32,
    pub loop_period: Duration,
    pub batch: BatchLimits,
    pub batch_sleep: Duration,
    pub connection: ConnectionMode,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = PROGRAM_NAME,
    version,
    about = "Sends an agency's bets to the aggregator in batches and asks for its winners"
)]
pub struct Cli {
    /// Agency identifier
    #[arg(long, env = "CLI_ID")]
    pub id: Option<String>,

    /// JSON config file (defaults to ./config.json when present)
    #[arg(long, env = "CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Aggregator address, host:port
    #[arg(long, env = "CLI_SERVER_ADDRESS")]
    pub server_address: Option<String>,

    /// Bets CSV (defaults to /dataset/agency-<id>.csv)
    #[arg(long, env = "CLI_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Maximum number of result polls, 0 for no limit
    #[arg(long, env = "CLI_LOOP_AMOUNT")]
    pub loop_amount: Option<u32>,

    /// Milliseconds between result polls
    #[arg(long, env = "CLI_LOOP_PERIOD_MS")]
    pub loop_period_ms: Option<u64>,

    /// Maximum bets per batch
    #[arg(long, env = "CLI_BATCH_MAXAMOUNT")]
    pub batch_max_amount: Option<usize>,

    /// Maximum batch weight in KiB
    #[arg(long, env = "CLI_BATCH_MAXKIB")]
    pub batch_max_kib: Option<f64>,

    /// Milliseconds to wait after each batch
    #[arg(long, env = "CLI_BATCH_SLEEP_MS")]
    pub batch_sleep_ms: Option<u64>,

    #[arg(long, value_enum, env = "CLI_CONNECTION")]
    pub connection: Option<ConnectionMode>,

    /// error, warn, info, debug or trace
    #[arg(long, env = "CLI_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Agency ids show up as numbers in most config files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AgencyId {
    Text(String),
    Number(u64),
}

impl From<AgencyId> for String {
    fn from(id: AgencyId) -> Self {
        match id {
            AgencyId::Text(s) => s,
            AgencyId::Number(n) => n.to_string(),
        }
    }
}

/// On-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    id: Option<AgencyId>,
    server_address: Option<String>,
    dataset: Option<PathBuf>,
    loop_amount: Option<u32>,
    loop_period_ms: Option<u64>,
    batch_max_amount: Option<usize>,
    batch_max_kib: Option<f64>,
    batch_sleep_ms: Option<u64>,
    connection: Option<ConnectionMode>,
    log_level: Option<String>,
}

impl FileConfig {
    /// Reads `explicit`, or the default path if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl ClientConfig {
    /// Defaults for everything but the agency and the aggregator address.
    pub fn new(agency: impl Into<String>, server_address: impl Into<String>) -> Self {
        let agency = agency.into();
        Self {
            dataset: default_dataset_path(DEFAULT_DATASET_DIR, &agency),
            agency,
            server_address: server_address.into(),
            loop_amount: DEFAULT_LOOP_AMOUNT,
            loop_period: Duration::from_millis(DEFAULT_LOOP_PERIOD_MS),
            batch: BatchLimits {
                max_count: DEFAULT_BATCH_MAX_AMOUNT,
                max_kib: DEFAULT_MAX_BATCH_KIB,
            },
            batch_sleep: Duration::from_millis(DEFAULT_BATCH_SLEEP_MS),
            connection: ConnectionMode::default(),
            log_level: Level::Info,
        }
    }

    /// Flags and environment first, then the config file, then defaults.
    pub fn from_args(args: &Cli) -> Result<Self> {
        let file = FileConfig::load(args.config.as_deref())?;
        Self::merge(args, file)
    }

    pub fn from_env() -> Result<Self> {
        let args = Cli::parse();
        Self::from_args(&args)
    }

    fn merge(args: &Cli, file: FileConfig) -> Result<Self> {
        let agency = args
            .id
            .clone()
            .or_else(|| file.id.map(String::from))
            .context("No agency id given (use --id, CLI_ID or \"id\" in the config file)")?;
        let server_address = args
            .server_address
            .clone()
            .or(file.server_address)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());

        let mut config = Self::new(agency, server_address);

        if let Some(dataset) = args.dataset.clone().or(file.dataset) {
            config.dataset = dataset;
        }
        if let Some(n) = args.loop_amount.or(file.loop_amount) {
            config.loop_amount = n;
        }
        if let Some(ms) = args.loop_period_ms.or(file.loop_period_ms) {
            config.loop_period = Duration::from_millis(ms);
        }
        if let Some(n) = args.batch_max_amount.or(file.batch_max_amount) {
            config.batch.max_count = n;
        }
        if let Some(kib) = args.batch_max_kib.or(file.batch_max_kib) {
            config.batch.max_kib = kib;
        }
        if let Some(ms) = args.batch_sleep_ms.or(file.batch_sleep_ms) {
            config.batch_sleep = Duration::from_millis(ms);
        }
        if let Some(mode) = args.connection.or(file.connection) {
            config.connection = mode;
        }
        if let Some(level) = args.log_level.clone().or(file.log_level) {
            config.log_level =
                parse_level(&level).with_context(|| format!("Unknown log level {level:?}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agency.trim().is_empty() {
            bail!("Agency id must not be empty");
        }
        if self.agency.contains(['|', '\n', '\r']) {
            bail!("Agency id {:?} contains a reserved character", self.agency);
        }
        if self.server_address.trim().is_empty() {
            bail!("Server address must not be empty");
        }
        self.batch.validate().context("Invalid batch settings")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
