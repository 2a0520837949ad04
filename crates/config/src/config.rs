use std::path::PathBuf;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// Default value for `scan_range` in [`ScanConfig`].
const DEFAULT_SCAN_RANGE: u64 = 50;

/// Default value for `batch_size` in [`ScanConfig`].
const DEFAULT_BATCH_SIZE: u64 = 10;

/// Default value for `workers` in [`ScanConfig`].
const DEFAULT_WORKERS: usize = 4;

const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

const DEFAULT_PARAMS_PATH: &str = "global-params.json";
const DEFAULT_TRANSACTIONS_PATH: &str = "babylon-transactions.json";
const DEFAULT_ANALYSIS_PATH: &str = "babylon-stake-analysis.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoindConfig {
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
}

/// Which heights to scan and how hard to hit the node doing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// First height to scan. Derived from the tip when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_height: Option<u64>,

    /// Last height to scan. Defaults to the tip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_height: Option<u64>,

    /// How many blocks back from the tip to scan when `start_height` is absent.
    #[serde(default = "default_scan_range")]
    pub scan_range: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Concurrent block fetches per batch.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start_height: None,
            end_height: None,
            scan_range: DEFAULT_SCAN_RANGE,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
        }
    }
}

fn default_scan_range() -> u64 {
    DEFAULT_SCAN_RANGE
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Backoff for fetches that fail transiently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt before a block is skipped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in ms.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Multiplier for each subsequent retry.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum delay cap in ms.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// Path to the versioned parameter table (`global-params.json`).
    #[serde(default = "default_params_path")]
    pub path: PathBuf,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            path: default_params_path(),
        }
    }
}

fn default_params_path() -> PathBuf {
    DEFAULT_PARAMS_PATH.into()
}

/// Where scan artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_transactions_path")]
    pub transactions_path: PathBuf,

    #[serde(default = "default_analysis_path")]
    pub analysis_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            transactions_path: default_transactions_path(),
            analysis_path: default_analysis_path(),
        }
    }
}

fn default_transactions_path() -> PathBuf {
    DEFAULT_TRANSACTIONS_PATH.into()
}

fn default_analysis_path() -> PathBuf {
    DEFAULT_ANALYSIS_PATH.into()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bitcoind: BitcoindConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub params: ParamsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}
