//! Configuration schema definitions.
//!
//! Every section has serde defaults, so an empty file (or no file at all)
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};
use crate::barcode::DecodeRules;
use crate::discovery::CandidateNamespace;
use crate::port::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use crate::reader::{ReaderOptions, DEFAULT_SEPARATOR};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device settings
    pub serial: SerialConfig,
    /// Candidate names probed when listing ports
    pub discovery: CandidateNamespace,
    /// Product catalog source
    pub catalog: CatalogConfig,
    /// Interpretation of the extended barcode layout
    pub decoder: DecodeRules,
    /// Scan journal used for restoring a shift
    pub journal: JournalConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation("serial.baud_rate", "must be non-zero"));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must be non-zero",
            ));
        }
        if self.serial.idle_wait_ms == 0 {
            return Err(ConfigError::validation("serial.idle_wait_ms", "must be non-zero"));
        }
        if self.serial.read_chunk == 0 {
            return Err(ConfigError::validation("serial.read_chunk", "must be non-zero"));
        }
        if let Some(ref port) = self.serial.port {
            if port.trim().is_empty() {
                return Err(ConfigError::validation("serial.port", "must not be blank"));
            }
        }
        self.discovery
            .validate()
            .map_err(|m| ConfigError::validation("discovery", m))?;
        self.decoder
            .validate()
            .map_err(|m| ConfigError::validation("decoder", m))?;
        if self.journal.enabled && self.journal.database_url.trim().is_empty() {
            return Err(ConfigError::validation(
                "journal.database_url",
                "must be set when the journal is enabled",
            ));
        }
        Ok(())
    }
}

/// Serial device configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device opened at startup
    pub port: Option<String>,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Upper bound on a single blocking read
    pub read_timeout_ms: u64,
    /// Wait between checks while no device is active
    pub idle_wait_ms: u64,
    /// Scratch buffer size for each read
    pub read_chunk: usize,
    /// Byte terminating each barcode (13 = carriage return)
    pub separator: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout_ms: 250,
            idle_wait_ms: 1000,
            read_chunk: 256,
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Settings every device is opened with.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
            timeout: self.read_timeout(),
        }
    }

    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            idle_wait: self.idle_wait(),
            read_chunk: self.read_chunk,
        }
    }
}

/// Product catalog section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file with the product list
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("products.json"),
        }
    }
}

/// Scan journal section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    /// Journal database URL
    pub database_url: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "journal"),
            database_url: "sqlite://scans.db".to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
