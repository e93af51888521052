//! Configuration module for barcode-reader.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `BRREADER_CONFIG` environment variable (explicit path)
//! 2. `./brreader.toml` (current directory)
//! 3. `brreader.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `BRREADER_<SECTION>_<KEY>`, for example
//! `BRREADER_SERIAL_PORT=COM3` or `BRREADER_JOURNAL_ENABLED=false`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "COM3"
//! read_timeout_ms = 250
//!
//! [catalog]
//! path = "products.json"
//!
//! [decoder]
//! weight_scale = 10000.0
//! date_format = "%d%m%y"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{CatalogConfig, Config, JournalConfig, LogFormat, LoggingConfig, SerialConfig};
