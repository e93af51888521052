//! Barcode Reader Library
//!
//! Reads barcodes from a serial scanner, decodes them and keeps the scans of
//! the current work shift.
//!
//! # Modules
//!
//! - `port`: Port abstraction layer for serial communication
//! - `reader`: Background read loop, line framing and port switching
//! - `discovery`: Enumeration of openable serial devices
//! - `barcode`: Decoding of 13 and 32 character barcodes
//! - `catalog`: Product lookup collaborator
//! - `session`: In-memory scan session
//! - `service`: The dispatch step tying the pipeline together
//! - `journal`: SQLite journal for restoring a shift (when `journal` feature is enabled)
//! - `config`: Configuration management with TOML support
//! - `error`: Unified error handling
//! - `logging`: Log subscriber setup

pub mod barcode;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod port;
pub mod reader;
pub mod service;
pub mod session;

#[cfg(feature = "journal")]
pub mod journal;

// Re-export commonly used types for convenience
pub use barcode::{BarcodeDecoder, DecodeRules, ScanEvent};
pub use catalog::{CatalogError, JsonCatalog, ProductCatalog, ProductInfo};
pub use discovery::{CandidateNamespace, PortDiscovery, PortEntry, PortListing};
pub use error::{AppError, ScanError, ScanResult};
pub use port::{
    MockDevice, MockPortRegistry, PortConfiguration, PortError, PortOpener, SerialPortAdapter,
    SyncSerialPort, SystemPortOpener,
};
pub use reader::{
    BarcodeToken, LineFramer, LineSource, PortSwitcher, ReaderContext, ReaderHandle,
    ReaderOptions, SharedReader, TokenSink, DEFAULT_SEPARATOR,
};
pub use service::{ScanService, ScannedItem};
pub use session::{ScanSession, SessionEvent, SessionSnapshot};

#[cfg(feature = "journal")]
pub use journal::{ScanJournal, Shift};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
