use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::port::PortError;

/// Per-operation errors of the scanning pipeline.
///
/// Every variant is recoverable: a failed port switch leaves the reader
/// without an active device, and a failed dispatch affects only the token it
/// was raised for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// The device could not be opened (or was lost while reading).
    #[error("Serial port '{port}' is unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// The token length matches neither the plain nor the extended layout.
    #[error("Unsupported barcode: {length} characters")]
    UnsupportedBarcode { length: usize },

    /// A recognised layout carried a malformed numeric or date payload.
    #[error("Invalid barcode '{token}': {reason}")]
    InvalidBarcode { token: String, reason: String },

    /// The catalog has no product for this code.
    #[error("Unknown product code {0}")]
    UnknownProductCode(u64),
}

impl ScanError {
    pub fn port_unavailable(port: impl Into<String>, source: &PortError) -> Self {
        Self::PortUnavailable {
            port: port.into(),
            reason: source.to_string(),
        }
    }

    pub fn invalid(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBarcode {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable name of the variant, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PortUnavailable { .. } => "PortUnavailable",
            Self::UnsupportedBarcode { .. } => "UnsupportedBarcode",
            Self::InvalidBarcode { .. } => "InvalidBarcode",
            Self::UnknownProductCode(_) => "UnknownProductCode",
        }
    }
}

/// A specialized `Result` type for scanning operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Unified application error type used by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[cfg(feature = "journal")]
    #[error("Scan journal error: {0}")]
    Journal(#[from] sqlx::Error),

    #[error("An I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install log subscriber: {0}")]
    Logging(String),
}
