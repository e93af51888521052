//! Service layer for the scanning pipeline.
//!
//! Every control operation and every framed token flows through
//! [`ScanService`], which wires the reader, discovery, decoder, catalog and
//! session together so front ends never touch them directly.
//!
//! # Architecture
//!
//! ```text
//! LineSource ──token──┐
//! CLI / UI ───────────┼──> ScanService ──> BarcodeDecoder ──> ProductCatalog ──> ScanSession
//!                     └──> PortSwitcher / PortDiscovery
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::barcode::{BarcodeDecoder, ScanEvent};
use crate::catalog::{CatalogError, ProductCatalog, ProductInfo};
use crate::discovery::{PortDiscovery, PortListing};
use crate::error::ScanResult;
use crate::reader::{BarcodeToken, PortSwitcher};
use crate::session::{ScanSession, SessionSnapshot};

// ========== Result Types ==========

/// A token that made it all the way into the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannedItem {
    pub product: ProductInfo,
    pub event: ScanEvent,
}

// ========== Service Implementation ==========

#[derive(Clone)]
pub struct ScanService {
    switcher: PortSwitcher,
    discovery: PortDiscovery,
    decoder: BarcodeDecoder,
    catalog: Arc<dyn ProductCatalog>,
    session: Arc<ScanSession>,
}

impl ScanService {
    pub fn new(
        switcher: PortSwitcher,
        discovery: PortDiscovery,
        decoder: BarcodeDecoder,
        catalog: Arc<dyn ProductCatalog>,
        session: Arc<ScanSession>,
    ) -> Self {
        Self {
            switcher,
            discovery,
            decoder,
            catalog,
            session,
        }
    }

    /// Decode a framed token, resolve its product and record the scan.
    ///
    /// Nothing is appended to the session when any step fails.
    ///
    /// # Errors
    ///
    /// - `ScanError::UnsupportedBarcode` / `ScanError::InvalidBarcode` from decoding
    /// - `ScanError::UnknownProductCode` if the catalog has no such product
    pub fn dispatch(&self, token: &BarcodeToken) -> ScanResult<ScannedItem> {
        let result = self.decoder.decode_now(token).and_then(|event| {
            let product = self.catalog.lookup(event.product_code)?;
            Ok(ScannedItem { product, event })
        });

        match result {
            Ok(item) => {
                self.session.append(item.event.clone());
                info!(
                    code = item.event.product_code,
                    product = %item.product.name,
                    "Scan recorded"
                );
                Ok(item)
            }
            Err(e) => {
                warn!(token = %token, kind = e.kind(), error = %e, "Scan rejected");
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// - `ScanError::PortUnavailable` if the device cannot be opened
    pub fn switch_to(&self, name: &str) -> ScanResult<()> {
        self.switcher.switch_to(name)
    }

    pub fn disconnect(&self) -> Option<String> {
        self.switcher.disconnect()
    }

    pub fn active_port(&self) -> Option<String> {
        self.switcher.active_port()
    }

    pub fn list_ports(&self) -> PortListing {
        self.discovery.list_ports()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn clear(&self) {
        self.session.clear();
        info!("Scan session cleared");
    }

    pub fn reload_catalog(&self) -> Result<(), CatalogError> {
        self.catalog.reload()?;
        info!(products = self.catalog.len(), "Product catalog reloaded");
        Ok(())
    }

    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }

    pub fn catalog(&self) -> &Arc<dyn ProductCatalog> {
        &self.catalog
    }
}

impl std::fmt::Debug for ScanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanService")
            .field("active_port", &self.switcher.active_port())
            .field("scans", &self.session.len())
            .finish()
    }
}

// ========== Tests ==========
