//! Shared test utilities for barcode-reader integration tests.
//!
//! This module provides common test infrastructure including:
//! - A complete mock pipeline (registry, read loop, service)
//! - Product catalog builders
//! - Polling helpers for asynchronous assertions

#![allow(dead_code)]

use barcode_reader::{
    BarcodeDecoder, BarcodeToken, CandidateNamespace, JsonCatalog, LineSource, MockPortRegistry,
    PortDiscovery, PortOpener, PortSwitcher, ProductInfo, ReaderContext, ReaderHandle,
    ReaderOptions, ScanResult, ScanService, ScanSession, ScannedItem, DEFAULT_SEPARATOR,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Plain 13-character barcode of the milk product in [`sample_products`].
pub const MILK: &str = "4601234567890";
/// Extended barcode of the cheese product: 1.25 packed on 2024-01-01.
pub const CHEESE_WEIGHED: &str = "4601234567891012500010124ABCDEFG";

pub fn product(code: u64, name: &str) -> ProductInfo {
    ProductInfo {
        code,
        name: name.to_string(),
        packaging: "piece".to_string(),
        weight: None,
        storage_type: "shelf".to_string(),
    }
}

pub fn sample_products() -> Vec<ProductInfo> {
    vec![
        product(4601234567890, "Milk 1L"),
        product(4601234567891, "Cheese"),
        product(4601234567892, "Bread"),
    ]
}

/// A running pipeline over mock devices named `COM1`..`COM8`.
pub struct Pipeline {
    pub registry: MockPortRegistry,
    pub service: ScanService,
    pub session: Arc<ScanSession>,
    pub tokens: mpsc::Receiver<BarcodeToken>,
    pub reader: ReaderHandle,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_products(sample_products())
    }

    pub fn with_products(products: Vec<ProductInfo>) -> Self {
        let registry = MockPortRegistry::new();
        let shared = ReaderContext::new(DEFAULT_SEPARATOR);
        let opener: Arc<dyn PortOpener> = Arc::new(registry.clone());
        let namespace = CandidateNamespace {
            prefixes: vec!["COM".to_string()],
            first_index: 1,
            count: 8,
            extra: Vec::new(),
            include_system_ports: false,
        };

        let (tx, tokens) = mpsc::channel();
        let reader = LineSource::new(
            Arc::clone(&shared),
            tx,
            ReaderOptions {
                idle_wait: Duration::from_millis(20),
                read_chunk: 16,
            },
        )
        .spawn()
        .expect("spawn reader");

        let catalog = JsonCatalog::from_products(products).expect("valid catalog");
        let session = Arc::new(ScanSession::new());
        let service = ScanService::new(
            PortSwitcher::new(Arc::clone(&shared), Arc::clone(&opener)),
            PortDiscovery::new(shared, opener, namespace),
            BarcodeDecoder::default(),
            Arc::new(catalog),
            Arc::clone(&session),
        );

        Self {
            registry,
            service,
            session,
            tokens,
            reader,
        }
    }

    /// Wait for the next framed token.
    pub fn next_token(&self) -> BarcodeToken {
        self.tokens
            .recv_timeout(RECV_TIMEOUT)
            .expect("token within timeout")
    }

    /// Wait for the next token and dispatch it.
    pub fn dispatch_next(&self) -> ScanResult<ScannedItem> {
        let token = self.next_token();
        self.service.dispatch(&token)
    }

    /// True if no token arrives within `wait`.
    pub fn no_token_within(&self, wait: Duration) -> bool {
        self.tokens.recv_timeout(wait).is_err()
    }
}

/// Poll `cond` until it holds or the timeout expires.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + RECV_TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
