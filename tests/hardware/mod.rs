//! Hardware-specific tests requiring a real serial scanner.
//!
//! These tests are ignored by default and require actual hardware to run.
//! Set `TEST_PORT` (and optionally `TEST_BAUD`) and scan a barcode when
//! prompted.

#[cfg(feature = "hardware-tests")]
pub mod scanner_tests;
