//! Barcode decoding.
//!
//! Two layouts are recognised:
//!
//! | Length | Layout                                               |
//! |--------|------------------------------------------------------|
//! | 13     | product code                                         |
//! | 32     | product code (13) + weight (6) + pack date (6) + rest |
//!
//! The weight scale and date encoding of the extended layout are taken from
//! [`DecodeRules`] so they can be adjusted without touching the decoder.

mod decoder;

pub use decoder::{BarcodeDecoder, DecodeRules, ScanEvent, EXTENDED_LEN, PRODUCT_CODE_LEN};
