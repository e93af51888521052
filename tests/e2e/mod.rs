//! End-to-end tests for the scanning pipeline.
//!
//! Bytes enter through mock devices and leave as session entries, exercising
//! the read loop, port switching, discovery, decoding and dispatch together.

pub mod discovery_tests;
pub mod pipeline_tests;
pub mod switching_tests;

#[cfg(feature = "journal")]
pub mod journal_tests;
