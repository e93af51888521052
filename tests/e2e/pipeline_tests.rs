//! Scanner bytes to session entries.

use crate::common::{Pipeline, CHEESE_WEIGHED, MILK};
use barcode_reader::ScanError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_plain_then_extended_then_unsupported() {
    // Arrange
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM3");
    pipeline.service.switch_to("COM3").unwrap();

    // Act
    scanner.enqueue_read(format!("{MILK}\r").as_bytes());
    let plain = pipeline.dispatch_next().unwrap();

    scanner.enqueue_read(format!("{CHEESE_WEIGHED}\r").as_bytes());
    let extended = pipeline.dispatch_next().unwrap();

    scanner.enqueue_read(b"4601234567\r");
    let rejected = pipeline.dispatch_next();

    // Assert
    assert_eq!(plain.event.product_code, 4601234567890);
    assert_eq!(plain.event.weight_grams, None);
    assert_eq!(plain.product.name, "Milk 1L");

    assert_eq!(extended.event.product_code, 4601234567891);
    assert_eq!(extended.event.weight_grams, Some(1.25));
    assert_eq!(extended.event.pack_date, NaiveDate::from_ymd_opt(2024, 1, 1));

    assert_eq!(rejected, Err(ScanError::UnsupportedBarcode { length: 10 }));

    let snapshot = pipeline.service.snapshot();
    assert_eq!(snapshot.events, vec![plain.event, extended.event]);
}

#[test]
fn test_bad_tokens_do_not_disturb_neighbours() {
    // Arrange
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM2");
    pipeline.service.switch_to("COM2").unwrap();

    // Act
    scanner.enqueue_read(format!("{MILK}\r12345\r46012345678X0\r{CHEESE_WEIGHED}\r").as_bytes());
    let results: Vec<_> = (0..4).map(|_| pipeline.dispatch_next()).collect();

    // Assert
    assert_eq!(results[0].as_ref().unwrap().event.product_code, 4601234567890);
    assert_eq!(results[1], Err(ScanError::UnsupportedBarcode { length: 5 }));
    assert!(matches!(results[2], Err(ScanError::InvalidBarcode { ref token, .. }) if token == "46012345678X0"));
    assert_eq!(results[3].as_ref().unwrap().event.product_code, 4601234567891);
    assert_eq!(results[3].as_ref().unwrap().event.weight_grams, Some(1.25));
    assert_eq!(pipeline.session.len(), 2);
}

#[test]
fn test_frames_split_across_reads_are_reassembled_in_order() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    let wire = format!("{MILK}\r{CHEESE_WEIGHED}\r4601234567892\r");
    scanner.enqueue_chunks(wire.as_bytes().chunks(5));

    let codes: Vec<u64> = (0..3)
        .map(|_| pipeline.dispatch_next().unwrap().event.product_code)
        .collect();
    assert_eq!(codes, vec![4601234567890, 4601234567891, 4601234567892]);
}

#[test]
fn test_unknown_product_is_reported_and_not_recorded() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    scanner.enqueue_read(b"9999999999999\r");

    assert_eq!(
        pipeline.dispatch_next(),
        Err(ScanError::UnknownProductCode(9999999999999))
    );
    assert!(pipeline.session.is_empty());
}

#[test]
fn test_blank_frames_produce_no_tokens() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    scanner.enqueue_read(b"\r\r \r\n\r");
    assert!(pipeline.no_token_within(Duration::from_millis(100)));

    scanner.enqueue_read(format!(" {MILK} \r").as_bytes());
    assert_eq!(pipeline.next_token().as_str(), MILK);
}

#[test]
fn test_repeated_scans_are_counted() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    scanner.enqueue_read(format!("{MILK}\r{MILK}\r{CHEESE_WEIGHED}\r{MILK}\r").as_bytes());
    for _ in 0..4 {
        pipeline.dispatch_next().unwrap();
    }

    let snapshot = pipeline.service.snapshot();
    assert_eq!(snapshot.frequencies.get(&4601234567890), Some(&3));
    assert_eq!(snapshot.frequencies.get(&4601234567891), Some(&1));

    pipeline.service.clear();
    let cleared = pipeline.service.snapshot();
    assert!(cleared.events.is_empty());
    assert!(cleared.frequencies.is_empty());
}

#[test]
fn test_shutdown_releases_device() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();
    assert!(scanner.is_open());

    let Pipeline { reader, .. } = pipeline;
    reader.shutdown();

    assert!(!scanner.is_open());
}
