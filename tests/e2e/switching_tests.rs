//! Port switching while the read loop is running.

use crate::common::{wait_until, Pipeline, MILK};
use barcode_reader::ScanError;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_switch_discards_partial_frame_of_previous_device() {
    // Arrange
    let pipeline = Pipeline::new();
    let first = pipeline.registry.add_device("COM1");
    let second = pipeline.registry.add_device("COM2");
    pipeline.service.switch_to("COM1").unwrap();

    first.enqueue_read(b"46012");
    assert!(wait_until(|| first.pending_chunks() == 0));

    // Act
    pipeline.service.switch_to("COM2").unwrap();
    second.enqueue_read(format!("{MILK}\r").as_bytes());

    // Assert
    assert_eq!(pipeline.next_token().as_str(), MILK);
    assert!(!first.is_open());
    assert!(second.is_open());
}

#[test]
fn test_never_two_devices_open() {
    let pipeline = Pipeline::new();
    let devices: Vec<_> = (1..=4)
        .map(|i| pipeline.registry.add_device(format!("COM{i}")))
        .collect();

    for round in 0..3 {
        for (i, device) in devices.iter().enumerate() {
            pipeline.service.switch_to(device.name()).unwrap();
            let open: Vec<_> = devices.iter().filter(|d| d.is_open()).collect();
            assert_eq!(open.len(), 1, "round {round}, device {i}");
            assert_eq!(open[0].name(), device.name());
        }
    }
}

#[test]
fn test_failed_switch_is_reported_and_reader_idles() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    let busy = pipeline.registry.add_device("COM2");
    pipeline.service.switch_to("COM1").unwrap();

    // Held by someone else.
    let _other = busy.open().unwrap();
    let err = pipeline.service.switch_to("COM2").unwrap_err();

    assert!(matches!(err, ScanError::PortUnavailable { ref port, .. } if port == "COM2"));
    assert_eq!(pipeline.service.active_port(), None);
    assert!(!scanner.is_open());
    assert!(pipeline.reader.is_running());
}

#[test]
fn test_unplugged_device_deactivates_and_can_be_reopened() {
    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    scanner.enqueue_read(b"4601");
    assert!(wait_until(|| scanner.pending_chunks() == 0));
    scanner.fail_next_read(std::io::ErrorKind::BrokenPipe);
    assert!(wait_until(|| pipeline.service.active_port().is_none()));
    assert!(pipeline.reader.is_running());

    pipeline.service.switch_to("COM1").unwrap();
    scanner.enqueue_read(format!("{MILK}\r").as_bytes());
    assert_eq!(pipeline.next_token().as_str(), MILK);
}

#[test]
fn test_switching_from_another_thread_keeps_order() {
    let pipeline = Pipeline::new();
    let first = pipeline.registry.add_device("COM1");
    let second = pipeline.registry.add_device("COM2");
    pipeline.service.switch_to("COM1").unwrap();

    first.enqueue_read(b"4601234567890\r4601234567891\r");
    assert_eq!(pipeline.next_token().as_str(), "4601234567890");
    assert_eq!(pipeline.next_token().as_str(), "4601234567891");

    let service = pipeline.service.clone();
    std::thread::spawn(move || service.switch_to("COM2"))
        .join()
        .unwrap()
        .unwrap();

    second.enqueue_read(b"4601234567892\r");
    assert_eq!(pipeline.next_token().as_str(), "4601234567892");
    assert!(pipeline.no_token_within(Duration::from_millis(50)));
}
