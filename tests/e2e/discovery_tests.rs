//! Port discovery against the mock namespace `COM1`..`COM8`.

use crate::common::Pipeline;
use barcode_reader::PortEntry;
use pretty_assertions::assert_eq;

#[test]
fn test_listing_follows_namespace_order() {
    let pipeline = Pipeline::new();
    for name in ["COM7", "COM2", "COM4"] {
        pipeline.registry.add_device(name);
    }

    let listing = pipeline.service.list_ports();

    assert_eq!(listing.names(), vec!["COM2", "COM4", "COM7"]);
    assert!(listing.iter().all(|e| !e.active));
}

#[test]
fn test_active_port_reported_as_active() {
    let pipeline = Pipeline::new();
    pipeline.registry.add_device("COM1");
    let scanner = pipeline.registry.add_device("COM5");
    pipeline.service.switch_to("COM5").unwrap();

    let listing = pipeline.service.list_ports();

    assert_eq!(
        listing.entries(),
        &[
            PortEntry {
                name: "COM1".to_string(),
                active: false
            },
            PortEntry {
                name: "COM5".to_string(),
                active: true
            },
        ]
    );
    assert!(scanner.is_open());
}

#[test]
fn test_busy_and_unavailable_ports_are_omitted() {
    let pipeline = Pipeline::new();
    pipeline.registry.add_device("COM1");
    let busy = pipeline.registry.add_device("COM2");
    let gone = pipeline.registry.add_device("COM3");
    let _held = busy.open().unwrap();
    gone.set_unavailable(true);

    let listing = pipeline.service.list_ports();

    assert_eq!(listing.names(), vec!["COM1"]);
    assert_eq!(listing.get("COM2"), None);
}

#[test]
fn test_listing_has_no_lasting_side_effects() {
    let pipeline = Pipeline::new();
    let device = pipeline.registry.add_device("COM1");

    pipeline.service.list_ports();
    pipeline.service.list_ports();

    assert!(!device.is_open());
    assert_eq!(pipeline.service.active_port(), None);
    assert_eq!(device.open_count(), 2);
}
