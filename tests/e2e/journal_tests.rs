//! Journaling scans and restoring them into a fresh session.

use crate::common::{Pipeline, CHEESE_WEIGHED, MILK};
use barcode_reader::{ScanJournal, ScanSession};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_restart_restores_open_shift() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("journal/scans.db").display());
    let journal = ScanJournal::new(&url).await.unwrap();
    let shift = journal.open_shift(Some("COM1")).await.unwrap();

    let pipeline = Pipeline::new();
    let scanner = pipeline.registry.add_device("COM1");
    pipeline.service.switch_to("COM1").unwrap();

    // Act
    scanner.enqueue_read(format!("{MILK}\r{CHEESE_WEIGHED}\r").as_bytes());
    for _ in 0..2 {
        let item = pipeline.dispatch_next().unwrap();
        journal.record(&shift.id, &item.event).await.unwrap();
    }
    let before = pipeline.service.snapshot();
    drop(pipeline);

    let reopened = ScanJournal::new(&url).await.unwrap();
    let open = reopened.latest_open_shift().await.unwrap().expect("shift still open");
    let restored = ScanSession::new();
    restored.restore(reopened.load(&open.id).await.unwrap());

    // Assert
    assert_eq!(open.id, shift.id);
    assert_eq!(restored.snapshot(), before);
}

#[tokio::test]
async fn test_closed_shift_is_not_restored() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("scans.db").display());
    let journal = ScanJournal::new(&url).await.unwrap();

    let shift = journal.open_shift(None).await.unwrap();
    journal.close_shift(&shift.id).await.unwrap();

    assert!(journal.latest_open_shift().await.unwrap().is_none());
}
