//! In-memory log of the scans taken during the current work shift.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::barcode::ScanEvent;

/// Capacity of the change-notification channel; slow subscribers lag, they
/// never block `append`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications published by a [`ScanSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Appended(ScanEvent),
    Cleared,
    Restored { count: usize },
}

/// A consistent point-in-time copy of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Events in scan order.
    pub events: Vec<ScanEvent>,
    /// Number of scans per product code.
    pub frequencies: BTreeMap<u64, usize>,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    events: Vec<ScanEvent>,
    frequencies: BTreeMap<u64, usize>,
}

/// Ordered, append-only (until cleared) log of scan events.
#[derive(Debug)]
pub struct ScanSession {
    inner: Mutex<SessionInner>,
    notify: broadcast::Sender<SessionEvent>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(SessionInner::default()),
            notify,
        }
    }

    /// Receive every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.notify.subscribe()
    }

    pub fn append(&self, event: ScanEvent) {
        let mut inner = self.inner.lock();
        *inner.frequencies.entry(event.product_code).or_insert(0) += 1;
        inner.events.push(event.clone());
        // Sent under the lock so subscribers observe changes in log order.
        // No subscribers is not an error.
        let _ = self.notify.send(SessionEvent::Appended(event));
    }

    /// Drop every event. Irreversible.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.frequencies.clear();
        let _ = self.notify.send(SessionEvent::Cleared);
    }

    /// Replace the contents with a previously recorded sequence.
    pub fn restore(&self, events: Vec<ScanEvent>) {
        let count = events.len();
        let mut inner = self.inner.lock();
        inner.frequencies.clear();
        for event in &events {
            *inner.frequencies.entry(event.product_code).or_insert(0) += 1;
        }
        inner.events = events;
        let _ = self.notify.send(SessionEvent::Restored { count });
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            events: inner.events.clone(),
            frequencies: inner.frequencies.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `product_code` was scanned this session.
    pub fn frequency(&self, product_code: u64) -> usize {
        self.inner
            .lock()
            .frequencies
            .get(&product_code)
            .copied()
            .unwrap_or(0)
    }
}
