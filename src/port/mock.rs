//! Mock serial devices for testing.
//!
//! A `MockDevice` is the test-side view of a simulated scanner: tests enqueue
//! byte chunks on it, inject read failures and inspect whether it is held
//! open. `MockPortRegistry` implements `PortOpener` over a set of such
//! devices, and every successful open hands out a `MockSerialPort` that shares
//! the device state.

use super::error::PortError;
use super::traits::{PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of a simulated device.
#[derive(Debug)]
struct MockDeviceState {
    /// Chunks returned by successive reads, one chunk per read at most.
    read_queue: VecDeque<Vec<u8>>,
    /// Error kind returned by the next read, if any.
    fail_next_read: Option<std::io::ErrorKind>,
    /// Whether open attempts should currently fail.
    unavailable: bool,
    /// Number of live `MockSerialPort` handles.
    open_handles: usize,
    /// Number of successful opens since creation.
    open_count: usize,
    /// How long an empty read blocks before reporting a timeout.
    read_timeout: Duration,
}

/// Test-side handle of a simulated serial device.
///
/// # Example
/// ```
/// use barcode_reader::port::{MockDevice, SerialPortAdapter};
///
/// let device = MockDevice::new("MOCK0");
/// device.enqueue_read(b"4601234567890\r");
///
/// let mut port = device.open().unwrap();
/// let mut buffer = [0u8; 32];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"4601234567890\r");
/// assert!(device.is_open());
///
/// drop(port);
/// assert!(!device.is_open());
/// ```
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    /// Create a new simulated device with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockDeviceState {
                read_queue: VecDeque::new(),
                fail_next_read: None,
                unavailable: false,
                open_handles: 0,
                open_count: 0,
                read_timeout: Duration::from_millis(5),
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue one chunk to be returned by a subsequent read.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.push_back(data.to_vec());
    }

    /// Enqueue several chunks, each returned by its own read.
    pub fn enqueue_chunks<I, B>(&self, chunks: I)
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut state = self.state.lock();
        for chunk in chunks {
            state.read_queue.push_back(chunk.as_ref().to_vec());
        }
    }

    /// Make the next read fail with an I/O error of the given kind.
    pub fn fail_next_read(&self, kind: std::io::ErrorKind) {
        self.state.lock().fail_next_read = Some(kind);
    }

    /// Make open attempts fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Set how long an empty read blocks before returning zero bytes.
    pub fn set_read_timeout(&self, timeout: Duration) {
        self.state.lock().read_timeout = timeout;
    }

    /// Whether any handle to this device is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open_handles > 0
    }

    /// Number of successful opens (probes included).
    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    /// Chunks still waiting to be read.
    pub fn pending_chunks(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Open an exclusive handle to the device.
    ///
    /// Fails with `PortError::Busy` while another handle is open, mirroring
    /// how COM ports behave on Windows.
    pub fn open(&self) -> Result<MockSerialPort, PortError> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(PortError::not_found(self.name.clone()));
        }
        if state.open_handles > 0 {
            return Err(PortError::busy(self.name.clone()));
        }
        state.open_handles += 1;
        state.open_count += 1;
        Ok(MockSerialPort {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("pending_chunks", &self.pending_chunks())
            .field("open", &self.is_open())
            .finish()
    }
}

/// An open handle to a `MockDevice`.
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockDeviceState>>,
}

impl SerialPortAdapter for MockSerialPort {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let timeout = {
            let mut state = self.state.lock();

            if let Some(kind) = state.fail_next_read.take() {
                return Err(PortError::Io(std::io::Error::new(
                    kind,
                    "simulated device failure",
                )));
            }

            if let Some(mut chunk) = state.read_queue.pop_front() {
                let n = chunk.len().min(buffer.len());
                buffer[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    state.read_queue.push_front(chunk.split_off(n));
                }
                return Ok(n);
            }

            state.read_timeout
        };

        // Behave like a real port: an empty read blocks until the timeout.
        std::thread::sleep(timeout);
        Ok(0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .finish()
    }
}

/// A `PortOpener` over a fixed set of simulated devices.
#[derive(Debug, Default, Clone)]
pub struct MockPortRegistry {
    devices: Arc<Mutex<Vec<MockDevice>>>,
}

impl MockPortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and return its test-side handle.
    pub fn add_device(&self, name: impl Into<String>) -> MockDevice {
        let device = MockDevice::new(name);
        self.devices.lock().push(device.clone());
        device
    }

    /// Look up a registered device by name.
    pub fn device(&self, name: &str) -> Option<MockDevice> {
        self.devices.lock().iter().find(|d| d.name == name).cloned()
    }

    /// Names of all registered devices, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.devices.lock().iter().map(|d| d.name.clone()).collect()
    }
}

impl PortOpener for MockPortRegistry {
    fn open(&self, name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let device = self.device(name).ok_or_else(|| PortError::not_found(name))?;
        Ok(Box::new(device.open()?))
    }
}
