//! Serial ingestion: the read loop, its shared state and port switching.
//!
//! ```text
//!                      ┌──────────── ReaderContext ────────────┐
//! PortSwitcher ──lock──┤ Mutex<ReaderState { port, framer }>   ├──lock── LineSource::run
//! PortDiscovery ─lock──┤ Condvar (idle wait) + shutdown flag   │            │
//!                      └───────────────────────────────────────┘            ▼
//!                                                                       TokenSink
//! ```
//!
//! The active device and the accumulation buffer live behind one lock, and
//! the blocking read happens while holding it, so a switch can never
//! interleave with a read and always starts the new device on an empty
//! buffer.

pub mod framing;

pub use framing::{BarcodeToken, LineFramer, DEFAULT_SEPARATOR};

use crate::error::{ScanError, ScanResult};
use crate::port::{PortError, PortOpener, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receives completed tokens from the read loop.
pub trait TokenSink: Send {
    /// Deliver one token. Returns `false` if the consumer has gone away.
    fn deliver(&mut self, token: BarcodeToken) -> bool;
}

impl TokenSink for std::sync::mpsc::Sender<BarcodeToken> {
    fn deliver(&mut self, token: BarcodeToken) -> bool {
        self.send(token).is_ok()
    }
}

impl TokenSink for tokio::sync::mpsc::UnboundedSender<BarcodeToken> {
    fn deliver(&mut self, token: BarcodeToken) -> bool {
        self.send(token).is_ok()
    }
}

/// State guarded by the reader lock.
#[derive(Debug)]
pub struct ReaderState {
    port: Option<Box<dyn SerialPortAdapter>>,
    framer: LineFramer,
}

impl ReaderState {
    pub fn active_port(&self) -> Option<&str> {
        self.port.as_deref().map(|p| p.name())
    }

    pub fn pending(&self) -> &[u8] {
        self.framer.pending()
    }

    /// Close the active device and forget any partial frame.
    fn deactivate(&mut self) -> Option<String> {
        self.framer.clear();
        self.port.take().map(|p| p.name().to_string())
    }
}

/// State shared between the read loop and the control path.
#[derive(Debug)]
pub struct ReaderContext {
    state: Mutex<ReaderState>,
    wake: Condvar,
    shutdown: AtomicBool,
}

/// A type alias for the shared, thread-safe reader state.
pub type SharedReader = Arc<ReaderContext>;

impl ReaderContext {
    pub fn new(separator: u8) -> SharedReader {
        Arc::new(Self {
            state: Mutex::new(ReaderState {
                port: None,
                framer: LineFramer::new(separator),
            }),
            wake: Condvar::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Name of the active device, if any.
    ///
    /// May wait for an in-flight read to return.
    pub fn active_port(&self) -> Option<String> {
        self.state.lock().active_port().map(str::to_string)
    }

    /// Bytes of the incomplete frame currently buffered.
    pub fn pending(&self) -> Vec<u8> {
        self.state.lock().pending().to_vec()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Ask the read loop to stop after its current read.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        // Taking the lock orders the notification after any idle-wait check.
        let _state = self.state.lock();
        self.wake.notify_all();
    }
}

/// Tuning for the read loop.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// How long to wait before re-checking when no device is active.
    pub idle_wait: Duration,
    /// Size of the scratch buffer handed to each read.
    pub read_chunk: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_secs(1),
            read_chunk: 256,
        }
    }
}

/// The serial read loop.
pub struct LineSource {
    shared: SharedReader,
    sink: Box<dyn TokenSink>,
    options: ReaderOptions,
}

impl LineSource {
    pub fn new(shared: SharedReader, sink: impl TokenSink + 'static, options: ReaderOptions) -> Self {
        Self {
            shared,
            sink: Box::new(sink),
            options,
        }
    }

    /// Run the loop on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<ReaderHandle> {
        let shared = Arc::clone(&self.shared);
        let thread = std::thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || self.run())?;
        Ok(ReaderHandle {
            shared,
            thread: Some(thread),
        })
    }

    /// Drain the active device until shutdown is requested.
    pub fn run(mut self) {
        info!("Serial reader started");
        let mut chunk = vec![0u8; self.options.read_chunk.max(1)];

        loop {
            let tokens = {
                let mut state = self.shared.state.lock();
                if self.shared.is_shutdown() {
                    break;
                }
                if state.port.is_none() {
                    self.shared.wake.wait_for(&mut state, self.options.idle_wait);
                    continue;
                }
                Self::read_once(&mut state, &mut chunk)
            };

            for token in tokens {
                debug!(token = %token, "Barcode token framed");
                if !self.sink.deliver(token) {
                    warn!("Token consumer is gone; dropping framed token");
                }
            }
        }

        if let Some(port) = self.shared.state.lock().deactivate() {
            info!(port = %port, "Closed serial port on shutdown");
        }
        info!("Serial reader stopped");
    }

    fn read_once(state: &mut ReaderState, chunk: &mut [u8]) -> Vec<BarcodeToken> {
        let ReaderState { port, framer } = &mut *state;
        let Some(device) = port.as_mut() else {
            return Vec::new();
        };

        match device.read_bytes(chunk) {
            Ok(0) => Vec::new(),
            Ok(n) => framer.push(&chunk[..n]),
            Err(PortError::Io(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
                ) =>
            {
                Vec::new()
            }
            Err(e) => {
                let name = state.deactivate().unwrap_or_default();
                warn!(port = %name, error = %e, "Serial read failed; port deactivated");
                Vec::new()
            }
        }
    }
}

/// Owner of the running read loop thread.
#[derive(Debug)]
pub struct ReaderHandle {
    shared: SharedReader,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    pub fn context(&self) -> &SharedReader {
        &self.shared
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop, wait for it to exit and close the active device.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// [`shutdown`](Self::shutdown) run on the blocking pool.
    pub async fn shutdown_async(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.shutdown()).await {
            warn!(error = %e, "Serial reader shutdown task failed");
        }
    }

    fn stop(&mut self) {
        self.shared.request_shutdown();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Serial reader thread panicked");
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Replaces the active device.
#[derive(Clone)]
pub struct PortSwitcher {
    shared: SharedReader,
    opener: Arc<dyn PortOpener>,
}

impl PortSwitcher {
    pub fn new(shared: SharedReader, opener: Arc<dyn PortOpener>) -> Self {
        Self { shared, opener }
    }

    /// Close the current device (if any), flush the buffer and open `name`.
    ///
    /// On failure no device is active afterwards.
    ///
    /// # Errors
    ///
    /// - `ScanError::PortUnavailable` if `name` cannot be opened
    pub fn switch_to(&self, name: &str) -> ScanResult<()> {
        let result = {
            let mut state = self.shared.state.lock();
            if let Some(previous) = state.deactivate() {
                debug!(port = %previous, "Closed previous serial port");
            }

            match self.opener.open(name) {
                Ok(port) => {
                    state.port = Some(port);
                    info!(port = %name, "Switched to serial port");
                    Ok(())
                }
                Err(e) => {
                    warn!(port = %name, error = %e, "Failed to open serial port");
                    Err(ScanError::port_unavailable(name, &e))
                }
            }
        };
        self.shared.wake.notify_all();
        result
    }

    /// Close the active device without opening another one.
    pub fn disconnect(&self) -> Option<String> {
        let closed = self.shared.state.lock().deactivate();
        if let Some(ref name) = closed {
            info!(port = %name, "Disconnected serial port");
        }
        closed
    }

    pub fn active_port(&self) -> Option<String> {
        self.shared.active_port()
    }
}

impl std::fmt::Debug for PortSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSwitcher")
            .field("active_port", &self.shared.active_port())
            .finish()
    }
}
