//! Port abstraction layer for serial communication.
//!
//! Provides the traits the reader depends on, the `serialport`-backed
//! implementation and mock devices for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockDevice, MockPortRegistry, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
