//! Separator-based framing of the raw byte stream.

use memchr::memchr_iter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Carriage return, the terminator barcode scanners send after each code.
pub const DEFAULT_SEPARATOR: u8 = b'\r';

/// The text of one separator-delimited frame, trimmed of surrounding
/// whitespace and control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarcodeToken(String);

impl BarcodeToken {
    /// Build a token from raw frame bytes (separator already stripped).
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(frame);
        let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c.is_control());
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BarcodeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BarcodeToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for BarcodeToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Accumulates bytes across reads and cuts them into tokens on a separator.
///
/// Bytes after the last separator stay buffered until a later push completes
/// the frame; nothing is ever discarded except by `clear`.
#[derive(Debug, Clone)]
pub struct LineFramer {
    buffer: Vec<u8>,
    separator: u8,
}

impl LineFramer {
    pub fn new(separator: u8) -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            separator,
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// Append `bytes` and return every frame they complete, in wire order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<BarcodeToken> {
        // Everything already buffered is known to be separator-free.
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        let mut tokens = Vec::new();
        let mut start = 0;
        for pos in memchr_iter(self.separator, &self.buffer[scan_from..]) {
            let end = scan_from + pos;
            if let Some(token) = BarcodeToken::from_frame(&self.buffer[start..end]) {
                tokens.push(token);
            }
            start = end + 1;
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        tokens
    }

    /// Bytes of the incomplete frame currently buffered.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}
