use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{ScanError, ScanResult};
use crate::reader::BarcodeToken;

/// Length of a plain barcode, which is also the width of the product code.
pub const PRODUCT_CODE_LEN: usize = 13;

/// Length of the extended barcode carrying weight and pack date.
pub const EXTENDED_LEN: usize = 32;

const PRODUCT_CODE: Range<usize> = 0..PRODUCT_CODE_LEN;
const WEIGHT: Range<usize> = 13..19;
const PACK_DATE: Range<usize> = 19..25;

/// One successfully decoded scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub product_code: u64,
    pub weight_grams: Option<f64>,
    pub pack_date: Option<NaiveDate>,
    pub observed_at: DateTime<Utc>,
}

impl ScanEvent {
    pub fn is_extended(&self) -> bool {
        self.weight_grams.is_some() || self.pack_date.is_some()
    }
}

/// How the payload of the extended layout is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeRules {
    /// The six weight digits are divided by this to obtain grams.
    pub weight_scale: f64,
    /// chrono format string applied to the six pack-date characters.
    pub date_format: String,
}

impl Default for DecodeRules {
    fn default() -> Self {
        Self {
            weight_scale: 10_000.0,
            date_format: "%d%m%y".to_string(),
        }
    }
}

impl DecodeRules {
    /// Check that the rules can decode anything at all.
    pub fn validate(&self) -> Result<(), String> {
        if !self.weight_scale.is_finite() || self.weight_scale <= 0.0 {
            return Err(format!(
                "weight_scale must be a positive number, got {}",
                self.weight_scale
            ));
        }
        if self.date_format.is_empty() {
            return Err("date_format must not be empty".to_string());
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(format!("date_format '{}' is not a valid format", self.date_format));
        }
        Ok(())
    }
}

/// Maps tokens to scan events. Performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct BarcodeDecoder {
    rules: DecodeRules,
}

impl BarcodeDecoder {
    pub fn new(rules: DecodeRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &DecodeRules {
        &self.rules
    }

    /// Decode `token`, stamping the result with `observed_at`.
    ///
    /// # Errors
    ///
    /// - `ScanError::UnsupportedBarcode` if the length is neither 13 nor 32
    /// - `ScanError::InvalidBarcode` if a field of a recognised layout is malformed
    pub fn decode(&self, token: &BarcodeToken, observed_at: DateTime<Utc>) -> ScanResult<ScanEvent> {
        let text = token.as_str();
        let length = token.len();
        if length != PRODUCT_CODE_LEN && length != EXTENDED_LEN {
            return Err(ScanError::UnsupportedBarcode { length });
        }
        // Char length matched, so byte slicing below is only safe for ASCII.
        if !text.is_ascii() {
            return Err(ScanError::invalid(text, "contains non-ASCII characters"));
        }

        let product_code = parse_digits(text, &text[PRODUCT_CODE], "product code")?;
        if length == PRODUCT_CODE_LEN {
            return Ok(ScanEvent {
                product_code,
                weight_grams: None,
                pack_date: None,
                observed_at,
            });
        }

        let raw_weight = parse_digits(text, &text[WEIGHT], "weight")?;
        let weight_grams = raw_weight as f64 / self.rules.weight_scale;

        let date_field = &text[PACK_DATE];
        let pack_date = NaiveDate::parse_from_str(date_field, &self.rules.date_format)
            .map_err(|e| ScanError::invalid(text, format!("pack date '{date_field}': {e}")))?;

        Ok(ScanEvent {
            product_code,
            weight_grams: Some(weight_grams),
            pack_date: Some(pack_date),
            observed_at,
        })
    }

    /// Decode `token` stamped with the current time.
    pub fn decode_now(&self, token: &BarcodeToken) -> ScanResult<ScanEvent> {
        self.decode(token, Utc::now())
    }

    /// Decode text typed by hand, trimmed the same way as scanner frames.
    ///
    /// Blank input is reported as an unsupported barcode of length zero.
    pub fn decode_str(&self, raw: &str, observed_at: DateTime<Utc>) -> ScanResult<ScanEvent> {
        let token = BarcodeToken::from_frame(raw.as_bytes())
            .ok_or(ScanError::UnsupportedBarcode { length: 0 })?;
        self.decode(&token, observed_at)
    }
}

fn parse_digits(token: &str, field: &str, what: &str) -> ScanResult<u64> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScanError::invalid(token, format!("{what} '{field}' is not numeric")));
    }
    field
        .parse()
        .map_err(|e| ScanError::invalid(token, format!("{what} '{field}': {e}")))
}
