//! Positional-array codec
//!
//! Bitfinex v2 payloads are schema-less JSON arrays: a record's fields are
//! addressed by index, values are loosely typed and may be `null`. This module
//! turns those arrays into typed records.
//!
//! Rules applied by every decode:
//!
//! - a minimum-length check gates the decode; extra trailing elements are
//!   ignored so newer server payloads still decode
//! - `null` and indices past the end of the row yield the zero value of the
//!   target type (`Decimal::ZERO`, `0`, `""`, `false`)
//! - a present value of the wrong JSON type fails with
//!   [`DecodeError::TypeMismatch`] naming the field
//!
//! # Example
//!
//! ```
//! use bitfinex_types::{Decode, Trade, Side};
//! use serde_json::json;
//!
//! let raw = json!([401597395, 1574694478808_i64, -0.005, 7245.3]);
//! let trade = Trade::from_value(&raw).unwrap();
//! assert_eq!(trade.side, Side::Sell);
//! ```

use crate::error::{DecodeError, DecodeResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Index-addressed view over one positional array
///
/// Construction performs the minimum-length check, so getters only ever deal
/// with optional trailing fields and type mismatches.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    record: &'static str,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Wrap `values`, failing if it holds fewer than `min_len` elements
    pub fn new(record: &'static str, min_len: usize, values: &'a [Value]) -> DecodeResult<Self> {
        if values.len() < min_len {
            return Err(DecodeError::TooShort {
                record,
                expected: min_len,
                actual: values.len(),
                raw: render(values),
            });
        }
        Ok(Self { record, values })
    }

    /// Record name used in error messages
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Number of elements in the underlying array
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the underlying array is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Element at `index`, treating `null` and out-of-range the same
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        match self.values.get(index) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    /// Element at `index` as-is (`Value::Null` when absent)
    pub fn raw_value(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Decimal field; numbers and numeric strings are accepted
    pub fn decimal(&self, index: usize, field: &'static str) -> DecodeResult<Decimal> {
        match self.get(index) {
            None => Ok(Decimal::ZERO),
            Some(Value::Number(n)) => {
                number_to_decimal(n).ok_or_else(|| self.mismatch(index, field, "decimal", n))
            }
            Some(Value::String(s)) => {
                parse_decimal(s).ok_or_else(|| self.mismatch(index, field, "decimal", s))
            }
            Some(other) => Err(self.mismatch(index, field, "decimal", other)),
        }
    }

    /// Integer field (ids, timestamps, counts)
    pub fn int(&self, index: usize, field: &'static str) -> DecodeResult<i64> {
        match self.get(index) {
            None => Ok(0),
            Some(Value::Number(n)) => {
                number_to_i64(n).ok_or_else(|| self.mismatch(index, field, "integer", n))
            }
            Some(other) => Err(self.mismatch(index, field, "integer", other)),
        }
    }

    /// String field
    pub fn string(&self, index: usize, field: &'static str) -> DecodeResult<String> {
        match self.get(index) {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(self.mismatch(index, field, "string", other)),
        }
    }

    /// Boolean field; Bitfinex encodes most flags as `0`/`1`
    pub fn flag(&self, index: usize, field: &'static str) -> DecodeResult<bool> {
        match self.get(index) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Number(n)) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            Some(other) => Err(self.mismatch(index, field, "flag", other)),
        }
    }

    /// List of strings (e.g. post tags)
    pub fn strings(&self, index: usize, field: &'static str) -> DecodeResult<Vec<String>> {
        match self.get(index) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.mismatch(index, field, "string list", other)),
                })
                .collect(),
            Some(other) => Err(self.mismatch(index, field, "string list", other)),
        }
    }

    /// Nested positional array at `index`, `None` if absent
    pub fn nested(&self, index: usize, field: &'static str) -> DecodeResult<Option<&'a [Value]>> {
        match self.get(index) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(other) => Err(self.mismatch(index, field, "array", other)),
        }
    }

    fn mismatch(
        &self,
        index: usize,
        field: &'static str,
        expected: &'static str,
        found: impl ToString,
    ) -> DecodeError {
        DecodeError::TypeMismatch {
            record: self.record,
            field,
            index,
            expected,
            found: found.to_string(),
            raw: render(self.values),
        }
    }
}

/// A record decodable from one positional array
pub trait Decode: Sized {
    /// Record name used in error messages
    const NAME: &'static str;
    /// Minimum number of elements the array must contain
    const MIN_LEN: usize;

    /// Decode from a row that already passed the length check
    fn decode(row: &Row<'_>) -> DecodeResult<Self>;

    /// Length-check `values` and decode
    fn from_raw(values: &[Value]) -> DecodeResult<Self> {
        let row = Row::new(Self::NAME, Self::MIN_LEN, values)?;
        Self::decode(&row)
    }

    /// Decode a JSON value that must be an array
    fn from_value(value: &Value) -> DecodeResult<Self> {
        match value {
            Value::Array(values) => Self::from_raw(values),
            other => Err(DecodeError::NotAnArray {
                record: Self::NAME,
                found: other.to_string(),
            }),
        }
    }
}

/// Decode every inner array of a snapshot, keeping server order.
///
/// One result per row: a bad row never hides the rows around it.
pub fn decode_snapshot<T: Decode>(rows: &[Vec<Value>]) -> Vec<DecodeResult<T>> {
    rows.iter().map(|row| T::from_raw(row)).collect()
}

/// Like [`decode_snapshot`] for a list of values (REST responses)
pub fn decode_list<T: Decode>(values: &[Value]) -> Vec<DecodeResult<T>> {
    values.iter().map(T::from_value).collect()
}

/// Convert a JSON number to a decimal without going through binary floats
/// where possible.
pub fn number_to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    parse_decimal(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.contains('e') || s.contains('E') {
        Decimal::from_scientific(s).ok()
    } else {
        Decimal::from_str(s).ok()
    }
}

fn number_to_i64(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if let Some(u) = n.as_u64() {
        return i64::try_from(u).ok();
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Serialize a row for diagnostics
pub(crate) fn render(values: &[Value]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| format!("{:?}", values))
}
