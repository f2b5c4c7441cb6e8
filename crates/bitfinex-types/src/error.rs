//! Error types for decoding Bitfinex payloads

use thiserror::Error;

/// Failure to turn a positional array into a typed record.
///
/// Always recoverable: the caller decides whether to skip the item or abort
/// the batch it belongs to. `raw` holds the offending row as JSON text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Row shorter than the schema's minimum length
    #[error("{record}: expected at least {expected} fields, got {actual} (raw: {raw})")]
    TooShort {
        record: &'static str,
        expected: usize,
        actual: usize,
        raw: String,
    },

    /// Element present but of the wrong JSON type
    #[error("{record}.{field} at index {index}: expected {expected}, found {found} (raw: {raw})")]
    TypeMismatch {
        record: &'static str,
        field: &'static str,
        index: usize,
        expected: &'static str,
        found: String,
        raw: String,
    },

    /// Payload did not have the array shape the schema needs
    #[error("{record}: expected an array payload, found {found}")]
    NotAnArray { record: &'static str, found: String },
}

impl DecodeError {
    /// Name of the record that failed to decode
    pub fn record(&self) -> &'static str {
        match self {
            Self::TooShort { record, .. }
            | Self::TypeMismatch { record, .. }
            | Self::NotAnArray { record, .. } => record,
        }
    }

    /// Raw input that caused the failure
    pub fn raw(&self) -> &str {
        match self {
            Self::TooShort { raw, .. } | Self::TypeMismatch { raw, .. } => raw,
            Self::NotAnArray { found, .. } => found,
        }
    }
}

/// A frame whose shape matches neither the event nor the data convention.
///
/// Non-fatal: the frame is dropped and the receive loop keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Text was not valid JSON
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String, raw: String },

    /// Object without an `event` field, or with an unparseable one
    #[error("malformed event frame: {message} (raw: {raw})")]
    MalformedEvent { message: String, raw: String },

    /// Array frame that is not `[chanId, payload]` / `[chanId, tag, payload]`
    #[error("malformed data frame: {message} (raw: {raw})")]
    MalformedData { message: String, raw: String },

    /// Neither an object nor an array
    #[error("unexpected frame shape: {raw}")]
    UnexpectedShape { raw: String },
}

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_mentions_both_lengths() {
        let err = DecodeError::TooShort {
            record: "trade",
            expected: 4,
            actual: 2,
            raw: "[1,2]".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
        assert_eq!(err.record(), "trade");
        assert_eq!(err.raw(), "[1,2]");
    }
}
