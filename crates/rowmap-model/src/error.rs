use thiserror::Error;

use crate::value::ValueKind;

/// A raw value could not be converted to a property's declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {found} value to {expected}")]
    Incompatible {
        expected: &'static str,
        found: ValueKind,
    },

    #[error("cannot parse '{text}' as {expected}")]
    Parse { expected: &'static str, text: String },

    #[error("value {value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },

    #[error("NULL cannot be assigned to non-optional {expected}")]
    UnexpectedNull { expected: &'static str },
}

/// Failures raised by a row cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("malformed row: {message}")]
    Malformed { message: String },

    #[error("ordinal {ordinal} is out of range for {width} columns")]
    OrdinalOutOfRange { ordinal: usize, width: usize },

    #[error("cursor is not positioned on a row")]
    NotPositioned,
}
