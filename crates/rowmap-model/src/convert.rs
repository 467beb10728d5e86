//! Conversions between raw [`Value`]s and typed property values.
//!
//! Conversions are lenient in the way database drivers usually are: text is
//! parsed into numbers and booleans, integers widen to floats, and any value
//! renders to text. Narrowing that would lose information is an error.

use crate::error::ConversionError;
use crate::value::{Value, ValueKind};

/// Builds a typed value from a raw cell value.
pub trait FromValue: Sized {
    /// Kind reported for properties of this type.
    const KIND: ValueKind;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// Renders a typed value back to a raw value.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn incompatible<T>(expected: &'static str, found: &Value) -> Result<T, ConversionError> {
    Err(ConversionError::Incompatible {
        expected,
        found: found.kind(),
    })
}

fn parse_i64(expected: &'static str, text: &str) -> Result<i64, ConversionError> {
    text.trim().parse().map_err(|_| ConversionError::Parse {
        expected,
        text: text.to_string(),
    })
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Bool(v) => Ok(i64::from(v)),
            // i64::MAX rounds up to 2^63 as f64, which is already out of range.
            Value::Float(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
                Ok(v as i64)
            }
            Value::Float(v) => Err(ConversionError::OutOfRange {
                expected: "i64",
                value: v.to_string(),
            }),
            Value::Text(text) => parse_i64("i64", &text),
            Value::Null => Err(ConversionError::UnexpectedNull { expected: "i64" }),
            other => incompatible("i64", &other),
        }
    }
}

macro_rules! narrow_int {
    ($ty:ty, $name:literal) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::Int;

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                let wide = match value {
                    Value::Null => return Err(ConversionError::UnexpectedNull { expected: $name }),
                    Value::Text(text) => parse_i64($name, &text)?,
                    other => i64::from_value(other).map_err(|err| match err {
                        ConversionError::Incompatible { found, .. } => {
                            ConversionError::Incompatible {
                                expected: $name,
                                found,
                            }
                        }
                        other => other,
                    })?,
                };
                <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    expected: $name,
                    value: wide.to_string(),
                })
            }
        }
    };
}

narrow_int!(i32, "i32");
narrow_int!(u32, "u32");
narrow_int!(u64, "u64");

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Text(text) => text.trim().parse().map_err(|_| ConversionError::Parse {
                expected: "f64",
                text,
            }),
            Value::Null => Err(ConversionError::UnexpectedNull { expected: "f64" }),
            other => incompatible("f64", &other),
        }
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(v) => Err(ConversionError::OutOfRange {
                expected: "bool",
                value: v.to_string(),
            }),
            Value::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(true),
                "false" | "f" | "no" | "n" | "0" => Ok(false),
                _ => Err(ConversionError::Parse {
                    expected: "bool",
                    text,
                }),
            },
            Value::Null => Err(ConversionError::UnexpectedNull { expected: "bool" }),
            other => incompatible("bool", &other),
        }
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Null => Err(ConversionError::UnexpectedNull { expected: "String" }),
            Value::Bytes(bytes) => String::from_utf8(bytes).map_err(|err| ConversionError::Parse {
                expected: "String",
                text: format!("<{} non-utf8 bytes>", err.as_bytes().len()),
            }),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(text) => Ok(text.into_bytes()),
            Value::Null => Err(ConversionError::UnexpectedNull { expected: "Vec<u8>" }),
            other => incompatible("Vec<u8>", &other),
        }
    }
}

impl FromValue for Value {
    const KIND: ValueKind = ValueKind::Any;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        i64::try_from(self).map_or(Value::Float(self as f64), Value::Int)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}
