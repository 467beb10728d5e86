//! Data model shared by the rowmap crates.
//!
//! - [`Value`] / [`ValueKind`]: raw cell values and declared property kinds
//! - [`FromValue`] / [`IntoValue`]: typed conversions used by property accessors
//! - [`RowShape`]: the ordered column names of one result set
//! - [`RowRecord`] / [`RowCursor`]: the forward-only row source consumed by the mapper

#![deny(unsafe_code)]

pub mod convert;
pub mod cursor;
pub mod error;
pub mod shape;
pub mod value;

pub use convert::{FromValue, IntoValue};
pub use cursor::{RowCursor, RowRecord};
pub use error::{ConversionError, CursorError};
pub use shape::RowShape;
pub use value::{Value, ValueKind};
