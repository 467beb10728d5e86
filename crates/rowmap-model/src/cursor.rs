//! Row source traits consumed by the mapper.

use crate::error::CursorError;
use crate::shape::RowShape;
use crate::value::Value;

/// Read access to the row a cursor is currently positioned on.
///
/// Object safe so conditions can inspect the row through `&dyn RowRecord`.
pub trait RowRecord {
    /// Column names of the current result set.
    fn shape(&self) -> &RowShape;

    fn get_ordinal(&self, alias: &str) -> Option<usize> {
        self.shape().ordinal(alias)
    }

    fn is_null(&self, ordinal: usize) -> bool;

    fn read(&self, ordinal: usize) -> Result<Value, CursorError>;
}

/// Forward-only, single-traversal row source.
pub trait RowCursor: RowRecord {
    /// Moves to the next row. Returns `Ok(false)` once the rows are exhausted.
    fn advance(&mut self) -> Result<bool, CursorError>;
}

impl<C: RowCursor + ?Sized> RowRecord for &mut C {
    fn shape(&self) -> &RowShape {
        (**self).shape()
    }

    fn get_ordinal(&self, alias: &str) -> Option<usize> {
        (**self).get_ordinal(alias)
    }

    fn is_null(&self, ordinal: usize) -> bool {
        (**self).is_null(ordinal)
    }

    fn read(&self, ordinal: usize) -> Result<Value, CursorError> {
        (**self).read(ordinal)
    }
}

impl<C: RowCursor + ?Sized> RowCursor for &mut C {
    fn advance(&mut self) -> Result<bool, CursorError> {
        (**self).advance()
    }
}
