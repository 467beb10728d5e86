//! Drives a row cursor through a compiled projector.
//!
//! Two modes share the same per-row semantics:
//!
//! - [`Materializer::map`] collects every row before returning. Any failure
//!   fails the whole call and no partial data is returned.
//! - [`Materializer::stream`] yields rows lazily. The iterator is single
//!   pass and stops after the first error; rows already yielded belong to
//!   the caller and stay valid.

use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rowmap_model::RowCursor;
use tracing::debug;

use crate::compiler::CompiledProjector;
use crate::error::{CursorFailure, MappingError};
use crate::presence::ColumnPresenceIndex;

/// Caller-owned cancellation signal, checked before every `advance()`.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Applies one projector to whole cursors.
#[derive(Debug)]
pub struct Materializer<'p, T> {
    projector: &'p CompiledProjector<T>,
    cancellation: Option<CancellationFlag>,
}

impl<'p, T: Default> Materializer<'p, T> {
    pub fn new(projector: &'p CompiledProjector<T>) -> Self {
        Self {
            projector,
            cancellation: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Maps every remaining row, in cursor order.
    pub fn map<C: RowCursor>(&self, cursor: C) -> Result<Vec<T>, MappingError> {
        let rows = self.stream(cursor).collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Lazily maps the remaining rows.
    pub fn stream<C: RowCursor>(&self, cursor: C) -> MappedRows<'p, C, T> {
        MappedRows {
            cursor,
            projector: self.projector,
            index: self.projector.presence_index(),
            cancellation: self.cancellation.clone(),
            rows: 0,
            finished: false,
        }
    }
}

/// Single-pass iterator over mapped rows.
#[derive(Debug)]
pub struct MappedRows<'p, C, T> {
    cursor: C,
    projector: &'p CompiledProjector<T>,
    index: ColumnPresenceIndex,
    cancellation: Option<CancellationFlag>,
    rows: usize,
    finished: bool,
}

impl<C, T> MappedRows<'_, C, T> {
    /// Rows successfully mapped so far.
    pub fn rows_mapped(&self) -> usize {
        self.rows
    }

    /// Distinct row shapes met so far.
    pub fn shapes_seen(&self) -> usize {
        self.index.shapes_seen()
    }

    fn finish(&mut self) {
        self.finished = true;
        debug!(
            target_type = %self.projector.target_type(),
            rows = self.rows,
            shapes = self.index.shapes_seen(),
            "materialized rows"
        );
    }
}

impl<C: RowCursor, T: Default> Iterator for MappedRows<'_, C, T> {
    type Item = Result<T, MappingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            self.finish();
            return Some(Err(MappingError::Cancelled { rows: self.rows }));
        }
        match self.cursor.advance() {
            Ok(true) => {}
            Ok(false) => {
                self.finish();
                return None;
            }
            Err(source) => {
                self.finish();
                return Some(Err(CursorFailure {
                    row_index: Some(self.rows),
                    source,
                }
                .into()));
            }
        }
        match self.projector.project(&self.cursor, &mut self.index) {
            Ok(row) => {
                self.rows += 1;
                Some(Ok(row))
            }
            Err(failure) => {
                let failure = failure.at_row(self.rows);
                self.finish();
                Some(Err(failure.into()))
            }
        }
    }
}

impl<C: RowCursor, T: Default> FusedIterator for MappedRows<'_, C, T> {}

/// Eagerly maps every row of `cursor`.
pub fn map<C, T>(cursor: C, projector: &CompiledProjector<T>) -> Result<Vec<T>, MappingError>
where
    C: RowCursor,
    T: Default,
{
    Materializer::new(projector).map(cursor)
}

/// Lazily maps the rows of `cursor`.
pub fn stream<C, T>(cursor: C, projector: &CompiledProjector<T>) -> MappedRows<'_, C, T>
where
    C: RowCursor,
    T: Default,
{
    Materializer::new(projector).stream(cursor)
}
