//! Row shapes: the ordered column names of one result set.

use std::fmt;
use std::sync::Arc;

/// Ordered column names shared by every row of one result set.
///
/// Cloning is cheap; cursors hand out the same `Arc` for every row of a
/// result set so consumers can detect a schema change by pointer first.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RowShape(Arc<[String]>);

impl RowShape {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self, ordinal: usize) -> Option<&str> {
        self.0.get(ordinal).map(String::as_str)
    }

    /// Resolves a column alias to its ordinal.
    ///
    /// An exact match wins; otherwise the first ASCII case-insensitive match
    /// is used.
    pub fn ordinal(&self, alias: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|column| column == alias)
            .or_else(|| {
                self.0
                    .iter()
                    .position(|column| column.eq_ignore_ascii_case(alias))
            })
    }

    /// Same shape, cheap pointer check first.
    pub fn same_as(&self, other: &RowShape) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl fmt::Debug for RowShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
