//! In-memory row cursor.
//!
//! Holds one or more result sets, each with its own [`RowShape`], and walks
//! them back to back. Useful for tests and for callers that already hold
//! rows in memory.

use rowmap_model::{CursorError, RowCursor, RowRecord, RowShape, Value};

#[derive(Debug, Clone)]
struct ResultSet {
    shape: RowShape,
    rows: Vec<Vec<Value>>,
}

/// Forward-only cursor over rows held in memory.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    sets: Vec<ResultSet>,
    set: usize,
    row: Option<usize>,
    delivered: usize,
    fail_at: Option<usize>,
}

impl MemoryCursor {
    /// Single result set.
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_result_sets(vec![(RowShape::new(columns), rows)])
    }

    /// Several result sets read one after another; each keeps one shared
    /// [`RowShape`] for all of its rows.
    pub fn with_result_sets(sets: Vec<(RowShape, Vec<Vec<Value>>)>) -> Self {
        Self {
            sets: sets
                .into_iter()
                .map(|(shape, rows)| ResultSet { shape, rows })
                .collect(),
            set: 0,
            row: None,
            delivered: 0,
            fail_at: None,
        }
    }

    /// Makes `advance` fail once `rows` rows have been delivered.
    #[must_use]
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_at = Some(rows);
        self
    }

    fn current(&self) -> Result<&[Value], CursorError> {
        let row = self.row.ok_or(CursorError::NotPositioned)?;
        self.sets
            .get(self.set)
            .and_then(|set| set.rows.get(row))
            .map(Vec::as_slice)
            .ok_or(CursorError::NotPositioned)
    }
}

impl RowRecord for MemoryCursor {
    fn shape(&self) -> &RowShape {
        let index = self.set.min(self.sets.len().saturating_sub(1));
        match self.sets.get(index) {
            Some(set) => &set.shape,
            None => empty_shape(),
        }
    }

    fn is_null(&self, ordinal: usize) -> bool {
        self.current()
            .ok()
            .and_then(|row| row.get(ordinal))
            .is_some_and(Value::is_null)
    }

    fn read(&self, ordinal: usize) -> Result<Value, CursorError> {
        let row = self.current()?;
        row.get(ordinal)
            .cloned()
            .ok_or(CursorError::OrdinalOutOfRange {
                ordinal,
                width: row.len(),
            })
    }
}

impl RowCursor for MemoryCursor {
    fn advance(&mut self) -> Result<bool, CursorError> {
        if self.fail_at == Some(self.delivered) {
            self.row = None;
            return Err(CursorError::Malformed {
                message: format!("injected failure after {} rows", self.delivered),
            });
        }
        let mut next = self.row.map_or(0, |row| row + 1);
        while let Some(set) = self.sets.get(self.set) {
            if next < set.rows.len() {
                self.row = Some(next);
                self.delivered += 1;
                return Ok(true);
            }
            self.set += 1;
            next = 0;
        }
        self.row = None;
        Ok(false)
    }
}

fn empty_shape() -> &'static RowShape {
    static EMPTY: std::sync::OnceLock<RowShape> = std::sync::OnceLock::new();
    EMPTY.get_or_init(|| RowShape::new(Vec::<String>::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_result_sets_in_order() {
        let mut cursor = MemoryCursor::with_result_sets(vec![
            (RowShape::new(["A"]), vec![vec![Value::Int(1)]]),
            (RowShape::new(["B"]), Vec::new()),
            (
                RowShape::new(["B", "C"]),
                vec![vec![Value::Int(2), Value::Null]],
            ),
        ]);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.shape().columns(), ["A"]);
        assert_eq!(cursor.read(0).unwrap(), Value::Int(1));
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.shape().columns(), ["B", "C"]);
        assert!(cursor.is_null(1));
        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn rows_share_one_shape_allocation() {
        let mut cursor = MemoryCursor::new(["A"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        cursor.advance().unwrap();
        let first = cursor.shape().clone();
        cursor.advance().unwrap();
        assert!(first.same_as(cursor.shape()));
    }

    #[test]
    fn injected_failure_fires_after_delivered_rows() {
        let mut cursor =
            MemoryCursor::new(["A"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]).failing_after(1);
        assert!(cursor.advance().unwrap());
        assert!(matches!(cursor.advance(), Err(CursorError::Malformed { .. })));
    }

    #[test]
    fn read_before_advance_is_not_positioned() {
        let cursor = MemoryCursor::new(["A"], vec![vec![Value::Int(1)]]);
        assert!(matches!(cursor.read(0), Err(CursorError::NotPositioned)));
    }
}
