//! Column presence index: alias -> ordinal per row shape.
//!
//! Built lazily the first time a projector meets a row shape during one
//! traversal and reused for every later row of that shape. Never shared
//! between traversals or threads.

use std::sync::Arc;

use rowmap_model::{RowRecord, RowShape};
use tracing::trace;

#[derive(Debug)]
struct ResolvedShape {
    shape: RowShape,
    ordinals: Vec<Option<usize>>,
}

/// Resolved ordinals for one projector's aliases, per row shape seen.
#[derive(Debug)]
pub struct ColumnPresenceIndex {
    aliases: Arc<[String]>,
    shapes: Vec<ResolvedShape>,
    current: usize,
}

impl ColumnPresenceIndex {
    pub(crate) fn new(aliases: Arc<[String]>) -> Self {
        Self {
            aliases,
            shapes: Vec::new(),
            current: 0,
        }
    }

    /// Number of distinct row shapes resolved so far.
    pub fn shapes_seen(&self) -> usize {
        self.shapes.len()
    }

    pub(crate) fn is_for(&self, aliases: &Arc<[String]>) -> bool {
        Arc::ptr_eq(&self.aliases, aliases)
    }

    /// Ordinals (aligned with the aliases) for the row's shape.
    pub(crate) fn resolve(&mut self, row: &dyn RowRecord) -> &[Option<usize>] {
        let shape = row.shape();
        let hit = match self.shapes.get(self.current) {
            Some(resolved) if resolved.shape.same_as(shape) => Some(self.current),
            _ => self
                .shapes
                .iter()
                .position(|resolved| resolved.shape.same_as(shape)),
        };
        self.current = match hit {
            Some(position) => position,
            None => {
                let ordinals: Vec<Option<usize>> = self
                    .aliases
                    .iter()
                    .map(|alias| row.get_ordinal(alias))
                    .collect();
                trace!(
                    columns = shape.len(),
                    present = ordinals.iter().filter(|o| o.is_some()).count(),
                    aliases = self.aliases.len(),
                    "resolved column ordinals for row shape"
                );
                self.shapes.push(ResolvedShape {
                    shape: shape.clone(),
                    ordinals,
                });
                self.shapes.len() - 1
            }
        };
        &self.shapes[self.current].ordinals
    }
}
