//! Compiles a rule set into a projector: a list of plain closures, one per
//! property, applied to a fresh default value per row.

use std::fmt;
use std::sync::Arc;

use rowmap_model::{RowRecord, ValueKind};
use tracing::{debug, trace};

use crate::error::{BindingCause, ColumnBindingFailure, ConfigurationError};
use crate::fingerprint::Fingerprint;
use crate::presence::ColumnPresenceIndex;
use crate::rule::{Condition, FieldStatement};
use crate::rule_set::MappingRuleSet;

struct CompiledField<T> {
    property: String,
    alias: String,
    kind: ValueKind,
    condition: Option<Condition>,
    statement: FieldStatement<T>,
}

/// Immutable row-to-object function for one fingerprint.
///
/// Safe to share between threads; all per-traversal state lives in the
/// [`ColumnPresenceIndex`] passed to [`CompiledProjector::project`].
pub struct CompiledProjector<T> {
    fingerprint: Fingerprint,
    target_type: String,
    aliases: Arc<[String]>,
    fields: Vec<CompiledField<T>>,
    strict_columns: bool,
}

impl<T> fmt::Debug for CompiledProjector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProjector")
            .field("fingerprint", &self.fingerprint.to_hex())
            .field("target_type", &self.target_type)
            .field("aliases", &self.aliases)
            .field("strict_columns", &self.strict_columns)
            .finish_non_exhaustive()
    }
}

impl<T> CompiledProjector<T> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Active aliases in field application order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn strict_columns(&self) -> bool {
        self.strict_columns
    }

    /// Empty presence index for one traversal.
    pub fn presence_index(&self) -> ColumnPresenceIndex {
        ColumnPresenceIndex::new(Arc::clone(&self.aliases))
    }

    fn failure(&self, field: &CompiledField<T>, cause: BindingCause) -> ColumnBindingFailure {
        ColumnBindingFailure {
            property: field.property.clone(),
            alias: field.alias.clone(),
            target_type: self.target_type.clone(),
            kind: field.kind,
            row_index: None,
            cause,
        }
    }
}

impl<T: Default> CompiledProjector<T> {
    /// Maps the current row of a cursor into a new `T`.
    ///
    /// Absent columns, `NULL` values and declined conditions leave the
    /// property at its default. Any other failure aborts the row.
    pub fn project(
        &self,
        row: &dyn RowRecord,
        index: &mut ColumnPresenceIndex,
    ) -> Result<T, ColumnBindingFailure> {
        if !index.is_for(&self.aliases) {
            *index = self.presence_index();
        }
        let ordinals = index.resolve(row);
        let mut target = T::default();
        for (field, ordinal) in self.fields.iter().zip(ordinals.iter().copied()) {
            let Some(ordinal) = ordinal else {
                let declined = field
                    .condition
                    .as_ref()
                    .is_some_and(|condition| !condition.evaluate(row, &field.alias));
                if self.strict_columns && !declined {
                    return Err(self.failure(field, BindingCause::MissingColumn));
                }
                trace!(property = %field.property, alias = %field.alias, "column absent, skipped");
                continue;
            };
            if row.is_null(ordinal) {
                trace!(property = %field.property, alias = %field.alias, "null value, skipped");
                continue;
            }
            match (field.statement)(&mut target, row, ordinal) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(property = %field.property, "condition declined field");
                }
                Err(cause) => return Err(self.failure(field, cause)),
            }
        }
        Ok(target)
    }

    /// Maps a single row with a throwaway presence index.
    pub fn project_one(&self, row: &dyn RowRecord) -> Result<T, ColumnBindingFailure> {
        let mut index = self.presence_index();
        self.project(row, &mut index)
    }
}

/// Turns rule sets into projectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingCompiler;

impl MappingCompiler {
    /// Compiles `rules` into a projector keyed by `fingerprint`.
    ///
    /// Fields are applied in rule declaration order.
    pub fn compile<T: 'static>(
        rules: &MappingRuleSet<T>,
        fingerprint: Fingerprint,
    ) -> Result<CompiledProjector<T>, ConfigurationError> {
        if fingerprint.type_id() != rules.type_id() {
            return Err(ConfigurationError::FingerprintMismatch {
                type_name: rules.type_name().to_string(),
                fingerprint_type: fingerprint.type_name().to_string(),
            });
        }

        let fields: Vec<CompiledField<T>> = rules
            .rules()
            .iter()
            .map(|rule| CompiledField {
                property: rule.property_name().to_string(),
                alias: rule.active_alias().to_string(),
                kind: rule.property().kind(),
                condition: rule.condition().cloned(),
                statement: rule.assemble(),
            })
            .collect();
        let aliases: Arc<[String]> = fields.iter().map(|f| f.alias.clone()).collect();

        debug!(
            target_type = %rules.type_name(),
            fingerprint = %fingerprint,
            fields = fields.len(),
            "compiled projector"
        );

        Ok(CompiledProjector {
            fingerprint,
            target_type: rules.type_name().to_string(),
            aliases,
            fields,
            strict_columns: rules.strict_columns(),
        })
    }
}
