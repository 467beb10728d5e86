//! Per-property mapping rules.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use rowmap_model::{RowRecord, Value, ValueKind};

use crate::descriptor::PropertyDescriptor;
use crate::error::{BindingCause, BoxError};

type ConditionFn = dyn Fn(&dyn RowRecord, &str) -> bool + Send + Sync;
type ProcessorFn = dyn Fn(ValueKind, Value, Value) -> Result<Value, BoxError> + Send + Sync;

/// Predicate deciding whether a field is assigned at all.
///
/// The `key` together with the closure's type identifies the predicate in
/// projector fingerprints. Two values of one closure type that differ only in
/// captured state must use different keys.
#[derive(Clone)]
pub struct Condition {
    key: String,
    type_id: TypeId,
    predicate: Arc<ConditionFn>,
}

impl Condition {
    pub fn new<F>(key: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn RowRecord, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            type_id: TypeId::of::<F>(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn evaluate(&self, row: &dyn RowRecord, column: &str) -> bool {
        (self.predicate)(row, column)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.key).finish()
    }
}

/// Transformation between the raw column read and the property assignment.
///
/// Called with the property's declared kind, the raw value, and the
/// property's prior value. Identified by `key` and closure type in
/// fingerprints, like [`Condition`].
#[derive(Clone)]
pub struct ValueProcessor {
    key: String,
    type_id: TypeId,
    process: Arc<ProcessorFn>,
}

impl ValueProcessor {
    pub fn new<F>(key: impl Into<String>, process: F) -> Self
    where
        F: Fn(ValueKind, Value, Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            type_id: TypeId::of::<F>(),
            process: Arc::new(process),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn apply(&self, kind: ValueKind, raw: Value, prior: Value) -> Result<Value, BoxError> {
        (self.process)(kind, raw, prior)
    }
}

impl fmt::Debug for ValueProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueProcessor").field(&self.key).finish()
    }
}

/// Assembled mapping statement for one property. Returns `Ok(false)` when the
/// condition declined the field.
pub(crate) type FieldStatement<T> =
    Box<dyn Fn(&mut T, &dyn RowRecord, usize) -> Result<bool, BindingCause> + Send + Sync>;

/// How one property is filled from a row.
pub struct PropertyMappingRule<T> {
    property: PropertyDescriptor<T>,
    alias: String,
    condition: Option<Condition>,
    processors: Vec<ValueProcessor>,
}

impl<T> fmt::Debug for PropertyMappingRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMappingRule")
            .field("property", &self.property.name())
            .field("alias", &self.alias)
            .field("condition", &self.condition)
            .field("processors", &self.processors)
            .finish()
    }
}

impl<T> PropertyMappingRule<T> {
    pub(crate) fn new(property: PropertyDescriptor<T>) -> Self {
        let alias = property.default_alias().to_string();
        Self {
            property,
            alias,
            condition: None,
            processors: Vec::new(),
        }
    }

    pub fn property(&self) -> &PropertyDescriptor<T> {
        &self.property
    }

    pub fn property_name(&self) -> &str {
        self.property.name()
    }

    pub fn active_alias(&self) -> &str {
        &self.alias
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn processors(&self) -> &[ValueProcessor] {
        &self.processors
    }

    /// Replaces the active alias.
    pub fn set_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias = alias.into();
        self
    }

    /// Replaces the condition.
    pub fn set_condition(&mut self, condition: Condition) -> &mut Self {
        self.condition = Some(condition);
        self
    }

    /// Shorthand for [`Self::set_condition`] with a new [`Condition`].
    pub fn map_if<F>(&mut self, key: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&dyn RowRecord, &str) -> bool + Send + Sync + 'static,
    {
        self.set_condition(Condition::new(key, predicate))
    }

    /// Appends a processor; processors run in the order they were attached.
    pub fn set_value_processor(&mut self, processor: ValueProcessor) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Shorthand for [`Self::set_value_processor`] with a new [`ValueProcessor`].
    pub fn process_value<F>(&mut self, key: impl Into<String>, process: F) -> &mut Self
    where
        F: Fn(ValueKind, Value, Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.set_value_processor(ValueProcessor::new(key, process))
    }
}

impl<T: 'static> PropertyMappingRule<T> {
    /// Binds this rule to its property accessor: condition, read, processors,
    /// assignment. Presence and null checks stay with the compiler.
    pub(crate) fn assemble(&self) -> FieldStatement<T> {
        let alias = self.alias.clone();
        let kind = self.property.kind();
        let accessor = self.property.accessor().clone();
        let condition = self.condition.clone();
        let processors = self.processors.clone();

        Box::new(move |target: &mut T, row: &dyn RowRecord, ordinal: usize| {
            if let Some(condition) = &condition
                && !condition.evaluate(row, &alias)
            {
                return Ok(false);
            }
            let mut value = row.read(ordinal).map_err(BindingCause::Read)?;
            if !processors.is_empty() {
                let prior = accessor.get(target);
                for processor in &processors {
                    value = processor
                        .apply(kind, value, prior.clone())
                        .map_err(|source| BindingCause::Processor {
                            key: processor.key().to_string(),
                            source,
                        })?;
                }
            }
            accessor.set(target, value)?;
            Ok(true)
        })
    }
}
