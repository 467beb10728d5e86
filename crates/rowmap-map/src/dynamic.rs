//! Runtime-described result type.
//!
//! [`DynamicRecord`] is the result type for mappings whose shape is only
//! known at runtime (for example from a rules file). Its properties are
//! supplied by a [`SchemaExtractor`], which coerces assigned values to each
//! property's declared kind.

use std::sync::Arc;

use rowmap_model::{ConversionError, FromValue, Value, ValueKind};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::descriptor::{
    PropertyAccessor, PropertyDescriptor, PropertyMetadataExtractor, ResultTypeDescriptor,
};
use crate::error::ConfigurationError;

/// Ordered property -> value record. Unassigned properties are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    fields: Vec<(String, Value)>,
}

impl DynamicRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Sets `name`, keeping its original position when already present.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DynamicRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One property of a runtime schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProperty {
    pub name: String,
    pub kind: ValueKind,
    pub alias: Option<String>,
    pub read_only: bool,
}

impl SchemaProperty {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            alias: None,
            read_only: false,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Describes [`DynamicRecord`] from a list of runtime properties.
#[derive(Debug, Clone)]
pub struct SchemaExtractor {
    type_name: String,
    properties: Vec<SchemaProperty>,
}

impl SchemaExtractor {
    pub fn new(type_name: impl Into<String>, properties: Vec<SchemaProperty>) -> Self {
        Self {
            type_name: type_name.into(),
            properties,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn properties(&self) -> &[SchemaProperty] {
        &self.properties
    }
}

impl PropertyMetadataExtractor<DynamicRecord> for SchemaExtractor {
    fn describe(&self) -> Result<ResultTypeDescriptor<DynamicRecord>, ConfigurationError> {
        if self.type_name.trim().is_empty() {
            return Err(ConfigurationError::Extractor {
                type_name: self.type_name.clone(),
                message: "target type name is empty".to_string(),
            });
        }
        let properties = self
            .properties
            .iter()
            .map(|property| {
                let mut descriptor =
                    PropertyDescriptor::new(&property.name, property.kind, accessor(property));
                if let Some(alias) = &property.alias {
                    descriptor = descriptor.with_alias(alias);
                }
                if property.read_only {
                    descriptor = descriptor.read_only();
                }
                descriptor
            })
            .collect();
        ResultTypeDescriptor::new(&self.type_name, properties)
    }
}

fn accessor(property: &SchemaProperty) -> PropertyAccessor<DynamicRecord> {
    let name: Arc<str> = Arc::from(property.name.as_str());
    let read = Arc::clone(&name);
    let kind = property.kind;
    PropertyAccessor::new(
        move |record: &DynamicRecord| record.get(&read).cloned().unwrap_or_default(),
        move |record: &mut DynamicRecord, value: Value| {
            record.set(&name, coerce(kind, value)?);
            Ok(())
        },
    )
}

/// Converts `value` to the representation of `kind`. `NULL` stays `NULL`.
pub fn coerce(kind: ValueKind, value: Value) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    Ok(match kind {
        ValueKind::Bool => Value::Bool(bool::from_value(value)?),
        ValueKind::Int => Value::Int(i64::from_value(value)?),
        ValueKind::Float => Value::Float(f64::from_value(value)?),
        ValueKind::Text => Value::Text(String::from_value(value)?),
        ValueKind::Bytes => Value::Bytes(Vec::<u8>::from_value(value)?),
        ValueKind::Any => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SchemaExtractor {
        SchemaExtractor::new(
            "Order",
            vec![
                SchemaProperty::new("Id", ValueKind::Int),
                SchemaProperty::new("Customer", ValueKind::Text).with_alias("customer_name"),
                SchemaProperty {
                    read_only: true,
                    ..SchemaProperty::new("Total", ValueKind::Float)
                },
            ],
        )
    }

    #[test]
    fn schema_describes_settable_properties_with_aliases() {
        let descriptor = extractor().describe().unwrap();
        assert_eq!(descriptor.type_name(), "Order");
        let eligible: Vec<(&str, &str)> = descriptor
            .enumerate()
            .map(|(property, alias)| (property.name(), alias))
            .collect();
        assert_eq!(eligible, vec![("Id", "Id"), ("Customer", "customer_name")]);
    }

    #[test]
    fn setter_coerces_to_declared_kind() {
        let descriptor = extractor().describe().unwrap();
        let id = &descriptor.properties()[0];
        let mut record = DynamicRecord::default();
        id.accessor().set(&mut record, Value::text("42")).unwrap();
        assert_eq!(record.get("Id"), Some(&Value::Int(42)));
        assert!(id.accessor().set(&mut record, Value::text("x")).is_err());
        id.accessor().set(&mut record, Value::Null).unwrap();
        assert_eq!(record.get("Id"), Some(&Value::Null));
    }

    #[test]
    fn record_serializes_as_ordered_object() {
        let mut record = DynamicRecord::default();
        record.set("b", Value::Int(1));
        record.set("a", Value::text("x"));
        record.set("b", Value::Int(2));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"b":2,"a":"x"}"#);
    }

    #[test]
    fn blank_type_name_is_an_extractor_error() {
        let err = SchemaExtractor::new(" ", Vec::new()).describe().unwrap_err();
        assert!(matches!(err, ConfigurationError::Extractor { .. }));
    }
}
