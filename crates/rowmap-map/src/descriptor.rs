//! Result type descriptors and the property metadata extractor seam.
//!
//! A [`ResultTypeDescriptor`] lists the properties of a result type in
//! declaration order. Each [`PropertyDescriptor`] carries a typed accessor
//! pair bound when the descriptor is built, so the mapping hot path never
//! looks properties up by name.
//!
//! # Example
//!
//! ```
//! use rowmap_map::{MapTarget, PropertyDescriptor};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl MapTarget for Person {
//!     fn properties() -> Vec<PropertyDescriptor<Self>> {
//!         vec![
//!             PropertyDescriptor::field("Name", |p: &Person| p.name.clone(), |p, v| p.name = v),
//!             PropertyDescriptor::field("Age", |p: &Person| p.age, |p, v| p.age = v),
//!         ]
//!     }
//! }
//! ```

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rowmap_model::{ConversionError, FromValue, IntoValue, Value, ValueKind};

use crate::error::ConfigurationError;

type Getter<T> = dyn Fn(&T) -> Value + Send + Sync;
type Setter<T> = dyn Fn(&mut T, Value) -> Result<(), ConversionError> + Send + Sync;

/// Getter/setter pair for one property of `T`.
pub struct PropertyAccessor<T> {
    get: Arc<Getter<T>>,
    set: Arc<Setter<T>>,
}

impl<T> Clone for PropertyAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T> PropertyAccessor<T> {
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<(), ConversionError> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Accessor over a typed field; conversion happens in the setter.
    pub fn typed<V, G, S>(get: G, set: S) -> Self
    where
        V: FromValue + IntoValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::new(
            move |target| get(target).into_value(),
            move |target, value| {
                set(target, V::from_value(value)?);
                Ok(())
            },
        )
    }

    pub fn get(&self, target: &T) -> Value {
        (self.get)(target)
    }

    pub fn set(&self, target: &mut T, value: Value) -> Result<(), ConversionError> {
        (self.set)(target, value)
    }
}

/// One property of a result type.
pub struct PropertyDescriptor<T> {
    name: String,
    kind: ValueKind,
    settable: bool,
    alias: Option<String>,
    accessor: PropertyAccessor<T>,
}

impl<T> Clone for PropertyDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            settable: self.settable,
            alias: self.alias.clone(),
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("settable", &self.settable)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

impl<T> PropertyDescriptor<T> {
    pub fn new(name: impl Into<String>, kind: ValueKind, accessor: PropertyAccessor<T>) -> Self {
        Self {
            name: name.into(),
            kind,
            settable: true,
            alias: None,
            accessor,
        }
    }

    /// Settable property backed by a typed field.
    pub fn field<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: FromValue + IntoValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::new(name, V::KIND, PropertyAccessor::typed(get, set))
    }

    /// Column alias used when no explicit alias is configured.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Marks the property as not eligible for mapping.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.settable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_settable(&self) -> bool {
        self.settable
    }

    /// Extractor-supplied alias, or the property name if none.
    pub fn default_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn accessor(&self) -> &PropertyAccessor<T> {
        &self.accessor
    }
}

/// Identity of a result type plus its properties in declaration order.
pub struct ResultTypeDescriptor<T> {
    type_id: TypeId,
    type_name: String,
    properties: Vec<PropertyDescriptor<T>>,
}

impl<T> fmt::Debug for ResultTypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultTypeDescriptor")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .finish()
    }
}

impl<T: 'static> ResultTypeDescriptor<T> {
    /// Builds a descriptor, rejecting duplicate property names.
    pub fn new(
        type_name: impl Into<String>,
        properties: Vec<PropertyDescriptor<T>>,
    ) -> Result<Self, ConfigurationError> {
        let type_name = type_name.into();
        let mut seen = HashSet::new();
        for property in &properties {
            if !seen.insert(property.name()) {
                return Err(ConfigurationError::DuplicateProperty {
                    type_name,
                    property: property.name().to_string(),
                });
            }
        }
        Ok(Self {
            type_id: TypeId::of::<T>(),
            type_name,
            properties,
        })
    }
}

impl<T> ResultTypeDescriptor<T> {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All declared properties, settable or not.
    pub fn properties(&self) -> &[PropertyDescriptor<T>] {
        &self.properties
    }

    /// Eligible (settable) properties with their default aliases, in order.
    pub fn enumerate(&self) -> impl Iterator<Item = (&PropertyDescriptor<T>, &str)> {
        self.properties
            .iter()
            .filter(|property| property.is_settable())
            .map(|property| (property, property.default_alias()))
    }
}

/// Enumerates the mappable properties of a result type.
///
/// Passed explicitly to rule-set construction.
pub trait PropertyMetadataExtractor<T> {
    fn describe(&self) -> Result<ResultTypeDescriptor<T>, ConfigurationError>;
}

/// A result type that declares its own properties.
pub trait MapTarget: Default + 'static {
    /// Short type name used in diagnostics.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn properties() -> Vec<PropertyDescriptor<Self>>;
}

/// Extractor for any [`MapTarget`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredProperties;

impl<T: MapTarget> PropertyMetadataExtractor<T> for DeclaredProperties {
    fn describe(&self) -> Result<ResultTypeDescriptor<T>, ConfigurationError> {
        ResultTypeDescriptor::new(T::type_name(), T::properties())
    }
}
