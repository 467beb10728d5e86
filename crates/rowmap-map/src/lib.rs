//! Runtime result mapping: rule sets, compiled projectors and materializers.
//!
//! The flow is:
//!
//! 1. Describe a result type with a [`PropertyMetadataExtractor`]
//!    ([`DeclaredProperties`] for [`MapTarget`] types, [`SchemaExtractor`]
//!    for runtime schemas).
//! 2. Build a [`MappingRuleSet`], overriding aliases, conditions and value
//!    processors per property.
//! 3. Fetch a [`CompiledProjector`] with [`compile_or_fetch`]; projectors
//!    are compiled once per [`Fingerprint`] and cached for the process.
//! 4. Run a [`RowCursor`](rowmap_model::RowCursor) through [`map`] or
//!    [`stream`].
//!
//! Missing columns, `NULL` values and declined conditions leave a property
//! at its default. Every other failure is an error.

#![deny(unsafe_code)]

pub mod cache;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod dynamic;
pub mod error;
pub mod fingerprint;
pub mod materializer;
pub mod presence;
pub mod processors;
pub mod rule;
pub mod rule_set;

pub use cache::{ProjectorCache, compile_or_fetch};
pub use compiler::{CompiledProjector, MappingCompiler};
pub use config::{PropertyConfig, RulesFile};
pub use descriptor::{
    DeclaredProperties, MapTarget, PropertyAccessor, PropertyDescriptor,
    PropertyMetadataExtractor, ResultTypeDescriptor,
};
pub use dynamic::{DynamicRecord, SchemaExtractor, SchemaProperty};
pub use error::{
    BindingCause, BoxError, CacheCompilationFailure, ColumnBindingFailure, ConfigurationError,
    CursorFailure, MappingError,
};
pub use fingerprint::{CommandId, Fingerprint};
pub use materializer::{CancellationFlag, MappedRows, Materializer, map, stream};
pub use presence::ColumnPresenceIndex;
pub use rule::{Condition, PropertyMappingRule, ValueProcessor};
pub use rule_set::{MappingRuleSet, MappingRuleSetBuilder};
