//! Error types for rule configuration, compilation and materialization.

use std::fmt;
use std::path::PathBuf;

use rowmap_model::{ConversionError, CursorError, ValueKind};
use thiserror::Error;

/// Boxed error returned by caller-supplied value processors and compile steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid mapping configuration. Raised while building a rule set, never
/// silently corrected.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to describe result type {type_name}: {message}")]
    Extractor { type_name: String, message: String },

    #[error("result type {type_name} declares property {property} more than once")]
    DuplicateProperty { type_name: String, property: String },

    #[error("property {property} of {type_name} is configured more than once")]
    DuplicateRule { type_name: String, property: String },

    #[error("{type_name} has no mappable property named {property}")]
    UnknownProperty { type_name: String, property: String },

    #[error("property {property} of {type_name} has an empty alias")]
    EmptyAlias { type_name: String, property: String },

    #[error("unknown value processor '{name}' configured for property {property}")]
    UnknownProcessor { property: String, name: String },

    #[error("fingerprint for {fingerprint_type} cannot compile rules of {type_name}")]
    FingerprintMismatch {
        type_name: String,
        fingerprint_type: String,
    },

    #[error("failed to read rules file {path}")]
    RulesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file")]
    RulesParse(#[from] serde_json::Error),
}

/// Why a single field could not be bound.
#[derive(Debug, Error)]
pub enum BindingCause {
    #[error("failed to read column")]
    Read(#[source] CursorError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("value processor '{key}' failed")]
    Processor {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("column is not present in the result set")]
    MissingColumn,
}

/// A single field's read, processing or assignment failed. Aborts the row.
#[derive(Debug, Error)]
pub struct ColumnBindingFailure {
    pub property: String,
    pub alias: String,
    pub target_type: String,
    pub kind: ValueKind,
    /// Zero-based row index, attached by the materializer.
    pub row_index: Option<usize>,
    #[source]
    pub cause: BindingCause,
}

impl ColumnBindingFailure {
    #[must_use]
    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }
}

impl fmt::Display for ColumnBindingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{property} encountered an error on column [{alias}] when binding into property \
             {property} of {target} ({kind})",
            property = self.property,
            alias = self.alias,
            target = self.target_type,
            kind = self.kind,
        )?;
        if let Some(row) = self.row_index {
            write!(f, " at row {row}")?;
        }
        Ok(())
    }
}

/// The cursor failed while the materializer was traversing it.
#[derive(Debug, Error)]
pub struct CursorFailure {
    pub row_index: Option<usize>,
    #[source]
    pub source: CursorError,
}

impl fmt::Display for CursorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_index {
            Some(row) => write!(f, "cursor failed at row {row}"),
            None => f.write_str("cursor failed"),
        }
    }
}

/// The compile step failed on a cache miss. Nothing was cached.
#[derive(Debug, Error)]
#[error("failed to compile projector {fingerprint} for {target_type}")]
pub struct CacheCompilationFailure {
    pub fingerprint: String,
    pub target_type: String,
    #[source]
    pub source: BoxError,
}

/// Top-level error for every mapping entry point.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Binding(#[from] ColumnBindingFailure),

    #[error(transparent)]
    Cursor(#[from] CursorFailure),

    #[error(transparent)]
    Compilation(#[from] CacheCompilationFailure),

    #[error("cache entry {fingerprint} holds a projector for a different result type")]
    CacheTypeMismatch { fingerprint: String },

    #[error("mapping cancelled after {rows} rows")]
    Cancelled { rows: usize },
}

impl MappingError {
    /// The binding failure, if this error is one.
    pub fn as_binding(&self) -> Option<&ColumnBindingFailure> {
        match self {
            Self::Binding(failure) => Some(failure),
            _ => None,
        }
    }
}
