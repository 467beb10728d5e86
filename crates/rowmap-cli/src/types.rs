use rowmap_map::DynamicRecord;
use rowmap_model::ValueKind;
use serde::Serialize;

/// How one configured property binds to the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyBinding {
    pub property: String,
    pub alias: String,
    pub kind: ValueKind,
    /// Header position of the alias, `None` when the column is absent.
    pub ordinal: Option<usize>,
    pub processors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub target: String,
    pub command: String,
    pub fingerprint: String,
    pub columns: Vec<String>,
    pub bindings: Vec<PropertyBinding>,
}

#[derive(Debug, Clone)]
pub struct MapResult {
    pub target: String,
    pub fingerprint: String,
    /// Configured property names in rule order.
    pub properties: Vec<String>,
    pub records: Vec<DynamicRecord>,
}
