//! JSON rules files describing a [`DynamicRecord`] mapping.
//!
//! ```json
//! {
//!   "target": "Person",
//!   "command": "people-export",
//!   "strict_columns": false,
//!   "properties": [
//!     { "name": "Name", "kind": "text", "processors": ["trim"] },
//!     { "name": "Age", "kind": "int", "alias": "Years" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use rowmap_model::ValueKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dynamic::{DynamicRecord, SchemaExtractor, SchemaProperty};
use crate::error::ConfigurationError;
use crate::fingerprint::CommandId;
use crate::processors;
use crate::rule_set::MappingRuleSet;

/// One property entry of a rules file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    pub name: String,
    #[serde(default = "any_kind")]
    pub kind: ValueKind,
    /// Column alias; the property name when omitted.
    #[serde(default)]
    pub alias: Option<String>,
    /// Built-in processor names, applied in order.
    #[serde(default)]
    pub processors: Vec<String>,
    #[serde(default)]
    pub read_only: bool,
}

fn any_kind() -> ValueKind {
    ValueKind::Any
}

/// Rules file root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    pub target: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub strict_columns: bool,
    pub properties: Vec<PropertyConfig>,
}

impl RulesFile {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::RulesFile {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            target_type = %rules.target,
            properties = rules.properties.len(),
            "loaded rules file"
        );
        Ok(rules)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Owning command identity; the target name when no command is given.
    pub fn command_id(&self) -> CommandId {
        CommandId::new(self.command.as_deref().unwrap_or(&self.target))
    }

    /// Extractor describing the configured properties.
    pub fn extractor(&self) -> SchemaExtractor {
        let properties = self
            .properties
            .iter()
            .map(|property| SchemaProperty {
                read_only: property.read_only,
                ..SchemaProperty::new(&property.name, property.kind)
            })
            .collect();
        SchemaExtractor::new(&self.target, properties)
    }

    /// Builds the rule set, resolving aliases and processor names.
    ///
    /// `strict_override` forces strict column handling on regardless of the
    /// file's own setting.
    pub fn rule_set(
        &self,
        strict_override: bool,
    ) -> Result<MappingRuleSet<DynamicRecord>, ConfigurationError> {
        let mut builder = MappingRuleSet::<DynamicRecord>::builder()
            .strict_columns(self.strict_columns || strict_override);
        for property in &self.properties {
            if property.read_only
                || (property.alias.is_none() && property.processors.is_empty())
            {
                continue;
            }
            let resolved = property
                .processors
                .iter()
                .map(|name| {
                    processors::by_name(name).ok_or_else(|| ConfigurationError::UnknownProcessor {
                        property: property.name.clone(),
                        name: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let alias = property.alias.clone();
            builder = builder.configure(&property.name, move |rule| {
                if let Some(alias) = alias {
                    rule.set_alias(alias);
                }
                for processor in resolved {
                    rule.set_value_processor(processor);
                }
            });
        }
        builder.build(&self.extractor())
    }
}
