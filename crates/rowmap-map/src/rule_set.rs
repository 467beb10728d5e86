//! Mapping rule sets: one rule per eligible property of a result type.
//!
//! Defaults come from the [`PropertyMetadataExtractor`]; explicit
//! configuration overrides them per property name. Once built, a rule set is
//! immutable input to the compiler.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::descriptor::PropertyMetadataExtractor;
use crate::error::ConfigurationError;
use crate::rule::PropertyMappingRule;

type Configure<T> = Box<dyn FnOnce(&mut PropertyMappingRule<T>)>;

/// Complete set of mapping rules for one result type.
pub struct MappingRuleSet<T> {
    type_id: TypeId,
    type_name: String,
    rules: Vec<PropertyMappingRule<T>>,
    strict_columns: bool,
}

impl<T> fmt::Debug for MappingRuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRuleSet")
            .field("type_name", &self.type_name)
            .field("rules", &self.rules)
            .field("strict_columns", &self.strict_columns)
            .finish()
    }
}

impl<T: 'static> MappingRuleSet<T> {
    /// Rule set with every property at its extractor defaults.
    pub fn from_extractor<E>(extractor: &E) -> Result<Self, ConfigurationError>
    where
        E: PropertyMetadataExtractor<T> + ?Sized,
    {
        Self::builder().build(extractor)
    }

    pub fn builder() -> MappingRuleSetBuilder<T> {
        MappingRuleSetBuilder::default()
    }
}

impl<T> MappingRuleSet<T> {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Rules in extractor declaration order.
    pub fn rules(&self) -> &[PropertyMappingRule<T>] {
        &self.rules
    }

    pub fn rule(&self, property: &str) -> Option<&PropertyMappingRule<T>> {
        self.rules
            .iter()
            .find(|rule| rule.property_name() == property)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether an absent column is an error instead of a silent skip.
    pub fn strict_columns(&self) -> bool {
        self.strict_columns
    }
}

/// Collects explicit per-property configuration before a rule set is built.
pub struct MappingRuleSetBuilder<T> {
    overrides: Vec<(String, Configure<T>)>,
    strict_columns: bool,
}

impl<T> Default for MappingRuleSetBuilder<T> {
    fn default() -> Self {
        Self {
            overrides: Vec::new(),
            strict_columns: false,
        }
    }
}

impl<T: 'static> MappingRuleSetBuilder<T> {
    /// Configures the rule for `property`. Each property may be configured once.
    #[must_use]
    pub fn configure<F>(mut self, property: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(&mut PropertyMappingRule<T>) + 'static,
    {
        self.overrides.push((property.into(), Box::new(configure)));
        self
    }

    /// Treat absent columns as binding failures.
    #[must_use]
    pub fn strict_columns(mut self, enabled: bool) -> Self {
        self.strict_columns = enabled;
        self
    }

    pub fn build<E>(self, extractor: &E) -> Result<MappingRuleSet<T>, ConfigurationError>
    where
        E: PropertyMetadataExtractor<T> + ?Sized,
    {
        let descriptor = extractor.describe()?;
        let type_name = descriptor.type_name().to_string();

        let mut rules: Vec<PropertyMappingRule<T>> = descriptor
            .enumerate()
            .map(|(property, _)| PropertyMappingRule::new(property.clone()))
            .collect();

        let override_count = self.overrides.len();
        let mut configured = HashSet::new();
        for (property, configure) in self.overrides {
            if !configured.insert(property.clone()) {
                return Err(ConfigurationError::DuplicateRule {
                    type_name,
                    property,
                });
            }
            let Some(rule) = rules
                .iter_mut()
                .find(|rule| rule.property_name() == property)
            else {
                return Err(ConfigurationError::UnknownProperty {
                    type_name,
                    property,
                });
            };
            configure(rule);
        }

        if let Some(rule) = rules
            .iter()
            .find(|rule| rule.active_alias().trim().is_empty())
        {
            return Err(ConfigurationError::EmptyAlias {
                type_name,
                property: rule.property_name().to_string(),
            });
        }

        debug!(
            target_type = %type_name,
            rules = rules.len(),
            overrides = override_count,
            strict_columns = self.strict_columns,
            "built mapping rule set"
        );

        Ok(MappingRuleSet {
            type_id: descriptor.type_id(),
            type_name,
            rules,
            strict_columns: self.strict_columns,
        })
    }
}
