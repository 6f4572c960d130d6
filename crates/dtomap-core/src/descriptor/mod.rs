//! Target type descriptors
//!
//! A [`TypeDescriptor`] is the explicit, registered description of a target
//! value type: its ordered field list, the declared source path of each field
//! (if any), how convention keys are derived from field names, and the
//! type-level template, field filters and pipeline.
//!
//! # Module Organization
//!
//! - [`builder`] - fluent construction in code
//! - [`loader`] - YAML/JSON catalog files
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod loader;

pub use builder::TypeDescriptorBuilder;
pub use loader::{load_catalog, parse_catalog, CatalogFormat};

use crate::case;
use crate::filter::FilterSpec;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Ordered map of target field name to template value.
///
/// A string value is an expression string; any other JSON value is a literal.
pub type TemplateDefinition = Map<String, Value>;

/// Field name to ordered filter references
pub type FieldFilterMap = BTreeMap<String, Vec<FilterSpec>>;

/// How the convention source key is derived from a field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NamingStrategy {
    /// Same name as the field
    #[default]
    #[serde(rename = "identity")]
    Identity,
    /// `fullName` reads `full_name`
    #[serde(rename = "snake_case")]
    SnakeCase,
    /// `full_name` reads `fullName`
    #[serde(rename = "camelCase")]
    CamelCase,
    /// `fullName` reads `full-name`
    #[serde(rename = "kebab-case")]
    KebabCase,
}

impl NamingStrategy {
    /// Input key for a field name under this strategy
    pub fn apply(&self, field: &str) -> String {
        match self {
            NamingStrategy::Identity => field.to_string(),
            NamingStrategy::SnakeCase => case::snake(field),
            NamingStrategy::CamelCase => case::camel(field),
            NamingStrategy::KebabCase => case::kebab(field),
        }
    }
}

/// One field of a target type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldRepr")]
pub struct FieldDescriptor {
    /// Target field name
    pub name: String,
    /// Explicit convention key, overriding the naming strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Declared source path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl FieldDescriptor {
    /// Field resolved by convention only
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            from: None,
        }
    }

    /// Set the declared source path
    pub fn from_path(mut self, path: impl Into<String>) -> Self {
        self.from = Some(path.into());
        self
    }

    /// Set an explicit convention key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Key looked up in the input when this field falls back to convention
    pub fn convention_key(&self, naming: NamingStrategy) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => naming.apply(&self.name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        from: Option<String>,
    },
}

impl From<FieldRepr> for FieldDescriptor {
    fn from(repr: FieldRepr) -> Self {
        match repr {
            FieldRepr::Name(name) => Self::new(name),
            FieldRepr::Full { name, key, from } => Self { name, key, from },
        }
    }
}

/// Registered description of a target type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type identity, the cache key component
    pub id: String,
    /// Fields in output order
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub naming: NamingStrategy,
    /// Type-level template, used when a call supplies none
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub template: TemplateDefinition,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_filters: FieldFilterMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipeline: Vec<FilterSpec>,
}

impl TypeDescriptor {
    /// Start building a descriptor
    pub fn builder(id: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder::new(id)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check structural consistency: non-empty id, unique field names
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::catalog("Type id must not be empty", None));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(Error::catalog(
                    format!("Type '{}' has a field with an empty name", self.id),
                    None,
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::catalog(
                    format!("Type '{}' declares field '{}' twice", self.id, field.name),
                    None,
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_naming_strategies() {
        assert_eq!(NamingStrategy::Identity.apply("fullName"), "fullName");
        assert_eq!(NamingStrategy::SnakeCase.apply("fullName"), "full_name");
        assert_eq!(NamingStrategy::CamelCase.apply("full_name"), "fullName");
        assert_eq!(NamingStrategy::KebabCase.apply("fullName"), "full-name");
    }

    #[test]
    fn test_convention_key_prefers_explicit_key() {
        let field = FieldDescriptor::new("fullName").with_key("display");
        assert_eq!(field.convention_key(NamingStrategy::SnakeCase), "display");
        let field = FieldDescriptor::new("fullName");
        assert_eq!(field.convention_key(NamingStrategy::SnakeCase), "full_name");
    }

    #[test]
    fn test_deserialize_field_shorthand() {
        let fields: Vec<FieldDescriptor> =
            serde_json::from_value(json!(["id", {"name": "name", "from": "full_name"}])).unwrap();
        assert_eq!(fields[0], FieldDescriptor::new("id"));
        assert_eq!(fields[1], FieldDescriptor::new("name").from_path("full_name"));
    }

    #[test]
    fn test_validate_duplicate_fields() {
        let descriptor = TypeDescriptor {
            id: "User".to_string(),
            fields: vec![FieldDescriptor::new("id"), FieldDescriptor::new("id")],
            naming: NamingStrategy::Identity,
            template: Map::new(),
            field_filters: FieldFilterMap::new(),
            pipeline: Vec::new(),
        };
        let err = descriptor.validate().unwrap_err();
        assert!(err.to_string().contains("declares field 'id' twice"));
    }
}
