//! Fluent builder for type descriptors
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::{FieldDescriptor, FieldFilterMap, NamingStrategy, TemplateDefinition, TypeDescriptor};
use crate::filter::FilterSpec;
use crate::Result;
use serde_json::Value;

/// Builder for [`TypeDescriptor`]
///
/// Filter references are given in text form (`"substr:0:3"`) and parsed when
/// [`build`](Self::build) is called.
#[derive(Debug, Clone)]
pub struct TypeDescriptorBuilder {
    id: String,
    fields: Vec<FieldDescriptor>,
    naming: NamingStrategy,
    template: TemplateDefinition,
    field_filters: Vec<(String, String)>,
    pipeline: Vec<String>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for the given type id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            naming: NamingStrategy::default(),
            template: TemplateDefinition::new(),
            field_filters: Vec::new(),
            pipeline: Vec::new(),
        }
    }

    /// Add a field resolved by convention
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDescriptor::new(name));
        self
    }

    /// Add a field with a declared source path
    pub fn field_from(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.fields.push(FieldDescriptor::new(name).from_path(path));
        self
    }

    /// Add a fully specified field
    pub fn field_descriptor(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the naming strategy for convention keys
    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Add a type-level template entry
    pub fn template(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template.insert(field.into(), value.into());
        self
    }

    /// Append a filter to a field's filter list
    pub fn field_filter(mut self, field: impl Into<String>, spec: impl Into<String>) -> Self {
        self.field_filters.push((field.into(), spec.into()));
        self
    }

    /// Append a filter to the type's pipeline
    pub fn pipeline(mut self, spec: impl Into<String>) -> Self {
        self.pipeline.push(spec.into());
        self
    }

    /// Build and validate the descriptor
    pub fn build(self) -> Result<TypeDescriptor> {
        let mut field_filters = FieldFilterMap::new();
        for (field, spec) in &self.field_filters {
            let spec: FilterSpec = spec.parse()?;
            field_filters.entry(field.clone()).or_default().push(spec);
        }

        let pipeline = self
            .pipeline
            .iter()
            .map(|spec| spec.parse::<FilterSpec>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let descriptor = TypeDescriptor {
            id: self.id,
            fields: self.fields,
            naming: self.naming,
            template: self.template,
            field_filters,
            pipeline,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let descriptor = TypeDescriptor::builder("User")
            .field("id")
            .field_from("name", "user.full_name")
            .field_descriptor(FieldDescriptor::new("email").with_key("mail"))
            .naming(NamingStrategy::SnakeCase)
            .template("id", "{{ user.id }}")
            .template("kind", json!("user"))
            .field_filter("email", "lower")
            .field_filter("email", "limit:20")
            .pipeline("trim")
            .build()
            .unwrap();

        assert_eq!(descriptor.id, "User");
        assert_eq!(descriptor.fields.len(), 3);
        assert_eq!(descriptor.field("name").unwrap().from.as_deref(), Some("user.full_name"));
        assert_eq!(descriptor.template.keys().collect::<Vec<_>>(), vec!["id", "kind"]);
        assert_eq!(
            descriptor.field_filters["email"],
            vec![FilterSpec::new("lower"), FilterSpec::with_args("limit", [20])]
        );
        assert_eq!(descriptor.pipeline, vec![FilterSpec::new("trim")]);
    }

    #[test]
    fn test_builder_rejects_bad_filter_text() {
        let err = TypeDescriptor::builder("User")
            .field("id")
            .pipeline("trim |")
            .build()
            .unwrap_err();
        assert!(err.is_build_error());
    }

    #[test]
    fn test_builder_rejects_empty_id() {
        assert!(TypeDescriptor::builder("  ").field("id").build().is_err());
    }
}
