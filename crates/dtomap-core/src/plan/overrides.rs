//! Per-call overrides and their fingerprint
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use crate::descriptor::{FieldFilterMap, TemplateDefinition};
use crate::filter::FilterSpec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Digest of the empty overrides, computed once
static EMPTY_FINGERPRINT: OnceLock<String> = OnceLock::new();

/// Template, field filters and pipeline supplied for a single resolve call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    /// Replaces the type's template when non-empty
    pub template: TemplateDefinition,
    /// Replaces the type's filter list for each named field
    pub field_filters: FieldFilterMap,
    /// Appended to the type's pipeline
    pub pipeline: Vec<FilterSpec>,
}

impl Overrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is overridden
    pub fn is_empty(&self) -> bool {
        self.template.is_empty() && self.field_filters.is_empty() && self.pipeline.is_empty()
    }

    /// Use `template` instead of the type's template
    pub fn with_template(mut self, template: TemplateDefinition) -> Self {
        self.template = template;
        self
    }

    /// Add one template entry
    pub fn template(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template.insert(field.into(), value.into());
        self
    }

    /// Append a filter to a field's override list
    pub fn field_filter(mut self, field: impl Into<String>, spec: FilterSpec) -> Self {
        self.field_filters.entry(field.into()).or_default().push(spec);
        self
    }

    /// Append a pipeline filter
    pub fn pipeline(mut self, spec: FilterSpec) -> Self {
        self.pipeline.push(spec);
        self
    }

    /// SHA-256 hex digest of the canonical JSON form.
    ///
    /// Field filters are keyed in sorted order; template entries keep their
    /// order since it determines the order of extra output fields. Empty
    /// overrides reuse a digest computed on first use.
    pub fn fingerprint(&self) -> String {
        if self.is_empty() {
            return EMPTY_FINGERPRINT.get_or_init(|| self.digest()).clone();
        }
        self.digest()
    }

    fn digest(&self) -> String {
        let mut canonical = Map::new();
        canonical.insert("template".to_string(), Value::Object(self.template.clone()));

        let field_filters = self
            .field_filters
            .iter()
            .map(|(field, specs)| (field.clone(), specs_value(specs)))
            .collect::<Map<String, Value>>();
        canonical.insert("field_filters".to_string(), Value::Object(field_filters));
        canonical.insert("pipeline".to_string(), specs_value(&self.pipeline));

        let digest = Sha256::digest(Value::Object(canonical).to_string().as_bytes());
        hex::encode(digest)
    }
}

fn specs_value(specs: &[FilterSpec]) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|spec| {
                let mut entry = vec![Value::String(spec.name.clone())];
                entry.extend(spec.args.iter().cloned());
                Value::Array(entry)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_fingerprint_matches_digest() {
        let empty = Overrides::new();
        assert_eq!(empty.fingerprint(), empty.digest());
        assert_eq!(
            Overrides::new().with_template(TemplateDefinition::new()).fingerprint(),
            empty.fingerprint()
        );
        assert_ne!(
            Overrides::new().pipeline(FilterSpec::new("trim")).fingerprint(),
            empty.fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Overrides::new()
            .template("id", "{{ user.id }}")
            .field_filter("email", FilterSpec::new("lower"))
            .field_filter("name", FilterSpec::new("trim"));
        let b = Overrides::new()
            .template("id", "{{ user.id }}")
            .field_filter("name", FilterSpec::new("trim"))
            .field_filter("email", FilterSpec::new("lower"));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_distinguishes_overrides() {
        let empty = Overrides::new();
        let piped = Overrides::new().pipeline(FilterSpec::new("trim"));
        let args = Overrides::new().pipeline(FilterSpec::with_args("trim", ["-"]));
        let literal = Overrides::new().template("id", json!(1));
        let text = Overrides::new().template("id", "1");

        let prints = [&empty, &piped, &args, &literal, &text]
            .iter()
            .map(|o| o.fingerprint())
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(prints.len(), 5);
        assert!(empty.is_empty());
        assert!(!piped.is_empty());
    }

    #[test]
    fn test_deserialize_overrides() {
        let overrides: Overrides = serde_json::from_value(json!({
            "template": {"id": "{{ user.id }}"},
            "field_filters": {"email": ["lower"]},
            "pipeline": ["trim", "limit:5"]
        }))
        .unwrap();
        assert_eq!(overrides.pipeline[1], FilterSpec::with_args("limit", [5]));
        assert_eq!(overrides.field_filters["email"], vec![FilterSpec::new("lower")]);
    }
}
