//! Mapping source precedence
//!
//! The effective template is the call's template when non-empty, otherwise
//! the type's own. Then exactly one of two branches applies to the whole type:
//!
//! - **template present**: fields it covers use their expression, every other
//!   field uses convention; declared paths are never consulted.
//! - **no template**: a field's declared path if it has one, else convention.
//!
//! Field filters from the call replace the type's list for that field; the
//! call's pipeline is appended to the type's pipeline.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::{FieldSource, Overrides, PlannedField, ResolvedMappingPlan};
use crate::descriptor::{FieldFilterMap, TemplateDefinition, TypeDescriptor};
use crate::error::BuildError;
use crate::expression::{parse_with_filters, Expr};
use crate::filter::FilterRegistry;
use crate::path::PathExpr;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds plans from type descriptors and overrides
#[derive(Debug, Clone, Copy)]
pub struct MappingResolver<'a> {
    filters: &'a FilterRegistry,
}

impl<'a> MappingResolver<'a> {
    /// Create a resolver binding filters against `filters`
    pub fn new(filters: &'a FilterRegistry) -> Self {
        Self { filters }
    }

    /// Build the plan for `descriptor` under `overrides`
    pub fn resolve_plan(
        &self,
        descriptor: &TypeDescriptor,
        overrides: &Overrides,
    ) -> Result<ResolvedMappingPlan, BuildError> {
        let template = if overrides.template.is_empty() {
            &descriptor.template
        } else {
            &overrides.template
        };

        let sources = if template.is_empty() {
            self.declared_sources(descriptor)?
        } else {
            self.template_sources(descriptor, template)?
        };

        let mut field_filters: FieldFilterMap = descriptor.field_filters.clone();
        for (field, specs) in &overrides.field_filters {
            field_filters.insert(field.clone(), specs.clone());
        }
        for field in field_filters.keys() {
            if !sources.iter().any(|(name, _)| name == field) {
                warn!(
                    type_id = %descriptor.id,
                    field = %field,
                    "ignoring filters for a field that is not part of the plan"
                );
            }
        }

        let fields = sources
            .into_iter()
            .map(|(name, source)| {
                let filters = match field_filters.get(&name) {
                    Some(specs) => self
                        .filters
                        .bind_all(specs)
                        .map_err(|err| err.for_field(&name))?,
                    None => Vec::new(),
                };
                Ok(PlannedField {
                    name,
                    source,
                    field_filters: filters,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let pipeline_specs: Vec<_> = descriptor
            .pipeline
            .iter()
            .chain(&overrides.pipeline)
            .cloned()
            .collect();
        let pipeline = self.filters.bind_all(&pipeline_specs)?;

        debug!(
            type_id = %descriptor.id,
            fields = fields.len(),
            pipeline = pipeline.len(),
            template = !template.is_empty(),
            "built mapping plan"
        );

        Ok(ResolvedMappingPlan::new(
            descriptor.id.clone(),
            overrides.fingerprint(),
            fields,
            pipeline,
        ))
    }

    fn template_sources(
        &self,
        descriptor: &TypeDescriptor,
        template: &TemplateDefinition,
    ) -> Result<Vec<(String, FieldSource)>, BuildError> {
        let mut compiled: HashMap<&str, Arc<Expr>> = HashMap::new();
        let mut sources = Vec::with_capacity(descriptor.fields.len());

        for field in &descriptor.fields {
            let source = match template.get(&field.name) {
                Some(value) => FieldSource::Template(self.compile(&field.name, value, &mut compiled)?),
                None => FieldSource::Convention(PathExpr::key(field.convention_key(descriptor.naming))),
            };
            sources.push((field.name.clone(), source));
        }

        let extra: Vec<&String> = template
            .keys()
            .filter(|key| descriptor.field(key).is_none())
            .collect();
        if !extra.is_empty() {
            debug!(type_id = %descriptor.id, fields = ?extra, "template adds fields outside the type");
        }
        for key in extra {
            let value = &template[key.as_str()];
            let expr = self.compile(key, value, &mut compiled)?;
            sources.push((key.clone(), FieldSource::Template(expr)));
        }

        Ok(sources)
    }

    fn declared_sources(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Vec<(String, FieldSource)>, BuildError> {
        descriptor
            .fields
            .iter()
            .map(|field| {
                let source = match &field.from {
                    Some(path) => FieldSource::Declared(PathExpr::parse(path).map_err(|err| {
                        BuildError::syntax(err.message, err.offset, path.as_str())
                            .for_field(&field.name)
                    })?),
                    None => FieldSource::Convention(PathExpr::key(
                        field.convention_key(descriptor.naming),
                    )),
                };
                Ok((field.name.clone(), source))
            })
            .collect()
    }

    /// Parse a template value, reusing the tree for repeated expression strings
    fn compile<'t>(
        &self,
        field: &str,
        value: &'t Value,
        compiled: &mut HashMap<&'t str, Arc<Expr>>,
    ) -> Result<Arc<Expr>, BuildError> {
        let Value::String(text) = value else {
            return Ok(Arc::new(Expr::Literal(value.clone())));
        };

        if let Some(expr) = compiled.get(text.as_str()) {
            return Ok(Arc::clone(expr));
        }

        let expr = Arc::new(parse_with_filters(text, self.filters).map_err(|err| err.for_field(field))?);
        compiled.insert(text.as_str(), Arc::clone(&expr));
        Ok(expr)
    }
}
