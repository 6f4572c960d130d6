//! Resolved mapping plans
//!
//! A [`ResolvedMappingPlan`] records, for one target type and one set of call
//! overrides, which source each field is read from, the filters bound to each
//! field and the shared pipeline. Plans are immutable and shared through the
//! [`PlanCache`]; executing a plan against an input produces the raw field map.
//!
//! # Module Organization
//!
//! - [`resolver`] - the two-branch source precedence algorithm
//! - [`overrides`] - per-call overrides and their fingerprint
//! - [`cache`] - concurrent plan cache with hit/miss statistics
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod overrides;
pub mod resolver;

pub use cache::{CacheStats, PlanCache, PlanKey};
pub use overrides::Overrides;
pub use resolver::MappingResolver;

use crate::engine::{AbsentPolicy, EngineConfig};
use crate::expression::{EvalContext, Expr};
use crate::filter::{BoundFilter, FilterRegistry};
use crate::path::{Container, PathExpr};
use crate::pipeline::PipelineExecutor;
use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Where a field's raw value comes from, decided once per plan build
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Template expression
    Template(Arc<Expr>),
    /// Declared source path of the field
    Declared(PathExpr),
    /// Same-name (or naming-strategy) key lookup
    Convention(PathExpr),
}

/// Discriminant of [`FieldSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Template,
    Declared,
    Convention,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Template => write!(f, "template"),
            SourceKind::Declared => write!(f, "declared"),
            SourceKind::Convention => write!(f, "convention"),
        }
    }
}

impl FieldSource {
    /// Which source won
    pub fn kind(&self) -> SourceKind {
        match self {
            FieldSource::Template(_) => SourceKind::Template,
            FieldSource::Declared(_) => SourceKind::Declared,
            FieldSource::Convention(_) => SourceKind::Convention,
        }
    }

    /// Evaluate against the input; `None` means absent
    pub fn evaluate<C: Container + ?Sized>(
        &self,
        input: &C,
        ctx: &EvalContext<'_>,
    ) -> Result<Option<Value>> {
        match self {
            FieldSource::Template(expr) => expr.evaluate(input, ctx),
            FieldSource::Declared(path) | FieldSource::Convention(path) => {
                Ok(path.resolve(input).cloned())
            }
        }
    }
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Template(expr) => write!(f, "{}", expr.to_template()),
            FieldSource::Declared(path) | FieldSource::Convention(path) => write!(f, "{}", path),
        }
    }
}

/// One field of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedField {
    pub name: String,
    pub source: FieldSource,
    /// Field filters, applied before the pipeline
    pub field_filters: Vec<BoundFilter>,
}

/// Immutable per-(type, overrides) mapping plan
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMappingPlan {
    type_id: String,
    fingerprint: String,
    fields: Vec<PlannedField>,
    pipeline: Vec<BoundFilter>,
}

impl ResolvedMappingPlan {
    pub(crate) fn new(
        type_id: String,
        fingerprint: String,
        fields: Vec<PlannedField>,
        pipeline: Vec<BoundFilter>,
    ) -> Self {
        Self {
            type_id,
            fingerprint,
            fields,
            pipeline,
        }
    }

    /// Target type id
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Fingerprint of the overrides the plan was built for
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Planned fields in output order
    pub fn fields(&self) -> &[PlannedField] {
        &self.fields
    }

    /// Look up a planned field
    pub fn field(&self, name: &str) -> Option<&PlannedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Pipeline filters applied to every field
    pub fn pipeline(&self) -> &[BoundFilter] {
        &self.pipeline
    }

    /// Produce the raw field map for `input`.
    ///
    /// Any filter failure aborts the whole call; no partial map is returned.
    pub fn execute<C: Container + ?Sized>(
        &self,
        input: &C,
        filters: &FilterRegistry,
        config: &EngineConfig,
    ) -> Result<Map<String, Value>> {
        let executor = PipelineExecutor::new();
        let mut out = Map::with_capacity(self.fields.len());

        for field in &self.fields {
            let ctx = EvalContext {
                field: &field.name,
                filters,
                null_triggers_default: config.null_triggers_default,
            };

            let raw = match field.source.evaluate(input, &ctx)? {
                Some(value) => value,
                None => match config.absent_fields {
                    AbsentPolicy::Null => Value::Null,
                    AbsentPolicy::Omit => continue,
                },
            };

            let value = executor.execute(&field.name, raw, &field.field_filters, &self.pipeline)?;
            out.insert(field.name.clone(), value);
        }

        Ok(out)
    }
}
