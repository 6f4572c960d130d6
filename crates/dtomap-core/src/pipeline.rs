//! Two-tier filter execution
//!
//! A field's raw value goes through its own field filters first and then
//! through every pipeline filter, each list in declared order. The order is
//! fixed: a field filter's output is always subject to the pipeline.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use crate::filter::BoundFilter;
use crate::{Error, Result};
use serde_json::Value;
use tracing::trace;

/// Applies field filters then pipeline filters to one field value
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Create a new executor
    pub fn new() -> Self {
        Self
    }

    /// Run `raw` through `field_filters` then `pipeline_filters`
    pub fn execute(
        &self,
        field: &str,
        raw: Value,
        field_filters: &[BoundFilter],
        pipeline_filters: &[BoundFilter],
    ) -> Result<Value> {
        let mut value = raw;

        for filter in field_filters.iter().chain(pipeline_filters) {
            trace!(field, filter = filter.name(), "applying filter");
            value = filter
                .apply(&value)
                .map_err(|source| Error::FilterExecution {
                    field: field.to_string(),
                    filter: filter.name().to_string(),
                    source,
                })?;
        }

        Ok(value)
    }
}
