//! Mapping engine
//!
//! The [`Engine`] owns the registered type descriptors, the filter registry
//! and the plan cache. Both registries are fixed once the engine is built,
//! so an engine can be shared freely between threads.
//!
//! ```
//! use dtomap_core::{Engine, Overrides, TypeDescriptor};
//! use serde_json::json;
//!
//! let user = TypeDescriptor::builder("User")
//!     .field("id")
//!     .field("name")
//!     .build()?;
//! let engine = Engine::builder().register_type(user).build()?;
//!
//! let overrides = Overrides::new().template("name", "{{ profile.name | trim }}");
//! let out = engine.resolve("User", &json!({"id": 7, "profile": {"name": " Ada "}}), &overrides)?;
//! assert_eq!(out["name"], json!("Ada"));
//! # Ok::<(), dtomap_core::Error>(())
//! ```
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod global;

pub use config::{AbsentPolicy, EngineConfig};

use crate::descriptor::TypeDescriptor;
use crate::filter::FilterRegistry;
use crate::path::Container;
use crate::plan::{CacheStats, MappingResolver, Overrides, PlanCache, PlanKey, ResolvedMappingPlan};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Template mapping engine
#[derive(Debug)]
pub struct Engine {
    types: HashMap<String, Arc<TypeDescriptor>>,
    filters: FilterRegistry,
    cache: PlanCache,
    config: EngineConfig,
}

impl Engine {
    /// Start configuring an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Map `input` to the raw field map of `type_id`
    pub fn resolve<C: Container + ?Sized>(
        &self,
        type_id: &str,
        input: &C,
        overrides: &Overrides,
    ) -> Result<Map<String, Value>> {
        let plan = self.resolve_plan(type_id, overrides)?;
        plan.execute(input, &self.filters, &self.config)
    }

    /// Fetch or build the plan for `type_id` under `overrides`
    pub fn resolve_plan(
        &self,
        type_id: &str,
        overrides: &Overrides,
    ) -> Result<Arc<ResolvedMappingPlan>> {
        let descriptor = self
            .types
            .get(type_id)
            .ok_or_else(|| Error::UnknownType {
                type_id: type_id.to_string(),
            })?;

        let key = PlanKey::new(type_id, overrides.fingerprint());
        self.cache
            .get_or_build(key, || {
                MappingResolver::new(&self.filters)
                    .resolve_plan(descriptor, overrides)
                    .map(Arc::new)
            })
            .map_err(Error::from)
    }

    /// Drop every cached plan of `type_id`
    pub fn invalidate(&self, type_id: &str) -> usize {
        self.cache.invalidate(type_id)
    }

    /// Drop every cached plan
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache size and hit/miss counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Registered descriptor for `type_id`
    pub fn descriptor(&self, type_id: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_id).map(|d| d.as_ref())
    }

    /// Registered type ids, sorted
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.types.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The engine's filter registry
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// The engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Builder for [`Engine`]
#[derive(Debug)]
pub struct EngineBuilder {
    types: Vec<TypeDescriptor>,
    filters: FilterRegistry,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Builder with the built-in filters and default configuration
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            filters: FilterRegistry::with_builtins(),
            config: EngineConfig::default(),
        }
    }

    /// Register a target type
    pub fn register_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Register several target types
    pub fn register_types<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        self.types.extend(descriptors);
        self
    }

    /// Register or replace a filter
    pub fn filter<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.filters.register(name, func);
        self
    }

    /// Replace the whole filter registry
    pub fn filters(mut self, registry: FilterRegistry) -> Self {
        self.filters = registry;
        self
    }

    /// Set the engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the registered types and build the engine
    pub fn build(self) -> Result<Engine> {
        let mut types = HashMap::with_capacity(self.types.len());
        for descriptor in self.types {
            descriptor.validate()?;
            let id = descriptor.id.clone();
            if types.insert(id.clone(), Arc::new(descriptor)).is_some() {
                return Err(Error::configuration(format!(
                    "Type '{}' is registered twice",
                    id
                )));
            }
        }

        debug!(
            types = types.len(),
            filters = self.filters.len(),
            cache_enabled = self.config.cache_enabled,
            "built mapping engine"
        );

        Ok(Engine {
            types,
            filters: self.filters,
            cache: PlanCache::with_enabled(self.config.cache_enabled),
            config: self.config,
        })
    }
}
