//! Named, parameterized value filters
//!
//! A filter is a pure function `(value, args) -> value`. Filters are looked up
//! by name in a [`FilterRegistry`]; templates reference them inside blocks
//! (`{{ user.email | lower }}`), type descriptors and call overrides reference
//! them through [`FilterSpec`]s (`"substr:0:3"`).
//!
//! # Module Organization
//!
//! - [`built_in`] - the default filter set
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

pub mod built_in;

use crate::error::BuildError;
use crate::expression::parser::parse_filter_reference;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Signature of a filter implementation
pub type FilterFn = Arc<dyn Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// A registered filter: a name and its implementation
#[derive(Clone)]
pub struct Filter {
    name: Arc<str>,
    func: FilterFn,
}

impl Filter {
    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the filter on a value
    pub fn apply(&self, value: &Value, args: &[Value]) -> anyhow::Result<Value> {
        (self.func)(value, args)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}

/// Registry of filters available to templates and pipelines
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the built-in filters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        built_in::register_all(&mut registry);
        registry
    }

    /// Register a filter, replacing any filter already registered under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let filter = Filter {
            name: Arc::from(name.as_str()),
            func: Arc::new(func),
        };
        self.filters.insert(name, filter);
        self
    }

    /// Look up a filter by name
    pub fn get(&self, name: &str) -> Result<Filter, BuildError> {
        self.filters
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::filter_not_found(name))
    }

    /// Whether a filter is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered filter names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the registry has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply the named filter to a value of `field`
    pub fn apply(
        &self,
        field: &str,
        name: &str,
        value: &Value,
        args: &[Value],
    ) -> crate::Result<Value> {
        let filter = self.get(name)?;
        filter
            .apply(value, args)
            .map_err(|source| crate::Error::FilterExecution {
                field: field.to_string(),
                filter: name.to_string(),
                source,
            })
    }

    /// Resolve a filter reference against this registry
    pub fn bind(&self, spec: &FilterSpec) -> Result<BoundFilter, BuildError> {
        let filter = self.get(&spec.name)?;
        Ok(BoundFilter {
            spec: spec.clone(),
            filter,
        })
    }

    /// Resolve a list of filter references, preserving order
    pub fn bind_all(&self, specs: &[FilterSpec]) -> Result<Vec<BoundFilter>, BuildError> {
        specs.iter().map(|spec| self.bind(spec)).collect()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

/// A reference to a filter by name, with its arguments.
///
/// Deserializes from either the text form (`"substr:0:3"`) or a structure
/// (`{"name": "substr", "args": [0, 3]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterSpecRepr")]
pub struct FilterSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl FilterSpec {
    /// Create a filter reference without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a filter reference with arguments
    pub fn with_args<I, V>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl FromStr for FilterSpec {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = parse_filter_reference(s)?;
        Ok(Self { name, args })
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, ":{}", crate::expression::ast::format_literal(arg))?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterSpecRepr {
    Text(String),
    Structured {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl TryFrom<FilterSpecRepr> for FilterSpec {
    type Error = BuildError;

    fn try_from(repr: FilterSpecRepr) -> Result<Self, Self::Error> {
        match repr {
            FilterSpecRepr::Text(text) => text.parse(),
            FilterSpecRepr::Structured { name, args } => Ok(Self { name, args }),
        }
    }
}

/// A filter reference bound to its implementation at plan build
#[derive(Debug, Clone)]
pub struct BoundFilter {
    spec: FilterSpec,
    filter: Filter,
}

impl BoundFilter {
    /// Filter name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The reference this filter was bound from
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Apply the filter with its bound arguments
    pub fn apply(&self, value: &Value) -> anyhow::Result<Value> {
        self.filter.apply(value, &self.spec.args)
    }
}

impl PartialEq for BoundFilter {
    fn eq(&self, other: &Self) -> bool {
        // Implementations are not comparable; the registry is fixed per engine.
        self.spec == other.spec
    }
}

#[cfg(test)]
mod tests;
