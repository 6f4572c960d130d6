//! Type catalog loading from YAML and JSON
//!
//! A catalog is either a list of type descriptors or a document with a
//! `types` list:
//!
//! ```yaml
//! types:
//!   - id: User
//!     naming: snake_case
//!     fields:
//!       - id
//!       - name: displayName
//!         from: profile.display_name
//!     field_filters:
//!       email: [lower]
//!     pipeline: [trim]
//! ```
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::TypeDescriptor;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Supported catalog file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl CatalogFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(CatalogFormat::Yaml),
            Some("json") => Ok(CatalogFormat::Json),
            _ => Err(Error::catalog(
                "Unsupported catalog format, expected .yaml, .yml or .json",
                Some(path.to_path_buf()),
            )),
        }
    }
}

/// Parse catalog text in the given format
pub fn parse_catalog(content: &str, format: CatalogFormat) -> Result<Vec<TypeDescriptor>> {
    let document: Value = match format {
        CatalogFormat::Yaml => serde_yaml::from_str(content).map_err(|e| Error::Catalog {
            message: format!("Invalid YAML catalog: {}", e),
            path: None,
            source: Some(e.into()),
        })?,
        CatalogFormat::Json => serde_json::from_str(content).map_err(|e| Error::Catalog {
            message: format!("Invalid JSON catalog: {}", e),
            path: None,
            source: Some(e.into()),
        })?,
    };

    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("types") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(Error::catalog("`types` must be a list", None)),
            None => {
                return Err(Error::catalog(
                    "Catalog must be a list of types or a document with a `types` list",
                    None,
                ))
            }
        },
        _ => {
            return Err(Error::catalog(
                "Catalog must be a list of types or a document with a `types` list",
                None,
            ))
        }
    };

    let types = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_type(index, entry))
        .collect::<Result<Vec<_>>>()?;

    let mut ids = HashSet::new();
    for descriptor in &types {
        descriptor.validate()?;
        if !ids.insert(descriptor.id.as_str()) {
            return Err(Error::catalog(
                format!("Type '{}' is declared twice", descriptor.id),
                None,
            ));
        }
    }

    Ok(types)
}

/// Decode one catalog entry, naming it in the error
fn parse_type(index: usize, entry: Value) -> Result<TypeDescriptor> {
    let label = match entry.get("id").and_then(Value::as_str) {
        Some(id) => format!("type #{} ('{}')", index + 1, id),
        None => format!("type #{}", index + 1),
    };

    serde_json::from_value(entry).map_err(|e| Error::Catalog {
        message: format!("Invalid {}: {}", label, e),
        path: None,
        source: Some(e.into()),
    })
}

/// Load a catalog file, detecting the format from its extension
pub fn load_catalog(path: &Path) -> Result<Vec<TypeDescriptor>> {
    let format = CatalogFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| Error::Catalog {
        message: format!("Failed to read catalog: {}", e),
        path: Some(path.to_path_buf()),
        source: Some(e.into()),
    })?;

    let types = parse_catalog(&content, format).map_err(|err| match err {
        Error::Catalog {
            message, source, ..
        } => Error::Catalog {
            message,
            path: Some(path.to_path_buf()),
            source,
        },
        other => other,
    })?;

    debug!(path = %path.display(), types = types.len(), "loaded type catalog");
    Ok(types)
}
