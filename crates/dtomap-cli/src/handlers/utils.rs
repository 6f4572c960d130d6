//! Shared utilities for command handlers

use crate::cli::OverrideArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use dtomap_core::descriptor::load_catalog;
use dtomap_core::{Engine, EngineConfig, FilterSpec, Overrides};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the input records were laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// One record
    Single,
    /// An array of records
    Array,
    /// Newline-delimited records
    Lines,
}

/// Input syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
    Ndjson,
}

impl InputFormat {
    /// Pick the input syntax from the flag and the file extension
    pub fn detect(path: Option<&Path>, ndjson: bool) -> Self {
        if ndjson {
            return Self::Ndjson;
        }
        match path.and_then(|p| p.extension()).and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            Some("ndjson") | Some("jsonl") => Self::Ndjson,
            _ => Self::Json,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Read a JSON or YAML document
pub fn read_structured(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })
    }
}

/// Catalog from the command line, else from the config file
pub fn catalog_path(arg: Option<&Path>, config: &Config) -> Result<PathBuf> {
    arg.map(Path::to_path_buf)
        .or_else(|| config.paths.catalog.clone())
        .ok_or_else(|| {
            Error::invalid_args("no catalog given; pass --catalog or set paths.catalog in the config")
        })
}

/// Load a catalog and build an engine over its types
pub fn load_engine(
    catalog: &Path,
    engine_config: EngineConfig,
    output: &OutputWriter,
) -> Result<Engine> {
    if !catalog.exists() {
        return Err(Error::FileNotFound {
            path: catalog.to_path_buf(),
        });
    }

    let spinner = output.spinner(&format!("Loading catalog {}", catalog.display()));
    let types = load_catalog(catalog)?;
    debug!(catalog = %catalog.display(), types = types.len(), "Catalog loaded");

    let engine = Engine::builder()
        .register_types(types)
        .config(engine_config)
        .build()?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(engine)
}

/// Split `field=filter[:arg...]`
pub fn parse_field_filter(text: &str) -> Result<(String, FilterSpec)> {
    let (field, spec) = text
        .split_once('=')
        .ok_or_else(|| Error::invalid_args(format!("--field-filter '{}' is not FIELD=FILTER", text)))?;

    let field = field.trim();
    if field.is_empty() {
        return Err(Error::invalid_args(format!(
            "--field-filter '{}' has an empty field name",
            text
        )));
    }

    let spec = parse_filter(spec.trim())?;
    Ok((field.to_string(), spec))
}

fn parse_filter(text: &str) -> Result<FilterSpec> {
    text.parse()
        .map_err(|e| Error::invalid_args(format!("invalid filter '{}': {}", text, e)))
}

/// Turn the override flags into call overrides
pub fn build_overrides(args: &OverrideArgs) -> Result<Overrides> {
    let mut overrides = Overrides::new();

    if let Some(path) = &args.template {
        match read_structured(path)? {
            Value::Object(template) => {
                debug!(fields = template.len(), "Template loaded");
                overrides = overrides.with_template(template);
            }
            _ => {
                return Err(Error::InvalidFormat {
                    path: path.clone(),
                    expected: "an object of field -> expression".to_string(),
                })
            }
        }
    }

    for text in &args.field_filters {
        let (field, spec) = parse_field_filter(text)?;
        overrides = overrides.field_filter(field, spec);
    }

    for text in &args.pipeline {
        overrides = overrides.pipeline(parse_filter(text)?);
    }

    Ok(overrides)
}

/// Read the input file, or stdin when the path is absent or `-`
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            if !p.exists() {
                return Err(Error::FileNotFound {
                    path: p.to_path_buf(),
                });
            }
            Ok(fs::read_to_string(p)?)
        }
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

/// Parse the input into records
pub fn parse_records(content: &str, format: InputFormat) -> Result<(Vec<Value>, InputShape)> {
    let document: Value = match format {
        InputFormat::Ndjson => return parse_lines(content),
        InputFormat::Yaml => serde_yaml::from_str(content)?,
        InputFormat::Json => match serde_json::from_str(content) {
            Ok(value) => value,
            // several documents on separate lines
            Err(e) if content.trim().lines().count() > 1 => {
                debug!(error = %e, "Input is not one JSON document, reading as NDJSON");
                return parse_lines(content);
            }
            Err(e) => return Err(e.into()),
        },
    };

    match document {
        Value::Array(records) => Ok((records, InputShape::Array)),
        record => Ok((vec![record], InputShape::Single)),
    }
}

fn parse_lines(content: &str) -> Result<(Vec<Value>, InputShape)> {
    let records = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::other(format!("Invalid JSON on line {}: {}", n + 1, e)))
        })
        .collect::<Result<Vec<Value>>>()?;
    Ok((records, InputShape::Lines))
}

/// Write mapped output to a file, formatted by its extension
pub fn write_output_file(path: &Path, value: &Value) -> Result<()> {
    let content = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::to_string(value)?,
        Some("ndjson") | Some("jsonl") => match value {
            Value::Array(items) => items
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join("\n"),
            other => serde_json::to_string(other)?,
        },
        _ => serde_json::to_string_pretty(value)?,
    };

    fs::write(path, content + "\n")?;
    Ok(())
}
