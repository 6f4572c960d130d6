//! Configuration management for the CLI
//!
//! Configuration is read from the first of:
//! - the file given by `--config` / `DTOMAP_CONFIG`
//! - `.dtomap.toml`, `.dtomap.yaml`, `.dtomap.yml` or `.dtomap.json` in the
//!   working directory
//! - `config.toml` in the user config directory (`~/.config/dtomap/`)
//!
//! Missing files fall back to defaults; command-line flags win over all of it.

use crate::cli::ConfigFormat;
use crate::error::{Error, Result};
use dtomap_core::{AbsentPolicy, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project config file names, in lookup order
const PROJECT_CONFIG_FILES: [&str; 4] = [".dtomap.toml", ".dtomap.yaml", ".dtomap.yml", ".dtomap.json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mapping engine switches
    pub engine: EngineConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LogSettings,

    /// Path settings
    pub paths: PathConfig,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json, json-pretty, ndjson, yaml)
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators for large batches
    pub progress: bool,
}

/// Logging configuration as written in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Record keys whose values are masked when records are logged
    pub redact_keys: Vec<String>,
}

/// Path configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Catalog used when `--catalog` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
            redact_keys: vec![
                "password".to_string(),
                "secret".to_string(),
                "token".to_string(),
                "api_key".to_string(),
            ],
        }
    }
}

/// Config file format implied by the file extension
fn format_for_path(path: &Path) -> Result<ConfigFormat> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "a .toml, .yaml or .json config file".to_string(),
        }),
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content, format_for_path(path)?)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(content: &str, format: ConfigFormat) -> std::result::Result<Self, String> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::find_project_config() {
            return Self::from_file(&path);
        }

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// First project config file in the working directory
    pub fn find_project_config() -> Option<PathBuf> {
        Self::find_project_config_in(Path::new("."))
    }

    fn find_project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Path of the user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dtomap").join("config.toml"))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if crate::cli::OutputFormat::from_name(&self.output.format).is_none() {
            return Err(Error::config(format!(
                "Unknown output format '{}'",
                self.output.format
            )));
        }
        if crate::logging::LogFormat::from_name(&self.logging.format).is_none() {
            return Err(Error::config(format!(
                "Unknown log format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Render the configuration in a config file format
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(format_for_path(path)?)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up a value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "engine.cache_enabled" => self.engine.cache_enabled.to_string(),
            "engine.null_triggers_default" => self.engine.null_triggers_default.to_string(),
            "engine.absent_fields" => match self.engine.absent_fields {
                AbsentPolicy::Null => "null".to_string(),
                AbsentPolicy::Omit => "omit".to_string(),
            },
            "output.format" => self.output.format.clone(),
            "output.color" => self.output.color.to_string(),
            "output.progress" => self.output.progress.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.format" => self.logging.format.clone(),
            "logging.file" => self
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "logging.redact_keys" => self.logging.redact_keys.join(","),
            "paths.catalog" => self
                .paths
                .catalog
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return Err(Error::config(format!("Unknown configuration key: {}", key))),
        };
        Ok(value)
    }
}
