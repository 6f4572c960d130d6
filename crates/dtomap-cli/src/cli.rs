//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// dtomap - template-driven mapping of nested records into flat field maps
///
/// Loads type descriptors from a catalog, resolves a mapping plan per type
/// and call overrides, and applies it to JSON/YAML/NDJSON input.
#[derive(Parser, Debug)]
#[command(
    name = "dtomap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "DTOMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map input records into the field map of a catalog type
    Map(MapArgs),

    /// Build the default plan of every catalog type and report failures
    Check(CheckArgs),

    /// Show the resolved mapping plan of a type
    Plan(PlanArgs),

    /// List the registered filters
    Filters,

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Catalog and type selection shared by several commands
#[derive(Parser, Debug, Clone)]
pub struct CatalogArgs {
    /// Type catalog (YAML or JSON); falls back to `paths.catalog` from the config
    #[arg(long, value_name = "CATALOG")]
    pub catalog: Option<PathBuf>,
}

/// Per-call overrides given on the command line
#[derive(Parser, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Template file (YAML or JSON object of field -> expression)
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Field filter, `field=filter[:arg...]` (repeatable, applied in order)
    #[arg(long = "field-filter", value_name = "FIELD=FILTER")]
    pub field_filters: Vec<String>,

    /// Pipeline filter applied to every field (repeatable, applied in order)
    #[arg(long = "pipeline", value_name = "FILTER")]
    pub pipeline: Vec<String>,
}

/// Arguments for the map command
#[derive(Parser, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Target type id
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_id: String,

    /// Input file: one record, an array of records, or NDJSON (stdin if omitted or `-`)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Treat the input as newline-delimited JSON
    #[arg(long)]
    pub ndjson: bool,

    /// Leave absent fields out of the output instead of emitting null
    #[arg(long)]
    pub omit_absent: bool,

    /// Let explicit null values trigger `??` and `| default`
    #[arg(long)]
    pub null_default: bool,

    /// Print plan cache statistics after the batch
    #[arg(long)]
    pub stats: bool,

    /// Output file path (stdout if not specified)
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Check only this type
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_id: Option<String>,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Target type id
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_id: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Get a single configuration value
    Get(ConfigGetArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Write the user config instead of `.dtomap.toml` in the working directory
    #[arg(long)]
    pub user: bool,

    /// Force overwrite of an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Arguments for config get
#[derive(Parser, Debug)]
pub struct ConfigGetArgs {
    /// Configuration key (e.g., engine.cache_enabled, paths.catalog)
    pub key: String,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// One JSON document per line
    Ndjson,
    /// YAML output
    Yaml,
}

impl OutputFormat {
    /// Parse the name used in configuration files
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "json-pretty" | "json_pretty" => Some(Self::JsonPretty),
            "ndjson" => Some(Self::Ndjson),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_map_arguments() {
        let cli = Cli::parse_from([
            "dtomap",
            "map",
            "--catalog",
            "types.yaml",
            "--type",
            "User",
            "--field-filter",
            "email=lower",
            "--field-filter",
            "name=trim",
            "--pipeline",
            "trim",
            "--stats",
            "input.json",
        ]);

        match cli.command {
            Commands::Map(args) => {
                assert_eq!(args.type_id, "User");
                assert_eq!(args.catalog.catalog, Some(PathBuf::from("types.yaml")));
                assert_eq!(args.input, Some(PathBuf::from("input.json")));
                assert_eq!(args.overrides.field_filters, vec!["email=lower", "name=trim"]);
                assert_eq!(args.overrides.pipeline, vec!["trim"]);
                assert!(args.stats);
                assert!(!args.ndjson);
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["dtomap", "-vv", "filters"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["dtomap", "--quiet", "filters"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_name("ndjson"), Some(OutputFormat::Ndjson));
        assert_eq!(OutputFormat::from_name("xml"), None);
    }
}
