//! Output formatting and writing utilities
//!
//! This module formats mapped records, resolved plans, check reports and
//! cache statistics in the selected output format (human, JSON, NDJSON,
//! YAML) and writes them with optional colors and progress indicators.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use dtomap_core::{CacheStats, ResolvedMappingPlan, SourceKind};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::trace;

/// Serializable view of a resolved plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    #[serde(rename = "type")]
    pub type_id: String,
    pub fingerprint: String,
    pub fields: Vec<PlannedFieldSummary>,
    pub pipeline: Vec<String>,
}

/// Serializable view of one planned field
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFieldSummary {
    pub name: String,
    pub source: SourceKind,
    pub expression: String,
    pub filters: Vec<String>,
}

impl From<&ResolvedMappingPlan> for PlanSummary {
    fn from(plan: &ResolvedMappingPlan) -> Self {
        Self {
            type_id: plan.type_id().to_string(),
            fingerprint: plan.fingerprint().to_string(),
            fields: plan
                .fields()
                .iter()
                .map(|field| PlannedFieldSummary {
                    name: field.name.clone(),
                    source: field.source.kind(),
                    expression: field.source.to_string(),
                    filters: field
                        .field_filters
                        .iter()
                        .map(|f| f.spec().to_string())
                        .collect(),
                })
                .collect(),
            pipeline: plan.pipeline().iter().map(|f| f.spec().to_string()).collect(),
        }
    }
}

/// Outcome of building one type's default plan
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    #[serde(rename = "type")]
    pub type_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a resolved plan
    fn format_plan(&self, plan: &PlanSummary) -> Result<String>;

    /// Format plan cache statistics
    fn format_stats(&self, stats: &CacheStats) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Ndjson => format_ndjson(&serde_json::to_value(value)?),
        }
    }

    fn format_plan(&self, plan: &PlanSummary) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_plan_human(plan)),
            _ => self.format(plan),
        }
    }

    fn format_stats(&self, stats: &CacheStats) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_stats_human(stats)),
            _ => {
                let value = serde_json::json!({
                    "size": stats.size,
                    "hits": stats.hits,
                    "misses": stats.misses,
                    "hit_rate": stats.hit_rate(),
                });
                self.format(&value)
            }
        }
    }
}

/// Arrays become one compact document per line; anything else a single line
fn format_ndjson(value: &Value) -> Result<String> {
    match value {
        Value::Array(items) => {
            let lines = items
                .iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        }
        other => Ok(serde_json::to_string(other)?),
    }
}

fn format_plan_human(plan: &PlanSummary) -> String {
    let mut out = format!("Plan for {} ({})\n", plan.type_id, &plan.fingerprint[..plan.fingerprint.len().min(12)]);

    let name_width = plan.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    for field in &plan.fields {
        out.push_str(&format!(
            "  {:width$}  {:10}  {}",
            field.name,
            field.source.to_string(),
            field.expression,
            width = name_width
        ));
        if !field.filters.is_empty() {
            out.push_str(&format!("  | {}", field.filters.join(" | ")));
        }
        out.push('\n');
    }

    if !plan.pipeline.is_empty() {
        out.push_str(&format!("Pipeline: {}\n", plan.pipeline.join(" | ")));
    }

    out.trim_end().to_string()
}

fn format_stats_human(stats: &CacheStats) -> String {
    format!(
        "Plans cached: {}\nHits: {}\nMisses: {}\nHit rate: {:.1}%",
        stats.size,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    )
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            verbose,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Suppress progress indicators when `enabled` is false
    pub fn set_progress(&mut self, enabled: bool) {
        self.show_progress = self.show_progress && enabled;
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Writing data");
        self.writeln(formatted.trim_end())
    }

    /// Write a resolved plan
    pub fn plan(&mut self, plan: &ResolvedMappingPlan) -> Result<()> {
        let formatted = self.format.format_plan(&PlanSummary::from(plan))?;
        self.writeln(formatted.trim_end())
    }

    /// Write plan cache statistics
    pub fn stats(&mut self, stats: &CacheStats) -> Result<()> {
        let formatted = self.format.format_stats(stats)?;
        self.writeln(formatted.trim_end())
    }

    /// Write check results; human output is one line per type
    pub fn check_report(&mut self, entries: &[CheckEntry]) -> Result<()> {
        if !self.is_human() {
            return self.data(&entries);
        }

        for entry in entries {
            match (&entry.error, entry.fields) {
                (None, fields) => {
                    let line = format!("✓ {} ({} fields)", entry.type_id, fields.unwrap_or(0));
                    if self.use_color {
                        self.writeln(&line.green().to_string())?;
                    } else {
                        self.writeln(&line)?;
                    }
                }
                (Some(error), _) => {
                    let line = format!("✗ {}: {}", entry.type_id, error);
                    if self.use_color {
                        self.writeln(&line.red().to_string())?;
                    } else {
                        self.writeln(&line)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Create a progress bar for long batches
    pub fn progress_bar(&self, length: u64, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(length);
        pb.set_style(default_progress_style());
        pb.set_message(message.to_string());
        Some(pb)
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Write debug information if verbose mode is enabled
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose > 0 && self.is_human() {
            if self.use_color {
                self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
            } else {
                self.writeln(&format!("DEBUG: {}", message))
            }
        } else {
            Ok(())
        }
    }
}

/// Progress bar style for record batches
pub fn default_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Spinner style for catalog loading
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
