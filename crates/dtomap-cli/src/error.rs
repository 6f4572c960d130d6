//! Error types and handling for the CLI
//!
//! This module provides error types, exit codes, and user-facing formatting
//! for the failure modes of the dtomap CLI.

use colored::Colorize;
use dtomap_core::BuildError;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the dtomap-core library
    #[error("{0}")]
    Core(#[from] dtomap_core::Error),

    /// A single input record failed to map
    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: dtomap_core::Error,
    },

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// One or more catalog types failed to build
    #[error("{failed} of {total} type(s) failed to build")]
    CheckFailed { failed: usize, total: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) | Self::Record { .. } => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::CheckFailed { .. } => 7,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// The underlying core error, if any
    fn core(&self) -> Option<&dtomap_core::Error> {
        match self {
            Self::Core(err) | Self::Record { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Format an error for display to the user
///
/// Template syntax errors get the offending expression echoed back with a
/// caret under the failing position.
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut message = if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    if let Some(dtomap_core::Error::Build(BuildError::ExpressionSyntax {
        expression,
        position,
        ..
    })) = error.core()
    {
        message.push('\n');
        message.push_str(&syntax_snippet(expression, *position, use_color));
    }

    message
}

/// Render `expression` with a caret under byte offset `position`
pub fn syntax_snippet(expression: &str, position: usize, use_color: bool) -> String {
    let column = expression
        .get(..position)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| expression.chars().count());
    let caret = format!("{}^", " ".repeat(column));
    let caret = if use_color {
        caret.red().bold().to_string()
    } else {
        caret
    };
    format!("    {}\n    {}", expression, caret)
}
