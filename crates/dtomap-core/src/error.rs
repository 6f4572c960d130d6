//! Error types for the dtomap core library
//!
//! Plan-build failures ([`BuildError`]) are kept separate from the top-level
//! [`Error`] because they are cached as permanent failures for a plan key and
//! therefore need to be cheaply cloneable. Runtime failures (a filter raising
//! on a particular input) are never cached.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dtomap operations
#[derive(Error, Debug)]
pub enum Error {
    /// The mapping plan could not be built (bad template or unknown filter)
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A filter raised while transforming a field value
    #[error("Filter '{filter}' failed on field '{field}': {source}")]
    FilterExecution {
        field: String,
        filter: String,
        #[source]
        source: anyhow::Error,
    },

    /// No descriptor is registered for the requested target type
    #[error("Unknown target type: {type_id}")]
    UnknownType { type_id: String },

    /// A type catalog could not be loaded or is inconsistent
    #[error("Catalog error: {message}")]
    Catalog {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures detected while building a mapping plan.
///
/// These depend only on the type descriptor and the call overrides, never on
/// input data, so the plan cache stores them for the key that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildError {
    /// Malformed template expression
    #[error("Expression syntax error{} at position {position}: {message} in `{expression}`", field_suffix(.field))]
    ExpressionSyntax {
        message: String,
        position: usize,
        expression: String,
        field: Option<String>,
    },

    /// A filter name that is not present in the registry
    #[error("Filter not found: '{name}'{}", field_suffix(.field))]
    FilterNotFound { name: String, field: Option<String> },

    /// A filter reference written in text form could not be read
    #[error("Invalid filter reference `{reference}`: {message}")]
    InvalidFilterSpec { reference: String, message: String },
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(name) => format!(" (field '{}')", name),
        None => String::new(),
    }
}

impl BuildError {
    /// Create a syntax error at the given byte position of `expression`
    pub fn syntax(
        message: impl Into<String>,
        position: usize,
        expression: impl Into<String>,
    ) -> Self {
        Self::ExpressionSyntax {
            message: message.into(),
            position,
            expression: expression.into(),
            field: None,
        }
    }

    /// Create an unknown-filter error
    pub fn filter_not_found(name: impl Into<String>) -> Self {
        Self::FilterNotFound {
            name: name.into(),
            field: None,
        }
    }

    /// Attach the target field the failing expression belongs to
    pub fn for_field(mut self, name: &str) -> Self {
        match &mut self {
            Self::ExpressionSyntax { field, .. } | Self::FilterNotFound { field, .. } => {
                if field.is_none() {
                    *field = Some(name.to_string());
                }
            }
            Self::InvalidFilterSpec { .. } => {}
        }
        self
    }

    /// Target field the error was raised for, if known
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ExpressionSyntax { field, .. } | Self::FilterNotFound { field, .. } => {
                field.as_deref()
            }
            Self::InvalidFilterSpec { .. } => None,
        }
    }
}

impl Error {
    /// Create a catalog error without an underlying cause
    pub fn catalog(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Catalog {
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error was raised while building a plan
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Short machine-readable category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Build(BuildError::ExpressionSyntax { .. }) => ErrorKind::ExpressionSyntax,
            Self::Build(BuildError::FilterNotFound { .. }) => ErrorKind::FilterNotFound,
            Self::Build(BuildError::InvalidFilterSpec { .. }) => ErrorKind::ExpressionSyntax,
            Self::FilterExecution { .. } => ErrorKind::FilterExecution,
            Self::UnknownType { .. } => ErrorKind::UnknownType,
            Self::Catalog { .. } => ErrorKind::Catalog,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Json { .. } | Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Error categories, mostly useful for diagnostics output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ExpressionSyntax,
    FilterNotFound,
    FilterExecution,
    UnknownType,
    Catalog,
    Configuration,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ExpressionSyntax => write!(f, "expression_syntax"),
            ErrorKind::FilterNotFound => write!(f, "filter_not_found"),
            ErrorKind::FilterExecution => write!(f, "filter_execution"),
            ErrorKind::UnknownType => write!(f, "unknown_type"),
            ErrorKind::Catalog => write!(f, "catalog"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Io => write!(f, "io"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
