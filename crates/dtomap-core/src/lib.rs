//! Dtomap Core - template mapping and filter pipeline engine
//!
//! This crate turns heterogeneous nested input (JSON payloads, entity
//! adapters, plain maps) into the raw field map of a registered target type.
//! Each field is read from exactly one of three sources, chosen once per call:
//! an explicit template, the field's declared source path, or a same-name
//! convention lookup.
//!
//! # Main Components
//!
//! - **Path Resolution**: dot paths over nested containers, absent vs. `null`
//! - **Expressions**: the `{{ path | filter:arg ?? fallback }}` mini-language
//! - **Filters**: named, parameterized value transformations
//! - **Pipeline**: field filters followed by type-wide pipeline filters
//! - **Plans**: per-call source resolution, memoized in a concurrent cache
//!
//! # Example
//!
//! ```
//! use dtomap_core::{Engine, Overrides, TypeDescriptor};
//! use serde_json::json;
//!
//! let user = TypeDescriptor::builder("User")
//!     .field("id")
//!     .field("name")
//!     .field("email")
//!     .pipeline("trim")
//!     .build()?;
//! let engine = Engine::builder().register_type(user).build()?;
//!
//! let input = json!({"user": {"id": 1, "full_name": "  john doe  ", "email": "JOHN@X.COM"}});
//! let overrides = Overrides::new()
//!     .template("id", "{{user.id}}")
//!     .template("name", "{{user.full_name|trim|ucfirst}}")
//!     .template("email", "{{user.email|lower}}");
//!
//! let out = engine.resolve("User", &input, &overrides)?;
//! assert_eq!(serde_json::Value::Object(out), json!({"id": 1, "name": "John doe", "email": "john@x.com"}));
//! # Ok::<(), dtomap_core::Error>(())
//! ```

pub mod case;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod expression;
pub mod filter;
pub mod path;
pub mod pipeline;
pub mod plan;

// Re-export main types for convenience
pub use descriptor::{FieldDescriptor, NamingStrategy, TemplateDefinition, TypeDescriptor};
pub use engine::{global, AbsentPolicy, Engine, EngineBuilder, EngineConfig};
pub use error::{BuildError, Error, ErrorKind, Result};
pub use expression::Expr;
pub use filter::{FilterRegistry, FilterSpec};
pub use path::{Container, PathExpr, Resolution};
pub use pipeline::PipelineExecutor;
pub use plan::{CacheStats, FieldSource, Overrides, ResolvedMappingPlan, SourceKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
