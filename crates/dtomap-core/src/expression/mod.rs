//! Template expression mini-language
//!
//! Templates mix literal text with `{{ }}` blocks:
//!
//! ```text
//! {{ user.full_name | trim | ucfirst }}
//! {{ user.nickname ?? user.login | lower }}
//! Order #{{ order.id }} for {{ customer.name | default:'guest' }}
//! ```
//!
//! A template made of exactly one block evaluates to the block's value with
//! its type preserved; anything else is rendered to a string.
//!
//! # Module Organization
//!
//! - [`ast`] - expression tree and its template rendering
//! - [`parser`] - recursive descent parser
//! - [`eval`] - evaluation against an input container
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{format_literal, Expr};
pub use eval::EvalContext;
pub use parser::Parser;

use crate::error::BuildError;
use crate::filter::FilterRegistry;

/// Parse a template string, accepting any filter name
pub fn parse(template: &str) -> Result<Expr, BuildError> {
    Parser::new(template).parse()
}

/// Parse a template string, rejecting filters missing from `registry`
pub fn parse_with_filters(template: &str, registry: &FilterRegistry) -> Result<Expr, BuildError> {
    Parser::new(template).with_filters(registry).parse()
}
