//! Expression evaluation against an input container
//!
//! Evaluation yields `Ok(None)` when the expression is absent (a path that
//! does not resolve and no fallback). Filters are skipped for absent values
//! so that an enclosing `??` still sees the absence.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::ast::Expr;
use crate::filter::built_in::render_text;
use crate::filter::FilterRegistry;
use crate::path::Container;
use crate::{Error, Result};
use serde_json::Value;
use tracing::trace;

/// Per-field evaluation settings
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Target field the expression belongs to, for diagnostics
    pub field: &'a str,
    /// Registry that filter names are looked up in
    pub filters: &'a FilterRegistry,
    /// Whether an explicit `null` also triggers `??`
    pub null_triggers_default: bool,
}

impl<'a> EvalContext<'a> {
    /// Context with absent-only defaulting
    pub fn new(field: &'a str, filters: &'a FilterRegistry) -> Self {
        Self {
            field,
            filters,
            null_triggers_default: false,
        }
    }
}

impl Expr {
    /// Evaluate against `input`; `None` means absent
    pub fn evaluate<C: Container + ?Sized>(
        &self,
        input: &C,
        ctx: &EvalContext<'_>,
    ) -> Result<Option<Value>> {
        match self {
            Expr::Literal(value) => Ok(Some(value.clone())),
            Expr::Path(path) => Ok(path.resolve(input).cloned()),
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    if let Some(value) = part.evaluate(input, ctx)? {
                        out.push_str(&render_text(&value));
                    }
                }
                Ok(Some(Value::String(out)))
            }
            Expr::Filter { inner, name, args } => {
                let Some(value) = inner.evaluate(input, ctx)? else {
                    return Ok(None);
                };
                let filter = ctx
                    .filters
                    .get(name)
                    .map_err(|err| err.for_field(ctx.field))?;

                trace!(field = ctx.field, filter = %name, "applying template filter");
                filter
                    .apply(&value, args)
                    .map(Some)
                    .map_err(|source| Error::FilterExecution {
                        field: ctx.field.to_string(),
                        filter: name.clone(),
                        source,
                    })
            }
            Expr::Default { inner, fallback } => match inner.evaluate(input, ctx)? {
                Some(Value::Null) if ctx.null_triggers_default => fallback.evaluate(input, ctx),
                Some(value) => Ok(Some(value)),
                None => fallback.evaluate(input, ctx),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse;
    use serde_json::json;

    fn eval(template: &str, input: &Value) -> Result<Option<Value>> {
        let registry = FilterRegistry::with_builtins();
        let ctx = EvalContext::new("field", &registry);
        parse(template)?.evaluate(input, &ctx)
    }

    fn input() -> Value {
        json!({
            "user": {
                "id": 1,
                "full_name": "  john doe  ",
                "nick": null,
                "tags": ["x", "y"]
            }
        })
    }

    #[test]
    fn test_single_block_keeps_type() {
        assert_eq!(eval("{{ user.id }}", &input()).unwrap(), Some(json!(1)));
        assert_eq!(eval("{{ user.tags }}", &input()).unwrap(), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_concat_renders_text() {
        assert_eq!(
            eval("#{{ user.id }}: {{ user.nick }}{{ user.missing }} {{ user.tags }}", &input())
                .unwrap(),
            Some(json!("#1:  [\"x\",\"y\"]"))
        );
    }

    #[test]
    fn test_filters_apply_in_order() {
        assert_eq!(
            eval("{{ user.full_name | trim | ucfirst }}", &input()).unwrap(),
            Some(json!("John doe"))
        );
    }

    #[test]
    fn test_absent_skips_filters() {
        assert_eq!(eval("{{ user.email | lower }}", &input()).unwrap(), None);
        assert_eq!(
            eval("{{ user.email | lower ?? 'none' }}", &input()).unwrap(),
            Some(json!("none"))
        );
    }

    #[test]
    fn test_default_triggers_on_absent_only() {
        assert_eq!(
            eval("{{ user.email ?? 'anon' }}", &input()).unwrap(),
            Some(json!("anon"))
        );
        assert_eq!(eval("{{ user.nick ?? 'anon' }}", &input()).unwrap(), Some(Value::Null));
        assert_eq!(
            eval("{{ user.email ?? user.id }}", &input()).unwrap(),
            Some(json!(1))
        );
    }

    #[test]
    fn test_null_triggers_default_option() {
        let registry = FilterRegistry::with_builtins();
        let ctx = EvalContext {
            null_triggers_default: true,
            ..EvalContext::new("nick", &registry)
        };
        let expr = parse("{{ user.nick | default:'anon' }}").unwrap();
        assert_eq!(expr.evaluate(&input(), &ctx).unwrap(), Some(json!("anon")));
    }

    #[test]
    fn test_filter_failure_carries_field_and_filter() {
        let err = eval("{{ user.full_name | int }}", &input()).unwrap_err();
        match err {
            Error::FilterExecution { field, filter, .. } => {
                assert_eq!(field, "field");
                assert_eq!(filter, "int");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_filter_at_evaluation() {
        let err = eval("{{ user.id | shout }}", &input()).unwrap_err();
        assert!(matches!(
            err,
            Error::Build(crate::BuildError::FilterNotFound { ref field, .. })
                if field.as_deref() == Some("field")
        ));
    }
}
