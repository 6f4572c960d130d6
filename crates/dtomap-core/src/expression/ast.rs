//! Abstract syntax tree for template expressions
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use crate::path::PathExpr;
use serde_json::Value;
use std::fmt;

/// A parsed template expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant value: free text outside blocks, or a quoted/keyword literal
    Literal(Value),
    /// Reference into the input container
    Path(PathExpr),
    /// Text and blocks rendered and joined in order
    Concat(Vec<Expr>),
    /// `inner | name:arg:arg`
    Filter {
        inner: Box<Expr>,
        name: String,
        args: Vec<Value>,
    },
    /// `inner ?? fallback`, also produced by `inner | default:value`
    Default {
        inner: Box<Expr>,
        fallback: Box<Expr>,
    },
}

impl Expr {
    /// Literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Path reference expression
    pub fn path(path: PathExpr) -> Self {
        Expr::Path(path)
    }

    /// Names of every filter referenced, in evaluation order
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_filter_names(&mut names);
        names
    }

    fn collect_filter_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) | Expr::Path(_) => {}
            Expr::Concat(parts) => parts.iter().for_each(|p| p.collect_filter_names(names)),
            Expr::Filter { inner, name, .. } => {
                inner.collect_filter_names(names);
                names.push(name);
            }
            Expr::Default { inner, fallback } => {
                inner.collect_filter_names(names);
                fallback.collect_filter_names(names);
            }
        }
    }

    /// Render back to template syntax.
    ///
    /// Text parts are emitted verbatim and everything else is wrapped in a
    /// `{{ }}` block, so the output parses back to an equivalent expression.
    pub fn to_template(&self) -> String {
        match self {
            Expr::Literal(Value::String(text)) => text.clone(),
            Expr::Concat(parts) => parts.iter().map(Expr::to_template).collect(),
            other => format!("{{{{ {} }}}}", other),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", format_literal(value)),
            Expr::Path(path) => write!(f, "{}", path),
            Expr::Concat(_) => write!(f, "{}", self.to_template()),
            Expr::Filter { inner, name, args } => {
                write!(f, "{} | {}", inner, name)?;
                for arg in args {
                    write!(f, ":{}", format_literal(arg))?;
                }
                Ok(())
            }
            Expr::Default { inner, fallback } => write!(f, "{} ?? {}", inner, fallback),
        }
    }
}

/// Format a literal value the way it is written inside a block
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('\'');
            for ch in s.chars() {
                if ch == '\'' || ch == '\\' {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('\'');
            out
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Expr {
        Expr::Path(PathExpr::parse(p).unwrap())
    }

    #[test]
    fn test_format_literal() {
        assert_eq!(format_literal(&json!("it's")), r"'it\'s'");
        assert_eq!(format_literal(&json!(3)), "3");
        assert_eq!(format_literal(&Value::Null), "null");
    }

    #[test]
    fn test_display_filter_chain() {
        let expr = Expr::Default {
            inner: Box::new(Expr::Filter {
                inner: Box::new(path("user.name")),
                name: "substr".to_string(),
                args: vec![json!(0), json!(3)],
            }),
            fallback: Box::new(Expr::literal("n/a")),
        };
        assert_eq!(expr.to_string(), "user.name | substr:0:3 ?? 'n/a'");
        assert_eq!(expr.to_template(), "{{ user.name | substr:0:3 ?? 'n/a' }}");
        assert_eq!(expr.filter_names(), vec!["substr"]);
    }

    #[test]
    fn test_concat_to_template() {
        let expr = Expr::Concat(vec![
            path("first"),
            Expr::literal(" "),
            path("last"),
        ]);
        assert_eq!(expr.to_template(), "{{ first }} {{ last }}");
    }
}
