//! Template expression parser
//!
//! Recursive descent over the template text. Everything outside `{{ }}` is
//! literal text; inside a block the grammar is
//!
//! ```text
//! block    := chain
//! chain    := primary ('|' filter)* ('??' chain)?
//! filter   := ident (':' arg)*
//! primary  := quoted-string | path            (head of a block)
//!           | quoted-string | keyword | number | path   (after '??')
//! arg      := quoted-string | keyword | number | bare-word
//! ```
//!
//! Positions in errors are byte offsets into the template string.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::ast::Expr;
use crate::error::BuildError;
use crate::filter::FilterRegistry;
use crate::path::PathExpr;
use serde_json::{Number, Value};
use std::iter::Peekable;
use std::str::Chars;

/// Characters that end a bare word inside a block
const WORD_STOP: &[char] = &['|', '}', '?', ':'];

/// Template expression parser
pub struct Parser<'a> {
    /// Input string being parsed
    input: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input
    position: usize,
    /// Registry used to reject unknown filters while parsing
    filters: Option<&'a FilterRegistry>,
}

impl<'a> Parser<'a> {
    /// Create a parser that accepts any filter name
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            filters: None,
        }
    }

    /// Reject filter names that are not registered in `registry`
    pub fn with_filters(mut self, registry: &'a FilterRegistry) -> Self {
        self.filters = Some(registry);
        self
    }

    /// Parse the whole template string
    pub fn parse(mut self) -> Result<Expr, BuildError> {
        let mut parts = Vec::new();
        let mut text = String::new();

        while let Some(ch) = self.current_char() {
            if self.lookahead("{{") {
                let start = self.position;
                self.advance();
                self.advance();
                if !text.is_empty() {
                    parts.push(Expr::Literal(Value::String(std::mem::take(&mut text))));
                }
                parts.push(self.parse_block(start)?);
            } else {
                text.push(ch);
                self.advance();
            }
        }

        if !text.is_empty() || parts.is_empty() {
            parts.push(Expr::Literal(Value::String(text)));
        }

        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Concat(parts)
        })
    }

    /// Parse the contents of a block; `{{` has been consumed
    fn parse_block(&mut self, start: usize) -> Result<Expr, BuildError> {
        self.skip_whitespace();

        if self.lookahead("}}") {
            return Err(self.error("Empty expression block", start));
        }
        if self.is_at_end() {
            return Err(self.error("Unterminated expression block", start));
        }

        let expr = self.parse_chain(start, false)?;
        self.skip_whitespace();

        if self.lookahead("}}") {
            self.advance();
            self.advance();
            return Ok(expr);
        }

        match self.current_char() {
            Some(ch) => Err(self.error(format!("Unexpected character '{}'", ch), self.position)),
            None => Err(self.error("Unterminated expression block", start)),
        }
    }

    /// Parse `primary ('|' filter)* ('??' chain)?`
    fn parse_chain(&mut self, start: usize, fallback: bool) -> Result<Expr, BuildError> {
        let mut expr = self.parse_primary(start, fallback)?;

        loop {
            self.skip_whitespace();
            if self.current_char() != Some('|') {
                break;
            }
            let pipe = self.position;
            self.advance();
            expr = self.parse_filter(expr, pipe)?;
        }

        self.skip_whitespace();
        if self.lookahead("??") {
            let operator = self.position;
            self.advance();
            self.advance();
            self.skip_whitespace();
            if self.is_at_end() || self.lookahead("}}") {
                return Err(self.error("Expected fallback after '??'", operator));
            }
            let fallback = self.parse_chain(start, true)?;
            expr = Expr::Default {
                inner: Box::new(expr),
                fallback: Box::new(fallback),
            };
        }

        Ok(expr)
    }

    /// Parse the head of a chain: a quoted literal or a path.
    ///
    /// In fallback position keywords and numbers are literals too.
    fn parse_primary(&mut self, start: usize, fallback: bool) -> Result<Expr, BuildError> {
        self.skip_whitespace();

        match self.current_char() {
            Some('\'') | Some('"') => Ok(Expr::Literal(Value::String(self.parse_quoted_string()?))),
            None => Err(self.error("Unterminated expression block", start)),
            Some(ch) if WORD_STOP.contains(&ch) => Err(self.error(
                format!("Expected path or literal, found '{}'", ch),
                self.position,
            )),
            Some(_) => {
                let word_start = self.position;
                let word = self.parse_word();
                if fallback {
                    if let Some(value) = keyword_or_number(&word) {
                        return Ok(Expr::Literal(value));
                    }
                }
                PathExpr::parse(&word)
                    .map(Expr::Path)
                    .map_err(|err| self.error(err.message, word_start + err.offset))
            }
        }
    }

    /// Parse `name (':' arg)*` after a `|`
    fn parse_filter(&mut self, inner: Expr, pipe: usize) -> Result<Expr, BuildError> {
        self.skip_whitespace();
        let name_start = self.position;
        let name = self
            .parse_identifier()
            .ok_or_else(|| self.error("Expected filter name after '|'", pipe))?;
        let args = self.parse_args()?;

        if name == "default" {
            if args.len() != 1 {
                return Err(self.error("'default' takes exactly one argument", name_start));
            }
            let fallback = args.into_iter().next().unwrap_or(Value::Null);
            return Ok(Expr::Default {
                inner: Box::new(inner),
                fallback: Box::new(Expr::Literal(fallback)),
            });
        }

        if let Some(registry) = self.filters {
            if !registry.contains(&name) {
                return Err(BuildError::filter_not_found(name));
            }
        }

        Ok(Expr::Filter {
            inner: Box::new(inner),
            name,
            args,
        })
    }

    /// Parse `(':' arg)*`
    fn parse_args(&mut self) -> Result<Vec<Value>, BuildError> {
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            if self.current_char() != Some(':') {
                return Ok(args);
            }
            let colon = self.position;
            self.advance();
            self.skip_whitespace();
            args.push(self.parse_arg(colon)?);
        }
    }

    fn parse_arg(&mut self, colon: usize) -> Result<Value, BuildError> {
        match self.current_char() {
            Some('\'') | Some('"') => Ok(Value::String(self.parse_quoted_string()?)),
            Some(ch) if !ch.is_whitespace() && !WORD_STOP.contains(&ch) => {
                let word = self.parse_word();
                Ok(keyword_or_number(&word).unwrap_or(Value::String(word)))
            }
            _ => Err(self.error("Expected argument after ':'", colon)),
        }
    }

    /// Parse `[A-Za-z_][A-Za-z0-9_]*`
    fn parse_identifier(&mut self) -> Option<String> {
        match self.current_char() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
            _ => return None,
        }

        let mut ident = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Some(ident)
    }

    /// Read until whitespace or a structural character
    fn parse_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || WORD_STOP.contains(&ch) {
                break;
            }
            word.push(ch);
            self.advance();
        }
        word
    }

    /// Parse a single- or double-quoted string; `\` escapes the next character
    fn parse_quoted_string(&mut self) -> Result<String, BuildError> {
        let start = self.position;
        let quote = self.advance().unwrap_or('\'');
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some(ch) => value.push(ch),
                None => break,
            }
        }

        Err(self.error("Unterminated string literal", start))
    }

    fn lookahead(&self, expected: &str) -> bool {
        self.input[self.position..].starts_with(expected)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn is_at_end(&mut self) -> bool {
        self.current_char().is_none()
    }

    fn error(&self, message: impl Into<String>, position: usize) -> BuildError {
        BuildError::syntax(message, position, self.input)
    }
}

/// `true`, `false`, `null` or a number
fn keyword_or_number(word: &str) -> Option<Value> {
    match word {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }

    if let Ok(i) = word.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = word.parse::<u64>() {
        return Some(Value::from(u));
    }
    if word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        if let Ok(f) = word.parse::<f64>() {
            return Number::from_f64(f).map(Value::Number);
        }
    }
    None
}

/// Parse a filter reference in text form: `name(:arg)*`
pub fn parse_filter_reference(text: &str) -> Result<(String, Vec<Value>), BuildError> {
    let invalid = |message: String| BuildError::InvalidFilterSpec {
        reference: text.to_string(),
        message,
    };

    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    let name = parser
        .parse_identifier()
        .ok_or_else(|| invalid(format!("expected filter name at position {}", parser.position)))?;
    let args = parser.parse_args().map_err(|err| match err {
        BuildError::ExpressionSyntax {
            message, position, ..
        } => invalid(format!("{} at position {}", message, position)),
        other => other,
    })?;

    parser.skip_whitespace();
    if let Some(ch) = parser.current_char() {
        return Err(invalid(format!(
            "unexpected character '{}' at position {}",
            ch, parser.position
        )));
    }

    Ok((name, args))
}
