//! Built-in filters
//!
//! String filters leave `null` and non-string values untouched so that a
//! global pipeline (e.g. `trim`) can run over every field regardless of type.
//! Conversion filters (`int`, `float`, `bool`, `date`, `json_decode`, ...)
//! fail on input they cannot convert.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use super::FilterRegistry;
use crate::case;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Register every built-in filter
pub fn register_all(registry: &mut FilterRegistry) {
    registry
        .register("trim", trim)
        .register("ltrim", |v: &Value, _: &[Value]| map_str(v, |s| s.trim_start().to_string()))
        .register("rtrim", |v: &Value, _: &[Value]| map_str(v, |s| s.trim_end().to_string()))
        .register("lower", |v: &Value, _: &[Value]| map_str(v, str::to_lowercase))
        .register("upper", |v: &Value, _: &[Value]| map_str(v, str::to_uppercase))
        .register("ucfirst", |v: &Value, _: &[Value]| map_str(v, case::upper_first))
        .register("lcfirst", |v: &Value, _: &[Value]| map_str(v, case::lower_first))
        .register("ucwords", |v: &Value, _: &[Value]| map_str(v, case::title_words))
        .register("snake", |v: &Value, _: &[Value]| map_str(v, case::snake))
        .register("camel", |v: &Value, _: &[Value]| map_str(v, case::camel))
        .register("kebab", |v: &Value, _: &[Value]| map_str(v, case::kebab))
        .register("slug", |v: &Value, _: &[Value]| map_str(v, case::slug))
        .register("replace", replace)
        .register("regex_replace", regex_replace)
        .register("substr", substr)
        .register("limit", limit)
        .register("prefix", prefix)
        .register("suffix", suffix)
        .register("pad_left", pad_left)
        .register("split", split)
        .register("join", join)
        .register("first", |v: &Value, _: &[Value]| Ok(pick(v, |items| items.first())))
        .register("last", |v: &Value, _: &[Value]| Ok(pick(v, |items| items.last())))
        .register("count", count)
        .register("int", to_int)
        .register("float", to_float)
        .register("bool", to_bool)
        .register("string", to_string)
        .register("round", round)
        .register("abs", abs)
        .register("json", |v: &Value, _: &[Value]| Ok(Value::String(serde_json::to_string(v)?)))
        .register("json_decode", json_decode)
        .register("date", date)
        .register("nullify", nullify)
        .register("default", default);
}

/// Render a scalar as text: strings verbatim, `null` as empty, others as JSON
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn map_str(value: &Value, f: impl Fn(&str) -> String) -> anyhow::Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    })
}

/// Map strings and numbers (rendered as text); pass everything else through
fn map_text(value: &Value, f: impl Fn(String) -> String) -> anyhow::Result<Value> {
    Ok(match value {
        Value::String(_) | Value::Number(_) => Value::String(f(render_text(value))),
        other => other.clone(),
    })
}

fn arg_str(args: &[Value], index: usize, name: &str) -> anyhow::Result<String> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => bail!("missing argument {} for '{}'", index + 1, name),
        Some(other) => Ok(other.to_string()),
    }
}

fn opt_arg_str(args: &[Value], index: usize) -> Option<String> {
    match args.get(index) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn arg_i64(args: &[Value], index: usize, name: &str) -> anyhow::Result<Option<i64>> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| anyhow!("argument {} for '{}' must be an integer", index + 1, name)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .with_context(|| format!("argument {} for '{}' must be an integer", index + 1, name)),
        Some(other) => bail!(
            "argument {} for '{}' must be an integer, got {}",
            index + 1,
            name,
            other
        ),
    }
}

fn float_value(f: f64) -> anyhow::Result<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("{} is not a finite number", f))
}

/// Truncated or rounded float as i64; fails outside the i64 range
fn float_to_i64(f: f64) -> anyhow::Result<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        bail!("{} is out of range for an integer", f)
    }
}

fn trim(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    match opt_arg_str(args, 0) {
        Some(chars) => map_str(value, |s| {
            s.trim_matches(|c: char| chars.contains(c)).to_string()
        }),
        None => map_str(value, |s| s.trim().to_string()),
    }
}

fn replace(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let from = arg_str(args, 0, "replace")?;
    let to = opt_arg_str(args, 1).unwrap_or_default();
    if from.is_empty() {
        bail!("'replace' needs a non-empty search string");
    }
    map_str(value, |s| s.replace(&from, &to))
}

fn cached_regex(pattern: &str) -> anyhow::Result<Regex> {
    static CACHE: OnceLock<DashMap<String, Regex>> = OnceLock::new();
    let cache = CACHE.get_or_init(DashMap::new);

    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).with_context(|| format!("invalid regex `{}`", pattern))?;
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn regex_replace(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let pattern = arg_str(args, 0, "regex_replace")?;
    let to = opt_arg_str(args, 1).unwrap_or_default();
    let regex = cached_regex(&pattern)?;
    map_str(value, |s| regex.replace_all(s, to.as_str()).into_owned())
}

fn substr(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let start = arg_i64(args, 0, "substr")?.unwrap_or(0);
    let len = arg_i64(args, 1, "substr")?;
    if matches!(len, Some(l) if l < 0) {
        bail!("'substr' length must not be negative");
    }

    map_str(value, |s| {
        let total = s.chars().count() as i64;
        let from = if start < 0 { (total + start).max(0) } else { start.min(total) };
        let take = len.unwrap_or(total - from).max(0);
        s.chars().skip(from as usize).take(take as usize).collect()
    })
}

fn limit(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let max = arg_i64(args, 0, "limit")?
        .ok_or_else(|| anyhow!("missing argument 1 for 'limit'"))?;
    if max < 0 {
        bail!("'limit' must not be negative");
    }
    let end = opt_arg_str(args, 1).unwrap_or_else(|| "...".to_string());

    map_str(value, |s| {
        if s.chars().count() as i64 <= max {
            s.to_string()
        } else {
            let mut out: String = s.chars().take(max as usize).collect();
            out.push_str(&end);
            out
        }
    })
}

fn prefix(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let prefix = arg_str(args, 0, "prefix")?;
    map_text(value, |s| format!("{}{}", prefix, s))
}

fn suffix(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let suffix = arg_str(args, 0, "suffix")?;
    map_text(value, |s| format!("{}{}", s, suffix))
}

fn pad_left(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let width = arg_i64(args, 0, "pad_left")?
        .ok_or_else(|| anyhow!("missing argument 1 for 'pad_left'"))?
        .max(0) as usize;
    let fill = opt_arg_str(args, 1)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ');

    map_text(value, |s| {
        let len = s.chars().count();
        if len >= width {
            s
        } else {
            let mut out: String = std::iter::repeat(fill).take(width - len).collect();
            out.push_str(&s);
            out
        }
    })
}

fn split(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let sep = opt_arg_str(args, 0).unwrap_or_else(|| ",".to_string());
    Ok(match value {
        Value::String(s) if s.is_empty() => Value::Array(Vec::new()),
        Value::String(s) => Value::Array(
            s.split(sep.as_str())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        other => other.clone(),
    })
}

fn join(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let sep = opt_arg_str(args, 0).unwrap_or_else(|| ",".to_string());
    Ok(match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(render_text)
                .collect::<Vec<_>>()
                .join(&sep),
        ),
        other => other.clone(),
    })
}

fn pick(value: &Value, f: impl Fn(&[Value]) -> Option<&Value>) -> Value {
    match value {
        Value::Array(items) => f(items).cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn count(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    let n = match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        Value::Null => 0,
        other => bail!("cannot count {}", other),
    };
    Ok(Value::from(n))
}

fn to_int(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        // integers above i64::MAX are already integers
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => {
            let f = n
                .as_f64()
                .ok_or_else(|| anyhow!("cannot convert {} to an integer", n))?;
            Ok(Value::from(float_to_i64(f.trunc())?))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            if let Ok(u) = trimmed.parse::<u64>() {
                return Ok(Value::from(u));
            }
            let f = trimmed
                .parse::<f64>()
                .map_err(|_| anyhow!("cannot convert \"{}\" to an integer", s))?;
            float_to_i64(f.trunc())
                .map(Value::from)
                .with_context(|| format!("cannot convert \"{}\" to an integer", s))
        }
        other => bail!("cannot convert {} to an integer", other),
    }
}

fn to_float(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => float_value(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("cannot convert {} to a float", n))
            .and_then(float_value),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("cannot convert \"{}\" to a float", s))
            .and_then(float_value),
        other => bail!("cannot convert {} to a float", other),
    }
}

fn to_bool(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().map_or(false, |f| f != 0.0))),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
            "false" | "no" | "0" | "off" | "" => Ok(Value::Bool(false)),
            _ => bail!("cannot convert \"{}\" to a boolean", s),
        },
        other => bail!("cannot convert {} to a boolean", other),
    }
}

fn to_string(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    Ok(match value {
        Value::Null => Value::Null,
        other => Value::String(render_text(other)),
    })
}

fn round(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    let precision = arg_i64(args, 0, "round")?.unwrap_or(0);
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => {
            if precision <= 0 && (n.is_i64() || n.is_u64()) {
                return Ok(value.clone());
            }
            let f = n.as_f64().ok_or_else(|| anyhow!("cannot round {}", n))?;
            if precision <= 0 {
                return Ok(Value::from(float_to_i64(f.round())?));
            }
            let factor = 10f64.powi(precision.min(15) as i32);
            float_value((f * factor).round() / factor)
        }
        other => bail!("cannot round {}", other),
    }
}

fn abs(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i.unsigned_abs()))
            } else if n.is_u64() {
                Ok(value.clone())
            } else {
                let f = n.as_f64().ok_or_else(|| anyhow!("cannot take abs of {}", n))?;
                float_value(f.abs())
            }
        }
        other => bail!("cannot take abs of {}", other),
    }
}

fn json_decode(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => {
            serde_json::from_str(s).with_context(|| format!("invalid JSON text \"{}\"", s))
        }
        other => Ok(other.clone()),
    }
}

fn midnight(date: NaiveDate) -> anyhow::Result<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid date {}", date))
}

fn parse_datetime(value: &Value, input_format: Option<&str>) -> anyhow::Result<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| anyhow!("invalid timestamp {}", n))?;
            DateTime::<Utc>::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| anyhow!("timestamp {} out of range", secs))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Some(format) = input_format {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Ok(dt);
                }
                let date = NaiveDate::parse_from_str(s, format)
                    .with_context(|| format!("\"{}\" does not match format \"{}\"", s, format))?;
                return midnight(date);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.naive_utc());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(dt);
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("cannot parse \"{}\" as a date", s))?;
            midnight(date)
        }
        other => bail!("cannot parse {} as a date", other),
    }
}

fn date(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let format = arg_str(args, 0, "date")?;
    let input_format = opt_arg_str(args, 1);
    let parsed = parse_datetime(value, input_format.as_deref())?;

    let mut out = String::new();
    write!(out, "{}", parsed.format(&format))
        .map_err(|_| anyhow!("invalid date format \"{}\"", format))?;
    Ok(Value::String(out))
}

fn nullify(value: &Value, _args: &[Value]) -> anyhow::Result<Value> {
    Ok(match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        other => other.clone(),
    })
}

fn default(value: &Value, args: &[Value]) -> anyhow::Result<Value> {
    Ok(match value {
        Value::Null => args.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    })
}
