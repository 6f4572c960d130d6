//! Dot-path resolution over nested containers
//!
//! A path such as `user.addresses.0.city` is split on `.`; a segment made only
//! of ASCII digits indexes a sequence, any other segment is a map key.
//! Resolution is total: a missing key, an out-of-range index or an attempt to
//! descend into a scalar yields [`Resolution::Absent`], never an error. A key
//! that is present with a `null` value yields `Found(&Value::Null)`.
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Outcome of resolving a path against a container
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The path exists; the value may be `null`
    Found(&'a Value),
    /// Some segment of the path does not exist
    Absent,
}

impl<'a> Resolution<'a> {
    /// Whether the path did not resolve
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolution::Absent)
    }

    /// The resolved value, if any
    pub fn found(&self) -> Option<&'a Value> {
        match self {
            Resolution::Found(value) => Some(value),
            Resolution::Absent => None,
        }
    }

    /// Clone the resolved value out of the container
    pub fn cloned(&self) -> Option<Value> {
        self.found().cloned()
    }
}

/// A readable nested container that a path can be resolved against.
///
/// Implemented for JSON values and the common map/sequence shapes. Entity
/// adapters implement it to expose their attributes without first converting
/// the whole entity to JSON; only the root needs to implement this trait,
/// nested values are plain [`Value`]s.
pub trait Container {
    /// Look up a map/object key
    fn get_key(&self, key: &str) -> Option<&Value>;

    /// Look up a sequence index
    fn get_index(&self, index: usize) -> Option<&Value>;
}

impl Container for Value {
    fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }
}

impl Container for Map<String, Value> {
    fn get_key(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn get_index(&self, _index: usize) -> Option<&Value> {
        None
    }
}

impl Container for HashMap<String, Value> {
    fn get_key(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn get_index(&self, _index: usize) -> Option<&Value> {
        None
    }
}

impl Container for BTreeMap<String, Value> {
    fn get_key(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn get_index(&self, _index: usize) -> Option<&Value> {
        None
    }
}

impl Container for Vec<Value> {
    fn get_key(&self, _key: &str) -> Option<&Value> {
        None
    }

    fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(index)
    }
}

impl Container for [Value] {
    fn get_key(&self, _key: &str) -> Option<&Value> {
        None
    }

    fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(index)
    }
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Map/object key
    Key(String),
    /// Sequence index; `raw` keeps the text so maps with numeric keys still resolve
    Index { index: usize, raw: String },
}

impl Segment {
    fn from_text(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = text.parse::<usize>() {
                return Segment::Index {
                    index,
                    raw: text.to_string(),
                };
            }
        }
        Segment::Key(text.to_string())
    }

    fn lookup<'a, C: Container + ?Sized>(&self, container: &'a C) -> Option<&'a Value> {
        match self {
            Segment::Key(key) => container.get_key(key),
            Segment::Index { index, raw } => container
                .get_index(*index)
                .or_else(|| container.get_key(raw)),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index { raw, .. } => write!(f, "{}", raw),
        }
    }
}

/// A compiled dot path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    segments: Vec<Segment>,
}

/// Why a path string was rejected by [`PathExpr::parse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSyntaxError {
    /// Byte offset of the offending segment within the path
    pub offset: usize,
    pub message: String,
}

impl PathExpr {
    /// Parse a dot path strictly: empty paths and empty segments are rejected.
    pub fn parse(path: &str) -> std::result::Result<Self, PathSyntaxError> {
        if path.is_empty() {
            return Err(PathSyntaxError {
                offset: 0,
                message: "Empty path".to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut offset = 0;
        for part in path.split('.') {
            if part.is_empty() {
                return Err(PathSyntaxError {
                    offset,
                    message: "Empty path segment".to_string(),
                });
            }
            segments.push(Segment::from_text(part));
            offset += part.len() + 1;
        }

        Ok(Self { segments })
    }

    /// A path of exactly one key, used for convention lookups
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(key.into())],
        }
    }

    /// Split without validation; empty segments become empty keys
    fn lenient(path: &str) -> Self {
        Self {
            segments: path.split('.').map(Segment::from_text).collect(),
        }
    }

    /// Path segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve this path against a container
    pub fn resolve<'a, C: Container + ?Sized>(&self, container: &'a C) -> Resolution<'a> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Resolution::Absent;
        };

        let mut current = match first.lookup(container) {
            Some(value) => value,
            None => return Resolution::Absent,
        };

        for segment in rest {
            current = match segment.lookup(current) {
                Some(value) => value,
                None => return Resolution::Absent,
            };
        }

        Resolution::Found(current)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Resolve a dot path string against a container.
///
/// Never fails; malformed paths simply do not resolve.
pub fn resolve<'a, C: Container + ?Sized>(container: &'a C, path: &str) -> Resolution<'a> {
    PathExpr::lenient(path).resolve(container)
}

/// Check whether a dot path exists in the container (a `null` value counts)
pub fn exists<C: Container + ?Sized>(container: &C, path: &str) -> bool {
    !resolve(container, path).is_absent()
}
