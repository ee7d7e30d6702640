//! Field values.
//!
//! A [`Value`] is what a field slot holds and what traversal and search hand
//! back: an absent marker, a scalar, or a handle to a node or list living in a
//! [`Tree`](crate::tree::Tree).

use crate::tree::{Handle, ListId, NodeId};
use serde::Deserialize;
use std::fmt;

/// Scalar kinds a `native` field can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Regexp,
}

impl PrimitiveKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "number" => Some(PrimitiveKind::Number),
            "boolean" => Some(PrimitiveKind::Boolean),
            "regexp" => Some(PrimitiveKind::Regexp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Regexp => "regexp",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regular-expression literal, kept as source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    pub pattern: String,
    pub flags: String,
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Slot was never set, or was cleared.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Regex(Regex),
    Node(NodeId),
    List(ListId),
}

impl Value {
    /// Anything that is not a node or list handle.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Node(_) | Value::List(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Number(_) => Some(PrimitiveKind::Number),
            Value::String(_) => Some(PrimitiveKind::String),
            Value::Regex(_) => Some(PrimitiveKind::Regexp),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<ListId> {
        match self {
            Value::List(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Node(id) => Some(Handle::Node(*id)),
            Value::List(id) => Some(Handle::List(*id)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String coercion used by the textual attribute operators.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Regex(r) => r.to_string(),
            Value::Node(id) => format!("[node {}]", id.index()),
            Value::List(id) => format!("[list {}]", id.index()),
        }
    }
}

impl From<Handle> for Value {
    fn from(handle: Handle) -> Self {
        match handle {
            Handle::Node(id) => Value::Node(id),
            Handle::List(id) => Value::List(id),
        }
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<Option<NodeId>> for Value {
    fn from(id: Option<NodeId>) -> Self {
        id.map_or(Value::Null, Value::Node)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_text()),
        }
    }
}

pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Formats a number the way a script engine prints it: integral values carry
/// no fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Normalizes selector text into a comparison value.
///
/// Text that reads as a number (decimal, `Infinity`, `0x`/`0o`/`0b` integers,
/// surrounding whitespace allowed, blank text reads as zero) becomes a number.
/// `true`/`false` become booleans and `null`/`undefined` become the matching
/// absent markers. Everything else stays a string.
pub fn normalize(text: &str) -> Value {
    if !text.is_empty() {
        if let Some(n) = parse_numeric(text) {
            return Value::Number(n);
        }
    }

    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        "undefined" => Value::Undefined,
        _ => Value::String(text.to_string()),
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return Some(
            digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
        );
    }

    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if unsigned == "Infinity" {
        return Some(sign * f64::INFINITY);
    }

    // f64::from_str also takes "inf" and "nan", which are not numeric here
    let decimal = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !decimal || !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    unsigned.parse::<f64>().ok().map(|n| sign * n)
}
