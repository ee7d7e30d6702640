//! Declarative node-type catalogue, as read from TOML.

use crate::value::Value;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SchemaFile {
    #[serde(default)]
    pub meta: Metadata,
    /// Capability predicates: category name -> concrete member types.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One `describe` call: a type tag plus the fields it adds to its base.
#[derive(Debug, Deserialize, Clone)]
pub struct TypeDecl {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub accepts: Vec<String>,
    #[serde(default)]
    pub one_of: Vec<Literal>,
    #[serde(default)]
    pub default: Option<Literal>,
}

impl FieldDecl {
    /// A scalar or node field accepting the given entries.
    pub fn new(name: impl Into<String>, accepts: &[&str]) -> Self {
        Self {
            name: name.into(),
            list: false,
            accepts: accepts.iter().map(|s| s.to_string()).collect(),
            one_of: Vec::new(),
            default: None,
        }
    }

    pub fn list(name: impl Into<String>, accepts: &[&str]) -> Self {
        Self {
            list: true,
            ..Self::new(name, accepts)
        }
    }

    /// A strict field accepting only the listed string literals.
    pub fn one_of(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            one_of: values
                .iter()
                .map(|v| Literal::String(v.to_string()))
                .collect(),
            ..Self::new(name, &[])
        }
    }

    pub fn with_default(mut self, default: Literal) -> Self {
        self.default = Some(default);
        self
    }
}

/// A literal written in a catalogue: strict-field members and defaults.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
