//! Parsed selector structure.
//!
//! A [`Selector`] is a comma-separated list of [`Chain`]s. Each chain is a
//! sequence of compound [`Part`]s, each introduced by the [`Combinator`]
//! relating it to the previous part (or to the search context for the first
//! part).

use crate::query::errors::QueryError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `' '`: anything reachable below the context.
    Descendant,
    /// `>`: immediate field values and list items.
    Child,
    /// `<`: the context's parent.
    Parent,
    /// `!`: every ancestor, innermost first.
    Ancestor,
    /// `~>`: descendants, not entering blocks or loop statements.
    DescendantOutsideBlocks,
    /// `=>`: descendants, not entering functions.
    DescendantOutsideFunctions,
    /// `>>`: descendants, not entering classes.
    DescendantOutsideClasses,
}

impl Combinator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => ">",
            Combinator::Parent => "<",
            Combinator::Ancestor => "!",
            Combinator::DescendantOutsideBlocks => "~>",
            Combinator::DescendantOutsideFunctions => "=>",
            Combinator::DescendantOutsideClasses => ">>",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            " " => Some(Combinator::Descendant),
            ">" => Some(Combinator::Child),
            "<" => Some(Combinator::Parent),
            "!" => Some(Combinator::Ancestor),
            "~>" => Some(Combinator::DescendantOutsideBlocks),
            "=>" => Some(Combinator::DescendantOutsideFunctions),
            ">>" => Some(Combinator::DescendantOutsideClasses),
            _ => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Contains,
    /// `~=`
    Word,
    /// `|=`
    DashPrefix,
    /// Operator text outside the supported set. Never matches.
    Unknown(String),
}

impl AttrOp {
    pub fn parse(text: &str) -> Self {
        match text {
            "=" => AttrOp::Eq,
            "!=" => AttrOp::NotEq,
            "^=" => AttrOp::Prefix,
            "$=" => AttrOp::Suffix,
            "*=" => AttrOp::Contains,
            "~=" => AttrOp::Word,
            "|=" => AttrOp::DashPrefix,
            other => AttrOp::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttrOp::Eq => "=",
            AttrOp::NotEq => "!=",
            AttrOp::Prefix => "^=",
            AttrOp::Suffix => "$=",
            AttrOp::Contains => "*=",
            AttrOp::Word => "~=",
            AttrOp::DashPrefix => "|=",
            AttrOp::Unknown(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    /// `None` for a presence test (`[name]`).
    pub op: Option<AttrOp>,
    pub value: String,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            None => write!(f, "[{}]", self.name),
            Some(op) => write!(f, "[{}{}{:?}]", self.name, op.as_str(), self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pseudo {
    pub name: String,
    pub argument: Option<String>,
}

impl fmt::Display for Pseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            None => write!(f, ":{}", self.name),
            Some(argument) => write!(f, ":{}({:?})", self.name, argument),
        }
    }
}

/// One compound selector: `tag#Type.field[attr op value]:pseudo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Part {
    pub combinator: Combinator,
    /// Position key to match; `None` is the `*` wildcard.
    pub tag: Option<String>,
    /// Type or category name.
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub pseudos: Vec<Pseudo>,
}

impl Part {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            tag: None,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            pseudos: Vec::new(),
        }
    }

    /// True when the part tests more than the position key. Such parts never
    /// match primitive values.
    pub fn has_node_tests(&self) -> bool {
        self.id.is_some()
            || !self.classes.is_empty()
            || !self.attributes.is_empty()
            || !self.pseudos.is_empty()
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.combinator != Combinator::Descendant {
            write!(f, "{} ", self.combinator)?;
        }
        match (&self.tag, &self.id) {
            (Some(tag), _) => f.write_str(tag)?,
            (None, None) => f.write_str("*")?,
            (None, Some(_)) => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attribute in &self.attributes {
            write!(f, "{attribute}")?;
        }
        for pseudo in &self.pseudos {
            write!(f, "{pseudo}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain {
    pub parts: Vec<Part>,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub chains: Vec<Chain>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        crate::query::parser::parse(input)
    }

    /// A single chain of a single part, testable without traversal.
    pub fn simple_part(&self) -> Option<&Part> {
        match self.chains.as_slice() {
            [chain] => match chain.parts.as_slice() {
                [part] => Some(part),
                _ => None,
            },
            _ => None,
        }
    }

    /// Every `#id` named anywhere in the selector.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.chains
            .iter()
            .flat_map(|chain| chain.parts.iter())
            .filter_map(|part| part.id.as_deref())
    }
}

impl FromStr for Selector {
    type Err = QueryError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Selector::parse(input)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}
