//! Selector text parser.
//!
//! ```text
//! selector   := chain ("," chain)*
//! chain      := combinator? part (combinator part)*
//! combinator := whitespace | ">" | "<" | "!" | "~>" | "=>" | ">>"
//! part       := (tag | "*")? ("#" name | "." name | attribute | pseudo)*
//! attribute  := "[" name (op value)? "]"
//! pseudo     := ":" name ("(" value ")")?
//! ```
//!
//! A bare tag starting with an uppercase letter names a type, so `Program`
//! is read as `#Program`.

use crate::query::errors::QueryError;
use crate::query::selector::{AttrOp, Attribute, Chain, Combinator, Part, Pseudo, Selector};

pub fn parse(input: &str) -> Result<Selector, QueryError> {
    let mut scanner = Scanner::new(input);
    let mut chains = Vec::new();

    loop {
        chains.push(scanner.chain()?);
        scanner.skip_whitespace();
        match scanner.peek() {
            Some(',') => {
                scanner.bump();
            }
            None => break,
            Some(other) => return Err(scanner.error(format!("unexpected character '{other}'"))),
        }
    }

    Ok(Selector { chains })
}

struct Scanner<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::InvalidSelector {
            input: self.input.to_string(),
            message: message.into(),
        }
    }

    fn chain(&mut self) -> Result<Chain, QueryError> {
        self.skip_whitespace();
        let mut combinator = self.combinator().unwrap_or(Combinator::Descendant);
        let mut parts = Vec::new();

        loop {
            self.skip_whitespace();
            parts.push(self.part(combinator)?);

            let spaced = self.skip_whitespace();
            if matches!(self.peek(), None | Some(',')) {
                break;
            }
            combinator = match self.combinator() {
                Some(explicit) => explicit,
                None if spaced => Combinator::Descendant,
                None => {
                    let ch = self.peek().unwrap_or_default();
                    return Err(self.error(format!("unexpected character '{ch}'")));
                }
            };
        }

        Ok(Chain { parts })
    }

    fn combinator(&mut self) -> Option<Combinator> {
        let two: String = [self.peek(), self.peek_at(1)].iter().flatten().collect();
        if let Some(combinator) = Combinator::from_symbol(&two).filter(|_| two.len() == 2) {
            self.pos += 2;
            return Some(combinator);
        }
        let one = self.peek()?;
        let combinator = match one {
            '>' | '<' | '!' => Combinator::from_symbol(&one.to_string())?,
            _ => return None,
        };
        self.pos += 1;
        Some(combinator)
    }

    fn part(&mut self, combinator: Combinator) -> Result<Part, QueryError> {
        let mut part = Part::new(combinator);
        let start = self.pos;

        if self.peek() == Some('*') {
            self.bump();
        } else {
            let tag = self.name();
            if !tag.is_empty() {
                part.tag = Some(tag);
            }
        }

        while let Some(ch) = self.peek() {
            match ch {
                '#' => {
                    self.bump();
                    part.id = Some(self.required_name("a type name after '#'")?);
                }
                '.' => {
                    self.bump();
                    part.classes.push(self.required_name("a field name after '.'")?);
                }
                '[' => part.attributes.push(self.attribute()?),
                ':' => part.pseudos.push(self.pseudo()?),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(ch) => self.error(format!("expected a selector, found '{ch}'")),
                None => self.error("expected a selector"),
            });
        }

        if part.id.is_none()
            && part
                .tag
                .as_deref()
                .is_some_and(|tag| tag.starts_with(|c: char| c.is_ascii_uppercase()))
        {
            part.id = part.tag.take();
        }

        Ok(part)
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            let operator_start = ch == '$' && self.peek_at(1) == Some('=');
            if !operator_start && (ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-')) {
                name.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        name
    }

    fn required_name(&mut self, expected: &str) -> Result<String, QueryError> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.error(format!("expected {expected}")));
        }
        Ok(name)
    }

    fn attribute(&mut self) -> Result<Attribute, QueryError> {
        self.bump();
        self.skip_whitespace();
        let name = self.required_name("an attribute name")?;
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.bump();
            return Ok(Attribute {
                name,
                op: None,
                value: String::new(),
            });
        }

        let mut op = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_punctuation() || matches!(ch, '"' | '\'' | ']' | '_') {
                break;
            }
            op.push(ch);
            self.pos += 1;
            if ch == '=' {
                break;
            }
        }
        if op.is_empty() {
            return Err(self.error(format!("expected an operator or ']' after '{name}'")));
        }

        self.skip_whitespace();
        let value = self.value(']')?;
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("unterminated attribute"));
        }

        Ok(Attribute {
            name,
            op: Some(AttrOp::parse(&op)),
            value,
        })
    }

    fn pseudo(&mut self) -> Result<Pseudo, QueryError> {
        self.bump();
        let name = self.required_name("a pseudo-class name after ':'")?;
        if self.peek() != Some('(') {
            return Ok(Pseudo {
                name,
                argument: None,
            });
        }

        self.bump();
        self.skip_whitespace();
        let argument = self.value(')')?;
        self.skip_whitespace();
        if self.bump() != Some(')') {
            return Err(self.error(format!("unterminated argument to ':{name}'")));
        }

        Ok(Pseudo {
            name,
            argument: (!argument.is_empty()).then_some(argument),
        })
    }

    /// A quoted string, or bare text up to `close`.
    fn value(&mut self, close: char) -> Result<String, QueryError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.quoted(quote)
            }
            _ => {
                let mut value = String::new();
                while let Some(ch) = self.peek() {
                    if ch == close {
                        break;
                    }
                    value.push(ch);
                    self.pos += 1;
                }
                Ok(value.trim_end().to_string())
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, QueryError> {
        let mut value = String::new();
        while let Some(ch) = self.bump() {
            if ch == quote {
                return Ok(value);
            }
            if ch == '\\' {
                if let Some(next) = self.bump() {
                    let escaped = match next {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    };
                    value.push(escaped);
                    continue;
                }
            }
            value.push(ch);
        }
        Err(self.error("unterminated string"))
    }
}
