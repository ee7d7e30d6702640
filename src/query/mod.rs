//! Selector queries over typed trees.
//!
//! Selectors read like CSS: tags match the key a value sits under, `#Type`
//! tests node types, `.field` and `[field op value]` test fields and
//! `:reference`, `:declaration` and `:scope` test an identifier's role.
//! Combinators walk down (`' '`, `>`, `~>`, `=>`, `>>`) or up (`<`, `!`).

pub mod cache;
mod combinator;
pub mod engine;
pub mod errors;
mod matcher;
pub mod parser;
mod pseudo;
pub mod selector;

pub use engine::QueryEngine;
pub use errors::QueryError;
pub use selector::{AttrOp, Attribute, Chain, Combinator, Part, Pseudo, Selector};
