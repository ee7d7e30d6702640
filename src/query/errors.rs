use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("invalid selector '{input}': {message}")]
    InvalidSelector { input: String, message: String },

    #[error("unknown type '{name}' in selector{hint}")]
    UnknownType { name: String, hint: String },

    #[error("selector matched 0 values")]
    NoMatch,

    #[error("selector matched {count} values, expected exactly 1")]
    AmbiguousMatch { count: usize },
}
