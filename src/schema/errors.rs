use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal configuration errors raised while compiling a node-type catalogue.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("type '{type_name}' extends unknown base '{base}'{hint}")]
    UnknownBase {
        type_name: String,
        base: String,
        hint: String,
    },

    #[error("type '{type_name}' is declared more than once")]
    DuplicateType { type_name: String },

    #[error("field '{field}' of '{type_name}' is declared more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("field '{field}' of '{type_name}' accepts unknown type '{entry}'{hint}")]
    UnresolvedAccept {
        type_name: String,
        field: String,
        entry: String,
        hint: String,
    },

    #[error("field '{field}' of '{type_name}' mixes node types with primitive kinds")]
    MixedAccepts { type_name: String, field: String },

    #[error("field '{field}' of '{type_name}' has an empty accept set")]
    EmptyAccepts { type_name: String, field: String },

    #[error("list field '{field}' of '{type_name}' may only accept node types and null")]
    InvalidListAccepts { type_name: String, field: String },

    #[error("default {value} of field '{field}' in '{type_name}' is not accepted by the field")]
    InvalidDefault {
        type_name: String,
        field: String,
        value: String,
    },

    #[error("category '{category}' lists unknown type '{member}'{hint}")]
    UnknownCategoryMember {
        category: String,
        member: String,
        hint: String,
    },

    #[error("category '{name}' clashes with an existing type or category")]
    DuplicateCategory { name: String },

    #[error("failed to read schema from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema TOML{}: {source}", location(path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },
}

impl ConfigError {
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

/// Formats a " (did you mean 'X'?)" hint for the closest known name, or an
/// empty string when nothing is close enough.
pub(crate) fn did_you_mean<'a>(name: &str, known: impl IntoIterator<Item = &'a str>) -> String {
    known
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, best)| format!(" (did you mean '{best}'?)"))
        .unwrap_or_default()
}
