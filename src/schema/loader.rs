use crate::schema::errors::ConfigError;
use crate::schema::registry::{Registry, ROOT_TYPE};
use crate::schema::types::SchemaFile;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

const ESTREE_SCHEMA: &str = include_str!("../../schemas/estree.toml");

static ESTREE: OnceLock<Arc<Registry>> = OnceLock::new();

/// Compiles a parsed catalogue. Types are described in file order; each base
/// must appear before the types that extend it.
pub fn compile(file: SchemaFile) -> Result<Registry, ConfigError> {
    let mut builder = Registry::builder(file.meta.name);

    for (name, members) in file.categories {
        builder.category(name, members);
    }

    for decl in file.types {
        let base = decl.extends.clone().unwrap_or_else(|| ROOT_TYPE.to_string());
        builder.describe(&base, decl)?;
    }

    builder.finish()
}

pub fn load_from_str(input: &str) -> Result<Registry, ConfigError> {
    let file: SchemaFile =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })?;
    compile(file)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Registry, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// The bundled ESTree catalogue, compiled once per process.
pub fn estree() -> Result<Arc<Registry>, ConfigError> {
    if let Some(registry) = ESTREE.get() {
        return Ok(Arc::clone(registry));
    }
    let registry = Arc::new(load_from_str(ESTREE_SCHEMA)?);
    Ok(Arc::clone(ESTREE.get_or_init(|| registry)))
}
