//! Node-type catalogues.
//!
//! A catalogue declares, per node type, a tag, a base type and a list of
//! fields with their accept-sets. It compiles into a [`Registry`] that the
//! tree builder and the query engine resolve type names against.

pub mod errors;
pub mod loader;
pub mod registry;
pub mod types;

pub use errors::ConfigError;
pub use loader::{compile, estree, load_from_path, load_from_str};
pub use registry::{
    Accept, AcceptSet, Category, CategoryId, FieldKind, FieldSchema, NodeType, Registry,
    RegistryBuilder, TypeId, ROOT_TYPE,
};
pub use types::{FieldDecl, Literal, Metadata, SchemaFile, TypeDecl};
