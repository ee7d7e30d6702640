//! ast-select: a typed syntax-tree object model with CSS-style selectors
//!
//! Untyped tagged JSON (ESTree-shaped records carrying a `type` key) is built
//! into a typed tree whose every mutation is checked against a declarative
//! node-type catalogue. Trees are queried with selectors that read like CSS.
//!
//! # Architecture
//!
//! - [`schema`]: TOML node-type catalogues compiled into a [`Registry`]
//!   (fields, accept-sets, single inheritance, categories).
//! - [`tree`]: an arena [`Tree`] of nodes and lists. Attaching a node that
//!   already has a parent moves it; nothing is ever shared between parents.
//! - [`query`]: selector parsing and the [`QueryEngine`].
//!
//! # Invariants
//!
//! - A node has at most one parent at any time
//! - Every mutation is validated before anything is changed
//! - A list belongs to its owning node for the node's whole life
//! - `build(to_json(t))` is structurally equal to `t`
//!
//! # Example
//!
//! ```
//! use ast_select::{schema, Tree};
//! use serde_json::json;
//!
//! let mut tree = Tree::new(schema::estree()?);
//! let program = tree
//!     .build(&json!({
//!         "type": "Program",
//!         "body": [{
//!             "type": "IfStatement",
//!             "test": { "type": "Identifier", "name": "ready" },
//!             "consequent": { "type": "BlockStatement", "body": [{ "type": "EmptyStatement" }] }
//!         }]
//!     }))?
//!     .as_handle()
//!     .ok_or("expected a node")?;
//!
//! assert_eq!(tree.search(program, "EmptyStatement")?.len(), 1);
//! assert!(tree.search(program, "> EmptyStatement")?.is_empty());
//! assert_eq!(tree.search(program, "#Identifier:reference(ready)")?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod query;
pub mod schema;
pub mod tree;
pub mod value;

// Re-exports
pub use query::{QueryEngine, QueryError, Selector};
pub use schema::{estree, load_from_path, load_from_str, ConfigError, Registry};
pub use tree::{Handle, Key, ListId, NodeId, Tree, TreeError, Uid, Visit};
pub use value::Value;
