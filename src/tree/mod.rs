//! Typed syntax trees.
//!
//! A [`Tree`] is an arena holding nodes and lists built against one
//! [`Registry`](crate::schema::Registry). Every mutation validates against
//! the field's accept-set and keeps ownership single: a node sits in at most
//! one field slot or list at a time, and attaching it elsewhere detaches it
//! first.

pub mod arena;
mod build;
pub mod errors;
mod list;
mod node;

pub use arena::{Handle, Key, ListId, NodeId, Tree, Uid, Visit};
pub use errors::TreeError;
