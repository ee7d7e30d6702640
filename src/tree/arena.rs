//! Arena storage for nodes and lists.
//!
//! Every node and list of a tree lives in one [`Tree`]. Handles are indices
//! into the arena; the parent relation is an index too, so a detached subtree
//! keeps no strong link to its former owner and remains valid on its own.

use crate::schema::{FieldKind, FieldSchema, NodeType, Registry, TypeId};
use crate::tree::errors::TreeError;
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity token. Never reused, never derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(u64);

impl Uid {
    pub(crate) fn next() -> Self {
        Uid(NEXT_UID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a node in the [`Tree`] that allocated it. Ids carry no tree
/// identity: passing one to a different tree panics or names an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a list in the [`Tree`] that allocated it. Same caveat as [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(u32);

impl ListId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node or a list: anything that can own children or be a parent.
///
/// Only meaningful for the tree it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Node(NodeId),
    List(ListId),
}

impl From<NodeId> for Handle {
    fn from(id: NodeId) -> Self {
        Handle::Node(id)
    }
}

impl From<ListId> for Handle {
    fn from(id: ListId) -> Self {
        Handle::List(id)
    }
}

/// Position of a value within its parent: a field name or a list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Field(&'a str),
    Index(usize),
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

/// What a traversal visitor wants to happen next.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit<T> {
    /// Keep going, descending into the value when traversing deeply.
    Continue,
    /// Keep going, but do not descend into this value.
    Skip,
    /// End the traversal with a result.
    Stop(T),
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Value(Value),
    List(ListId),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) uid: Uid,
    pub(crate) ty: TypeId,
    pub(crate) parent: Option<Handle>,
    pub(crate) slots: Vec<Slot>,
    /// Keys outside the schema (`loc`, `range`, ...), kept verbatim.
    pub(crate) meta: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct ListData {
    pub(crate) uid: Uid,
    /// Owning node and field index. Standalone lists have no owner and
    /// neither validate nor re-parent their members.
    pub(crate) owner: Option<(NodeId, usize)>,
    pub(crate) items: Vec<Option<NodeId>>,
}

/// An arena of typed nodes and lists sharing one [`Registry`].
///
/// Slots are never freed. Detached subtrees, nodes left by a failed build and
/// [`Tree::clone_subtree`] copies stay allocated until the whole `Tree` is
/// dropped, so long-lived trees under heavy restructuring grow monotonically.
///
/// Cloning copies the arena under fresh uids, so handles stay valid in the
/// copy while no uid is shared between the two trees.
#[derive(Debug)]
pub struct Tree {
    pub(crate) registry: Arc<Registry>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) lists: Vec<ListData>,
}

impl Clone for Tree {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeData {
                    uid: Uid::next(),
                    ..node.clone()
                })
                .collect(),
            lists: self
                .lists
                .iter()
                .map(|list| ListData {
                    uid: Uid::next(),
                    ..list.clone()
                })
                .collect(),
        }
    }
}

impl Tree {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            lists: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of nodes ever allocated in this arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn uid(&self, handle: Handle) -> Uid {
        match handle {
            Handle::Node(id) => self.nodes[id.index()].uid,
            Handle::List(id) => self.lists[id.index()].uid,
        }
    }

    pub fn type_id(&self, node: NodeId) -> TypeId {
        self.nodes[node.index()].ty
    }

    pub fn node_type(&self, node: NodeId) -> &NodeType {
        self.registry.node_type(self.type_id(node))
    }

    pub fn type_name(&self, node: NodeId) -> &str {
        &self.node_type(node).name
    }

    /// The node's parent: a node when held by a field, a list when held as
    /// a list element.
    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        match handle {
            Handle::Node(id) => self.nodes[id.index()].parent,
            Handle::List(id) => self.lists[id.index()].owner.map(|(owner, _)| Handle::Node(owner)),
        }
    }

    /// Nearest ancestor that is a node, skipping over lists.
    pub fn parent_node(&self, handle: Handle) -> Option<NodeId> {
        let mut current = self.parent(handle);
        while let Some(parent) = current {
            if let Handle::Node(id) = parent {
                return Some(id);
            }
            current = self.parent(parent);
        }
        None
    }

    /// Outermost ancestor, or the handle itself when it has no parent.
    pub fn root(&self, handle: Handle) -> Handle {
        let mut current = handle;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Position of `handle` within its parent.
    pub fn key_of(&self, handle: Handle) -> Option<Key<'_>> {
        match handle {
            Handle::Node(id) => match self.nodes[id.index()].parent? {
                Handle::Node(parent) => self.field_of(parent, &Value::Node(id)).map(Key::Field),
                Handle::List(list) => self.position(list, Some(id)).map(Key::Index),
            },
            Handle::List(id) => {
                let (owner, field) = self.lists[id.index()].owner?;
                Some(Key::Field(&self.node_type(owner).fields[field].name))
            }
        }
    }

    /// True when `ancestor` is `handle` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: Handle, handle: Handle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.parent(h);
        }
        false
    }

    pub(crate) fn field_schema(&self, node: NodeId, field: usize) -> &FieldSchema {
        &self.node_type(node).fields[field]
    }

    pub(crate) fn alloc_node(&mut self, ty: TypeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let field_count = self.registry.node_type(ty).fields.len();
        self.nodes.push(NodeData {
            uid: Uid::next(),
            ty,
            parent: None,
            slots: Vec::with_capacity(field_count),
            meta: serde_json::Map::new(),
        });

        for index in 0..field_count {
            let kind = self.registry.node_type(ty).fields[index].kind;
            let slot = match kind {
                FieldKind::List => Slot::List(self.alloc_list(Some((id, index)))),
                _ => Slot::Value(Value::Undefined),
            };
            self.nodes[id.index()].slots.push(slot);
        }
        id
    }

    pub(crate) fn alloc_list(&mut self, owner: Option<(NodeId, usize)>) -> ListId {
        let id = ListId(self.lists.len() as u32);
        self.lists.push(ListData {
            uid: Uid::next(),
            owner,
            items: Vec::new(),
        });
        id
    }

    /// Removes `node` from wherever it is currently attached.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.index()].parent.take() else {
            return;
        };
        match parent {
            Handle::Node(owner) => {
                for slot in &mut self.nodes[owner.index()].slots {
                    if let Slot::Value(Value::Node(held)) = slot {
                        if *held == node {
                            *slot = Slot::Value(Value::Undefined);
                            break;
                        }
                    }
                }
            }
            Handle::List(list) => {
                let items = &mut self.lists[list.index()].items;
                if let Some(position) = items.iter().position(|item| *item == Some(node)) {
                    items.remove(position);
                }
            }
        }
    }

    /// Fails when attaching `child` under `parent` would create a cycle.
    pub(crate) fn check_acyclic(&self, child: NodeId, parent: Handle) -> Result<(), TreeError> {
        if self.is_ancestor_or_self(Handle::Node(child), parent) {
            return Err(TreeError::Cycle {
                child: self.describe(&Value::Node(child)),
                parent: self.describe(&Value::from(parent)),
            });
        }
        Ok(())
    }

    /// Short human-readable rendering of a value for error messages.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Node(id) => format!("{} #{}", self.type_name(*id), self.uid(Handle::Node(*id))),
            Value::List(id) => match self.lists[id.index()].owner {
                Some((owner, field)) => format!(
                    "{} #{}",
                    self.node_type(owner).list_type_name(&self.field_schema(owner, field).name),
                    self.uid(Handle::List(*id))
                ),
                None => format!("List #{}", self.uid(Handle::List(*id))),
            },
            other => other.to_string(),
        }
    }
}
