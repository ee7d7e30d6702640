//! Node operations: construction, validated field access, structural edits
//! and traversal.

use crate::schema::{FieldKind, TypeId};
use crate::tree::arena::{Handle, Key, ListId, NodeId, Slot, Tree, Visit};
use crate::tree::errors::TreeError;
use crate::value::Value;

impl Tree {
    /// Allocates a detached node of the named concrete type with every field
    /// unset.
    pub fn create_node(&mut self, type_name: &str) -> Result<NodeId, TreeError> {
        let Some(ty) = self.registry.type_id(type_name) else {
            return Err(TreeError::MissingType {
                type_name: type_name.to_string(),
                hint: crate::schema::errors::did_you_mean(type_name, self.registry.known_names()),
            });
        };
        self.create_node_of(ty)
    }

    pub fn create_node_of(&mut self, ty: TypeId) -> Result<NodeId, TreeError> {
        let node_type = self.registry.node_type(ty);
        if node_type.is_abstract {
            return Err(TreeError::AbstractType {
                type_name: node_type.name.clone(),
            });
        }
        Ok(self.alloc_node(ty))
    }

    pub(crate) fn field_index(&self, node: NodeId, field: &str) -> Result<usize, TreeError> {
        self.node_type(node)
            .field_index(field)
            .ok_or_else(|| TreeError::UnknownField {
                node_type: self.type_name(node).to_string(),
                field: field.to_string(),
            })
    }

    /// Current value of a slot; unset slots read as the field default.
    pub(crate) fn slot_value(&self, node: NodeId, index: usize) -> Value {
        match &self.nodes[node.index()].slots[index] {
            Slot::List(list) => Value::List(*list),
            Slot::Value(Value::Undefined) => self.field_schema(node, index).default.clone(),
            Slot::Value(value) => value.clone(),
        }
    }

    /// True when the slot holds an explicitly assigned value.
    pub(crate) fn slot_is_set(&self, node: NodeId, index: usize) -> bool {
        !matches!(
            self.nodes[node.index()].slots[index],
            Slot::Value(Value::Undefined)
        )
    }

    pub fn get(&self, node: NodeId, field: &str) -> Result<Value, TreeError> {
        let index = self.field_index(node, field)?;
        Ok(self.slot_value(node, index))
    }

    /// Child node held by a node-kind field, if any.
    pub fn child(&self, node: NodeId, field: &str) -> Result<Option<NodeId>, TreeError> {
        Ok(self.get(node, field)?.as_node())
    }

    /// The list owned by a list-kind field. Its identity never changes.
    pub fn list(&self, node: NodeId, field: &str) -> Result<ListId, TreeError> {
        let index = self.field_index(node, field)?;
        match &self.nodes[node.index()].slots[index] {
            Slot::List(list) => Ok(*list),
            Slot::Value(_) => Err(TreeError::NotAList {
                node_type: self.type_name(node).to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Assigns a field after validating the value against the field's
    /// accept-set. A node value is detached from its previous parent first;
    /// the node previously held by the slot loses its parent.
    pub fn set(
        &mut self,
        node: NodeId,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), TreeError> {
        let index = self.field_index(node, field)?;
        self.set_slot(node, index, value.into())
    }

    pub(crate) fn set_slot(
        &mut self,
        node: NodeId,
        index: usize,
        value: Value,
    ) -> Result<(), TreeError> {
        self.validate_slot(node, index, &value)?;

        let incoming = value.as_node();
        if let Some(child) = incoming {
            self.check_acyclic(child, Handle::Node(node))?;
            self.detach(child);
        }

        let previous = std::mem::replace(
            &mut self.nodes[node.index()].slots[index],
            Slot::Value(value),
        );
        if let Slot::Value(Value::Node(previous)) = previous {
            self.nodes[previous.index()].parent = None;
        }
        if let Some(child) = incoming {
            self.nodes[child.index()].parent = Some(Handle::Node(node));
        }
        Ok(())
    }

    fn validate_slot(&self, node: NodeId, index: usize, value: &Value) -> Result<(), TreeError> {
        let field = self.field_schema(node, index);
        let valid = match field.kind {
            FieldKind::List => {
                return Err(TreeError::ListField {
                    node_type: self.type_name(node).to_string(),
                    field: field.name.clone(),
                })
            }
            FieldKind::Node => match value {
                Value::Undefined => true,
                Value::Null => field.accepts.admits_null(),
                Value::Node(child) => field.accepts.admits_node(&self.registry, self.type_id(*child)),
                _ => false,
            },
            FieldKind::Native | FieldKind::Strict => field.accepts.admits_scalar(value),
        };

        if valid {
            Ok(())
        } else {
            Err(TreeError::InvalidValue {
                node_type: self.type_name(node).to_string(),
                field: field.name.clone(),
                value: self.describe(value),
                accepts: field.accepts.to_string(),
            })
        }
    }

    /// Detaches `child` from `parent`: clears the field slot holding it, or
    /// removes it from the list. No-op when `child` is not a current child.
    pub fn remove_child(&mut self, parent: Handle, child: NodeId) -> bool {
        match parent {
            Handle::Node(node) => {
                let Some(index) = self.slot_of(node, child) else {
                    return false;
                };
                self.nodes[node.index()].slots[index] = Slot::Value(Value::Undefined);
                self.nodes[child.index()].parent = None;
                true
            }
            Handle::List(list) => match self.position(list, Some(child)) {
                Some(index) => self.splice(list, index, 1, Vec::new()).is_ok(),
                None => false,
            },
        }
    }

    /// Puts `value` where `child` currently sits, re-running validation.
    /// Returns `false` when `child` is not a current child of `parent`.
    pub fn replace_child(
        &mut self,
        parent: Handle,
        child: NodeId,
        value: impl Into<Value>,
    ) -> Result<bool, TreeError> {
        let value = value.into();
        match parent {
            Handle::Node(node) => {
                let Some(index) = self.slot_of(node, child) else {
                    return Ok(false);
                };
                self.set_slot(node, index, value)?;
            }
            Handle::List(list) => {
                let Some(index) = self.position(list, Some(child)) else {
                    return Ok(false);
                };
                let item = self.list_item(list, &value)?;
                self.splice(list, index, 1, vec![item])?;
            }
        }
        Ok(true)
    }

    fn slot_of(&self, node: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[node.index()].slots.iter().position(|slot| {
            matches!(slot, Slot::Value(Value::Node(held)) if *held == child)
        })
    }

    /// Position of `value` within `parent`: the first field whose current
    /// value equals it, or its index in a list.
    pub fn index_of(&self, parent: Handle, value: &Value) -> Option<Key<'_>> {
        match parent {
            Handle::Node(node) => self.field_of(node, value).map(Key::Field),
            Handle::List(list) => {
                let item = match value {
                    Value::Node(id) => Some(*id),
                    Value::Null => None,
                    _ => return None,
                };
                self.position(list, item).map(Key::Index)
            }
        }
    }

    /// Name of the first field whose current value equals `value`.
    pub fn field_of(&self, node: NodeId, value: &Value) -> Option<&str> {
        let node_type = self.node_type(node);
        (0..node_type.fields.len())
            .find(|index| self.slot_value(node, *index) == *value)
            .map(|index| node_type.fields[index].name.as_str())
    }

    pub fn instance_of(&self, node: NodeId, type_name: &str) -> bool {
        self.registry
            .is_a(self.type_id(node), type_name)
            .unwrap_or(false)
    }

    pub fn meta(&self, node: NodeId) -> &serde_json::Map<String, serde_json::Value> {
        &self.nodes[node.index()].meta
    }

    pub fn meta_mut(&mut self, node: NodeId) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.nodes[node.index()].meta
    }

    /// Visits the fields of a node in schema order, or the items of a list in
    /// index order, calling `visitor(value, key)` for each.
    ///
    /// With `deep`, node and list values are descended into unless the
    /// visitor answered [`Visit::Skip`]. The first [`Visit::Stop`] ends the
    /// whole traversal and becomes its result. Metadata keys are never
    /// visited.
    pub fn traverse<'t, T, F>(&'t self, from: Handle, deep: bool, visitor: &mut F) -> Option<T>
    where
        F: FnMut(&Value, Key<'t>) -> Visit<T>,
    {
        match from {
            Handle::Node(node) => {
                let node_type = self.node_type(node);
                for (index, field) in node_type.fields.iter().enumerate() {
                    let value = self.slot_value(node, index);
                    let visit = visitor(&value, Key::Field(&field.name));
                    if let Some(found) = self.follow(visit, &value, deep, visitor) {
                        return Some(found);
                    }
                }
                None
            }
            Handle::List(list) => self.traverse_list(list, deep, visitor),
        }
    }

    pub(crate) fn follow<'t, T, F>(
        &'t self,
        visit: Visit<T>,
        value: &Value,
        deep: bool,
        visitor: &mut F,
    ) -> Option<T>
    where
        F: FnMut(&Value, Key<'t>) -> Visit<T>,
    {
        match visit {
            Visit::Stop(found) => Some(found),
            Visit::Skip => None,
            Visit::Continue if deep => value
                .as_handle()
                .and_then(|handle| self.traverse(handle, deep, visitor)),
            Visit::Continue => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::estree;

    fn tree() -> Tree {
        Tree::new(estree().unwrap())
    }

    fn ident(tree: &mut Tree, name: &str) -> NodeId {
        let id = tree.create_node("Identifier").unwrap();
        tree.set(id, "name", name).unwrap();
        id
    }

    #[test]
    fn unset_fields_read_their_default() {
        let mut tree = tree();
        let ret = tree.create_node("ReturnStatement").unwrap();
        assert_eq!(tree.get(ret, "argument").unwrap(), Value::Null);

        let ident = tree.create_node("Identifier").unwrap();
        assert_eq!(tree.get(ident, "name").unwrap(), Value::Undefined);

        let member = tree.create_node("MemberExpression").unwrap();
        assert_eq!(tree.get(member, "computed").unwrap(), Value::Bool(false));
    }

    #[test]
    fn set_validates_against_accept_set() {
        let mut tree = tree();
        let decl = tree.create_node("VariableDeclarator").unwrap();
        let x = ident(&mut tree, "x");
        tree.set(decl, "id", x).unwrap();

        let empty = tree.create_node("EmptyStatement").unwrap();
        let err = tree.set(decl, "id", empty).unwrap_err();
        match err {
            TreeError::InvalidValue {
                node_type, field, ..
            } => {
                assert_eq!(node_type, "VariableDeclarator");
                assert_eq!(field, "id");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(tree.get(decl, "id").unwrap(), Value::Node(x));
        assert_eq!(tree.parent(Handle::Node(x)), Some(Handle::Node(decl)));
        assert_eq!(tree.parent(Handle::Node(empty)), None);
    }

    #[test]
    fn strict_and_native_fields_reject_wrong_scalars() {
        let mut tree = tree();
        let decl = tree.create_node("VariableDeclaration").unwrap();
        assert!(tree.set(decl, "kind", "let").is_ok());
        assert!(tree.set(decl, "kind", "static").is_err());
        assert_eq!(tree.get(decl, "kind").unwrap(), Value::String("let".into()));

        let id = ident(&mut tree, "a");
        assert!(tree.set(id, "name", 3.0).is_err());
        assert!(tree.set(id, "name", Value::Null).is_err());
    }

    #[test]
    fn assigning_an_attached_node_moves_it() {
        let mut tree = tree();
        let first = tree.create_node("ExpressionStatement").unwrap();
        let second = tree.create_node("ExpressionStatement").unwrap();
        let x = ident(&mut tree, "x");

        tree.set(first, "expression", x).unwrap();
        tree.set(second, "expression", x).unwrap();

        assert_eq!(tree.parent(Handle::Node(x)), Some(Handle::Node(second)));
        assert_eq!(tree.get(first, "expression").unwrap(), Value::Undefined);
        assert_eq!(tree.get(second, "expression").unwrap(), Value::Node(x));
    }

    #[test]
    fn replacing_a_slot_orphans_the_previous_child() {
        let mut tree = tree();
        let stmt = tree.create_node("ExpressionStatement").unwrap();
        let a = ident(&mut tree, "a");
        let b = ident(&mut tree, "b");
        tree.set(stmt, "expression", a).unwrap();
        assert!(tree.replace_child(stmt.into(), a, b).unwrap());
        assert_eq!(tree.parent(Handle::Node(a)), None);
        assert_eq!(tree.parent(Handle::Node(b)), Some(Handle::Node(stmt)));
        assert!(!tree.replace_child(stmt.into(), a, b).unwrap());
    }

    #[test]
    fn remove_child_detaches() {
        let mut tree = tree();
        let stmt = tree.create_node("ExpressionStatement").unwrap();
        let a = ident(&mut tree, "a");
        tree.set(stmt, "expression", a).unwrap();

        assert!(tree.remove_child(stmt.into(), a));
        assert_eq!(tree.parent(Handle::Node(a)), None);
        assert!(!tree.remove_child(stmt.into(), a));
        assert_eq!(tree.index_of(stmt.into(), &Value::Node(a)), None);
    }

    #[test]
    fn index_of_names_the_holding_field() {
        let mut tree = tree();
        let bin = tree.create_node("BinaryExpression").unwrap();
        let a = ident(&mut tree, "a");
        let b = ident(&mut tree, "b");
        tree.set(bin, "left", a).unwrap();
        tree.set(bin, "right", b).unwrap();
        assert_eq!(tree.field_of(bin, &Value::Node(b)), Some("right"));
        assert_eq!(tree.index_of(bin.into(), &Value::Node(b)), Some(Key::Field("right")));
        assert_eq!(tree.key_of(Handle::Node(a)), Some(Key::Field("left")));
    }

    #[test]
    fn list_fields_cannot_be_reassigned() {
        let mut tree = tree();
        let program = tree.create_node("Program").unwrap();
        let other = tree.create_node("Program").unwrap();
        let list = tree.list(other, "body").unwrap();
        let err = tree.set(program, "body", Value::List(list)).unwrap_err();
        assert!(matches!(err, TreeError::ListField { .. }));
        assert!(matches!(
            tree.list(program, "sourceType"),
            Err(TreeError::NotAList { .. })
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = tree();
        let outer = tree.create_node("ExpressionStatement").unwrap();
        let seq = tree.create_node("UnaryExpression").unwrap();
        let inner = tree.create_node("UnaryExpression").unwrap();
        tree.set(outer, "expression", seq).unwrap();
        tree.set(seq, "argument", inner).unwrap();

        let err = tree.set(inner, "argument", seq).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
        assert_eq!(tree.parent(Handle::Node(seq)), Some(Handle::Node(outer)));
        assert!(tree.set(seq, "argument", seq).is_err());
    }

    #[test]
    fn abstract_and_unknown_types_cannot_be_created() {
        let mut tree = tree();
        assert!(matches!(
            tree.create_node("Statement"),
            Err(TreeError::AbstractType { .. })
        ));
        match tree.create_node("Identifer") {
            Err(TreeError::MissingType { hint, .. }) => assert!(hint.contains("Identifier")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn traverse_visits_fields_in_schema_order() {
        let mut tree = tree();
        let bin = tree.create_node("BinaryExpression").unwrap();
        tree.set(bin, "operator", "+").unwrap();
        let a = ident(&mut tree, "a");
        tree.set(bin, "left", a).unwrap();

        let mut keys = Vec::new();
        tree.traverse(Handle::Node(bin), false, &mut |_, key| {
            keys.push(key.to_string());
            Visit::<()>::Continue
        });
        assert_eq!(keys, ["operator", "left", "right"]);
    }

    #[test]
    fn traverse_stops_and_skips() {
        let mut tree = tree();
        let stmt = tree.create_node("ExpressionStatement").unwrap();
        let unary = tree.create_node("UnaryExpression").unwrap();
        let a = ident(&mut tree, "a");
        tree.set(stmt, "expression", unary).unwrap();
        tree.set(unary, "argument", a).unwrap();

        let found = tree.traverse(Handle::Node(stmt), true, &mut |value, _| match value {
            Value::String(name) => Visit::Stop(name.clone()),
            _ => Visit::Continue,
        });
        assert_eq!(found.as_deref(), Some("a"));

        let skipped: Option<String> = tree.traverse(Handle::Node(stmt), true, &mut |value, _| {
            match value {
                Value::Node(_) => Visit::Skip,
                Value::String(name) => Visit::Stop(name.clone()),
                _ => Visit::Continue,
            }
        });
        assert_eq!(skipped, None);

        let shallow: Option<String> = tree.traverse(Handle::Node(stmt), false, &mut |value, _| {
            match value {
                Value::String(name) => Visit::Stop(name.clone()),
                _ => Visit::Continue,
            }
        });
        assert_eq!(shallow, None);
    }

    #[test]
    fn instance_of_uses_registry() {
        let mut tree = tree();
        let a = ident(&mut tree, "a");
        assert!(tree.instance_of(a, "Identifier"));
        assert!(tree.instance_of(a, "Expression"));
        assert!(tree.instance_of(a, "Pattern"));
        assert!(!tree.instance_of(a, "Statement"));
        assert!(!tree.instance_of(a, "Bogus"));
    }
}
