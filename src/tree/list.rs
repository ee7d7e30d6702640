//! List operations.
//!
//! A list created for a node's list field validates every inserted item
//! against that field's accept-set and owns its members: insertion detaches
//! the item from its previous parent, removal clears the parent. Standalone
//! lists, produced by [`Tree::slice`] and [`Tree::filter`], hold references
//! only and touch neither validation nor ownership.

use crate::tree::arena::{Handle, Key, ListId, NodeId, Tree, Visit};
use crate::tree::errors::TreeError;
use crate::value::Value;
use std::collections::HashSet;
use std::ops::{Bound, RangeBounds};

impl Tree {
    /// Allocates an empty standalone list.
    pub fn create_list(&mut self) -> ListId {
        self.alloc_list(None)
    }

    /// True when the list belongs to a node's list field.
    pub fn is_owned(&self, list: ListId) -> bool {
        self.lists[list.index()].owner.is_some()
    }

    pub fn list_len(&self, list: ListId) -> usize {
        self.lists[list.index()].items.len()
    }

    pub fn items(&self, list: ListId) -> &[Option<NodeId>] {
        &self.lists[list.index()].items
    }

    /// Item at `index`: a node, `Null` for a hole, `Undefined` past the end.
    pub fn item(&self, list: ListId, index: usize) -> Value {
        match self.items(list).get(index) {
            Some(item) => Value::from(*item),
            None => Value::Undefined,
        }
    }

    pub fn list_values(&self, list: ListId) -> impl Iterator<Item = Value> + '_ {
        self.items(list).iter().map(|item| Value::from(*item))
    }

    pub(crate) fn position(&self, list: ListId, item: Option<NodeId>) -> Option<usize> {
        self.items(list).iter().position(|held| *held == item)
    }

    /// Converts a value into a list item. Only nodes and null may sit in a
    /// list.
    pub(crate) fn list_item(&self, list: ListId, value: &Value) -> Result<Option<NodeId>, TreeError> {
        match value {
            Value::Node(id) => Ok(Some(*id)),
            Value::Null => Ok(None),
            other => Err(TreeError::InvalidListItem {
                list: self.describe(&Value::List(list)),
                value: self.describe(other),
                accepts: self.list_accepts(list),
            }),
        }
    }

    fn list_accepts(&self, list: ListId) -> String {
        match self.lists[list.index()].owner {
            Some((owner, field)) => self.field_schema(owner, field).accepts.to_string(),
            None => "Node or null".to_string(),
        }
    }

    fn validate_item(&self, list: ListId, item: Option<NodeId>) -> Result<(), TreeError> {
        let Some((owner, field)) = self.lists[list.index()].owner else {
            return Ok(());
        };
        let accepts = &self.field_schema(owner, field).accepts;
        let valid = match item {
            None => accepts.admits_null(),
            Some(id) => accepts.admits_node(&self.registry, self.type_id(id)),
        };
        if !valid {
            return Err(TreeError::InvalidListItem {
                list: self.node_type(owner).list_type_name(&self.field_schema(owner, field).name),
                value: self.describe(&Value::from(item)),
                accepts: accepts.to_string(),
            });
        }
        if let Some(id) = item {
            self.check_acyclic(id, Handle::List(list))?;
        }
        Ok(())
    }

    /// Removes `delete` items starting at `start` and inserts `items` in
    /// their place, returning the removed items.
    ///
    /// `start` is clamped to the list length. On an owned list every item is
    /// validated before anything changes; a node listed twice is inserted
    /// once, at its first position.
    pub fn splice(
        &mut self,
        list: ListId,
        start: usize,
        delete: usize,
        mut items: Vec<Option<NodeId>>,
    ) -> Result<Vec<Option<NodeId>>, TreeError> {
        let owned = self.is_owned(list);
        if owned {
            let mut seen = HashSet::new();
            items.retain(|item| item.map_or(true, |id| seen.insert(id)));
            for item in &items {
                self.validate_item(list, *item)?;
            }
        }

        let len = self.list_len(list);
        let start = start.min(len);
        let end = start.saturating_add(delete).min(len);
        let removed: Vec<Option<NodeId>> =
            self.lists[list.index()].items.drain(start..end).collect();

        if !owned {
            self.insert_items(list, start, items);
            return Ok(removed);
        }

        for id in removed.iter().flatten() {
            self.nodes[id.index()].parent = None;
        }

        let mut at = start;
        for id in items.iter().flatten() {
            if self.nodes[id.index()].parent == Some(Handle::List(list)) {
                if let Some(position) = self.position(list, Some(*id)) {
                    self.lists[list.index()].items.remove(position);
                    if position < at {
                        at -= 1;
                    }
                }
                self.nodes[id.index()].parent = None;
            } else {
                self.detach(*id);
            }
        }

        for id in items.iter().flatten() {
            self.nodes[id.index()].parent = Some(Handle::List(list));
        }
        self.insert_items(list, at, items);
        Ok(removed)
    }

    fn insert_items(&mut self, list: ListId, at: usize, items: Vec<Option<NodeId>>) {
        let held = &mut self.lists[list.index()].items;
        let tail = held.split_off(at);
        held.extend(items);
        held.extend(tail);
    }

    /// Appends one item, returning the new length.
    pub fn push(&mut self, list: ListId, item: impl Into<Value>) -> Result<usize, TreeError> {
        let item = self.list_item(list, &item.into())?;
        let len = self.list_len(list);
        self.splice(list, len, 0, vec![item])?;
        Ok(self.list_len(list))
    }

    /// Appends many items at once; nothing is appended if any item is
    /// rejected.
    pub fn append(&mut self, list: ListId, items: Vec<Option<NodeId>>) -> Result<usize, TreeError> {
        let len = self.list_len(list);
        self.splice(list, len, 0, items)?;
        Ok(self.list_len(list))
    }

    /// Prepends one item, returning the new length.
    pub fn unshift(&mut self, list: ListId, item: impl Into<Value>) -> Result<usize, TreeError> {
        let item = self.list_item(list, &item.into())?;
        self.splice(list, 0, 0, vec![item])?;
        Ok(self.list_len(list))
    }

    /// Removes and returns the last item. `None` when the list is empty.
    pub fn pop(&mut self, list: ListId) -> Option<Option<NodeId>> {
        let len = self.list_len(list);
        if len == 0 {
            return None;
        }
        self.take(list, len - 1)
    }

    /// Removes and returns the first item. `None` when the list is empty.
    pub fn shift(&mut self, list: ListId) -> Option<Option<NodeId>> {
        if self.list_len(list) == 0 {
            return None;
        }
        self.take(list, 0)
    }

    fn take(&mut self, list: ListId, index: usize) -> Option<Option<NodeId>> {
        let item = self.lists[list.index()].items.remove(index);
        if let (true, Some(id)) = (self.is_owned(list), item) {
            self.nodes[id.index()].parent = None;
        }
        Some(item)
    }

    /// Removes every item, returning them.
    pub fn empty(&mut self, list: ListId) -> Vec<Option<NodeId>> {
        let removed = std::mem::take(&mut self.lists[list.index()].items);
        if self.is_owned(list) {
            for id in removed.iter().flatten() {
                self.nodes[id.index()].parent = None;
            }
        }
        removed
    }

    /// Copies a range of items into a new standalone list.
    pub fn slice(&mut self, list: ListId, range: impl RangeBounds<usize>) -> ListId {
        let len = self.list_len(list);
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&n) => n.saturating_add(1),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        }
        .clamp(start, len);

        let items = self.items(list)[start..end].to_vec();
        let slice = self.alloc_list(None);
        self.lists[slice.index()].items = items;
        slice
    }

    /// Collects the items accepted by `keep` into a new standalone list.
    pub fn filter<F>(&mut self, list: ListId, mut keep: F) -> ListId
    where
        F: FnMut(&Tree, Option<NodeId>, usize) -> bool,
    {
        let this: &Tree = self;
        let items: Vec<Option<NodeId>> = this
            .items(list)
            .iter()
            .enumerate()
            .filter(|(index, item)| keep(this, **item, *index))
            .map(|(_, item)| *item)
            .collect();
        let filtered = self.alloc_list(None);
        self.lists[filtered.index()].items = items;
        filtered
    }

    pub(crate) fn traverse_list<'t, T, F>(&'t self, list: ListId, deep: bool, visitor: &mut F) -> Option<T>
    where
        F: FnMut(&Value, Key<'t>) -> Visit<T>,
    {
        for (index, item) in self.items(list).iter().enumerate() {
            let value = Value::from(*item);
            let visit = visitor(&value, Key::Index(index));
            if let Some(found) = self.follow(visit, &value, deep, visitor) {
                return Some(found);
            }
        }
        None
    }

    /// Visits items from last to first. Holes are passed as `Null`.
    pub fn for_each_right<F>(&self, list: ListId, mut visitor: F)
    where
        F: FnMut(&Value, usize),
    {
        for (index, item) in self.items(list).iter().enumerate().rev() {
            visitor(&Value::from(*item), index);
        }
    }
}
