//! Combinator expansion: turning a context into the candidates the next
//! selector part is tested against.

use crate::query::selector::Combinator;
use crate::tree::{Handle, Key, Tree, Visit};
use crate::value::Value;

/// Where a selector part is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Context {
    /// A virtual document whose only child is the given root, so the root
    /// itself can be a candidate.
    Document(Handle),
    /// A node or list in the tree.
    Item(Handle),
}

impl Combinator {
    /// Types and categories a descendant variant does not enter. The boundary
    /// value itself is not yielded either.
    pub(crate) fn boundary(&self) -> &'static [&'static str] {
        match self {
            Combinator::DescendantOutsideBlocks => &[
                "BlockStatement",
                "ForStatement",
                "ForInStatement",
                "ForOfStatement",
            ],
            Combinator::DescendantOutsideFunctions => &["Function"],
            Combinator::DescendantOutsideClasses => &["Class"],
            _ => &[],
        }
    }

    fn is_deep(&self) -> bool {
        matches!(
            self,
            Combinator::Descendant
                | Combinator::DescendantOutsideBlocks
                | Combinator::DescendantOutsideFunctions
                | Combinator::DescendantOutsideClasses
        )
    }
}

fn at_boundary(tree: &Tree, value: &Value, boundary: &[&str]) -> bool {
    let Some(node) = value.as_node() else {
        return false;
    };
    boundary
        .iter()
        .any(|name| tree.registry().is_a(tree.type_id(node), name) == Some(true))
}

/// Calls `visit(value, key)` for every candidate `combinator` reaches from
/// `context`, in document order for descendants and innermost-first for
/// ancestors.
pub(crate) fn expand<'t, F>(tree: &'t Tree, context: Context, combinator: Combinator, mut visit: F)
where
    F: FnMut(&Value, Option<Key<'t>>),
{
    let boundary = combinator.boundary();

    match context {
        Context::Document(root) => {
            let value = Value::from(root);
            if combinator == Combinator::Child {
                visit(&value, None);
            } else if combinator.is_deep() && !at_boundary(tree, &value, boundary) {
                visit(&value, None);
                descend(tree, root, boundary, &mut visit);
            }
        }
        Context::Item(handle) => match combinator {
            Combinator::Child => {
                tree.traverse(handle, false, &mut |value, key| {
                    visit(value, Some(key));
                    Visit::<()>::Continue
                });
            }
            Combinator::Parent => {
                if let Some(parent) = tree.parent(handle) {
                    visit(&Value::from(parent), tree.key_of(parent));
                }
            }
            Combinator::Ancestor => {
                let mut current = tree.parent(handle);
                while let Some(parent) = current {
                    visit(&Value::from(parent), tree.key_of(parent));
                    current = tree.parent(parent);
                }
            }
            _ => descend(tree, handle, boundary, &mut visit),
        },
    }
}

fn descend<'t, F>(tree: &'t Tree, from: Handle, boundary: &[&str], visit: &mut F)
where
    F: FnMut(&Value, Option<Key<'t>>),
{
    tree.traverse(from, true, &mut |value, key| {
        if at_boundary(tree, value, boundary) {
            return Visit::<()>::Skip;
        }
        visit(value, Some(key));
        Visit::Continue
    });
}
