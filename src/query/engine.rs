use crate::query::cache;
use crate::query::combinator::{expand, Context};
use crate::query::errors::QueryError;
use crate::query::matcher::matches_part;
use crate::query::pseudo;
use crate::query::selector::{Chain, Part, Selector};
use crate::schema::errors::did_you_mean;
use crate::tree::{Handle, NodeId, Tree, Uid};
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// Per-search memo of expansions, keyed by context uid and part text.
type ExpansionCache = HashMap<(Uid, String), Vec<Value>>;

/// Engine for evaluating selectors against a typed tree.
///
/// # Selector Syntax
///
/// ```text
/// Program > body > #VariableDeclaration declarations #Identifier:declaration
/// #CallExpression > callee[name=require], #ImportDeclaration
/// #Identifier:reference(x) ! #FunctionDeclaration
/// ```
///
/// Tags match the key a value sits under in its parent (a field name or list
/// index). `#Type` tests the node type, including base types and categories.
pub struct QueryEngine<'t> {
    tree: &'t Tree,
}

impl<'t> QueryEngine<'t> {
    pub fn new(tree: &'t Tree) -> Self {
        Self { tree }
    }

    /// Every value the expression selects below `context`, deduplicated and
    /// in first-found order. Lists among the results are replaced by their
    /// member nodes.
    pub fn search(&self, context: Handle, expression: &str) -> Result<Vec<Value>, QueryError> {
        let selector = cache::get_or_parse(expression)?;
        self.search_selector(context, &selector)
    }

    pub fn search_selector(
        &self,
        context: Handle,
        selector: &Selector,
    ) -> Result<Vec<Value>, QueryError> {
        self.check_types(selector)?;
        let found = self.evaluate(Context::Item(context), selector);
        Ok(self.flatten(found))
    }

    /// Search that must select exactly one value.
    pub fn find_unique(&self, context: Handle, expression: &str) -> Result<Value, QueryError> {
        let mut found = self.search(context, expression)?;
        match found.len() {
            0 => Err(QueryError::NoMatch),
            1 => Ok(found.remove(0)),
            n => Err(QueryError::AmbiguousMatch { count: n }),
        }
    }

    /// Whether `handle` is selected by the expression.
    ///
    /// A single part is tested directly. Anything longer is evaluated from
    /// the document holding the tree root, so the root can satisfy the first
    /// part.
    pub fn matches(&self, handle: Handle, expression: &str) -> Result<bool, QueryError> {
        let selector = cache::get_or_parse(expression)?;
        self.check_types(&selector)?;

        if let Some(part) = selector.simple_part() {
            return Ok(matches_part(self.tree, &Value::from(handle), None, part));
        }

        let uid = self.tree.uid(handle);
        let root = self.tree.root(handle);
        Ok(self
            .evaluate(Context::Document(root), &selector)
            .iter()
            .any(|value| self.identity(value) == Some(uid)))
    }

    /// Nearest ancestor, list or node, satisfying the expression, or the
    /// immediate parent when no expression is given.
    pub fn parent(&self, handle: Handle, expression: Option<&str>) -> Result<Option<Handle>, QueryError> {
        let mut current = self.tree.parent(handle);
        while let Some(parent) = current {
            if self.accepts(parent, expression)? {
                return Ok(Some(parent));
            }
            current = self.tree.parent(parent);
        }
        Ok(None)
    }

    /// Every ancestor satisfying the expression, innermost first.
    pub fn parents(&self, handle: Handle, expression: Option<&str>) -> Result<Vec<Handle>, QueryError> {
        let mut found = Vec::new();
        let mut current = self.tree.parent(handle);
        while let Some(parent) = current {
            if self.accepts(parent, expression)? {
                found.push(parent);
            }
            current = self.tree.parent(parent);
        }
        Ok(found)
    }

    /// Nearest enclosing scope (program or function) satisfying the
    /// expression.
    pub fn scope(&self, handle: Handle, expression: Option<&str>) -> Result<Option<NodeId>, QueryError> {
        let mut current = self.tree.parent(handle);
        while let Some(parent) = current {
            if let Some(scope) = self.scope_match(parent, expression)? {
                return Ok(Some(scope));
            }
            current = self.tree.parent(parent);
        }
        Ok(None)
    }

    /// Every enclosing scope satisfying the expression, innermost first.
    pub fn scopes(&self, handle: Handle, expression: Option<&str>) -> Result<Vec<NodeId>, QueryError> {
        let mut found = Vec::new();
        let mut current = self.tree.parent(handle);
        while let Some(parent) = current {
            found.extend(self.scope_match(parent, expression)?);
            current = self.tree.parent(parent);
        }
        Ok(found)
    }

    fn scope_match(&self, handle: Handle, expression: Option<&str>) -> Result<Option<NodeId>, QueryError> {
        match handle {
            Handle::Node(node) if pseudo::is_scope(self.tree, node) => {
                Ok(self.accepts(handle, expression)?.then_some(node))
            }
            _ => Ok(None),
        }
    }

    fn accepts(&self, handle: Handle, expression: Option<&str>) -> Result<bool, QueryError> {
        match expression {
            None => Ok(true),
            Some(expression) => self.matches(handle, expression),
        }
    }

    /// Rejects `#id` names the registry knows neither as type nor category.
    fn check_types(&self, selector: &Selector) -> Result<(), QueryError> {
        let registry = self.tree.registry();
        for name in selector.type_names() {
            if registry.type_id(name).is_none() && registry.category_id(name).is_none() {
                return Err(QueryError::UnknownType {
                    name: name.to_string(),
                    hint: did_you_mean(name, registry.known_names()),
                });
            }
        }
        Ok(())
    }

    fn identity(&self, value: &Value) -> Option<Uid> {
        value.as_handle().map(|handle| self.tree.uid(handle))
    }

    /// Unions the results of every chain, deduplicated by uid.
    fn evaluate(&self, start: Context, selector: &Selector) -> Vec<Value> {
        let mut cache = ExpansionCache::new();
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for chain in &selector.chains {
            let matched = self.evaluate_chain(start, chain, &mut cache);
            tracing::trace!(chain = %chain, matched = matched.len(), "evaluated selector chain");
            for value in matched {
                self.push_unique(&mut found, &mut seen, value);
            }
        }
        found
    }

    fn evaluate_chain(&self, start: Context, chain: &Chain, cache: &mut ExpansionCache) -> Vec<Value> {
        let mut contexts = vec![start];
        let mut matched = Vec::new();

        for part in &chain.parts {
            let key = part.to_string();
            let mut next = Vec::new();
            let mut seen = HashSet::new();

            for context in &contexts {
                for value in self.expand_part(*context, part, &key, cache) {
                    self.push_unique(&mut next, &mut seen, value);
                }
            }

            if next.is_empty() {
                return Vec::new();
            }
            contexts = next
                .iter()
                .filter_map(Value::as_handle)
                .map(Context::Item)
                .collect();
            matched = next;
        }
        matched
    }

    /// Candidates for `part` reachable from `context` that satisfy it.
    fn expand_part(
        &self,
        context: Context,
        part: &Part,
        key: &str,
        cache: &mut ExpansionCache,
    ) -> Vec<Value> {
        let cache_key = match context {
            Context::Item(handle) => Some((self.tree.uid(handle), key.to_string())),
            Context::Document(_) => None,
        };
        if let Some(hit) = cache_key.as_ref().and_then(|k| cache.get(k)) {
            tracing::trace!(part = key, "expansion cache hit");
            return hit.clone();
        }

        let mut matched = Vec::new();
        let mut seen = HashSet::new();
        expand(self.tree, context, part.combinator, |value, position| {
            if matches_part(self.tree, value, position, part) {
                self.push_unique(&mut matched, &mut seen, value.clone());
            }
        });

        if let Some(cache_key) = cache_key {
            cache.insert(cache_key, matched.clone());
        }
        matched
    }

    /// Appends `value` unless a value with the same uid is already present.
    /// Primitives carry no identity and are always appended.
    fn push_unique(&self, found: &mut Vec<Value>, seen: &mut HashSet<Uid>, value: Value) {
        match self.identity(&value) {
            Some(uid) if !seen.insert(uid) => {}
            _ => found.push(value),
        }
    }

    /// Replaces each list result, last to first, by its member nodes that are
    /// not already among the results.
    fn flatten(&self, mut found: Vec<Value>) -> Vec<Value> {
        let mut index = found.len();
        while index > 0 {
            index -= 1;
            let Value::List(list) = found[index] else {
                continue;
            };
            let members: Vec<Value> = self
                .tree
                .items(list)
                .iter()
                .flatten()
                .map(|node| Value::Node(*node))
                .filter(|member| !found.contains(member))
                .collect();
            let tail = found.split_off(index + 1);
            found.pop();
            found.extend(members);
            found.extend(tail);
        }
        found
    }
}

impl Tree {
    /// Shorthand for [`QueryEngine::search`].
    pub fn search(&self, context: impl Into<Handle>, expression: &str) -> Result<Vec<Value>, QueryError> {
        QueryEngine::new(self).search(context.into(), expression)
    }

    /// Shorthand for [`QueryEngine::matches`].
    pub fn matches(&self, handle: impl Into<Handle>, expression: &str) -> Result<bool, QueryError> {
        QueryEngine::new(self).matches(handle.into(), expression)
    }
}
