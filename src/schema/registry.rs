//! Schema compiler and type registry.
//!
//! [`RegistryBuilder::describe`] takes a declarative [`TypeDecl`] and a base
//! type and produces a concrete [`NodeType`] whose field set is the base's
//! combined fields with the new declaration overlaid. Accept-set entries are
//! resolved when the builder is finished, so declarations may reference types
//! that are described later in the same catalogue.

use crate::schema::errors::{did_you_mean, ConfigError};
use crate::schema::types::{FieldDecl, Literal, TypeDecl};
use crate::value::{PrimitiveKind, Value};
use std::collections::HashMap;
use std::fmt;

/// Name of the implicit root of every inheritance chain.
pub const ROOT_TYPE: &str = "Node";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Holds at most one child node, or null.
    Node,
    /// Holds an owned list of child nodes.
    List,
    /// Holds a scalar of one of the accepted primitive kinds.
    Native,
    /// Holds one of an explicit set of literal values.
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accept {
    Type(TypeId),
    Category(CategoryId),
    Primitive(PrimitiveKind),
    Literal(Value),
    Null,
    Undefined,
}

#[derive(Debug, Clone)]
pub struct AcceptSet {
    entries: Vec<Accept>,
    label: String,
}

impl AcceptSet {
    pub fn entries(&self) -> &[Accept] {
        &self.entries
    }

    pub fn admits_null(&self) -> bool {
        self.entries.contains(&Accept::Null)
    }

    /// Scalar test for native and strict fields.
    pub fn admits_scalar(&self, value: &Value) -> bool {
        match value {
            Value::Null => self.admits_null(),
            Value::Undefined => true,
            Value::Node(_) | Value::List(_) => false,
            scalar => self.entries.iter().any(|entry| match entry {
                Accept::Primitive(kind) => scalar.primitive_kind() == Some(*kind),
                Accept::Literal(literal) => literal == scalar,
                _ => false,
            }),
        }
    }

    /// Polymorphic node test: the type, or any type derived from it, or a
    /// member of an accepted category.
    pub fn admits_node(&self, registry: &Registry, ty: TypeId) -> bool {
        self.entries.iter().any(|entry| match entry {
            Accept::Type(test) => registry.instance_of(ty, *test),
            Accept::Category(category) => registry.satisfies(ty, *category),
            _ => false,
        })
    }
}

impl fmt::Display for AcceptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub accepts: AcceptSet,
    /// Value read back while the slot is unset.
    pub default: Value,
}

#[derive(Debug, Clone)]
pub struct NodeType {
    pub id: TypeId,
    pub name: String,
    pub base: Option<TypeId>,
    pub is_abstract: bool,
    /// Combined fields: ancestor fields first, most specific declaration wins.
    pub fields: Vec<FieldSchema>,
}

impl NodeType {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Name of the list subtype generated for one of this type's list fields,
    /// e.g. `ProgramBody`.
    pub fn list_type_name(&self, field: &str) -> String {
        let mut chars = field.chars();
        match chars.next() {
            Some(first) => format!("{}{}{}", self.name, first.to_uppercase(), chars.as_str()),
            None => self.name.clone(),
        }
    }
}

/// A capability predicate: membership in a fixed list of concrete types.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub members: Vec<TypeId>,
}

#[derive(Debug)]
pub struct Registry {
    name: String,
    types: Vec<NodeType>,
    type_index: HashMap<String, TypeId>,
    categories: Vec<Category>,
    category_index: HashMap<String, CategoryId>,
}

impl Registry {
    pub fn builder(name: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    pub fn node_type(&self, id: TypeId) -> &NodeType {
        &self.types[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<&NodeType> {
        self.type_id(name).map(|id| self.node_type(id))
    }

    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.category_index.get(name).copied()
    }

    pub fn category(&self, id: CategoryId) -> &Category {
        &self.categories[id.0 as usize]
    }

    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.iter()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// True if `test` is `ty` or one of its declared ancestors.
    pub fn instance_of(&self, ty: TypeId, test: TypeId) -> bool {
        let mut current = Some(ty);
        while let Some(id) = current {
            if id == test {
                return true;
            }
            current = self.node_type(id).base;
        }
        false
    }

    pub fn satisfies(&self, ty: TypeId, category: CategoryId) -> bool {
        self.category(category)
            .members
            .iter()
            .any(|member| self.instance_of(ty, *member))
    }

    /// Tests `ty` against a type or category name. `None` when the name is
    /// neither.
    pub fn is_a(&self, ty: TypeId, name: &str) -> Option<bool> {
        if let Some(test) = self.type_id(name) {
            return Some(self.instance_of(ty, test));
        }
        self.category_id(name)
            .map(|category| self.satisfies(ty, category))
    }

    /// Ancestor chain of `ty`, innermost first, excluding `ty` itself.
    pub fn ancestors(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.node_type(ty).base;
        while let Some(id) = current {
            chain.push(id);
            current = self.node_type(id).base;
        }
        chain
    }

    /// All type and category names, for "did you mean" hints.
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.types
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.categories.iter().map(|c| c.name.as_str()))
    }
}

struct PendingType {
    name: String,
    base: Option<TypeId>,
    is_abstract: bool,
    fields: Vec<FieldDecl>,
}

/// Collects type and category declarations and compiles them into a
/// [`Registry`].
pub struct RegistryBuilder {
    name: String,
    pending: Vec<PendingType>,
    index: HashMap<String, TypeId>,
    categories: Vec<(String, Vec<String>)>,
}

impl RegistryBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let root = PendingType {
            name: ROOT_TYPE.to_string(),
            base: None,
            is_abstract: true,
            fields: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert(ROOT_TYPE.to_string(), TypeId(0));

        Self {
            name: name.into(),
            pending: vec![root],
            index,
            categories: Vec::new(),
        }
    }

    /// Declares `decl` as a subtype of `base`. The base must already be
    /// declared.
    pub fn describe(&mut self, base: &str, decl: TypeDecl) -> Result<TypeId, ConfigError> {
        let Some(base_id) = self.index.get(base).copied() else {
            return Err(ConfigError::UnknownBase {
                hint: did_you_mean(base, self.index.keys().map(String::as_str)),
                type_name: decl.name,
                base: base.to_string(),
            });
        };

        if self.index.contains_key(&decl.name) {
            return Err(ConfigError::DuplicateType {
                type_name: decl.name,
            });
        }

        let id = TypeId(self.pending.len() as u32);
        self.index.insert(decl.name.clone(), id);
        self.pending.push(PendingType {
            name: decl.name,
            base: Some(base_id),
            is_abstract: decl.is_abstract,
            fields: decl.fields,
        });
        Ok(id)
    }

    /// Declares a capability predicate over a fixed list of member types.
    pub fn category(&mut self, name: impl Into<String>, members: Vec<String>) -> &mut Self {
        self.categories.push((name.into(), members));
        self
    }

    pub fn finish(self) -> Result<Registry, ConfigError> {
        let known: Vec<&str> = self
            .index
            .keys()
            .map(String::as_str)
            .chain(self.categories.iter().map(|(name, _)| name.as_str()))
            .collect();

        let mut categories = Vec::with_capacity(self.categories.len());
        let mut category_index = HashMap::new();

        for (name, members) in &self.categories {
            if self.index.contains_key(name) || category_index.contains_key(name) {
                return Err(ConfigError::DuplicateCategory { name: name.clone() });
            }

            let mut resolved = Vec::with_capacity(members.len());
            for member in members {
                let Some(id) = self.index.get(member) else {
                    return Err(ConfigError::UnknownCategoryMember {
                        category: name.clone(),
                        member: member.clone(),
                        hint: did_you_mean(member, known.iter().copied()),
                    });
                };
                resolved.push(*id);
            }

            let id = CategoryId(categories.len() as u32);
            category_index.insert(name.clone(), id);
            categories.push(Category {
                id,
                name: name.clone(),
                members: resolved,
            });
        }

        let resolver = Resolver {
            types: &self.index,
            categories: &category_index,
            known: &known,
        };

        let mut types: Vec<NodeType> = Vec::with_capacity(self.pending.len());
        for (position, pending) in self.pending.iter().enumerate() {
            let mut fields = pending
                .base
                .map(|base| types[base.index()].fields.clone())
                .unwrap_or_default();

            let mut own = Vec::with_capacity(pending.fields.len());
            for decl in &pending.fields {
                if own.contains(&decl.name.as_str()) {
                    return Err(ConfigError::DuplicateField {
                        type_name: pending.name.clone(),
                        field: decl.name.clone(),
                    });
                }
                own.push(decl.name.as_str());

                let field = resolver.compile_field(&pending.name, decl)?;
                match fields.iter_mut().find(|existing| existing.name == field.name) {
                    Some(existing) => *existing = field,
                    None => fields.push(field),
                }
            }

            types.push(NodeType {
                id: TypeId(position as u32),
                name: pending.name.clone(),
                base: pending.base,
                is_abstract: pending.is_abstract,
                fields,
            });
        }

        tracing::debug!(
            registry = %self.name,
            types = types.len(),
            categories = categories.len(),
            "compiled node-type registry"
        );

        Ok(Registry {
            name: self.name,
            types,
            type_index: self.index,
            categories,
            category_index,
        })
    }
}

struct Resolver<'a> {
    types: &'a HashMap<String, TypeId>,
    categories: &'a HashMap<String, CategoryId>,
    known: &'a [&'a str],
}

impl Resolver<'_> {
    fn resolve(&self, type_name: &str, field: &str, entry: &str) -> Result<Accept, ConfigError> {
        match entry {
            "null" => return Ok(Accept::Null),
            "undefined" => return Ok(Accept::Undefined),
            _ => {}
        }
        if let Some(kind) = PrimitiveKind::parse(entry) {
            return Ok(Accept::Primitive(kind));
        }
        if let Some(id) = self.types.get(entry) {
            return Ok(Accept::Type(*id));
        }
        if let Some(id) = self.categories.get(entry) {
            return Ok(Accept::Category(*id));
        }
        Err(ConfigError::UnresolvedAccept {
            type_name: type_name.to_string(),
            field: field.to_string(),
            entry: entry.to_string(),
            hint: did_you_mean(entry, self.known.iter().copied()),
        })
    }

    fn compile_field(&self, type_name: &str, decl: &FieldDecl) -> Result<FieldSchema, ConfigError> {
        let mut entries = Vec::with_capacity(decl.accepts.len() + decl.one_of.len());
        for entry in &decl.accepts {
            entries.push(self.resolve(type_name, &decl.name, entry)?);
        }

        let has_nodes = entries
            .iter()
            .any(|e| matches!(e, Accept::Type(_) | Accept::Category(_)));
        let has_primitives = entries.iter().any(|e| matches!(e, Accept::Primitive(_)));

        let kind = if decl.list {
            if has_primitives || !decl.one_of.is_empty() {
                return Err(ConfigError::InvalidListAccepts {
                    type_name: type_name.to_string(),
                    field: decl.name.clone(),
                });
            }
            FieldKind::List
        } else if !decl.one_of.is_empty() {
            if has_nodes || has_primitives {
                return Err(ConfigError::MixedAccepts {
                    type_name: type_name.to_string(),
                    field: decl.name.clone(),
                });
            }
            entries.extend(decl.one_of.iter().map(|l| Accept::Literal(l.to_value())));
            FieldKind::Strict
        } else if has_nodes && has_primitives {
            return Err(ConfigError::MixedAccepts {
                type_name: type_name.to_string(),
                field: decl.name.clone(),
            });
        } else if has_nodes {
            FieldKind::Node
        } else if has_primitives {
            FieldKind::Native
        } else {
            return Err(ConfigError::EmptyAccepts {
                type_name: type_name.to_string(),
                field: decl.name.clone(),
            });
        };

        if kind == FieldKind::List && !has_nodes {
            return Err(ConfigError::EmptyAccepts {
                type_name: type_name.to_string(),
                field: decl.name.clone(),
            });
        }

        let label = decl
            .accepts
            .iter()
            .cloned()
            .chain(decl.one_of.iter().map(Literal::to_string))
            .collect::<Vec<_>>()
            .join("|");

        let accepts = AcceptSet { entries, label };
        let default = Self::default_for(type_name, decl, kind, &accepts)?;

        Ok(FieldSchema {
            name: decl.name.clone(),
            kind,
            accepts,
            default,
        })
    }

    fn default_for(
        type_name: &str,
        decl: &FieldDecl,
        kind: FieldKind,
        accepts: &AcceptSet,
    ) -> Result<Value, ConfigError> {
        if let Some(literal) = &decl.default {
            let value = literal.to_value();
            let valid = matches!(kind, FieldKind::Native | FieldKind::Strict)
                && accepts.admits_scalar(&value);
            if !valid {
                return Err(ConfigError::InvalidDefault {
                    type_name: type_name.to_string(),
                    field: decl.name.clone(),
                    value: literal.to_string(),
                });
            }
            return Ok(value);
        }

        if kind == FieldKind::List {
            return Ok(Value::Undefined);
        }
        if accepts.admits_null() {
            return Ok(Value::Null);
        }
        if kind == FieldKind::Native
            && accepts.entries() == [Accept::Primitive(PrimitiveKind::Boolean)]
        {
            return Ok(Value::Bool(false));
        }
        Ok(Value::Undefined)
    }
}
