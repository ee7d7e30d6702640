//! Conversion between untyped JSON records and typed trees.

use crate::schema::FieldKind;
use crate::tree::arena::{Handle, ListId, NodeId, Tree};
use crate::tree::errors::TreeError;
use crate::value::{Regex, Value, MAX_SAFE_INTEGER};
use serde_json::{Map, Number, Value as Json};
use std::sync::Arc;

const TYPE_KEY: &str = "type";

impl Tree {
    /// Builds typed nodes from an untyped record graph.
    ///
    /// Records tagged with `type` become nodes of the registered type, arrays
    /// under list fields become that field's list, and a top-level array
    /// becomes a standalone list. Keys a node type does not declare are kept
    /// as metadata.
    pub fn build(&mut self, input: &Json) -> Result<Value, TreeError> {
        let before = self.node_count();
        let value = self.build_value(input, "input")?;
        tracing::debug!(
            root = %self.describe(&value),
            nodes = self.node_count() - before,
            "built tree"
        );
        Ok(value)
    }

    /// Parses JSON text and builds it.
    pub fn parse_json(&mut self, text: &str) -> Result<Value, TreeError> {
        let input: Json = serde_json::from_str(text)?;
        self.build(&input)
    }

    fn build_value(&mut self, input: &Json, context: &str) -> Result<Value, TreeError> {
        match input {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
                TreeError::UnsupportedValue {
                    context: context.to_string(),
                    value: n.to_string(),
                }
            }),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(elements) => {
                let list = self.create_list();
                self.fill_list(list, elements, context)?;
                Ok(Value::List(list))
            }
            Json::Object(record) if record.contains_key(TYPE_KEY) => {
                self.build_record(record).map(Value::Node)
            }
            Json::Object(record) => match regex_literal(record) {
                Some(regex) => Ok(Value::Regex(regex)),
                None => Err(TreeError::UntaggedRecord {
                    record: input.to_string(),
                }),
            },
        }
    }

    fn build_record(&mut self, record: &Map<String, Json>) -> Result<NodeId, TreeError> {
        let type_name = match &record[TYPE_KEY] {
            Json::String(name) => name.as_str(),
            other => {
                return Err(TreeError::UnsupportedValue {
                    context: "type tag".to_string(),
                    value: other.to_string(),
                })
            }
        };
        let node = self.create_node(type_name)?;
        let registry = Arc::clone(&self.registry);
        let node_type = registry.node_type(self.type_id(node));

        for (index, field) in node_type.fields.iter().enumerate() {
            let Some(raw) = record.get(&field.name) else {
                continue;
            };
            let context = format!("{}.{}", node_type.name, field.name);
            if field.kind == FieldKind::List {
                let list = self.list(node, &field.name)?;
                match raw {
                    Json::Array(elements) => self.fill_list(list, elements, &context)?,
                    Json::Null => {}
                    other => {
                        return Err(TreeError::UnsupportedValue {
                            context,
                            value: other.to_string(),
                        })
                    }
                }
                continue;
            }

            let value = match (raw, record.get("regex")) {
                // ESTree regex literals carry an empty `value` next to a
                // `regex: { pattern, flags }` record.
                (Json::Object(empty), Some(Json::Object(regex))) if empty.is_empty() => {
                    match regex_literal(regex) {
                        Some(regex) => Value::Regex(regex),
                        None => self.build_value(raw, &context)?,
                    }
                }
                _ => self.build_value(raw, &context)?,
            };
            self.set_slot(node, index, value)?;
        }

        let meta = &mut self.nodes[node.index()].meta;
        for (key, raw) in record {
            if key != TYPE_KEY && node_type.field_index(key).is_none() {
                meta.insert(key.clone(), raw.clone());
            }
        }
        Ok(node)
    }

    fn fill_list(&mut self, list: ListId, elements: &[Json], context: &str) -> Result<(), TreeError> {
        for element in elements {
            let value = self.build_value(element, context)?;
            let item = self.list_item(list, &value)?;
            self.append(list, vec![item])?;
        }
        Ok(())
    }

    /// Plain structural mirror of a node or list. Unset fields are omitted,
    /// list fields are always present and metadata is copied through.
    pub fn to_json(&self, handle: Handle) -> Json {
        match handle {
            Handle::Node(node) => {
                let mut record = Map::new();
                record.insert(TYPE_KEY.to_string(), Json::String(self.type_name(node).to_string()));
                for (index, field) in self.node_type(node).fields.iter().enumerate() {
                    if self.slot_is_set(node, index) {
                        let value = self.slot_value(node, index);
                        record.insert(field.name.clone(), self.value_to_json(&value));
                    }
                }
                for (key, raw) in self.meta(node) {
                    if !record.contains_key(key) {
                        record.insert(key.clone(), raw.clone());
                    }
                }
                Json::Object(record)
            }
            Handle::List(list) => Json::Array(
                self.items(list)
                    .iter()
                    .map(|item| match item {
                        Some(id) => self.to_json(Handle::Node(*id)),
                        None => Json::Null,
                    })
                    .collect(),
            ),
        }
    }

    pub fn value_to_json(&self, value: &Value) -> Json {
        match value {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Regex(regex) => {
                let mut record = Map::new();
                record.insert("pattern".to_string(), Json::String(regex.pattern.clone()));
                record.insert("flags".to_string(), Json::String(regex.flags.clone()));
                Json::Object(record)
            }
            Value::Node(id) => self.to_json(Handle::Node(*id)),
            Value::List(id) => self.to_json(Handle::List(*id)),
        }
    }

    pub fn to_json_string(&self, handle: Handle) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(&self.to_json(handle))?)
    }

    /// Structurally equal, identity-distinct copy of a subtree. The copy is
    /// detached; a cloned list is standalone.
    pub fn clone_subtree(&mut self, handle: Handle) -> Result<Value, TreeError> {
        let json = self.to_json(handle);
        self.build_value(&json, "clone")
    }
}

fn regex_literal(record: &Map<String, Json>) -> Option<Regex> {
    let pattern = record.get("pattern")?.as_str()?;
    let flags = match record.get("flags") {
        Some(flags) => flags.as_str()?,
        None => "",
    };
    Some(Regex {
        pattern: pattern.to_string(),
        flags: flags.to_string(),
    })
}

fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        Json::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}
