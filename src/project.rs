//! Typed, read-only view of a Scratch 3 `project.json`.
//!
//! Input shapes are decided once here so the compiler never has to inspect
//! raw JSON tuples.

use crate::error::ProjectError;
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Number, Value};

/// Primitive type code marking a variable reference inside an input tuple.
pub const VARIABLE_PRIMITIVE: i64 = 12;

#[derive(Debug, Clone)]
pub struct Project {
    pub targets: Vec<Target>,
    pub monitors: Vec<Monitor>,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub is_stage: bool,
    pub variables: IndexMap<String, Variable>,
    pub lists: IndexMap<String, ListDecl>,
    pub blocks: IndexMap<String, Block>,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct ListDecl {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub id: String,
    pub opcode: String,
    pub next: Option<String>,
    pub top_level: bool,
    pub x: Number,
    pub y: Number,
    pub fields: IndexMap<String, Field>,
    pub inputs: IndexMap<String, Input>,
    pub mutation: Option<Mutation>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// No payload (an empty boolean or substack slot).
    Empty,
    /// A nested block, either a reporter or the head of a statement chain.
    Block(String),
    /// A literal primitive such as `[4, "10"]`; holds the value element.
    Literal(Value),
    /// A `[12, name, id]` variable primitive.
    Reference { name: String, id: String },
}

#[derive(Debug, Clone, Default)]
pub struct Mutation {
    pub proccode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    pub id: String,
    pub kind: Option<String>,
    pub opcode: String,
    pub params: Map<String, Value>,
}

impl Project {
    pub fn from_json_str(source: &str) -> Result<Self, ProjectError> {
        let value: Value =
            serde_json::from_str(source).map_err(|e| ProjectError::Json(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ProjectError> {
        let targets = value
            .get("targets")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("missing 'targets' array."))?
            .iter()
            .map(Target::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let monitors = match value.get("monitors").and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(Monitor::from_value).collect(),
            None => Vec::new(),
        };

        Ok(Self { targets, monitors })
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn monitor(&self, id: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }
}

impl Target {
    fn from_value(value: &Value) -> Result<Self, ProjectError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("target missing 'name'."))?
            .to_string();
        let is_stage = value
            .get("isStage")
            .and_then(Value::as_bool)
            .ok_or_else(|| malformed(format!("target '{}' missing isStage.", name)))?;

        let variables = read_decls(value.get("variables"))
            .into_iter()
            .map(|(id, name, value)| (id, Variable { name, value }))
            .collect();
        let lists = read_decls(value.get("lists"))
            .into_iter()
            .map(|(id, name, value)| (id, ListDecl { name, value }))
            .collect();

        let mut blocks = IndexMap::new();
        if let Some(obj) = value.get("blocks").and_then(Value::as_object) {
            for (id, raw) in obj {
                if !raw.is_object() {
                    debug!("target '{}': skipping primitive block '{}'", name, id);
                    continue;
                }
                let block = Block::from_value(id, raw)
                    .map_err(|e| malformed(format!("target '{}': {}", name, e)))?;
                blocks.insert(id.clone(), block);
            }
        }

        Ok(Self {
            name,
            is_stage,
            variables,
            lists,
            blocks,
        })
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Script roots in document order.
    pub fn top_level_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values().filter(|b| b.top_level)
    }
}

fn read_decls(node: Option<&Value>) -> Vec<(String, String, Value)> {
    let mut out = Vec::new();
    let Some(obj) = node.and_then(Value::as_object) else {
        return out;
    };
    for (id, decl) in obj {
        let Some(arr) = decl.as_array() else {
            continue;
        };
        let name = arr.first().map(display_raw).unwrap_or_default();
        let value = arr.get(1).cloned().unwrap_or(Value::Null);
        out.push((id.clone(), name, value));
    }
    out
}

impl Block {
    fn from_value(id: &str, value: &Value) -> Result<Self, String> {
        let opcode = value
            .get("opcode")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("block '{}' missing opcode.", id))?
            .to_string();
        let next = value
            .get("next")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let top_level = value
            .get("topLevel")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut fields = IndexMap::new();
        if let Some(obj) = value.get("fields").and_then(Value::as_object) {
            for (name, raw) in obj {
                fields.insert(name.clone(), Field::from_value(raw));
            }
        }

        let mut inputs = IndexMap::new();
        if let Some(obj) = value.get("inputs").and_then(Value::as_object) {
            for (name, raw) in obj {
                let input = Input::from_value(raw).ok_or_else(|| {
                    format!("block '{}' ({}) has malformed input '{}'.", id, opcode, name)
                })?;
                inputs.insert(name.clone(), input);
            }
        }

        let mutation = value
            .get("mutation")
            .and_then(Value::as_object)
            .map(|m| Mutation {
                proccode: m
                    .get("proccode")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
            });

        Ok(Self {
            id: id.to_string(),
            opcode,
            next,
            top_level,
            x: read_coordinate(value.get("x")),
            y: read_coordinate(value.get("y")),
            fields,
            inputs,
            mutation,
        })
    }

    /// Block id referenced by the named input, if that input holds one.
    pub fn input_block_id(&self, name: &str) -> Option<&str> {
        match self.inputs.get(name) {
            Some(Input::Block(id)) => Some(id),
            _ => None,
        }
    }

    pub fn proccode(&self) -> Option<&str> {
        self.mutation.as_ref()?.proccode.as_deref()
    }
}

fn read_coordinate(value: Option<&Value>) -> Number {
    match value {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from(0),
    }
}

impl Field {
    fn from_value(value: &Value) -> Self {
        match value.as_array() {
            Some(arr) => Self {
                value: arr.first().cloned().unwrap_or(Value::Null),
            },
            None => Self {
                value: value.clone(),
            },
        }
    }
}

impl Input {
    /// Decodes a `[shadow, payload, ...]` input tuple. A null payload falls
    /// back to the trailing shadow value when one is present. Returns `None`
    /// when the tuple itself is not an array.
    pub fn from_value(value: &Value) -> Option<Self> {
        let arr = value.as_array()?;
        let input = match arr.get(1) {
            None => Input::Empty,
            Some(Value::Null) => match arr.get(2) {
                None | Some(Value::Null) => Input::Empty,
                Some(Value::Array(shadow)) => Self::from_primitive(shadow),
                Some(shadow) => Input::Literal(shadow.clone()),
            },
            Some(Value::String(id)) => Input::Block(id.clone()),
            Some(Value::Array(primitive)) => Self::from_primitive(primitive),
            Some(other) => Input::Literal(other.clone()),
        };
        Some(input)
    }

    fn from_primitive(primitive: &[Value]) -> Self {
        let code = primitive.first().and_then(Value::as_i64);
        if code == Some(VARIABLE_PRIMITIVE) {
            return Input::Reference {
                name: primitive.get(1).map(display_raw).unwrap_or_default(),
                id: primitive.get(2).map(display_raw).unwrap_or_default(),
            };
        }
        Input::Literal(primitive.get(1).cloned().unwrap_or(Value::Null))
    }
}

impl Monitor {
    fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str)?.to_string();
        let kind = value
            .get("type")
            .or_else(|| value.get("mode"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let opcode = value
            .get("opcode")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = value
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self {
            id,
            kind,
            opcode,
            params,
        })
    }

    pub fn is_list(&self) -> bool {
        self.kind.as_deref() == Some("list")
    }

    /// The watched variable or list name, depending on the monitor kind.
    pub fn param(&self) -> Value {
        let key = if self.is_list() { "LIST" } else { "VARIABLE" };
        self.params.get(key).cloned().unwrap_or(Value::Null)
    }
}

/// Text form of a raw JSON scalar: strings unquoted, anything else as JSON.
fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => crate::literal::json_literal(other),
    }
}

fn malformed(message: impl Into<String>) -> ProjectError {
    ProjectError::Malformed(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_shapes_are_decoded_once() {
        assert_eq!(Input::from_value(&json!([1, null])), Some(Input::Empty));
        assert_eq!(
            Input::from_value(&json!([1, null, 10])),
            Some(Input::Literal(json!(10)))
        );
        assert_eq!(
            Input::from_value(&json!([2, "abc"])),
            Some(Input::Block("abc".to_string()))
        );
        assert_eq!(
            Input::from_value(&json!([3, "abc", [4, "10"]])),
            Some(Input::Block("abc".to_string()))
        );
        assert_eq!(
            Input::from_value(&json!([1, [4, "10"]])),
            Some(Input::Literal(json!("10")))
        );
        assert_eq!(
            Input::from_value(&json!([3, [12, "score", "var-1"], [10, ""]])),
            Some(Input::Reference {
                name: "score".to_string(),
                id: "var-1".to_string()
            })
        );
        assert_eq!(Input::from_value(&json!("oops")), None);
    }

    #[test]
    fn key_order_follows_the_document() {
        let project = Project::from_json_str(
            r#"{"targets":[{"name":"S","isStage":false,"blocks":{
                "z":{"opcode":"a","next":null,"topLevel":true,"fields":{"B":["1"],"A":["2"]}},
                "a":{"opcode":"b","next":null,"topLevel":true}
            }}]}"#,
        )
        .unwrap();
        let target = &project.targets[0];
        let ids: Vec<_> = target.blocks.keys().cloned().collect();
        assert_eq!(ids, vec!["z", "a"]);
        let fields: Vec<_> = target.blocks["z"].fields.keys().cloned().collect();
        assert_eq!(fields, vec!["B", "A"]);
    }

    #[test]
    fn primitive_blocks_are_skipped() {
        let project = Project::from_value(&json!({
            "targets": [{
                "name": "Sprite1",
                "isStage": false,
                "blocks": { "loose": [12, "score", "var-1", 10, 20] }
            }]
        }))
        .unwrap();
        assert!(project.targets[0].blocks.is_empty());
    }

    #[test]
    fn monitor_kind_falls_back_to_mode() {
        let project = Project::from_value(&json!({
            "targets": [],
            "monitors": [{ "id": "l1", "mode": "list", "opcode": "data_listcontents",
                           "params": { "LIST": "items" } }]
        }))
        .unwrap();
        let monitor = project.monitor("l1").unwrap();
        assert!(monitor.is_list());
        assert_eq!(monitor.param(), json!("items"));
    }

    #[test]
    fn missing_targets_is_malformed() {
        let err = Project::from_value(&json!({})).unwrap_err();
        assert!(matches!(err, ProjectError::Malformed(_)));
    }
}
