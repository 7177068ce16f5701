//! JSON-Schema documents compiled into [`Schema`] trees.
//!
//! Supports the structural subset that maps one-to-one onto schema kinds:
//! `type`, `properties`/`required`/`additionalProperties`, `items`,
//! `prefixItems`, size and range keywords, `pattern`, the common `format`s,
//! `enum`, `const`, `anyOf`/`oneOf`/`allOf`, `default` and `description`.
//! Anything else (notably `$ref`) is rejected with the JSON path where it was
//! found.
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{
    array, boolean, enumeration, intersection, literal, never, null, number, object, string, tuple, union,
    unknown, DatetimeOptions, IpVersion, RefineParams, Schema, SchemaExt,
};
use crate::value::{Literal, Value};

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT MODEL
// ————————————————————————————————————————————————————————————————————————————

/// A schema position: either a boolean schema or a keyword object.
#[derive(Debug, Clone)]
pub enum Node {
    Bool(bool),
    Doc(Box<Document>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "$schema")]
    pub dialect: Option<String>,
    #[serde(rename = "$id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<TypeSpec>,

    pub properties: IndexMap<String, Node>,
    pub required: Vec<String>,
    pub additional_properties: Option<Node>,

    pub items: Option<Node>,
    pub prefix_items: Vec<Node>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,

    #[serde(rename = "enum")]
    pub enum_: Option<Vec<serde_json::Value>>,
    #[serde(rename = "const", deserialize_with = "present")]
    pub const_: Option<serde_json::Value>,
    pub any_of: Vec<Node>,
    pub one_of: Vec<Node>,
    pub all_of: Vec<Node>,
    #[serde(deserialize_with = "present")]
    pub default: Option<serde_json::Value>,
}

/// Keeps an explicit `null` as `Some(Null)` rather than collapsing it to
/// `None`.
fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(de).map(Some)
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = Node;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a schema object or a boolean")
            }

            fn visit_bool<E: de::Error>(self, b: bool) -> Result<Node, E> {
                Ok(Node::Bool(b))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Node, A::Error> {
                let doc = Document::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(Node::Doc(Box::new(doc)))
            }
        }

        de.deserialize_any(NodeVisitor)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with the JSON path of the failure in the error.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| SchemaError::Document {
        path: err.path().to_string(),
        reason: err.into_inner().to_string(),
    })
}

pub fn load_schema_str(src: &str) -> Result<Schema, SchemaError> {
    let node: Node = from_str_with_path(src)?;
    compile(&node, "#")
}

pub fn load_schema_file(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path)
        .map_err(|e| SchemaError::Read { path: path.display().to_string(), reason: e.to_string() })?;
    debug!(path = %path.display(), bytes = src.len(), "loading schema document");
    load_schema_str(&src)
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILATION
// ————————————————————————————————————————————————————————————————————————————

fn unsupported(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Document { path: path.to_string(), reason: reason.into() }
}

pub fn compile(node: &Node, path: &str) -> Result<Schema, SchemaError> {
    match node {
        Node::Bool(true) => Ok(unknown()),
        Node::Bool(false) => Ok(never()),
        Node::Doc(doc) => compile_doc(doc, path),
    }
}

fn compile_all(nodes: &[Node], path: &str) -> Result<Vec<Schema>, SchemaError> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| compile(n, &format!("{path}/{i}")))
        .collect()
}

fn compile_doc(doc: &Document, path: &str) -> Result<Schema, SchemaError> {
    if let Some(dialect) = &doc.dialect {
        debug!(%dialect, id = doc.id.as_deref().unwrap_or(""), "schema dialect");
    }

    // Every keyword group constrains the same value, so the groups intersect.
    let mut parts = Vec::new();
    match &doc.ty {
        Some(TypeSpec::One(ty)) => parts.push(typed(doc, ty, path)?),
        Some(TypeSpec::Many(types)) => parts.push(typed_any(doc, types, path)?),
        None => {}
    }
    if let Some(c) = &doc.const_ {
        parts.push(literal(to_literal(c, &format!("{path}/const"))?));
    }
    if let Some(values) = &doc.enum_ {
        parts.push(enum_of(values, &format!("{path}/enum"))?);
    }
    if !doc.any_of.is_empty() {
        parts.push(union(compile_all(&doc.any_of, &format!("{path}/anyOf"))?));
    }
    if !doc.one_of.is_empty() {
        parts.push(union(compile_all(&doc.one_of, &format!("{path}/oneOf"))?));
    }
    parts.extend(compile_all(&doc.all_of, &format!("{path}/allOf"))?);

    let mut schema = parts.into_iter().reduce(|a, b| intersection(a, b)).unwrap_or_else(unknown);
    if let Some(value) = &doc.default {
        schema = schema.default(Value::from(value));
    }
    if let Some(text) = doc.description.as_ref().or(doc.title.as_ref()) {
        schema = schema.describe(text.clone());
    }
    Ok(schema)
}

fn to_literal(value: &serde_json::Value, path: &str) -> Result<Literal, SchemaError> {
    Literal::from_value(&Value::from(value)).ok_or_else(|| unsupported(path, "only primitive constants are supported"))
}

fn enum_of(values: &[serde_json::Value], path: &str) -> Result<Schema, SchemaError> {
    if values.is_empty() {
        return Ok(never());
    }
    if let Some(names) = values.iter().map(|v| v.as_str()).collect::<Option<Vec<_>>>() {
        return Ok(enumeration(names).into());
    }
    let options = values
        .iter()
        .enumerate()
        .map(|(i, v)| to_literal(v, &format!("{path}/{i}")).map(literal))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(union(options))
}

/// A `type` list. `null` alongside other types becomes a nullable wrapper.
fn typed_any(doc: &Document, types: &[String], path: &str) -> Result<Schema, SchemaError> {
    let with_null = types.iter().any(|t| t == "null");
    let rest = types
        .iter()
        .filter(|t| *t != "null")
        .map(|t| typed(doc, t, path))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = match rest.len() {
        0 => return Ok(null()),
        1 => rest.into_iter().next().unwrap_or_else(unknown),
        _ => union(rest),
    };
    Ok(if with_null { schema.nullable() } else { schema })
}

fn typed(doc: &Document, ty: &str, path: &str) -> Result<Schema, SchemaError> {
    match ty {
        "string" => string_of(doc, path),
        "number" => Ok(number_of(doc, false)),
        "integer" => Ok(number_of(doc, true)),
        "boolean" => Ok(boolean()),
        "null" => Ok(null()),
        "array" => array_of(doc, path),
        "object" => object_of(doc, path),
        other => Err(unsupported(&format!("{path}/type"), format!("unknown type `{other}`"))),
    }
}

fn string_of(doc: &Document, path: &str) -> Result<Schema, SchemaError> {
    let mut s = string();
    if let Some(n) = doc.min_length {
        s = s.min(n);
    }
    if let Some(n) = doc.max_length {
        s = s.max(n);
    }
    if let Some(pattern) = &doc.pattern {
        s = s.pattern(pattern).map_err(|e| unsupported(&format!("{path}/pattern"), e.to_string()))?;
    }
    match doc.format.as_deref() {
        Some("email") => s = s.email(),
        Some("uri" | "url") => s = s.url(),
        Some("uuid") => s = s.uuid(),
        Some("date-time") => s = s.datetime_with(DatetimeOptions { precision: None, offset: true }),
        Some("ipv4") => s = s.ip_version(IpVersion::V4),
        Some("ipv6") => s = s.ip_version(IpVersion::V6),
        Some("cuid") => s = s.cuid(),
        Some("cuid2") => s = s.cuid2(),
        Some("ulid") => s = s.ulid(),
        Some("emoji") => s = s.emoji(),
        // Unknown formats are annotations only.
        Some(other) => debug!(format = other, %path, "ignoring unknown string format"),
        None => {}
    }
    Ok(s.into())
}

fn number_of(doc: &Document, int: bool) -> Schema {
    let mut n = number();
    if int {
        n = n.int();
    }
    if let Some(v) = doc.minimum {
        n = n.gte(v);
    }
    if let Some(v) = doc.exclusive_minimum {
        n = n.gt(v);
    }
    if let Some(v) = doc.maximum {
        n = n.lte(v);
    }
    if let Some(v) = doc.exclusive_maximum {
        n = n.lt(v);
    }
    if let Some(v) = doc.multiple_of {
        n = n.multiple_of(v);
    }
    n.into()
}

fn array_of(doc: &Document, path: &str) -> Result<Schema, SchemaError> {
    let items = doc.items.as_ref().map(|n| compile(n, &format!("{path}/items"))).transpose()?;
    let mut schema: Schema = if doc.prefix_items.is_empty() {
        let mut a = array(items.unwrap_or_else(unknown));
        if let Some(n) = doc.min_items {
            a = a.min(n);
        }
        if let Some(n) = doc.max_items {
            a = a.max(n);
        }
        a.into()
    } else {
        let prefix = compile_all(&doc.prefix_items, &format!("{path}/prefixItems"))?;
        let t = tuple(prefix);
        // `items: false` closes the tuple; otherwise extra items are checked
        // against `items` (or accepted when it is absent).
        let t = match (&doc.items, items) {
            (Some(Node::Bool(false)), _) => t,
            (_, Some(rest)) => t.rest(rest),
            (_, None) => t.rest(unknown()),
        };
        t.into()
    };
    if doc.unique_items {
        schema = schema.refine_with(all_distinct, RefineParams::message("Array items must be unique"));
    }
    Ok(schema)
}

fn all_distinct(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        return true;
    };
    items.iter().enumerate().all(|(i, a)| items[i + 1..].iter().all(|b| a != b))
}

fn object_of(doc: &Document, path: &str) -> Result<Schema, SchemaError> {
    let mut shape = Vec::with_capacity(doc.properties.len());
    for (key, node) in &doc.properties {
        let member = compile(node, &format!("{path}/properties/{key}"))?;
        let member = if doc.required.contains(key) { member } else { member.optional() };
        shape.push((key.clone(), member));
    }
    for key in doc.required.iter().filter(|k| !doc.properties.contains_key(*k)) {
        // Required but otherwise unconstrained.
        shape.push((key.clone(), unknown().refine_with(|v| !v.is_undefined(), RefineParams::message("Required"))));
    }

    let o = object(shape);
    let o = match &doc.additional_properties {
        None | Some(Node::Bool(true)) => o.passthrough(),
        Some(Node::Bool(false)) => o.strict(),
        Some(node) => o.catchall(compile(node, &format!("{path}/additionalProperties"))?),
    };
    Ok(o.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueCode, PathSegment};
    use serde_json::json;

    fn load(doc: serde_json::Value) -> Schema {
        load_schema_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn object_documents_compile_to_object_schemas() {
        let s = load(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "age": { "type": "integer", "minimum": 0 }
            },
            "required": ["name"],
            "additionalProperties": false
        }));
        assert!(s.parse(Value::from(json!({ "name": "a" }))).is_ok());
        let err = s.safe_parse(Value::from(json!({ "name": "", "age": 1.5, "x": 1 }))).unwrap();
        let codes: Vec<_> = err.error().unwrap().issues().iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec![IssueCode::TooSmall, IssueCode::InvalidType, IssueCode::UnrecognizedKeys]);
    }

    #[test]
    fn nullable_type_lists_accept_null() {
        let s = load(json!({ "type": ["string", "null"] }));
        assert!(s.parse(Value::Null).is_ok());
        assert!(s.parse("x").is_ok());
        assert!(s.parse(1).is_err());
    }

    #[test]
    fn explicit_null_const_is_kept() {
        let s = load(json!({ "const": null }));
        assert!(s.parse(Value::Null).is_ok());
        assert!(s.parse(0).is_err());
    }

    #[test]
    fn unique_items_are_refined() {
        let s = load(json!({ "type": "array", "items": { "type": "number" }, "uniqueItems": true }));
        assert!(s.parse(Value::from(json!([1, 2]))).is_ok());
        let err = s.safe_parse(Value::from(json!([1, 1]))).unwrap();
        assert_eq!(err.error().unwrap().issues()[0].message, "Array items must be unique");
    }

    #[test]
    fn tuples_follow_prefix_items() {
        let s = load(json!({ "type": "array", "prefixItems": [{ "type": "string" }], "items": false }));
        assert!(s.parse(Value::from(json!(["a"]))).is_ok());
        let err = s.safe_parse(Value::from(json!(["a", 1]))).unwrap();
        assert_eq!(err.error().unwrap().issues()[0].code(), IssueCode::TooBig);
    }

    #[test]
    fn unsupported_keywords_report_their_location() {
        let err = load_schema_str(r##"{"properties": {"a": {"$ref": "#/x"}}}"##).unwrap_err();
        match err {
            SchemaError::Document { path, reason } => {
                assert!(path.contains("properties"), "{path}");
                assert!(reason.contains("$ref"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn combinators_nest_paths_in_errors() {
        let s = load(json!({ "anyOf": [{ "type": "string" }, { "type": "number" }] }));
        assert!(s.parse(1).is_ok());
        let s = load(json!({ "type": "object", "properties": { "p": { "allOf": [{ "type": "integer" }] } } }));
        let err = s.safe_parse(Value::from(json!({ "p": "x" }))).unwrap();
        assert_eq!(err.error().unwrap().issues()[0].path, vec![PathSegment::from("p")]);
    }
}
